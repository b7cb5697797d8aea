use engine::RenderedFeature;
use foundation::LatLng;
use layers::{DATA_CENTERS, FEEDERS, HOSTING_CAPACITY, PNODES, TRANSMISSION_LINES};

/// Shown for any property a feature does not carry.
pub const MISSING_TEXT: &str = "N/A";

struct Field {
    label: &'static str,
    key: &'static str,
}

struct Template {
    title_key: &'static str,
    fallback_title: &'static str,
    fields: &'static [Field],
}

const fn field(label: &'static str, key: &'static str) -> Field {
    Field { label, key }
}

static HOSTING_CAPACITY_POPUP: Template = Template {
    title_key: "feeder_id",
    fallback_title: "Hosting capacity",
    fields: &[
        field("Utility", "utility"),
        field("Remaining capacity (MW)", "remaining_capacity_mw"),
        field("Installed capacity (MW)", "installed_capacity_mw"),
    ],
};

static PNODE_POPUP: Template = Template {
    title_key: "name",
    fallback_title: "Pricing node",
    fields: &[
        field("ISO", "iso_code"),
        field("Severity score", "severity_score"),
        field("Avg congestion ($/MWh)", "avg_congestion"),
    ],
};

static DATA_CENTER_POPUP: Template = Template {
    title_key: "name",
    fallback_title: "Data center",
    fields: &[
        field("Operator", "operator"),
        field("Status", "status"),
        field("Capacity (MW)", "capacity_mw"),
    ],
};

static FEEDER_POPUP: Template = Template {
    title_key: "feeder_id",
    fallback_title: "Feeder",
    fields: &[
        field("Substation", "substation_name"),
        field("Voltage (kV)", "voltage_kv"),
        field("Peak loading (%)", "peak_loading_pct"),
    ],
};

static TRANSMISSION_LINE_POPUP: Template = Template {
    title_key: "name",
    fallback_title: "Transmission line",
    fields: &[
        field("Voltage (kV)", "voltage_kv"),
        field("Owner", "owner"),
        field("ISO", "iso_code"),
    ],
};

fn template(layer: &str) -> Option<&'static Template> {
    match layer {
        HOSTING_CAPACITY => Some(&HOSTING_CAPACITY_POPUP),
        PNODES => Some(&PNODE_POPUP),
        DATA_CENTERS => Some(&DATA_CENTER_POPUP),
        FEEDERS => Some(&FEEDER_POPUP),
        TRANSMISSION_LINES => Some(&TRANSMISSION_LINE_POPUP),
        _ => None,
    }
}

/// Title plus label/value rows for an engine popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl PopupContent {
    /// Popup for a clicked feature, or `None` when its layer has no popup.
    pub fn for_feature(feature: &RenderedFeature) -> Option<Self> {
        let t = template(&feature.layer)?;
        let title = feature
            .property_text(t.title_key)
            .unwrap_or_else(|| t.fallback_title.to_string());
        let rows = t
            .fields
            .iter()
            .map(|f| {
                let value = feature
                    .property_text(f.key)
                    .unwrap_or_else(|| MISSING_TEXT.to_string());
                (f.label.to_string(), value)
            })
            .collect();
        Some(Self { title, rows })
    }

    /// Popup for a background click that starts the siting workflow.
    pub fn siting(at: LatLng) -> Self {
        Self {
            title: "Candidate site".to_string(),
            rows: vec![
                ("Latitude".to_string(), format!("{:.5}", at.lat)),
                ("Longitude".to_string(), format!("{:.5}", at.lng)),
            ],
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(64 + self.rows.len() * 48);
        out.push_str("<div class=\"map-popup\"><strong>");
        push_escaped(&mut out, &self.title);
        out.push_str("</strong><table>");
        for (label, value) in &self.rows {
            out.push_str("<tr><th>");
            push_escaped(&mut out, label);
            out.push_str("</th><td>");
            push_escaped(&mut out, value);
            out.push_str("</td></tr>");
        }
        out.push_str("</table></div>");
        out
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::RenderedFeature;
    use foundation::LatLng;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::{MISSING_TEXT, PopupContent};

    #[test]
    fn missing_properties_render_na() {
        let f = RenderedFeature::new("data-centers", "data_centers")
            .with_property("name", "Ashburn 4")
            .with_property("status", Value::Null)
            .with_property("capacity_mw", 120);
        let p = PopupContent::for_feature(&f).expect("popup");
        assert_eq!(p.title, "Ashburn 4");
        assert_eq!(
            p.rows,
            vec![
                ("Operator".to_string(), MISSING_TEXT.to_string()),
                ("Status".to_string(), MISSING_TEXT.to_string()),
                ("Capacity (MW)".to_string(), "120".to_string()),
            ]
        );
        assert!(!p.to_html().contains("undefined"));
    }

    #[test]
    fn untitled_feature_uses_layer_title() {
        let f = RenderedFeature::new("feeders", "feeders");
        assert_eq!(PopupContent::for_feature(&f).expect("popup").title, "Feeder");
    }

    #[test]
    fn layers_without_popups() {
        let f = RenderedFeature::new("zones-fill", "zones");
        assert!(PopupContent::for_feature(&f).is_none());
    }

    #[test]
    fn html_is_escaped() {
        let f = RenderedFeature::new("pnodes", "pnodes").with_property("name", "<b>A&B</b>");
        let html = PopupContent::for_feature(&f).expect("popup").to_html();
        assert!(html.contains("&lt;b&gt;A&amp;B&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn siting_popup_shows_coordinates() {
        let p = PopupContent::siting(LatLng::new(36.0, -120.0));
        assert_eq!(p.rows[0].1, "36.00000");
        assert_eq!(p.rows[1].1, "-120.00000");
    }
}
