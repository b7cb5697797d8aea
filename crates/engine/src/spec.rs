use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use style::Expr;

/// Clustering options for a GeoJSON point source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterOptions {
    pub radius_px: u32,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Vector {
        tiles: Vec<String>,
        min_zoom: u8,
        max_zoom: u8,
        /// Property promoted to the feature id, needed for feature-state.
        promote_id: Option<String>,
    },
    GeoJson {
        data: Value,
        cluster: Option<ClusterOptions>,
    },
}

impl SourceSpec {
    pub fn to_json(&self) -> Value {
        match self {
            SourceSpec::Vector {
                tiles,
                min_zoom,
                max_zoom,
                promote_id,
            } => {
                let mut out = json!({
                    "type": "vector",
                    "tiles": tiles,
                    "minzoom": min_zoom,
                    "maxzoom": max_zoom,
                });
                if let (Some(id), Some(obj)) = (promote_id, out.as_object_mut()) {
                    obj.insert("promoteId".into(), json!(id));
                }
                out
            }
            SourceSpec::GeoJson { data, cluster } => {
                let mut out = json!({ "type": "geojson", "data": data });
                if let (Some(c), Some(obj)) = (cluster, out.as_object_mut()) {
                    obj.insert("cluster".into(), json!(true));
                    obj.insert("clusterRadius".into(), json!(c.radius_px));
                    obj.insert("clusterMaxZoom".into(), json!(c.max_zoom));
                }
                out
            }
        }
    }

    pub fn tiles(&self) -> Option<&[String]> {
        match self {
            SourceSpec::Vector { tiles, .. } => Some(tiles),
            SourceSpec::GeoJson { .. } => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Circle => "circle",
            LayerKind::Symbol => "symbol",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

impl Visibility {
    pub fn from_flag(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

/// Declarative rendering rule bound to one source (and source-layer).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub source_layer: Option<String>,
    pub paint: BTreeMap<String, Expr>,
    pub layout: BTreeMap<String, Expr>,
    pub filter: Option<Expr>,
    pub min_zoom: Option<f64>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            source_layer: None,
            paint: BTreeMap::new(),
            layout: BTreeMap::new(),
            filter: None,
            min_zoom: None,
        }
    }

    pub fn source_layer(mut self, name: impl Into<String>) -> Self {
        self.source_layer = Some(name.into());
        self
    }

    pub fn paint(mut self, property: &str, value: impl Into<Expr>) -> Self {
        self.paint.insert(property.to_string(), value.into());
        self
    }

    pub fn layout(mut self, property: &str, value: impl Into<Expr>) -> Self {
        self.layout.insert(property.to_string(), value.into());
        self
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn min_zoom(mut self, zoom: f64) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    /// Style-document JSON with the given visibility folded into `layout`.
    pub fn to_json(&self, visibility: Visibility) -> Value {
        let mut layout: Map<String, Value> = self
            .layout
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        layout.insert("visibility".into(), json!(visibility.as_str()));
        let paint: Map<String, Value> = self
            .paint
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        let mut out = Map::new();
        out.insert("id".into(), json!(self.id));
        out.insert("type".into(), json!(self.kind.as_str()));
        out.insert("source".into(), json!(self.source));
        if let Some(sl) = &self.source_layer {
            out.insert("source-layer".into(), json!(sl));
        }
        if let Some(f) = &self.filter {
            out.insert("filter".into(), f.to_json());
        }
        if let Some(z) = self.min_zoom {
            out.insert("minzoom".into(), json!(z));
        }
        out.insert("layout".into(), Value::Object(layout));
        out.insert("paint".into(), Value::Object(paint));
        Value::Object(out)
    }
}
