use foundation::IsoCode;

/// Query parameter carrying the ISO filter.
pub const ISO_PARAM: &str = "iso_id";

/// Vector tile layers served by the backend.
///
/// Per-ISO layers accept the `iso_id` filter; the `gpkg_*` infrastructure
/// layers are nation-wide and never take it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileLayer {
    Zones,
    TransmissionLines,
    Substations,
    Pnodes,
    DataCenters,
    DerLocations,
    Feeders,
    InfraPowerLines,
    InfraSubstations,
    InfraPowerPlants,
}

impl TileLayer {
    pub const ALL: [TileLayer; 10] = [
        TileLayer::Zones,
        TileLayer::TransmissionLines,
        TileLayer::Substations,
        TileLayer::Pnodes,
        TileLayer::DataCenters,
        TileLayer::DerLocations,
        TileLayer::Feeders,
        TileLayer::InfraPowerLines,
        TileLayer::InfraSubstations,
        TileLayer::InfraPowerPlants,
    ];

    /// Layer name in the tile path; also the MVT source-layer and the source id.
    pub fn name(self) -> &'static str {
        match self {
            TileLayer::Zones => "zones",
            TileLayer::TransmissionLines => "transmission_lines",
            TileLayer::Substations => "substations",
            TileLayer::Pnodes => "pnodes",
            TileLayer::DataCenters => "data_centers",
            TileLayer::DerLocations => "der_locations",
            TileLayer::Feeders => "feeders",
            TileLayer::InfraPowerLines => "gpkg_power_lines",
            TileLayer::InfraSubstations => "gpkg_substations",
            TileLayer::InfraPowerPlants => "gpkg_power_plants",
        }
    }

    pub fn source_id(self) -> &'static str {
        self.name()
    }

    pub fn source_layer(self) -> &'static str {
        self.name()
    }

    pub fn iso_filtered(self) -> bool {
        !matches!(
            self,
            TileLayer::InfraPowerLines | TileLayer::InfraSubstations | TileLayer::InfraPowerPlants
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name)
    }
}

/// Tile URL template for `layer`: `{base}/{layer}/{z}/{x}/{y}.mvt[?iso_id=a,b]`.
///
/// An empty ISO list means "no filter" and omits the parameter entirely.
pub fn build_tile_url(base: &str, layer: TileLayer, isos: &[IsoCode]) -> String {
    let mut url = format!(
        "{}/{}/{{z}}/{{x}}/{{y}}.mvt",
        base.trim_end_matches('/'),
        layer.name()
    );
    if layer.iso_filtered() && !isos.is_empty() {
        let joined: Vec<&str> = isos.iter().map(IsoCode::as_str).collect();
        url.push('?');
        url.push_str(ISO_PARAM);
        url.push('=');
        url.push_str(&joined.join(","));
    }
    url
}

/// Reads the ISO filter back out of a tile URL, preserving order.
pub fn parse_iso_param(url: &str) -> Vec<IsoCode> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == ISO_PARAM)
        .flat_map(|(_, value)| value.split(','))
        .filter_map(|code| IsoCode::parse(code).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TileLayer, build_tile_url, parse_iso_param};
    use foundation::IsoCode;
    use pretty_assertions::assert_eq;

    fn isos(codes: &[&str]) -> Vec<IsoCode> {
        codes
            .iter()
            .map(|c| IsoCode::parse(c).expect("valid"))
            .collect()
    }

    #[test]
    fn empty_iso_list_omits_parameter() {
        let url = build_tile_url("/api/tiles/", TileLayer::Zones, &[]);
        assert_eq!(url, "/api/tiles/zones/{z}/{x}/{y}.mvt");
        assert!(!url.contains("iso_id"));
        assert!(parse_iso_param(&url).is_empty());
    }

    #[test]
    fn iso_list_round_trips_in_order() {
        let codes = isos(&["pjm", "miso"]);
        let url = build_tile_url("/api/tiles", TileLayer::Substations, &codes);
        assert_eq!(url, "/api/tiles/substations/{z}/{x}/{y}.mvt?iso_id=pjm,miso");
        assert_eq!(parse_iso_param(&url), codes);

        let reversed = isos(&["miso", "pjm"]);
        let url = build_tile_url("/api/tiles", TileLayer::Substations, &reversed);
        assert_eq!(parse_iso_param(&url), reversed);
    }

    #[test]
    fn infrastructure_layers_never_take_iso_filter() {
        let codes = isos(&["caiso"]);
        for layer in [
            TileLayer::InfraPowerLines,
            TileLayer::InfraSubstations,
            TileLayer::InfraPowerPlants,
        ] {
            let url = build_tile_url("/t", layer, &codes);
            assert!(!url.contains('?'), "{url}");
        }
        assert_eq!(TileLayer::ALL.iter().filter(|l| l.iso_filtered()).count(), 7);
    }

    #[test]
    fn parse_ignores_other_parameters() {
        let got = parse_iso_param("/t/zones/{z}/{x}/{y}.mvt?v=2&iso_id=ercot,spp&x=1");
        assert_eq!(got, isos(&["ercot", "spp"]));
    }

    #[test]
    fn layer_names_round_trip() {
        for layer in TileLayer::ALL {
            assert_eq!(TileLayer::from_name(layer.name()), Some(layer));
        }
        assert_eq!(TileLayer::from_name("nope"), None);
    }
}
