use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geo::{LatLng, ViewState};
use crate::ids::IsoCode;

/// Predefined camera for one market region.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl RegionView {
    pub const fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self { lat, lng, zoom }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(LatLng::new(self.lat, self.lng), self.zoom)
    }
}

/// Lookup of the fly-to target for each ISO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    views: BTreeMap<IsoCode, RegionView>,
}

const DEFAULT_REGIONS: &[(&str, RegionView)] = &[
    ("caiso", RegionView::new(37.0, -119.5, 6.0)),
    ("ercot", RegionView::new(31.0, -99.0, 6.0)),
    ("isone", RegionView::new(43.5, -71.5, 7.0)),
    ("miso", RegionView::new(41.0, -90.0, 5.0)),
    ("nyiso", RegionView::new(42.9, -75.5, 7.0)),
    ("pjm", RegionView::new(39.5, -78.0, 6.0)),
    ("spp", RegionView::new(37.5, -98.0, 5.0)),
];

impl Default for RegionTable {
    fn default() -> Self {
        let mut views = BTreeMap::new();
        for (code, view) in DEFAULT_REGIONS {
            if let Ok(code) = IsoCode::parse(code) {
                views.insert(code, *view);
            }
        }
        Self { views }
    }
}

impl RegionTable {
    pub fn get(&self, code: &IsoCode) -> Option<RegionView> {
        self.views.get(code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{RegionTable, RegionView};
    use crate::ids::IsoCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_table_has_caiso_view() {
        let table = RegionTable::default();
        let caiso = IsoCode::parse("caiso").expect("valid");
        assert_eq!(table.get(&caiso), Some(RegionView::new(37.0, -119.5, 6.0)));
        for (code, view) in super::DEFAULT_REGIONS {
            let code = IsoCode::parse(code).expect("valid");
            assert_eq!(table.get(&code), Some(*view), "{code}");
        }
    }

    #[test]
    fn table_deserializes_from_map() {
        let table: RegionTable =
            serde_json::from_str(r#"{"PJM": {"lat": 39.0, "lng": -77.0, "zoom": 6.5}}"#)
                .expect("parse");
        let pjm = IsoCode::parse("pjm").expect("valid");
        assert_eq!(table.get(&pjm), Some(RegionView::new(39.0, -77.0, 6.5)));
        let caiso = IsoCode::parse("caiso").expect("valid");
        assert_eq!(table.get(&caiso), None);
    }
}
