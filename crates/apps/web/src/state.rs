use std::cell::RefCell;
use std::rc::Rc;

use foundation::{IsoCode, LatLng, ViewState};
use interaction::{AssetRef, SelectionWrite};
use layers::{Toggle, ToggleState, ZoneColorMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use streaming::HostingCapacityRecord;
use tracing::warn;

/// The slice of shared UI state the map core reads and writes.
///
/// Sibling UI components mutate this freely; the core reconciles on its next
/// `sync`. Every write the core makes is a plain scalar or id assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub toggles: ToggleState,
    pub zone_color_mode: ZoneColorMode,
    pub selected_isos: Vec<IsoCode>,
    pub selected_zone_code: Option<String>,
    pub selected_substation_id: Option<String>,
    pub selected_asset: Option<AssetRef>,
    /// Background click location for the siting workflow.
    pub clicked_point: Option<LatLng>,
    pub camera: ViewState,
    #[serde(skip)]
    hosting_capacity: Vec<HostingCapacityRecord>,
    #[serde(skip)]
    hosting_capacity_revision: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self::with_camera(ViewState::default())
    }
}

pub type SharedUiState = Rc<RefCell<UiState>>;

impl UiState {
    pub fn with_camera(camera: ViewState) -> Self {
        Self {
            toggles: ToggleState::default(),
            zone_color_mode: ZoneColorMode::default(),
            selected_isos: Vec::new(),
            selected_zone_code: None,
            selected_substation_id: None,
            selected_asset: None,
            clicked_point: None,
            camera,
            hosting_capacity: Vec::new(),
            hosting_capacity_revision: 0,
        }
    }

    pub fn shared(self) -> SharedUiState {
        Rc::new(RefCell::new(self))
    }

    pub fn hosting_capacity(&self) -> &[HostingCapacityRecord] {
        &self.hosting_capacity
    }

    /// Bumps on every replacement so watchers notice without comparing data.
    pub fn hosting_capacity_revision(&self) -> u64 {
        self.hosting_capacity_revision
    }

    pub fn set_hosting_capacity(&mut self, records: Vec<HostingCapacityRecord>) {
        self.hosting_capacity = records;
        self.hosting_capacity_revision = self.hosting_capacity_revision.wrapping_add(1);
    }

    /// Sets a toggle from its wire name (`"feeders"`, `"hosting_capacity"`, ...).
    ///
    /// This and the other `*_from_host` setters take raw host input: anything
    /// unrecognized is logged and ignored. Each returns whether state changed.
    pub fn set_toggle_from_host(&mut self, name: &str, visible: bool) -> bool {
        match serde_json::from_value::<Toggle>(Value::String(name.to_string())) {
            Ok(toggle) => {
                self.toggles.set(toggle, visible);
                true
            }
            Err(e) => {
                warn!(toggle = name, error = %e, "ignoring unknown toggle");
                false
            }
        }
    }

    pub fn set_zone_color_mode_from_host(&mut self, mode: &str) -> bool {
        match serde_json::from_value::<ZoneColorMode>(Value::String(mode.to_string())) {
            Ok(parsed) => {
                self.zone_color_mode = parsed;
                true
            }
            Err(e) => {
                warn!(mode, error = %e, "ignoring unknown zone color mode");
                false
            }
        }
    }

    /// Invalid codes are dropped; the rest are applied.
    pub fn set_selected_isos_from_host(&mut self, codes: &[String]) -> bool {
        self.selected_isos = codes
            .iter()
            .filter_map(|raw| match IsoCode::parse(raw) {
                Ok(code) => Some(code),
                Err(e) => {
                    warn!(error = %e, "ignoring ISO code");
                    None
                }
            })
            .collect();
        true
    }

    /// Malformed JSON keeps the current records.
    pub fn set_hosting_capacity_from_host(&mut self, records_json: &str) -> bool {
        match serde_json::from_str::<Vec<HostingCapacityRecord>>(records_json) {
            Ok(records) => {
                self.set_hosting_capacity(records);
                true
            }
            Err(e) => {
                warn!(error = %e, "ignoring malformed hosting capacity records");
                false
            }
        }
    }

    pub fn apply_selection(&mut self, write: SelectionWrite) {
        match write {
            SelectionWrite::Zone(code) => self.selected_zone_code = Some(code),
            SelectionWrite::Substation(id) => self.selected_substation_id = Some(id),
            SelectionWrite::Asset(asset) => self.selected_asset = Some(asset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UiState;
    use foundation::IsoCode;
    use interaction::SelectionWrite;
    use layers::{Toggle, ZoneColorMode};
    use pretty_assertions::assert_eq;
    use streaming::HostingCapacityRecord;

    #[test]
    fn hosting_capacity_replacement_bumps_revision() {
        let mut s = UiState::default();
        let r0 = s.hosting_capacity_revision();
        s.set_hosting_capacity(vec![HostingCapacityRecord::new("F1")]);
        s.set_hosting_capacity(Vec::new());
        assert_eq!(s.hosting_capacity_revision(), r0 + 2);
        assert!(s.hosting_capacity().is_empty());
    }

    #[test]
    fn host_input_is_parsed_or_ignored() {
        let mut s = UiState::default();
        let before = s.clone();
        assert!(!s.set_toggle_from_host("railways", true));
        assert!(!s.set_zone_color_mode_from_host("rainbow"));
        assert!(!s.set_hosting_capacity_from_host("{not json"));
        assert_eq!(s, before);
        assert_eq!(s.hosting_capacity_revision(), 0);

        assert!(s.set_toggle_from_host("feeders", true));
        assert!(s.toggles.get(Toggle::Feeders));
        assert!(s.set_zone_color_mode_from_host("value"));
        assert_eq!(s.zone_color_mode, ZoneColorMode::Value);
        assert!(s.set_hosting_capacity_from_host(r#"[{"feeder_id": "F-9"}]"#));
        assert_eq!(s.hosting_capacity().len(), 1);

        s.set_selected_isos_from_host(&["PJM".to_string(), "p&m".to_string()]);
        assert_eq!(s.selected_isos, vec![IsoCode::parse("pjm").expect("iso")]);
    }

    #[test]
    fn selection_writes_only_their_own_key() {
        let mut s = UiState::default();
        s.apply_selection(SelectionWrite::Substation("SUB-1".into()));
        assert_eq!(s.selected_substation_id.as_deref(), Some("SUB-1"));
        assert!(s.selected_zone_code.is_none());
        assert!(s.clicked_point.is_none());
    }
}
