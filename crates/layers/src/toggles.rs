use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::LayerDef;

/// UI show-toggles, one per layer family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Zones,
    TransmissionLines,
    Substations,
    Pnodes,
    DataCenters,
    DerLocations,
    Feeders,
    HostingCapacity,
    InfraLines,
    InfraSubstations,
    InfraPowerPlants,
}

impl Toggle {
    pub const ALL: [Toggle; 11] = [
        Toggle::Zones,
        Toggle::TransmissionLines,
        Toggle::Substations,
        Toggle::Pnodes,
        Toggle::DataCenters,
        Toggle::DerLocations,
        Toggle::Feeders,
        Toggle::HostingCapacity,
        Toggle::InfraLines,
        Toggle::InfraSubstations,
        Toggle::InfraPowerPlants,
    ];
}

/// Current value of every show-toggle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleState {
    pub show_zones: bool,
    pub show_transmission_lines: bool,
    pub show_substations: bool,
    pub show_pnodes: bool,
    pub show_data_centers: bool,
    pub show_der_locations: bool,
    pub show_feeders: bool,
    pub show_hosting_capacity: bool,
    pub show_infra_lines: bool,
    pub show_infra_substations: bool,
    pub show_infra_power_plants: bool,
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            show_zones: true,
            show_transmission_lines: true,
            show_substations: true,
            show_pnodes: false,
            show_data_centers: true,
            show_der_locations: false,
            show_feeders: false,
            show_hosting_capacity: false,
            show_infra_lines: false,
            show_infra_substations: false,
            show_infra_power_plants: false,
        }
    }
}

impl ToggleState {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Zones => self.show_zones,
            Toggle::TransmissionLines => self.show_transmission_lines,
            Toggle::Substations => self.show_substations,
            Toggle::Pnodes => self.show_pnodes,
            Toggle::DataCenters => self.show_data_centers,
            Toggle::DerLocations => self.show_der_locations,
            Toggle::Feeders => self.show_feeders,
            Toggle::HostingCapacity => self.show_hosting_capacity,
            Toggle::InfraLines => self.show_infra_lines,
            Toggle::InfraSubstations => self.show_infra_substations,
            Toggle::InfraPowerPlants => self.show_infra_power_plants,
        }
    }

    pub fn set(&mut self, toggle: Toggle, visible: bool) {
        let slot = match toggle {
            Toggle::Zones => &mut self.show_zones,
            Toggle::TransmissionLines => &mut self.show_transmission_lines,
            Toggle::Substations => &mut self.show_substations,
            Toggle::Pnodes => &mut self.show_pnodes,
            Toggle::DataCenters => &mut self.show_data_centers,
            Toggle::DerLocations => &mut self.show_der_locations,
            Toggle::Feeders => &mut self.show_feeders,
            Toggle::HostingCapacity => &mut self.show_hosting_capacity,
            Toggle::InfraLines => &mut self.show_infra_lines,
            Toggle::InfraSubstations => &mut self.show_infra_substations,
            Toggle::InfraPowerPlants => &mut self.show_infra_power_plants,
        };
        *slot = visible;
    }

    /// Toggles whose value differs between `self` and `other`.
    pub fn changed(&self, other: &ToggleState) -> Vec<Toggle> {
        Toggle::ALL
            .into_iter()
            .filter(|t| self.get(*t) != other.get(*t))
            .collect()
    }
}

/// Toggle → affected layer ids, derived from the layer catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleTable {
    layers: BTreeMap<Toggle, Vec<String>>,
}

impl ToggleTable {
    pub fn from_catalog(defs: &[LayerDef]) -> Self {
        let mut layers: BTreeMap<Toggle, Vec<String>> = BTreeMap::new();
        for def in defs {
            layers
                .entry(def.toggle)
                .or_default()
                .push(def.spec.id.clone());
        }
        Self { layers }
    }

    pub fn layers_for(&self, toggle: Toggle) -> &[String] {
        self.layers.get(&toggle).map(Vec::as_slice).unwrap_or_default()
    }
}
