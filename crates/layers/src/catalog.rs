//! Declarative catalog of every map layer.
//!
//! Insertion order is draw order: polygons first, then lines, then point
//! markers, then text labels on top. Each entry names the show-toggle that
//! drives its visibility so the toggle table can be derived instead of
//! maintained by hand.

use engine::{LayerKind, LayerSpec};
use serde::{Deserialize, Serialize};
use streaming::{HOSTING_CAPACITY_SOURCE, TileLayer};
use style::{
    Expr, StyleError, categorical_color, cluster_aware_radius, cluster_count_label, get_or,
    hover_switch, interpolated_color, interpolated_width, is_cluster,
};

use crate::toggles::Toggle;

pub const ZONES_FILL: &str = "zones-fill";
pub const ZONES_OUTLINE: &str = "zones-outline";
pub const TRANSMISSION_LINES: &str = "transmission-lines";
pub const TRANSMISSION_LINES_LABEL: &str = "transmission-lines-label";
pub const SUBSTATIONS: &str = "substations";
pub const SUBSTATIONS_COUNT: &str = "substations-count";
pub const PNODES: &str = "pnodes";
pub const PNODES_COUNT: &str = "pnodes-count";
pub const DATA_CENTERS: &str = "data-centers";
pub const DER_LOCATIONS: &str = "der-locations";
pub const DER_LOCATIONS_COUNT: &str = "der-locations-count";
pub const FEEDERS: &str = "feeders";
pub const FEEDERS_LABEL: &str = "feeders-label";
pub const HOSTING_CAPACITY: &str = "hosting-capacity";
pub const HOSTING_CAPACITY_COUNT: &str = "hosting-capacity-count";
pub const INFRA_LINES: &str = "infra-lines";
pub const INFRA_LINES_LABEL: &str = "infra-lines-label";
pub const INFRA_SUBSTATIONS_FILL: &str = "infra-substations-fill";
pub const INFRA_SUBSTATIONS_OUTLINE: &str = "infra-substations-outline";
pub const INFRA_SUBSTATIONS_LABEL: &str = "infra-substations-label";
pub const INFRA_POWER_PLANTS_FILL: &str = "infra-power-plants-fill";
pub const INFRA_POWER_PLANTS_OUTLINE: &str = "infra-power-plants-outline";
pub const INFRA_POWER_PLANTS_LABEL: &str = "infra-power-plants-label";

/// Clickable layers in click-priority order: small point markers win over
/// lines, and the zone fill underneath everything is the last resort.
pub const INTERACTIVE_LAYERS: &[&str] = &[
    HOSTING_CAPACITY,
    SUBSTATIONS,
    PNODES,
    DATA_CENTERS,
    DER_LOCATIONS,
    INFRA_POWER_PLANTS_FILL,
    INFRA_SUBSTATIONS_FILL,
    FEEDERS,
    TRANSMISSION_LINES,
    INFRA_LINES,
    ZONES_FILL,
];

/// Layers whose click opens an attribute popup.
pub const POPUP_LAYERS: &[&str] = &[
    HOSTING_CAPACITY,
    PNODES,
    DATA_CENTERS,
    FEEDERS,
    TRANSMISSION_LINES,
];

/// Line layers that highlight through the `hover` feature-state.
pub const HOVERABLE_LAYERS: &[&str] = &[TRANSMISSION_LINES, FEEDERS, INFRA_LINES];

/// Zone metric shown by the zone fill and outline.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneColorMode {
    /// Discrete constraint class (green / yellow / red).
    #[default]
    Classification,
    /// Continuous congestion score ramp.
    Value,
}

pub const ZONE_CLASS_FIELD: &str = "classification";
pub const ZONE_SCORE_FIELD: &str = "congestion_score";

const ZONE_CLASS_COLORS: &[(&str, &str)] = &[
    ("green", "#1a9850"),
    ("yellow", "#fee08b"),
    ("red", "#d73027"),
];
const ZONE_SCORE_RAMP: &[(f64, &str)] = &[(0.0, "#1a9850"), (0.5, "#fee08b"), (1.0, "#d73027")];
const UNKNOWN_COLOR: &str = "#9e9e9e";

/// Fill/outline color for the zone layers under `mode`.
pub fn zone_color(mode: ZoneColorMode) -> Result<Expr, StyleError> {
    match mode {
        ZoneColorMode::Classification => {
            categorical_color(ZONE_CLASS_FIELD, ZONE_CLASS_COLORS, UNKNOWN_COLOR)
        }
        ZoneColorMode::Value => interpolated_color(ZONE_SCORE_FIELD, ZONE_SCORE_RAMP, 0.0),
    }
}

/// One catalog entry: the layer declaration and the toggle driving it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDef {
    pub spec: LayerSpec,
    pub toggle: Toggle,
}

impl LayerDef {
    fn new(toggle: Toggle, spec: LayerSpec) -> Self {
        Self { spec, toggle }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }
}

fn vector(id: &str, kind: LayerKind, layer: TileLayer) -> LayerSpec {
    LayerSpec::new(id, kind, layer.source_id()).source_layer(layer.source_layer())
}

fn name_label(field: &str) -> Expr {
    Expr::ToText(Box::new(get_or(field, "")))
}

fn line_label(id: &str, layer: TileLayer, min_zoom: f64) -> LayerSpec {
    vector(id, LayerKind::Symbol, layer)
        .layout("text-field", name_label("name"))
        .layout("symbol-placement", "line")
        .layout("text-size", 11.0)
        .paint("text-color", "#333333")
        .paint("text-halo-color", "#ffffff")
        .paint("text-halo-width", 1.0)
        .min_zoom(min_zoom)
}

fn polygon_label(id: &str, layer: TileLayer, min_zoom: f64) -> LayerSpec {
    vector(id, LayerKind::Symbol, layer)
        .layout("text-field", name_label("name"))
        .layout("text-size", 10.0)
        .paint("text-color", "#333333")
        .paint("text-halo-color", "#ffffff")
        .paint("text-halo-width", 1.0)
        .min_zoom(min_zoom)
}

fn point_markers(source: LayerSpec, color: Expr, radius: Expr) -> LayerSpec {
    source
        .paint("circle-color", color)
        .paint("circle-radius", radius)
        .paint("circle-stroke-color", "#ffffff")
        .paint("circle-stroke-width", 1.0)
}

fn cluster_badge(source: LayerSpec) -> LayerSpec {
    source
        .filter(is_cluster())
        .layout("text-field", cluster_count_label())
        .layout("text-size", 11.0)
        .layout("text-allow-overlap", true)
        .paint("text-color", "#ffffff")
}

/// The full layer list in draw order.
pub fn layer_catalog(mode: ZoneColorMode) -> Result<Vec<LayerDef>, StyleError> {
    let zone = zone_color(mode)?;
    let voltage_width = interpolated_width("voltage_kv", &[(69.0, 1.0), (230.0, 2.0), (500.0, 3.5)])?;

    let mut defs = vec![
        LayerDef::new(
            Toggle::Zones,
            vector(ZONES_FILL, LayerKind::Fill, TileLayer::Zones)
                .paint("fill-color", zone.clone())
                .paint("fill-opacity", 0.35),
        ),
        LayerDef::new(
            Toggle::Zones,
            vector(ZONES_OUTLINE, LayerKind::Line, TileLayer::Zones)
                .paint("line-color", zone)
                .paint("line-width", 1.2),
        ),
    ];

    let fuel_colors = categorical_color(
        "fuel_type",
        &[
            ("solar", "#fdd835"),
            ("wind", "#4fc3f7"),
            ("gas", "#ff7043"),
            ("coal", "#5d4037"),
            ("nuclear", "#ab47bc"),
            ("hydro", "#1e88e5"),
            ("storage", "#66bb6a"),
        ],
        UNKNOWN_COLOR,
    )?;
    defs.extend([
        LayerDef::new(
            Toggle::InfraPowerPlants,
            vector(INFRA_POWER_PLANTS_FILL, LayerKind::Fill, TileLayer::InfraPowerPlants)
                .paint("fill-color", fuel_colors.clone())
                .paint("fill-opacity", 0.5),
        ),
        LayerDef::new(
            Toggle::InfraPowerPlants,
            vector(INFRA_POWER_PLANTS_OUTLINE, LayerKind::Line, TileLayer::InfraPowerPlants)
                .paint("line-color", fuel_colors)
                .paint("line-width", 1.0),
        ),
        LayerDef::new(
            Toggle::InfraSubstations,
            vector(INFRA_SUBSTATIONS_FILL, LayerKind::Fill, TileLayer::InfraSubstations)
                .paint("fill-color", "#9e9ac8")
                .paint("fill-opacity", 0.4)
                .min_zoom(9.0),
        ),
        LayerDef::new(
            Toggle::InfraSubstations,
            vector(INFRA_SUBSTATIONS_OUTLINE, LayerKind::Line, TileLayer::InfraSubstations)
                .paint("line-color", "#54278f")
                .paint("line-width", 1.0)
                .min_zoom(9.0),
        ),
    ]);

    // Lines
    defs.extend([
        LayerDef::new(
            Toggle::InfraLines,
            vector(INFRA_LINES, LayerKind::Line, TileLayer::InfraPowerLines)
                .paint("line-color", "#7f7f7f")
                .paint("line-width", hover_switch(voltage_width.clone(), Expr::num(4.0))),
        ),
        LayerDef::new(
            Toggle::TransmissionLines,
            vector(TRANSMISSION_LINES, LayerKind::Line, TileLayer::TransmissionLines)
                .paint(
                    "line-color",
                    interpolated_color(
                        "voltage_kv",
                        &[(69.0, "#8da0cb"), (230.0, "#5e3c99"), (500.0, "#e41a1c")],
                        69.0,
                    )?,
                )
                .paint("line-width", hover_switch(voltage_width, Expr::num(5.0))),
        ),
        LayerDef::new(
            Toggle::Feeders,
            vector(FEEDERS, LayerKind::Line, TileLayer::Feeders)
                .paint(
                    "line-color",
                    interpolated_color(
                        "peak_loading_pct",
                        &[(0.0, "#1a9850"), (80.0, "#fee08b"), (100.0, "#d73027")],
                        0.0,
                    )?,
                )
                .paint("line-width", hover_switch(Expr::num(1.5), Expr::num(3.5)))
                .min_zoom(10.0),
        ),
    ]);

    // Point markers, each followed by its cluster badge where clustering applies.
    let small = cluster_aware_radius(3.0, 5.0, 8.0)?;
    defs.extend([
        LayerDef::new(
            Toggle::Substations,
            point_markers(
                vector(SUBSTATIONS, LayerKind::Circle, TileLayer::Substations),
                interpolated_color(
                    "loading_pct",
                    &[(0.0, "#4575b4"), (80.0, "#fee090"), (100.0, "#d73027")],
                    0.0,
                )?,
                small.clone(),
            ),
        ),
        LayerDef::new(
            Toggle::Substations,
            cluster_badge(
                vector(SUBSTATIONS_COUNT, LayerKind::Symbol, TileLayer::Substations),
            ),
        ),
        LayerDef::new(
            Toggle::Pnodes,
            point_markers(
                vector(PNODES, LayerKind::Circle, TileLayer::Pnodes),
                interpolated_color(
                    "severity_score",
                    &[(0.0, "#ffffcc"), (0.5, "#fd8d3c"), (1.0, "#800026")],
                    0.0,
                )?,
                small.clone(),
            ),
        ),
        LayerDef::new(
            Toggle::Pnodes,
            cluster_badge(vector(PNODES_COUNT, LayerKind::Symbol, TileLayer::Pnodes)),
        ),
        LayerDef::new(
            Toggle::DataCenters,
            point_markers(
                vector(DATA_CENTERS, LayerKind::Circle, TileLayer::DataCenters),
                categorical_color(
                    "status",
                    &[
                        ("operational", "#6a3d9a"),
                        ("under_construction", "#9e76c4"),
                        ("planned", "#cab2d6"),
                    ],
                    UNKNOWN_COLOR,
                )?,
                Expr::num(6.0),
            ),
        ),
        LayerDef::new(
            Toggle::DerLocations,
            point_markers(
                vector(DER_LOCATIONS, LayerKind::Circle, TileLayer::DerLocations),
                categorical_color(
                    "value_tier",
                    &[
                        ("premium", "#00441b"),
                        ("high", "#238b45"),
                        ("moderate", "#74c476"),
                        ("low", "#c7e9c0"),
                    ],
                    UNKNOWN_COLOR,
                )?,
                small,
            ),
        ),
        LayerDef::new(
            Toggle::DerLocations,
            cluster_badge(
                vector(DER_LOCATIONS_COUNT, LayerKind::Symbol, TileLayer::DerLocations),
            ),
        ),
        LayerDef::new(
            Toggle::HostingCapacity,
            point_markers(
                LayerSpec::new(HOSTING_CAPACITY, LayerKind::Circle, HOSTING_CAPACITY_SOURCE),
                Expr::Case {
                    branches: vec![(is_cluster(), Expr::text("#2b8cbe"))],
                    fallback: Box::new(interpolated_color(
                        "remaining_capacity_mw",
                        &[(0.0, "#d73027"), (2.0, "#fee08b"), (5.0, "#1a9850")],
                        0.0,
                    )?),
                },
                cluster_aware_radius(3.0, 6.0, 10.0)?,
            ),
        ),
        LayerDef::new(
            Toggle::HostingCapacity,
            cluster_badge(
                LayerSpec::new(HOSTING_CAPACITY_COUNT, LayerKind::Symbol, HOSTING_CAPACITY_SOURCE),
            ),
        ),
    ]);

    // Labels last so they draw above everything. Regional lines label first,
    // fine-grained layers only once zoomed in.
    defs.extend([
        LayerDef::new(
            Toggle::TransmissionLines,
            line_label(TRANSMISSION_LINES_LABEL, TileLayer::TransmissionLines, 9.0),
        ),
        LayerDef::new(
            Toggle::InfraLines,
            line_label(INFRA_LINES_LABEL, TileLayer::InfraPowerLines, 10.0),
        ),
        LayerDef::new(
            Toggle::Feeders,
            line_label(FEEDERS_LABEL, TileLayer::Feeders, 12.0),
        ),
        LayerDef::new(
            Toggle::InfraPowerPlants,
            polygon_label(INFRA_POWER_PLANTS_LABEL, TileLayer::InfraPowerPlants, 10.0),
        ),
        LayerDef::new(
            Toggle::InfraSubstations,
            polygon_label(INFRA_SUBSTATIONS_LABEL, TileLayer::InfraSubstations, 12.0),
        ),
    ]);

    Ok(defs)
}
