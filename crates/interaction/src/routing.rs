use engine::RenderedFeature;
use foundation::{FeatureId, LatLng};
use layers::{INTERACTIVE_LAYERS, POPUP_LAYERS, SUBSTATIONS, ZONES_FILL};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::popup::PopupContent;

const ZONE_CODE_FIELD: &str = "zone_code";
const SUBSTATION_ID_FIELD: &str = "substation_id";
const POINT_COUNT_FIELD: &str = "point_count";

/// A selected asset that is neither a zone nor a substation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub layer: String,
    pub id: String,
}

/// Selection key written to shared UI state for a feature click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionWrite {
    Zone(String),
    Substation(String),
    Asset(AssetRef),
}

/// Outcome of routing one click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickRoute {
    /// A feature on an interactive layer was hit.
    Feature {
        feature: RenderedFeature,
        selection: Option<SelectionWrite>,
        popup: Option<PopupContent>,
    },
    /// A cluster aggregate was hit; it expands instead of selecting.
    Cluster { layer: String, center: LatLng },
    /// Nothing interactive under the pointer.
    Background { at: LatLng },
}

/// Position of `layer` in the click-priority list.
pub fn click_priority(layer: &str) -> Option<usize> {
    INTERACTIVE_LAYERS.iter().position(|l| *l == layer)
}

/// Routes a click from the hit-test result at that point.
///
/// `hits` is the engine's answer for the interactive layer list, topmost
/// first. The result depends only on `hits` and `at`.
///
/// Ordering contract:
/// - Hits on layers outside the interactive list are ignored.
/// - The hit whose layer has the best click priority wins.
/// - Among hits on the same layer the topmost wins.
/// - No remaining hit means a background click.
pub fn route_click(hits: &[RenderedFeature], at: LatLng) -> ClickRoute {
    let winner = hits
        .iter()
        .enumerate()
        .filter_map(|(order, f)| click_priority(&f.layer).map(|p| (p, order, f)))
        .min_by_key(|(p, order, _)| (*p, *order))
        .map(|(_, _, f)| f);

    let Some(feature) = winner else {
        return ClickRoute::Background { at };
    };

    if is_cluster(feature) {
        return ClickRoute::Cluster {
            layer: feature.layer.clone(),
            center: feature.position.unwrap_or(at),
        };
    }

    let popup = POPUP_LAYERS
        .contains(&feature.layer.as_str())
        .then(|| PopupContent::for_feature(feature))
        .flatten();
    ClickRoute::Feature {
        selection: selection_for(feature),
        popup,
        feature: feature.clone(),
    }
}

fn is_cluster(feature: &RenderedFeature) -> bool {
    feature
        .property(POINT_COUNT_FIELD)
        .and_then(Value::as_f64)
        .is_some_and(|n| n > 1.0)
}

fn feature_id_text(feature: &RenderedFeature) -> Option<String> {
    match &feature.id {
        Some(FeatureId::Text(s)) if !s.is_empty() => Some(s.clone()),
        Some(FeatureId::Number(n)) => Some(n.to_string()),
        _ => feature.property_text("id"),
    }
}

/// Selection key for a clicked feature; `None` when it carries no usable id.
pub fn selection_for(feature: &RenderedFeature) -> Option<SelectionWrite> {
    match feature.layer.as_str() {
        ZONES_FILL => feature
            .property_text(ZONE_CODE_FIELD)
            .or_else(|| feature_id_text(feature))
            .map(SelectionWrite::Zone),
        SUBSTATIONS => feature
            .property_text(SUBSTATION_ID_FIELD)
            .or_else(|| feature_id_text(feature))
            .map(SelectionWrite::Substation),
        layer => feature_id_text(feature).map(|id| {
            SelectionWrite::Asset(AssetRef {
                layer: layer.to_string(),
                id,
            })
        }),
    }
}
