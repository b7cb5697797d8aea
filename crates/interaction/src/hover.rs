use std::collections::BTreeMap;

use engine::{EngineError, FeatureRef, MapEngine, RenderedFeature};
use serde_json::{Map, Value};
use tracing::debug;

pub const HOVER_STATE: &str = "hover";

fn hover_state(on: bool) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(HOVER_STATE.to_string(), Value::Bool(on));
    m
}

/// Per-layer hover highlight bookkeeping.
///
/// Invariants:
/// - At most one feature per layer carries `hover: true`.
/// - The previous feature is cleared before the next one is set, so a failed
///   set never leaves two highlights behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverTracker {
    hovered: BTreeMap<String, FeatureRef>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self, layer: &str) -> Option<&FeatureRef> {
        self.hovered.get(layer)
    }

    pub fn is_empty(&self) -> bool {
        self.hovered.is_empty()
    }

    /// Pointer moved over `feature` on `layer`.
    ///
    /// Returns `true` when the highlight moved. A feature without an id
    /// cannot carry feature-state; it clears the layer's highlight instead.
    pub fn enter<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        layer: &str,
        feature: &RenderedFeature,
    ) -> Result<bool, EngineError> {
        let Some(next) = feature.feature_ref() else {
            return self.leave(engine, layer);
        };
        if self.hovered.get(layer) == Some(&next) {
            return Ok(false);
        }
        self.leave(engine, layer)?;
        engine.set_feature_state(&next, &hover_state(true))?;
        debug!(layer, id = ?next.id, "hover set");
        self.hovered.insert(layer.to_string(), next);
        Ok(true)
    }

    /// Pointer left `layer`; clears its highlight if any.
    pub fn leave<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        layer: &str,
    ) -> Result<bool, EngineError> {
        let Some(prev) = self.hovered.remove(layer) else {
            return Ok(false);
        };
        engine.set_feature_state(&prev, &hover_state(false))?;
        Ok(true)
    }

    /// Pointer left the map: every layer counts as left.
    ///
    /// All entries are dropped even if clearing one of them fails; the first
    /// error is reported.
    pub fn leave_all<E: MapEngine + ?Sized>(&mut self, engine: &mut E) -> Result<(), EngineError> {
        let mut first_err = None;
        for (_, prev) in std::mem::take(&mut self.hovered) {
            if let Err(e) = engine.set_feature_state(&prev, &hover_state(false)) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use engine::{HeadlessEngine, MapEngine, RenderedFeature, SourceSpec};
    use foundation::{FeatureId, LatLng, ViewState};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{HOVER_STATE, HoverTracker};

    fn engine() -> HeadlessEngine {
        let mut e = HeadlessEngine::new(ViewState::new(LatLng::new(40.0, -90.0), 8.0));
        e.add_source(
            "feeders",
            &SourceSpec::GeoJson {
                data: json!({ "type": "FeatureCollection", "features": [] }),
                cluster: None,
            },
        )
        .expect("source");
        e
    }

    fn feeder(id: u64) -> RenderedFeature {
        RenderedFeature::new("feeders", "feeders").with_id(FeatureId::Number(id))
    }

    #[test]
    fn at_most_one_feature_is_hovered() {
        let mut e = engine();
        let mut h = HoverTracker::new();
        for id in [1, 2, 2, 3, 1] {
            h.enter(&mut e, "feeders", &feeder(id)).expect("enter");
            let on = e.features_with_state(HOVER_STATE);
            assert_eq!(on.len(), 1);
            assert_eq!(on[0].id, FeatureId::Number(id));
        }
    }

    #[test]
    fn same_feature_is_not_reset() {
        let mut e = engine();
        let mut h = HoverTracker::new();
        assert!(h.enter(&mut e, "feeders", &feeder(1)).expect("first"));
        assert!(!h.enter(&mut e, "feeders", &feeder(1)).expect("again"));
    }

    #[test]
    fn leave_clears_highlight() {
        let mut e = engine();
        let mut h = HoverTracker::new();
        h.enter(&mut e, "feeders", &feeder(7)).expect("enter");
        assert!(h.leave(&mut e, "feeders").expect("leave"));
        assert!(e.features_with_state(HOVER_STATE).is_empty());
        assert!(!h.leave(&mut e, "feeders").expect("second leave"));
    }

    #[test]
    fn leaving_the_map_clears_every_layer() {
        let mut e = engine();
        let mut h = HoverTracker::new();
        h.enter(&mut e, "feeders", &feeder(1)).expect("feeders");
        h.enter(&mut e, "other-layer", &feeder(2)).expect("other");
        h.leave_all(&mut e).expect("leave all");
        assert!(h.is_empty());
        assert!(e.features_with_state(HOVER_STATE).is_empty());
    }

    #[test]
    fn feature_without_id_clears_instead_of_setting() {
        let mut e = engine();
        let mut h = HoverTracker::new();
        h.enter(&mut e, "feeders", &feeder(1)).expect("enter");
        let anonymous = RenderedFeature::new("feeders", "feeders");
        assert!(h.enter(&mut e, "feeders", &anonymous).expect("anon"));
        assert!(e.features_with_state(HOVER_STATE).is_empty());
        assert!(h.hovered("feeders").is_none());
    }
}
