use engine::{EngineError, MapEngine};
use foundation::{LatLng, ScreenPoint};
use layers::{HOVERABLE_LAYERS, INTERACTIVE_LAYERS};
use tracing::{debug, warn};

use crate::cursor::CursorTracker;
use crate::hover::HoverTracker;
use crate::popup::PopupContent;
use crate::routing::{ClickRoute, route_click};

/// Turns pointer events into hover state, cursor changes and click routes.
///
/// Every query is restricted to interactive layers that currently exist in
/// the engine, so hover and click agree on what is interactive.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    hover: HoverTracker,
    cursor: CursorTracker,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover(&self) -> &HoverTracker {
        &self.hover
    }

    fn live_layers<E: MapEngine + ?Sized>(engine: &E) -> Vec<&'static str> {
        INTERACTIVE_LAYERS
            .iter()
            .copied()
            .filter(|l| engine.has_layer(l))
            .collect()
    }

    /// Pointer moved to `point`: per layer, either enter (hit) or leave (miss).
    ///
    /// A failure on one layer does not stop the others from updating; the
    /// first error is reported once every layer has been visited.
    pub fn pointer_move<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        point: ScreenPoint,
    ) -> Result<(), EngineError> {
        let mut first_err = None;
        for layer in Self::live_layers(engine) {
            let top = engine.query_rendered_features(point, &[layer]).into_iter().next();
            let result = match top {
                Some(feature) => {
                    if let Some(c) = self.cursor.enter(layer) {
                        engine.set_cursor(c);
                    }
                    if HOVERABLE_LAYERS.contains(&layer) {
                        self.hover.enter(engine, layer, &feature).map(|_| ())
                    } else {
                        Ok(())
                    }
                }
                None => self.pointer_leave_layer(engine, layer),
            };
            if let Err(e) = result {
                warn!(layer, error = %e, "hover update failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Pointer left one layer.
    pub fn pointer_leave_layer<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        layer: &str,
    ) -> Result<(), EngineError> {
        if let Some(c) = self.cursor.leave(layer) {
            engine.set_cursor(c);
        }
        self.hover.leave(engine, layer)?;
        Ok(())
    }

    /// Pointer left the map canvas; treated as leaving every layer.
    pub fn pointer_out<E: MapEngine + ?Sized>(&mut self, engine: &mut E) -> Result<(), EngineError> {
        if let Some(c) = self.cursor.clear() {
            engine.set_cursor(c);
        }
        self.hover.leave_all(engine)
    }

    /// Hit-tests the interactive layers at `point` and routes the click.
    ///
    /// Feature popups and the siting popup are opened here; selection writes
    /// are left to the caller.
    pub fn click<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        point: ScreenPoint,
        at: LatLng,
    ) -> ClickRoute {
        let layers = Self::live_layers(engine);
        let hits = if layers.is_empty() {
            Vec::new()
        } else {
            engine.query_rendered_features(point, &layers)
        };
        let route = route_click(&hits, at);
        match &route {
            ClickRoute::Feature { feature, popup, .. } => match popup {
                Some(content) => {
                    engine.show_popup(feature.position.unwrap_or(at), &content.to_html());
                }
                None => engine.close_popup(),
            },
            ClickRoute::Background { at } => {
                engine.show_popup(*at, &PopupContent::siting(*at).to_html());
            }
            ClickRoute::Cluster { .. } => engine.close_popup(),
        }
        debug!(hits = hits.len(), ?route, "click routed");
        route
    }
}

#[cfg(test)]
mod tests {
    use engine::{Cursor, HeadlessEngine, RenderedFeature};
    use foundation::{FeatureId, LatLng, ScreenPoint, ViewState};
    use layers::{LayerManager, ToggleState, ZoneColorMode};
    use pretty_assertions::assert_eq;
    use streaming::{SourceConfig, TileSourceManager};

    use super::InteractionController;
    use crate::hover::HOVER_STATE;
    use crate::routing::{ClickRoute, SelectionWrite};

    fn ready_engine() -> HeadlessEngine {
        let mut e = HeadlessEngine::new(ViewState::new(LatLng::new(39.0, -77.0), 11.0));
        TileSourceManager::new(SourceConfig::default())
            .add_sources(&mut e, &[])
            .expect("sources");
        let toggles = ToggleState {
            show_feeders: true,
            ..ToggleState::default()
        };
        LayerManager::new(ZoneColorMode::Classification)
            .expect("layers")
            .add_layers(&mut e, &toggles)
            .expect("add layers");
        e
    }

    fn feeder(id: u64) -> RenderedFeature {
        RenderedFeature::new("feeders", "feeders")
            .with_source_layer("feeders")
            .with_id(FeatureId::Number(id))
    }

    #[test]
    fn moving_across_lines_keeps_one_highlight() {
        let mut e = ready_engine();
        e.place_feature(ScreenPoint::new(10.0, 10.0), 3.0, feeder(1));
        e.place_feature(ScreenPoint::new(50.0, 10.0), 3.0, feeder(2));
        let mut ic = InteractionController::new();

        ic.pointer_move(&mut e, ScreenPoint::new(10.0, 10.0)).expect("move");
        assert_eq!(e.features_with_state(HOVER_STATE).len(), 1);
        assert_eq!(e.cursor(), Cursor::Pointer);

        ic.pointer_move(&mut e, ScreenPoint::new(50.0, 10.0)).expect("move");
        let on = e.features_with_state(HOVER_STATE);
        assert_eq!(on.len(), 1);
        assert_eq!(on[0].id, FeatureId::Number(2));

        ic.pointer_move(&mut e, ScreenPoint::new(200.0, 200.0)).expect("move");
        assert!(e.features_with_state(HOVER_STATE).is_empty());
        assert_eq!(e.cursor(), Cursor::Default);
    }

    #[test]
    fn failing_layer_does_not_block_the_rest() {
        let mut e = ready_engine();
        let at = ScreenPoint::new(10.0, 10.0);
        // Feeder from a source the engine does not know: its hover update fails.
        e.place_feature(
            at,
            3.0,
            RenderedFeature::new("feeders", "gone").with_id(FeatureId::Number(1)),
        );
        e.place_feature(
            at,
            3.0,
            RenderedFeature::new("transmission-lines", "transmission_lines")
                .with_source_layer("transmission_lines")
                .with_id(FeatureId::Number(2)),
        );
        let mut ic = InteractionController::new();

        assert!(ic.pointer_move(&mut e, at).is_err());
        let on = e.features_with_state(HOVER_STATE);
        assert_eq!(on.len(), 1);
        assert_eq!(on[0].id, FeatureId::Number(2));
        assert_eq!(e.cursor(), Cursor::Pointer);
    }

    #[test]
    fn mouse_out_clears_hover() {
        let mut e = ready_engine();
        e.place_feature(ScreenPoint::new(10.0, 10.0), 3.0, feeder(1));
        let mut ic = InteractionController::new();
        ic.pointer_move(&mut e, ScreenPoint::new(10.0, 10.0)).expect("move");
        ic.pointer_out(&mut e).expect("out");
        assert!(e.features_with_state(HOVER_STATE).is_empty());
        assert_eq!(e.cursor(), Cursor::Default);
    }

    #[test]
    fn hidden_layers_do_not_trigger_cursor() {
        let mut e = ready_engine();
        // pnodes are hidden by default
        e.place_feature(
            ScreenPoint::new(10.0, 10.0),
            3.0,
            RenderedFeature::new("pnodes", "pnodes").with_id(FeatureId::Number(4)),
        );
        let mut ic = InteractionController::new();
        ic.pointer_move(&mut e, ScreenPoint::new(10.0, 10.0)).expect("move");
        assert_eq!(e.cursor(), Cursor::Default);
    }

    #[test]
    fn background_click_opens_siting_popup() {
        let mut e = ready_engine();
        let mut ic = InteractionController::new();
        let at = LatLng::new(38.9, -77.1);
        let route = ic.click(&mut e, ScreenPoint::new(5.0, 5.0), at);
        assert_eq!(route, ClickRoute::Background { at });
        let popup = e.popup().expect("popup");
        assert_eq!(popup.at, at);
        assert!(popup.html.contains("Candidate site"));
    }

    #[test]
    fn feeder_click_selects_and_shows_popup() {
        let mut e = ready_engine();
        e.place_feature(
            ScreenPoint::new(10.0, 10.0),
            3.0,
            feeder(12).with_property("feeder_id", "F-12"),
        );
        let mut ic = InteractionController::new();
        let route = ic.click(&mut e, ScreenPoint::new(10.0, 10.0), LatLng::new(38.9, -77.1));
        let ClickRoute::Feature { selection, .. } = route else {
            panic!("expected feature route");
        };
        assert!(matches!(selection, Some(SelectionWrite::Asset(a)) if a.id == "12"));
        assert!(e.popup().expect("popup").html.contains("F-12"));
    }
}
