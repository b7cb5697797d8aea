use foundation::{LatLng, ScreenPoint, ViewState};
use serde_json::{Map, Value};
use style::Expr;

use crate::error::EngineError;
use crate::feature::{Cursor, FeatureRef, RenderedFeature};
use crate::spec::{LayerSpec, SourceSpec, Visibility};

/// Engine operations the map core depends on.
///
/// Implementations are single-threaded and owned exclusively by one map core.
pub trait MapEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError>;
    fn has_source(&self, id: &str) -> bool;
    /// Replaces the tile URL list of a vector source in place.
    fn set_source_tiles(&mut self, id: &str, tiles: &[String]) -> Result<(), EngineError>;
    /// Replaces the data of a GeoJSON source wholesale.
    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError>;

    fn add_layer(&mut self, layer: &LayerSpec, visibility: Visibility) -> Result<(), EngineError>;
    fn has_layer(&self, id: &str) -> bool;
    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Expr)
    -> Result<(), EngineError>;
    fn set_paint_property(&mut self, layer: &str, name: &str, value: &Expr)
    -> Result<(), EngineError>;

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        state: &Map<String, Value>,
    ) -> Result<(), EngineError>;

    /// Features rendered at `point` by any of `layers`, topmost first.
    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature>;

    fn set_cursor(&mut self, cursor: Cursor);

    fn camera(&self) -> ViewState;
    fn fly_to(&mut self, view: ViewState, duration_ms: u64);
    fn ease_to(&mut self, view: ViewState, duration_ms: u64);
    fn jump_to(&mut self, view: ViewState);

    fn show_popup(&mut self, at: LatLng, html: &str);
    fn close_popup(&mut self);

    /// Tears the engine down; every later call fails or no-ops.
    fn remove(&mut self);
}
