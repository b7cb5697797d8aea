use std::collections::{BTreeMap, BTreeSet};

use foundation::{LatLng, ScreenPoint, ViewState};
use serde_json::{Map, Value, json};
use style::Expr;
use tracing::debug;

use crate::error::EngineError;
use crate::feature::{Cursor, FeatureRef, Popup, RenderedFeature};
use crate::map_engine::MapEngine;
use crate::spec::{LayerSpec, SourceSpec, Visibility};

/// Camera call recorded by [`HeadlessEngine`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraCommand {
    FlyTo { view: ViewState, duration_ms: u64 },
    EaseTo { view: ViewState, duration_ms: u64 },
    JumpTo { view: ViewState },
}

#[derive(Debug, Clone)]
struct PlacedFeature {
    at: ScreenPoint,
    radius_px: f64,
    feature: RenderedFeature,
}

#[derive(Debug, Clone)]
struct LayerEntry {
    spec: LayerSpec,
    visibility: Visibility,
}

/// In-memory engine with deterministic hit-testing.
///
/// Camera moves complete instantly; layers render in insertion order, so later
/// layers are on top for hit-testing. Tests place features at screen points
/// with [`HeadlessEngine::place_feature`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessEngine {
    sources: BTreeMap<String, SourceSpec>,
    source_updates: BTreeMap<String, u32>,
    failing_tile_updates: BTreeSet<String>,
    layers: Vec<LayerEntry>,
    feature_states: BTreeMap<FeatureRef, Map<String, Value>>,
    placed: Vec<PlacedFeature>,
    cursor: Cursor,
    camera: ViewState,
    camera_log: Vec<CameraCommand>,
    popup: Option<Popup>,
    removed: bool,
}

impl HeadlessEngine {
    pub fn new(camera: ViewState) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    /// Makes `feature` hit-testable within `radius_px` of `at`.
    pub fn place_feature(&mut self, at: ScreenPoint, radius_px: f64, feature: RenderedFeature) {
        self.placed.push(PlacedFeature {
            at,
            radius_px,
            feature,
        });
    }

    /// Makes the next `set_source_tiles` on `source` fail with a backend error.
    pub fn fail_next_tile_update(&mut self, source: &str) {
        self.failing_tile_updates.insert(source.to_string());
    }

    /// Simulates a user gesture that leaves the camera at `view`.
    pub fn user_move(&mut self, view: ViewState) {
        self.camera = view;
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    /// Number of in-place updates (`set_source_tiles`/`set_source_data`) a source received.
    pub fn source_update_count(&self, id: &str) -> u32 {
        self.source_updates.get(id).copied().unwrap_or(0)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.entry(id).map(|e| &e.spec)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|e| e.spec.id.as_str()).collect()
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.entry(id).map(|e| e.visibility)
    }

    pub fn feature_state(&self, feature: &FeatureRef) -> Option<&Map<String, Value>> {
        self.feature_states.get(feature)
    }

    /// Features whose `key` feature-state is `true`.
    pub fn features_with_state(&self, key: &str) -> Vec<&FeatureRef> {
        self.feature_states
            .iter()
            .filter(|(_, s)| s.get(key) == Some(&Value::Bool(true)))
            .map(|(f, _)| f)
            .collect()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn camera_log(&self) -> &[CameraCommand] {
        &self.camera_log
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Full style document: `{ version, sources, layers }`.
    pub fn style_document(&self) -> Value {
        let sources: Map<String, Value> = self
            .sources
            .iter()
            .map(|(id, s)| (id.clone(), s.to_json()))
            .collect();
        let layers: Vec<Value> = self
            .layers
            .iter()
            .map(|e| e.spec.to_json(e.visibility))
            .collect();
        json!({ "version": 8, "sources": sources, "layers": layers })
    }

    fn entry(&self, id: &str) -> Option<&LayerEntry> {
        self.layers.iter().find(|e| e.spec.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut LayerEntry> {
        self.layers.iter_mut().find(|e| e.spec.id == id)
    }

    fn alive(&self) -> Result<(), EngineError> {
        if self.removed {
            Err(EngineError::Removed)
        } else {
            Ok(())
        }
    }

    fn renders_at_current_zoom(&self, spec: &LayerSpec) -> bool {
        let z = self.camera.zoom;
        spec.min_zoom.is_none_or(|min| z >= min)
    }

    fn bump(&mut self, id: &str) {
        *self.source_updates.entry(id.to_string()).or_insert(0) += 1;
    }
}

impl MapEngine for HeadlessEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        self.alive()?;
        if self.sources.contains_key(id) {
            return Err(EngineError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source.clone());
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        !self.removed && self.sources.contains_key(id)
    }

    fn set_source_tiles(&mut self, id: &str, tiles: &[String]) -> Result<(), EngineError> {
        self.alive()?;
        if self.failing_tile_updates.remove(id) {
            return Err(EngineError::Backend(format!("tile update for {id:?} rejected")));
        }
        match self.sources.get_mut(id) {
            Some(SourceSpec::Vector { tiles: current, .. }) => {
                *current = tiles.to_vec();
            }
            Some(SourceSpec::GeoJson { .. }) => {
                return Err(EngineError::Backend(format!("{id:?} has no tiles")));
            }
            None => return Err(EngineError::UnknownSource(id.to_string())),
        }
        self.bump(id);
        debug!(source = id, "headless: tiles replaced");
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError> {
        self.alive()?;
        match self.sources.get_mut(id) {
            Some(SourceSpec::GeoJson { data: current, .. }) => {
                *current = data.clone();
            }
            Some(SourceSpec::Vector { .. }) => return Err(EngineError::NotGeoJson(id.to_string())),
            None => return Err(EngineError::UnknownSource(id.to_string())),
        }
        self.bump(id);
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec, visibility: Visibility) -> Result<(), EngineError> {
        self.alive()?;
        if self.entry(&layer.id).is_some() {
            return Err(EngineError::DuplicateLayer(layer.id.clone()));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(EngineError::UnknownSource(layer.source.clone()));
        }
        self.layers.push(LayerEntry {
            spec: layer.clone(),
            visibility,
        });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed && self.entry(id).is_some()
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: &Expr,
    ) -> Result<(), EngineError> {
        self.alive()?;
        let entry = self
            .entry_mut(layer)
            .ok_or_else(|| EngineError::UnknownLayer(layer.to_string()))?;
        if name == "visibility" {
            entry.visibility = match value {
                Expr::Literal(Value::String(s)) if s == "none" => Visibility::None,
                _ => Visibility::Visible,
            };
        } else {
            entry.spec.layout.insert(name.to_string(), value.clone());
        }
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: &Expr,
    ) -> Result<(), EngineError> {
        self.alive()?;
        let entry = self
            .entry_mut(layer)
            .ok_or_else(|| EngineError::UnknownLayer(layer.to_string()))?;
        entry.spec.paint.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        state: &Map<String, Value>,
    ) -> Result<(), EngineError> {
        self.alive()?;
        if !self.sources.contains_key(&feature.source) {
            return Err(EngineError::UnknownSource(feature.source.clone()));
        }
        // Feature-state merges key by key, like the real engine.
        let slot = self.feature_states.entry(feature.clone()).or_default();
        for (k, v) in state {
            slot.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        if self.removed {
            return Vec::new();
        }
        let mut hits: Vec<(usize, usize, &RenderedFeature)> = Vec::new();
        for (order, placed) in self.placed.iter().enumerate() {
            if !layers.contains(&placed.feature.layer.as_str()) {
                continue;
            }
            let Some(stack) = self
                .layers
                .iter()
                .position(|e| e.spec.id == placed.feature.layer)
            else {
                continue;
            };
            let entry = &self.layers[stack];
            if !entry.visibility.is_visible() || !self.renders_at_current_zoom(&entry.spec) {
                continue;
            }
            let dx = placed.at.x - point.x;
            let dy = placed.at.y - point.y;
            if (dx * dx + dy * dy).sqrt() <= placed.radius_px {
                hits.push((stack, order, &placed.feature));
            }
        }
        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        hits.into_iter().map(|(_, _, f)| f.clone()).collect()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn camera(&self) -> ViewState {
        self.camera
    }

    fn fly_to(&mut self, view: ViewState, duration_ms: u64) {
        if self.removed {
            return;
        }
        self.camera_log.push(CameraCommand::FlyTo { view, duration_ms });
        self.camera = view;
    }

    fn ease_to(&mut self, view: ViewState, duration_ms: u64) {
        if self.removed {
            return;
        }
        self.camera_log.push(CameraCommand::EaseTo { view, duration_ms });
        self.camera = view;
    }

    fn jump_to(&mut self, view: ViewState) {
        if self.removed {
            return;
        }
        self.camera_log.push(CameraCommand::JumpTo { view });
        self.camera = view;
    }

    fn show_popup(&mut self, at: LatLng, html: &str) {
        if self.removed {
            return;
        }
        self.popup = Some(Popup {
            at,
            html: html.to_string(),
        });
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }

    fn remove(&mut self) {
        self.removed = true;
        self.popup = None;
        self.placed.clear();
    }
}
