//! MapLibre GL binding and the exported `GridMap` handle.
//!
//! Everything crosses the boundary as JSON: style values are serialized with
//! `serde_json` and parsed by `JSON.parse`, and feature properties come back
//! through `JSON.stringify`.
//!
//! Only construction can fail on the JS side. Bad input to the store setters
//! is logged and dropped.

use engine::{
    Cursor, EngineError, FeatureRef, LayerSpec, MapEngine, RenderedFeature, SourceSpec, Visibility,
};
use foundation::{FeatureId, LatLng, Millis, ScreenPoint, ViewState};
use js_sys::{Array, Function, JSON, Reflect};
use serde_json::{Value, json};
use style::Expr;
use tracing::{Level, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::MapConfig;
use crate::map_core::{MapCore, MapEvent};
use crate::state::{SharedUiState, UiState};

// ── JS plumbing ──────────────────────────────────────────────

fn js_err(e: JsValue) -> EngineError {
    EngineError::Backend(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    JSON::parse(&value.to_string())
}

fn from_js(value: &JsValue) -> Option<Value> {
    let text = JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let f: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    let argv = Array::new();
    for a in args {
        argv.push(a);
    }
    f.apply(target, &argv)
}

fn present(v: &JsValue) -> bool {
    !(v.is_undefined() || v.is_null())
}

fn log_err(what: &str, result: Result<JsValue, JsValue>) {
    if let Err(e) = result {
        warn!(error = ?e, "maplibre {what} failed");
    }
}

fn now() -> Millis {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(Millis::ZERO, |p| Millis(p.now().max(0.0) as u64))
}

// ── Engine ───────────────────────────────────────────────────

/// [`MapEngine`] over a `maplibregl.Map` instance.
pub struct MapLibreEngine {
    map: JsValue,
    popup: Option<JsValue>,
    removed: bool,
}

impl MapLibreEngine {
    pub fn new(map: JsValue) -> Self {
        Self {
            map,
            popup: None,
            removed: false,
        }
    }

    fn alive(&self) -> Result<(), EngineError> {
        if self.removed {
            Err(EngineError::Removed)
        } else {
            Ok(())
        }
    }

    fn source_handle(&self, id: &str) -> Result<JsValue, EngineError> {
        self.alive()?;
        let src = call(&self.map, "getSource", &[JsValue::from_str(id)]).map_err(js_err)?;
        if present(&src) {
            Ok(src)
        } else {
            Err(EngineError::UnknownSource(id.to_string()))
        }
    }

    fn camera_options(view: ViewState, duration_ms: Option<u64>) -> Value {
        let mut opts = json!({ "center": view.center.to_lng_lat(), "zoom": view.zoom });
        if let (Some(ms), Some(obj)) = (duration_ms, opts.as_object_mut()) {
            obj.insert("duration".into(), json!(ms));
        }
        opts
    }

    fn move_camera(&mut self, method: &str, view: ViewState, duration_ms: Option<u64>) {
        if self.removed {
            return;
        }
        let result = to_js(&Self::camera_options(view, duration_ms))
            .and_then(|opts| call(&self.map, method, &[opts]));
        log_err(method, result);
    }

    fn rendered_feature(raw: &JsValue) -> Option<RenderedFeature> {
        let layer = get(&get(raw, "layer"), "id").as_string()?;
        let source = get(raw, "source").as_string()?;
        let mut f = RenderedFeature::new(layer, source);
        if let Some(sl) = get(raw, "sourceLayer").as_string() {
            f = f.with_source_layer(sl);
        }
        if let Some(id) = from_js(&get(raw, "id")).as_ref().and_then(FeatureId::from_json) {
            f = f.with_id(id);
        }
        if let Some(Value::Object(props)) = from_js(&get(raw, "properties")) {
            f.properties = props;
        }
        let geometry = from_js(&get(raw, "geometry"));
        if let Some(g) = geometry
            && g["type"] == "Point"
            && let (Some(lng), Some(lat)) = (g["coordinates"][0].as_f64(), g["coordinates"][1].as_f64())
        {
            f = f.with_position(LatLng::from_lng_lat([lng, lat]));
        }
        Some(f)
    }
}

impl MapEngine for MapLibreEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        self.alive()?;
        let spec = to_js(&source.to_json()).map_err(js_err)?;
        call(&self.map, "addSource", &[JsValue::from_str(id), spec]).map_err(js_err)?;
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.source_handle(id).is_ok()
    }

    fn set_source_tiles(&mut self, id: &str, tiles: &[String]) -> Result<(), EngineError> {
        let src = self.source_handle(id)?;
        let list: Array = tiles.iter().map(|t| JsValue::from_str(t)).collect();
        call(&src, "setTiles", &[list.into()]).map_err(js_err)?;
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError> {
        let src = self.source_handle(id)?;
        let data = to_js(data).map_err(js_err)?;
        call(&src, "setData", &[data]).map_err(js_err)?;
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec, visibility: Visibility) -> Result<(), EngineError> {
        self.alive()?;
        let spec = to_js(&layer.to_json(visibility)).map_err(js_err)?;
        call(&self.map, "addLayer", &[spec]).map_err(js_err)?;
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed
            && call(&self.map, "getLayer", &[JsValue::from_str(id)]).is_ok_and(|l| present(&l))
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: &Expr,
    ) -> Result<(), EngineError> {
        self.alive()?;
        let value = to_js(&value.to_json()).map_err(js_err)?;
        call(
            &self.map,
            "setLayoutProperty",
            &[JsValue::from_str(layer), JsValue::from_str(name), value],
        )
        .map_err(js_err)?;
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: &Expr,
    ) -> Result<(), EngineError> {
        self.alive()?;
        let value = to_js(&value.to_json()).map_err(js_err)?;
        call(
            &self.map,
            "setPaintProperty",
            &[JsValue::from_str(layer), JsValue::from_str(name), value],
        )
        .map_err(js_err)?;
        Ok(())
    }

    fn set_feature_state(
        &mut self,
        feature: &FeatureRef,
        state: &serde_json::Map<String, Value>,
    ) -> Result<(), EngineError> {
        self.alive()?;
        let mut target = json!({ "source": feature.source, "id": feature.id.to_json() });
        if let (Some(sl), Some(obj)) = (&feature.source_layer, target.as_object_mut()) {
            obj.insert("sourceLayer".into(), json!(sl));
        }
        let target = to_js(&target).map_err(js_err)?;
        let state = to_js(&Value::Object(state.clone())).map_err(js_err)?;
        call(&self.map, "setFeatureState", &[target, state]).map_err(js_err)?;
        Ok(())
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        if self.removed {
            return Vec::new();
        }
        let result = to_js(&json!([point.x, point.y]))
            .and_then(|p| Ok((p, to_js(&json!({ "layers": layers }))?)))
            .and_then(|(p, opts)| call(&self.map, "queryRenderedFeatures", &[p, opts]));
        match result {
            Ok(list) => Array::from(&list)
                .iter()
                .filter_map(|raw| Self::rendered_feature(&raw))
                .collect(),
            Err(e) => {
                warn!(error = ?e, "maplibre queryRenderedFeatures failed");
                Vec::new()
            }
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        if self.removed {
            return;
        }
        let result = call(&self.map, "getCanvas", &[]).and_then(|canvas| {
            let style = get(&canvas, "style");
            Reflect::set(&style, &JsValue::from_str("cursor"), &JsValue::from_str(cursor.as_css()))
                .map(JsValue::from)
        });
        log_err("cursor", result);
    }

    fn camera(&self) -> ViewState {
        let center = call(&self.map, "getCenter", &[]).unwrap_or(JsValue::UNDEFINED);
        let zoom = call(&self.map, "getZoom", &[])
            .ok()
            .and_then(|z| z.as_f64())
            .unwrap_or(0.0);
        let lat = get(&center, "lat").as_f64().unwrap_or(0.0);
        let lng = get(&center, "lng").as_f64().unwrap_or(0.0);
        ViewState::new(LatLng::new(lat, lng), zoom)
    }

    fn fly_to(&mut self, view: ViewState, duration_ms: u64) {
        self.move_camera("flyTo", view, Some(duration_ms));
    }

    fn ease_to(&mut self, view: ViewState, duration_ms: u64) {
        self.move_camera("easeTo", view, Some(duration_ms));
    }

    fn jump_to(&mut self, view: ViewState) {
        self.move_camera("jumpTo", view, None);
    }

    fn show_popup(&mut self, at: LatLng, html: &str) {
        self.close_popup();
        if self.removed {
            return;
        }
        let lib = get(&js_sys::global(), "maplibregl");
        let result = get(&lib, "Popup")
            .dyn_into::<Function>()
            .and_then(|ctor| Reflect::construct(&ctor, &Array::new()))
            .and_then(|popup| {
                let at = to_js(&json!(at.to_lng_lat()))?;
                call(&popup, "setLngLat", &[at])?;
                call(&popup, "setHTML", &[JsValue::from_str(html)])?;
                call(&popup, "addTo", &[self.map.clone()])?;
                Ok(popup)
            });
        match result {
            Ok(popup) => self.popup = Some(popup),
            Err(e) => warn!(error = ?e, "maplibre popup failed"),
        }
    }

    fn close_popup(&mut self) {
        if let Some(popup) = self.popup.take() {
            log_err("popup remove", call(&popup, "remove", &[]));
        }
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.close_popup();
        log_err("remove", call(&self.map, "remove", &[]));
        self.removed = true;
    }
}

// ── Exported handle ──────────────────────────────────────────

/// JS-facing owner of the map core. The host forwards MapLibre events and
/// store changes; the core never hands the map back out.
#[wasm_bindgen]
pub struct GridMap {
    core: MapCore<MapLibreEngine>,
    ui: SharedUiState,
}

#[wasm_bindgen]
impl GridMap {
    /// Wraps an already constructed `maplibregl.Map` (still loading).
    #[wasm_bindgen(constructor)]
    pub fn new(map: JsValue, config_json: Option<String>) -> Result<GridMap, JsValue> {
        console_error_panic_hook::set_once();
        crate::console::init(Level::INFO);
        let config = match config_json {
            Some(raw) => MapConfig::from_json_str(&raw),
            None => Ok(MapConfig::default()),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let ui = UiState::with_camera(config.initial_view).shared();
        let mut core =
            MapCore::new(config, ui.clone()).map_err(|e| JsValue::from_str(&e.to_string()))?;
        core.mount(MapLibreEngine::new(map));
        Ok(GridMap { core, ui })
    }

    pub fn on_load(&mut self) {
        self.core.handle(MapEvent::Load, now());
    }

    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        let point = ScreenPoint::new(x, y);
        self.core.handle(MapEvent::MouseMove { point }, now());
    }

    pub fn on_mouse_leave(&mut self, layer: String) {
        self.core.handle(MapEvent::MouseLeave { layer }, now());
    }

    pub fn on_mouse_out(&mut self) {
        self.core.handle(MapEvent::MouseOut, now());
    }

    pub fn on_click(&mut self, x: f64, y: f64, lng: f64, lat: f64) {
        let event = MapEvent::Click {
            point: ScreenPoint::new(x, y),
            at: LatLng::new(lat, lng),
        };
        self.core.handle(event, now());
    }

    pub fn on_move_end(&mut self) {
        self.core.handle(MapEvent::MoveEnd, now());
    }

    /// Fires due timers; call again at `next_deadline_ms`.
    pub fn tick(&mut self) {
        self.core.sync(now());
    }

    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.core.next_deadline().map(|m| m.0 as f64)
    }

    pub fn set_selected_isos(&mut self, codes: Vec<String>) {
        let applied = self.ui.borrow_mut().set_selected_isos_from_host(&codes);
        self.sync_if(applied);
    }

    pub fn set_toggle(&mut self, name: &str, visible: bool) {
        let applied = self.ui.borrow_mut().set_toggle_from_host(name, visible);
        self.sync_if(applied);
    }

    pub fn set_zone_color_mode(&mut self, mode: &str) {
        let applied = self.ui.borrow_mut().set_zone_color_mode_from_host(mode);
        self.sync_if(applied);
    }

    pub fn set_camera(&mut self, lng: f64, lat: f64, zoom: f64) {
        self.ui.borrow_mut().camera = ViewState::new(LatLng::new(lat, lng), zoom);
        self.core.sync(now());
    }

    /// Replaces the hosting-capacity records (a JSON array). Unparseable
    /// input leaves the current records in place.
    pub fn set_hosting_capacity(&mut self, records_json: &str) {
        let applied = self.ui.borrow_mut().set_hosting_capacity_from_host(records_json);
        self.sync_if(applied);
    }

    /// Shared UI state as JSON, for stores mirroring the core's writes.
    pub fn ui_state(&self) -> Result<String, JsValue> {
        serde_json::to_string(&*self.ui.borrow()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn destroy(&mut self) {
        self.core.teardown();
    }

    fn sync_if(&mut self, applied: bool) {
        if applied {
            self.core.sync(now());
        }
    }
}
