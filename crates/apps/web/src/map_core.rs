//! The map core: sole owner of the engine for its mounted lifetime.
//!
//! Lifecycle: `Uninitialized → Initializing → Ready → TornDown`.
//! - `mount` hands the core an engine that is still loading.
//! - The engine's load event registers sources and layers and moves to
//!   `Ready`.
//! - `teardown` removes the engine, tolerating a core that never got ready.
//!
//! Outside `Ready`, events and shared-state changes are no-ops. State that
//! changed before load is picked up when load reads the current shared state.
//!
//! Nothing here returns an error to the host: engine failures are logged and
//! absorbed.

use std::fmt::Display;

use engine::MapEngine;
use foundation::{IsoCode, LatLng, Millis, ScreenPoint, ViewState};
use interaction::{ClickRoute, InteractionController};
use layers::{LayerManager, ToggleState, ZoneColorMode};
use runtime::Watch;
use streaming::TileSourceManager;
use style::StyleError;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, MapConfig};
use crate::state::SharedUiState;
use crate::view::ViewController;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("layer catalog: {0}")]
    Style(#[from] StyleError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CoreState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    TornDown,
}

/// Engine events forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Load,
    MouseMove { point: ScreenPoint },
    /// Pointer left one interactive layer.
    MouseLeave { layer: String },
    /// Pointer left the map canvas.
    MouseOut,
    Click { point: ScreenPoint, at: LatLng },
    MoveEnd,
}

/// What a click did, for the host's benefit.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Selected,
    PopupOnly,
    ClusterExpanded(ViewState),
    Background(LatLng),
}

fn absorb<T, E: Display>(what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "{what} failed");
            None
        }
    }
}

pub struct MapCore<E: MapEngine> {
    state: CoreState,
    engine: Option<E>,
    ui: SharedUiState,
    sources: TileSourceManager,
    layers: LayerManager,
    interaction: InteractionController,
    view: ViewController,
    isos: Watch<Vec<IsoCode>>,
    toggles: Watch<ToggleState>,
    color_mode: Watch<ZoneColorMode>,
    camera: Watch<ViewState>,
    hosting_capacity: Watch<u64>,
}

impl<E: MapEngine> MapCore<E> {
    pub fn new(config: MapConfig, ui: SharedUiState) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            state: CoreState::Uninitialized,
            engine: None,
            ui,
            sources: TileSourceManager::new(config.sources.clone()),
            layers: LayerManager::new(config.zone_color_mode)?,
            interaction: InteractionController::new(),
            view: ViewController::new(&config),
            isos: Watch::new(),
            toggles: Watch::new(),
            color_mode: Watch::new(),
            camera: Watch::new(),
            hosting_capacity: Watch::new(),
        })
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == CoreState::Ready
    }

    pub fn ui(&self) -> &SharedUiState {
        &self.ui
    }

    /// Read-only view of the engine, for inspection.
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Takes ownership of a freshly constructed engine.
    ///
    /// Returns false (and drops `engine`) unless the core is uninitialized.
    pub fn mount(&mut self, engine: E) -> bool {
        if self.state != CoreState::Uninitialized {
            warn!(state = ?self.state, "mount ignored");
            return false;
        }
        self.engine = Some(engine);
        self.state = CoreState::Initializing;
        info!("map engine mounted");
        true
    }

    /// Dispatches one engine event, then reconciles shared state.
    pub fn handle(&mut self, event: MapEvent, now: Millis) -> Option<ClickOutcome> {
        let mut outcome = None;
        match event {
            MapEvent::Load => self.on_load(),
            _ if !self.is_ready() => {
                debug!(state = ?self.state, "event before ready ignored");
                return None;
            }
            MapEvent::MouseMove { point } => {
                if let Some(engine) = self.engine.as_mut() {
                    absorb("hover update", self.interaction.pointer_move(engine, point));
                }
            }
            MapEvent::MouseLeave { layer } => {
                if let Some(engine) = self.engine.as_mut() {
                    absorb("hover clear", self.interaction.pointer_leave_layer(engine, &layer));
                }
            }
            MapEvent::MouseOut => {
                if let Some(engine) = self.engine.as_mut() {
                    absorb("hover clear", self.interaction.pointer_out(engine));
                }
            }
            MapEvent::Click { point, at } => outcome = Some(self.on_click(point, at, now)),
            MapEvent::MoveEnd => {
                if let Some(engine) = self.engine.as_ref() {
                    self.view.on_move_end(engine.camera(), now);
                }
            }
        }
        self.sync(now);
        outcome
    }

    fn on_load(&mut self) {
        if self.state != CoreState::Initializing {
            warn!(state = ?self.state, "load event ignored");
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let ui = self.ui.borrow();

        if absorb("source registration", self.sources.add_sources(engine, &ui.selected_isos))
            .is_none()
        {
            return;
        }
        if absorb("layer registration", self.layers.add_layers(engine, &ui.toggles)).is_none() {
            return;
        }
        if ui.zone_color_mode != self.layers.color_mode() {
            absorb(
                "zone color mode",
                self.layers.set_zone_color_mode(engine, ui.zone_color_mode),
            );
        }
        absorb(
            "hosting capacity push",
            self.sources.push_hosting_capacity(engine, ui.hosting_capacity()),
        );
        if !engine.camera().approx_eq(&ui.camera) {
            engine.jump_to(ui.camera);
        }

        self.isos.prime(ui.selected_isos.clone());
        self.toggles.prime(ui.toggles);
        self.color_mode.prime(ui.zone_color_mode);
        self.camera.prime(ui.camera);
        self.hosting_capacity.prime(ui.hosting_capacity_revision());
        drop(ui);

        self.state = CoreState::Ready;
        info!("map core ready");
    }

    fn on_click(&mut self, point: ScreenPoint, at: LatLng, now: Millis) -> ClickOutcome {
        let Some(engine) = self.engine.as_mut() else {
            return ClickOutcome::Ignored;
        };
        match self.interaction.click(engine, point, at) {
            ClickRoute::Feature {
                selection: Some(write),
                ..
            } => {
                self.ui.borrow_mut().apply_selection(write);
                ClickOutcome::Selected
            }
            ClickRoute::Feature { selection: None, .. } => ClickOutcome::PopupOnly,
            ClickRoute::Cluster { center, .. } => {
                ClickOutcome::ClusterExpanded(self.view.expand_cluster(engine, center, now))
            }
            ClickRoute::Background { at } => {
                self.ui.borrow_mut().clicked_point = Some(at);
                ClickOutcome::Background(at)
            }
        }
    }

    /// Reconciles the engine with shared state and fires due timers.
    ///
    /// Hosts call this after shared-state writes and when
    /// [`Self::next_deadline`] passes; `handle` calls it after every event.
    pub fn sync(&mut self, now: Millis) {
        if !self.is_ready() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        if let Some(camera) = self.view.poll(engine, now) {
            self.ui.borrow_mut().camera = camera;
            // Our own write; not a change to mirror back into the engine.
            self.camera.prime(camera);
            debug!(?camera, "camera written to shared state");
        }

        let ui = self.ui.borrow();

        // Retried on every pass until the engine accepts it; a no-op once the
        // sources match.
        absorb(
            "source refresh",
            self.sources.refresh_source_urls(engine, &ui.selected_isos),
        );
        if let Some(prev) = self.isos.observe(&ui.selected_isos) {
            self.view.on_isos_changed(engine, &prev, &ui.selected_isos, now);
        }

        if let Some(prev) = self.toggles.observe(&ui.toggles) {
            for toggle in prev.changed(&ui.toggles) {
                absorb(
                    "visibility toggle",
                    self.layers.apply_toggle(engine, toggle, ui.toggles.get(toggle)),
                );
            }
        }

        if self.color_mode.observe(&ui.zone_color_mode).is_some() {
            absorb(
                "zone color mode",
                self.layers.set_zone_color_mode(engine, ui.zone_color_mode),
            );
        }

        if self
            .hosting_capacity
            .observe(&ui.hosting_capacity_revision())
            .is_some()
        {
            absorb(
                "hosting capacity push",
                self.sources.push_hosting_capacity(engine, ui.hosting_capacity()),
            );
        }

        if self.camera.observe(&ui.camera).is_some() {
            self.view.on_ui_camera_changed(engine, ui.camera);
        }
    }

    /// Earliest time the host should call [`Self::sync`] again.
    pub fn next_deadline(&self) -> Option<Millis> {
        if self.is_ready() {
            self.view.next_deadline()
        } else {
            None
        }
    }

    /// Removes the engine. Safe in every state, including after a failed load.
    pub fn teardown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.close_popup();
            engine.remove();
            info!("map engine removed");
        }
        self.state = CoreState::TornDown;
    }
}

impl<E: MapEngine> Drop for MapCore<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
