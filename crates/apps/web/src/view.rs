//! Camera ownership and the engine ↔ shared-state camera binding.
//!
//! Three paths move the camera:
//! - user gestures, reported as move-end and written back to shared state
//!   after a debounce;
//! - programmatic moves (region fly-to, cluster expansion), which raise a
//!   [`SyncGuard`] so their intermediate move-ends are never written back;
//! - shared-state writes from other components, mirrored with `jump_to`.
//!   A write that lands while a programmatic move is guarded is held and
//!   applied once the guard is released.
//!
//! The guard is lowered by a timer rather than an animation-end callback,
//! because an interrupted animation never reports completion.

use engine::MapEngine;
use foundation::{IsoCode, LatLng, Millis, RegionTable, ViewState};
use runtime::{Debouncer, GuardToken, SyncGuard, TimerQueue};
use tracing::debug;

use crate::config::MapConfig;

#[derive(Debug, Clone)]
pub struct ViewController {
    guard: SyncGuard,
    releases: TimerQueue<GuardToken>,
    pending_write: Debouncer<ViewState>,
    deferred_jump: Option<ViewState>,
    regions: RegionTable,
    fly_duration_ms: u64,
    guard_timeout_ms: u64,
    cluster_zoom_step: f64,
    cluster_ease_ms: u64,
    max_zoom: f64,
}

/// The most recently added code in `next`, if any code is new.
pub fn newly_added<'a>(prev: &[IsoCode], next: &'a [IsoCode]) -> Option<&'a IsoCode> {
    next.iter().rev().find(|code| !prev.contains(code))
}

impl ViewController {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            guard: SyncGuard::new(),
            releases: TimerQueue::new(),
            pending_write: Debouncer::new(config.camera_debounce_ms),
            deferred_jump: None,
            regions: config.regions.clone(),
            fly_duration_ms: config.fly_duration_ms,
            guard_timeout_ms: config.guard_timeout_ms,
            cluster_zoom_step: config.cluster_zoom_step,
            cluster_ease_ms: config.cluster_ease_ms,
            max_zoom: config.max_zoom,
        }
    }

    /// Engine finished moving. Ignored while a programmatic move is guarded.
    pub fn on_move_end(&mut self, camera: ViewState, now: Millis) {
        if self.guard.is_active() {
            debug!(?camera, "move-end during guarded move ignored");
            return;
        }
        self.pending_write.push(now, camera);
    }

    /// Fires due guard releases and returns a camera ready to be written to
    /// shared state, if its debounce window has elapsed.
    ///
    /// Once the guard is down, a shared-state camera held back during the
    /// programmatic move is applied to the engine.
    pub fn poll<E: MapEngine + ?Sized>(&mut self, engine: &mut E, now: Millis) -> Option<ViewState> {
        for token in self.releases.take_due(now) {
            if self.guard.release(token) {
                debug!(generation = self.guard.generation(), "camera guard released");
            }
        }
        if !self.guard.is_active()
            && let Some(view) = self.deferred_jump.take()
        {
            debug!(?view, "applying camera held during guarded move");
            self.on_ui_camera_changed(engine, view);
        }
        self.pending_write.poll(now)
    }

    /// Earliest time `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.releases.next_due(), self.pending_write.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn begin_programmatic(&mut self, now: Millis) {
        let token = self.guard.begin();
        self.releases.schedule(now.after(self.guard_timeout_ms), token);
        // A user pan still waiting in the debounce window is superseded.
        self.pending_write.cancel();
    }

    /// Flies to the region of the most recently added ISO.
    ///
    /// Returns the target, or `None` when nothing was added or the code has
    /// no predefined region.
    pub fn on_isos_changed<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        prev: &[IsoCode],
        next: &[IsoCode],
        now: Millis,
    ) -> Option<ViewState> {
        let code = newly_added(prev, next)?;
        let Some(region) = self.regions.get(code) else {
            debug!(iso = %code, "no region view for ISO");
            return None;
        };
        let target = region.view_state();
        self.fly_to(engine, target, now);
        Some(target)
    }

    pub fn fly_to<E: MapEngine + ?Sized>(&mut self, engine: &mut E, target: ViewState, now: Millis) {
        self.begin_programmatic(now);
        engine.fly_to(target, self.fly_duration_ms);
        debug!(?target, duration_ms = self.fly_duration_ms, "fly-to started");
    }

    /// Eases toward a clicked cluster, a few zoom levels closer.
    pub fn expand_cluster<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        center: LatLng,
        now: Millis,
    ) -> ViewState {
        let zoom = (engine.camera().zoom + self.cluster_zoom_step).min(self.max_zoom);
        let target = ViewState::new(center, zoom);
        self.begin_programmatic(now);
        engine.ease_to(target, self.cluster_ease_ms);
        target
    }

    /// Mirrors a camera written to shared state by another component.
    ///
    /// While a programmatic move is in flight the latest such camera is held
    /// for [`Self::poll`] to apply after the guard drops. Returns whether the
    /// engine was moved now.
    pub fn on_ui_camera_changed<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        view: ViewState,
    ) -> bool {
        if self.guard.is_active() {
            debug!(?view, "shared camera changed during guarded move; held");
            self.deferred_jump = Some(view);
            return false;
        }
        if engine.camera().approx_eq(&view) {
            return false;
        }
        self.pending_write.cancel();
        engine.jump_to(view);
        true
    }
}
