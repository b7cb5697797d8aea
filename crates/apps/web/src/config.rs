use foundation::{LatLng, RegionTable, ViewState};
use layers::ZoneColorMode;
use serde::{Deserialize, Serialize};
use streaming::SourceConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid map config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("guard timeout ({guard_ms} ms) must be longer than the fly-to duration ({fly_ms} ms)")]
    GuardTooShort { guard_ms: u64, fly_ms: u64 },
    #[error("{field} must be a finite zoom in 0..=24 (got {value})")]
    InvalidZoom { field: &'static str, value: f64 },
    #[error("initial view center is not a valid coordinate")]
    InvalidCenter,
}

/// Map core configuration. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    // ── Sources ──────────────────────────────────────────────
    /// Tile endpoint, source zoom range and hosting-capacity clustering.
    pub sources: SourceConfig,

    // ── Camera ───────────────────────────────────────────────
    /// Camera before the first user or selection move.
    pub initial_view: ViewState,
    /// Duration of the fly-to triggered by a newly selected ISO.
    pub fly_duration_ms: u64,
    /// How long engine move-ends are ignored after a programmatic move.
    /// Must outlast `fly_duration_ms` so an interrupted flight stays guarded.
    pub guard_timeout_ms: u64,
    /// Quiet window before a user pan is written back to shared state.
    pub camera_debounce_ms: u64,
    /// Zoom levels gained when a cluster marker is clicked.
    pub cluster_zoom_step: f64,
    /// Duration of the ease toward a clicked cluster.
    pub cluster_ease_ms: u64,
    /// Upper bound for cluster expansion zoom.
    pub max_zoom: f64,
    /// Fly-to target per ISO.
    pub regions: RegionTable,

    // ── Styling ──────────────────────────────────────────────
    /// Zone color mode used when shared state does not say otherwise.
    pub zone_color_mode: ZoneColorMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),

            initial_view: ViewState::new(LatLng::new(39.8, -98.6), 4.0),
            fly_duration_ms: 1200,
            guard_timeout_ms: 1500,
            camera_debounce_ms: 150,
            cluster_zoom_step: 2.0,
            cluster_ease_ms: 500,
            max_zoom: 18.0,
            regions: RegionTable::default(),

            zone_color_mode: ZoneColorMode::Classification,
        }
    }
}

impl MapConfig {
    /// Parses a (possibly partial) JSON config and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: MapConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guard_timeout_ms <= self.fly_duration_ms {
            return Err(ConfigError::GuardTooShort {
                guard_ms: self.guard_timeout_ms,
                fly_ms: self.fly_duration_ms,
            });
        }
        if !self.initial_view.center.is_valid() {
            return Err(ConfigError::InvalidCenter);
        }
        for (field, value) in [
            ("initial_view.zoom", self.initial_view.zoom),
            ("max_zoom", self.max_zoom),
        ] {
            if !(value.is_finite() && (0.0..=24.0).contains(&value)) {
                return Err(ConfigError::InvalidZoom { field, value });
            }
        }
        Ok(())
    }
}
