//! Grid map core for the browser dashboard.
//!
//! [`MapCore`] composes the tile source manager, layer manager, interaction
//! controller and [`ViewController`] around one exclusively owned engine, and
//! keeps it consistent with the shared UI state. Browser builds export a
//! `GridMap` wrapper driving MapLibre GL.

pub mod config;
pub mod map_core;
pub mod state;
pub mod view;

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod maplibre;

pub use config::{ConfigError, MapConfig};
pub use map_core::{ClickOutcome, CoreError, CoreState, MapCore, MapEvent};
pub use state::{SharedUiState, UiState};
pub use view::{ViewController, newly_added};

#[cfg(target_arch = "wasm32")]
pub use maplibre::{GridMap, MapLibreEngine};
