//! Tile and GeoJSON sources: URL construction, registration, and refresh.

pub mod geojson;
pub mod sources;
pub mod tiles;

pub use geojson::*;
pub use sources::*;
pub use tiles::*;
