//! The seam between the map core and the rendering engine.
//!
//! [`MapEngine`] is the exact set of engine calls the core makes. The browser
//! build implements it over MapLibre GL; [`HeadlessEngine`] implements it in
//! memory for tests and tooling.

pub mod error;
pub mod feature;
pub mod headless;
pub mod map_engine;
pub mod spec;

pub use error::*;
pub use feature::*;
pub use headless::*;
pub use map_engine::*;
pub use spec::*;
