pub mod geo;
pub mod ids;
pub mod regions;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use ids::*;
pub use regions::*;
pub use time::*;
