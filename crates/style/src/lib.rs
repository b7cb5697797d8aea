//! Data-driven style expressions for the grid map.
//!
//! Everything here is pure: expressions are plain values that serialize to the
//! map engine's JSON expression syntax and can be evaluated per feature for
//! testing. Nothing in this crate talks to an engine.

pub mod color;
pub mod eval;
pub mod expr;
pub mod symbology;

pub use color::*;
pub use eval::*;
pub use expr::*;
pub use symbology::*;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    #[error("invalid color literal {0:?}")]
    InvalidColor(String),
    #[error("breakpoints for {field:?} must be non-empty and strictly ascending")]
    UnsortedBreakpoints { field: String },
    #[error("radius bounds must satisfy 0 <= min <= mid <= max (got {min}, {mid}, {max})")]
    InvalidRadii { min: f64, mid: f64, max: f64 },
}
