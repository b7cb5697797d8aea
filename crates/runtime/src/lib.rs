//! Cooperative, single-threaded scheduling helpers.
//!
//! Nothing here owns a clock: callers pass the current [`foundation::Millis`]
//! into every call, which keeps timer and debounce behavior replayable.

pub mod debounce;
pub mod guard;
pub mod timers;
pub mod watch;

pub use debounce::*;
pub use guard::*;
pub use timers::*;
pub use watch::*;
