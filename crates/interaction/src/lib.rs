//! Pointer interaction: hover highlighting, cursor affordance, click routing
//! and popup content.

pub mod controller;
pub mod cursor;
pub mod hover;
pub mod popup;
pub mod routing;

pub use controller::*;
pub use cursor::*;
pub use hover::*;
pub use popup::*;
pub use routing::*;
