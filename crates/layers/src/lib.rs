pub mod catalog;
pub mod manager;
pub mod toggles;

pub use catalog::*;
pub use manager::*;
pub use toggles::*;
