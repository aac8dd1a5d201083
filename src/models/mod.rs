//! Data models

pub mod health;
pub mod predict;
pub mod upload;
pub mod stats;

pub use health::*;
pub use predict::*;
pub use upload::*;
pub use stats::*;
