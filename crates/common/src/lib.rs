//! Shared types used across the vitrine crates.
//!
//! Nothing here owns state; these are plain values passed between the scene,
//! the runner and the render backends.

mod color;
mod types;
mod viewport;

pub use color::Color;
pub use types::{ObjectId, Transform};
pub use viewport::Viewport;
