//! Rendering adapter: renderer-agnostic interface plus the camera rig.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Camera and controls live outside the scene graph and are driven by
//!   the runner, one `update` per rendered frame.

mod camera;
mod controls;
mod renderer;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "vitrine-render v0.1.0"
}
