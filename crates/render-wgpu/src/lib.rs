//! wgpu render backend for the viewer.
//!
//! Draws the environment background, the mirrored ground, the grid and the
//! card. The mirror is an offscreen pass from a camera reflected through the
//! reflector plane, sampled in screen space by the main pass.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - GPU resources are created lazily, once per scene object.

mod frame;
mod gpu;
mod meshes;
mod shaders;
mod textures;

pub use frame::SurfaceFrame;
pub use gpu::WgpuRenderer;
