//! Scene graph: the objects the viewer draws and the environment they sit in.
//!
//! # Invariants
//! - Objects are added once during assembly and never removed.
//! - The card's yaw is the only state that changes after assembly, apart
//!   from the environment slot being filled once.
//! - Iteration order is insertion order on every platform.

pub mod assembly;
pub mod materials;
pub mod objects;
pub mod scene;

pub use assembly::{AssembledScene, assemble};
pub use materials::{PhongMaterial, Side, StandardMaterial, TextureHandle};
pub use objects::{
    AmbientLight, Card, DirectionalLight, Ground, GridHelper, ObjectKind, PlaneGeometry,
    Reflector, SceneObject,
};
pub use scene::{Background, Scene};
