//! Camera input: raw pointer state mapped to orbit actions.
//!
//! # Invariants
//! - Orbiting is the only interaction; nothing here touches the scene.
//! - Deltas are in logical pixels so behaviour is independent of DPI.

pub mod action;
pub mod pointer;

pub use action::OrbitAction;
pub use pointer::{PointerButton, PointerTracker};
