//! Scene runner: builds the showcase once, then drives it frame by frame.
//!
//! # Invariants
//! - Assembly happens exactly once, before the first frame.
//! - The load gate opens once, on a successful environment load, and never
//!   closes again.
//! - While the gate is closed a frame does nothing: no rotation, no orbit
//!   update, no render.

pub mod config;
mod gate;
mod overlay;
mod stage;

pub use config::{ConfigError, StageConfig};
pub use gate::{FramePhase, LoadGate};
pub use overlay::LoadingOverlay;
pub use stage::{CARD_YAW_STEP, Stage};

pub fn crate_info() -> &'static str {
    "vitrine-stage v0.1.0"
}
