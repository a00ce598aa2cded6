use crate::action::OrbitAction;
use glam::Vec2;

/// Pointer buttons the orbit mapping cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Tracks button state and cursor position and turns motion into actions.
///
/// Primary drag rotates, secondary drag pans, middle drag dollies.
/// When several buttons are held the first one pressed wins.
#[derive(Debug, Default)]
pub struct PointerTracker {
    active: Option<PointerButton>,
    last_position: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_button(&self) -> Option<PointerButton> {
        self.active
    }

    pub fn press(&mut self, button: PointerButton) {
        if self.active.is_none() {
            self.active = Some(button);
            tracing::debug!(?button, "orbit drag started");
        }
    }

    pub fn release(&mut self, button: PointerButton) {
        if self.active == Some(button) {
            self.active = None;
        }
    }

    /// Record a cursor position; returns the action for the drag, if any.
    pub fn moved(&mut self, position: Vec2) -> Option<OrbitAction> {
        let previous = self.last_position.replace(position);
        let delta = position - previous?;
        let action = match self.active? {
            PointerButton::Primary => OrbitAction::Rotate(delta),
            PointerButton::Secondary => OrbitAction::Pan(delta),
            // Dragging down pulls the camera back, matching the wheel.
            PointerButton::Middle => OrbitAction::Dolly(-delta.y / DOLLY_DRAG_PIXELS),
        };
        (!action.is_noop()).then_some(action)
    }

    /// Cursor left the window; the next motion starts a fresh delta.
    pub fn left(&mut self) {
        self.last_position = None;
    }

    /// Wheel scrolled by `lines` (positive = away from the user).
    pub fn scrolled(&self, lines: f32) -> Option<OrbitAction> {
        let action = OrbitAction::Dolly(lines);
        (!action.is_noop()).then_some(action)
    }
}

/// Vertical drag distance that counts as one wheel step.
const DOLLY_DRAG_PIXELS: f32 = 20.0;
