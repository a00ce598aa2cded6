use glam::Vec2;

/// A camera action produced from pointer input.
///
/// Orbit controls consume actions, never raw window events, so the desktop
/// shell and headless tools drive the camera through the same path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitAction {
    /// Rotate around the orbit target by a pointer delta (logical pixels).
    Rotate(Vec2),
    /// Pan the orbit target in screen space by a pointer delta (logical pixels).
    Pan(Vec2),
    /// Dolly toward (positive) or away from (negative) the target, in wheel steps.
    Dolly(f32),
}

impl OrbitAction {
    /// True when the action cannot move the camera.
    pub fn is_noop(&self) -> bool {
        match self {
            OrbitAction::Rotate(d) | OrbitAction::Pan(d) => *d == Vec2::ZERO,
            OrbitAction::Dolly(steps) => *steps == 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_deltas_are_noops() {
        assert!(OrbitAction::Rotate(Vec2::ZERO).is_noop());
        assert!(OrbitAction::Pan(Vec2::ZERO).is_noop());
        assert!(OrbitAction::Dolly(0.0).is_noop());
    }

    #[test]
    fn nonzero_deltas_move_the_camera() {
        assert!(!OrbitAction::Rotate(Vec2::new(3.0, 0.0)).is_noop());
        assert!(!OrbitAction::Dolly(-1.0).is_noop());
    }
}
