/// State of the loading overlay shown until the environment arrives.
///
/// The host UI draws it; this type only tracks the progress value, the
/// current opacity and where the opacity is heading.
#[derive(Debug, Clone)]
pub struct LoadingOverlay {
    progress: f32,
    opacity: f32,
    target_opacity: f32,
    fade_seconds: f32,
    error: Option<String>,
}

impl LoadingOverlay {
    pub fn new(fade_seconds: f32) -> Self {
        Self {
            progress: 0.0,
            opacity: 1.0,
            target_opacity: 1.0,
            fade_seconds: fade_seconds.max(0.0),
            error: None,
        }
    }

    /// Progress indicator value in `0.0..=100.0`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn set_progress(&mut self, percent: f32) {
        self.progress = percent.clamp(0.0, 100.0);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn target_opacity(&self) -> f32 {
        self.target_opacity
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start fading out.
    pub fn hide(&mut self) {
        self.target_opacity = 0.0;
    }

    /// Keep the overlay up and show why loading stopped.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Move the opacity toward its target by `dt` seconds of fade.
    pub fn advance(&mut self, dt: f32) {
        if self.fade_seconds <= 0.0 {
            self.opacity = self.target_opacity;
            return;
        }
        let step = dt.max(0.0) / self.fade_seconds;
        if self.opacity > self.target_opacity {
            self.opacity = (self.opacity - step).max(self.target_opacity);
        } else {
            self.opacity = (self.opacity + step).min(self.target_opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_opaque_at_zero() {
        let overlay = LoadingOverlay::new(1.0);
        assert_eq!(overlay.progress(), 0.0);
        assert_eq!(overlay.opacity(), 1.0);
        assert!(overlay.is_visible());
    }

    #[test]
    fn progress_is_clamped() {
        let mut overlay = LoadingOverlay::new(1.0);
        overlay.set_progress(140.0);
        assert_eq!(overlay.progress(), 100.0);
        overlay.set_progress(-3.0);
        assert_eq!(overlay.progress(), 0.0);
    }

    #[test]
    fn fades_out_over_the_fade_time() {
        let mut overlay = LoadingOverlay::new(0.5);
        overlay.hide();
        assert_eq!(overlay.target_opacity(), 0.0);
        overlay.advance(0.25);
        assert!((overlay.opacity() - 0.5).abs() < 1e-6);
        overlay.advance(1.0);
        assert_eq!(overlay.opacity(), 0.0);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn zero_fade_time_is_immediate() {
        let mut overlay = LoadingOverlay::new(0.0);
        overlay.hide();
        overlay.advance(0.0);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn failure_keeps_the_overlay_up() {
        let mut overlay = LoadingOverlay::new(1.0);
        overlay.fail("missing sky");
        overlay.advance(5.0);
        assert_eq!(overlay.error(), Some("missing sky"));
        assert!(overlay.is_visible());
    }
}
