/// What a frame does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Environment still loading: frames are skipped.
    Waiting,
    /// Environment loaded: frames animate and render. Terminal.
    Active,
}

/// One-way latch that opens when the environment finishes loading.
#[derive(Debug, Default)]
pub struct LoadGate {
    loaded: bool,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.loaded
    }

    pub fn phase(&self) -> FramePhase {
        if self.loaded {
            FramePhase::Active
        } else {
            FramePhase::Waiting
        }
    }

    /// Open the gate. Returns true only for the call that opened it.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.loaded, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_waiting() {
        let gate = LoadGate::new();
        assert!(!gate.is_open());
        assert_eq!(gate.phase(), FramePhase::Waiting);
    }

    #[test]
    fn opens_once_and_stays_open() {
        let mut gate = LoadGate::new();
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_open());
        assert_eq!(gate.phase(), FramePhase::Active);
    }
}
