/// Operator switch that suppresses automatic door actions.
///
/// Only scheduled actions are gated; front-panel buttons always reach the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverrideGate {
    suppressed: bool,
}

impl OverrideGate {
    pub fn new(suppressed: bool) -> Self {
        Self { suppressed }
    }

    /// Flip suppression and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.suppressed = !self.suppressed;
        self.suppressed
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_and_reports() {
        let mut gate = OverrideGate::new(false);
        assert!(gate.toggle());
        assert!(gate.is_suppressed());
        assert!(!gate.toggle());
        assert!(!gate.is_suppressed());
    }

    #[test]
    fn test_reading_does_not_mutate() {
        let gate = OverrideGate::new(true);
        assert!(gate.is_suppressed());
        assert!(gate.is_suppressed());
        assert_eq!(gate, OverrideGate::new(true));
    }
}
