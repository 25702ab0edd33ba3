/// Optimistically displayed privacy-mode state.
///
/// The UI flips the displayed value immediately when the user clicks; the
/// cloud round trip happens in the background and only ever forces the
/// value back on failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct OptimisticToggle {
    displayed: bool,
}

impl OptimisticToggle {
    pub fn new(displayed: bool) -> Self {
        Self { displayed }
    }

    pub fn displayed(&self) -> bool {
        self.displayed
    }

    /// Flips the displayed state and returns the value that is now shown,
    /// which is also the value to request from the device.
    pub fn flip(&mut self) -> bool {
        self.displayed = !self.displayed;
        self.displayed
    }

    /// Rollback path: forces the displayed state, bypassing the flip.
    pub fn force(&mut self, displayed: bool) {
        self.displayed = displayed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_returns_the_new_state() {
        let mut toggle = OptimisticToggle::new(false);
        assert!(toggle.flip());
        assert!(toggle.displayed());
        assert!(!toggle.flip());
    }

    #[test]
    fn force_overrides_displayed_state() {
        let mut toggle = OptimisticToggle::new(false);
        toggle.flip();
        toggle.force(false);
        assert!(!toggle.displayed());
    }
}
