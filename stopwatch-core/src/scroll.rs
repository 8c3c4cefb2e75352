/// Scroll offset past which the nav bar switches to its scrolled look.
pub const SCROLL_THRESHOLD: f64 = 10.0;

/// Tracks whether the navigation bar should show its scrolled state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollToggle {
    scrolled: Option<bool>,
}

impl ScrollToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current vertical scroll offset. Returns the new state when
    /// it differs from the last one reported; the first call always reports.
    pub fn update(&mut self, scroll_y: f64) -> Option<bool> {
        let scrolled = scroll_y > SCROLL_THRESHOLD;
        if self.scrolled == Some(scrolled) {
            return None;
        }
        self.scrolled = Some(scrolled);
        Some(scrolled)
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled.unwrap_or(false)
    }
}
