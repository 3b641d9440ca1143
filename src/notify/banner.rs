/// Lifecycle of the in-page alert banner. Hiding happens in two steps so
/// the display layer gets a fade-out grace period before removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Hidden,
    Visible,
    Fading,
}

/// Banner state machine. Every `show` bumps the generation; timers carry
/// the generation they were scheduled for, so an auto-hide or fade-end
/// firing for an older message never touches a newer one.
#[derive(Debug)]
pub struct Banner {
    phase: BannerPhase,
    message: String,
    generation: u64,
}

impl Banner {
    pub fn new() -> Self {
        Self {
            phase: BannerPhase::Hidden,
            message: String::new(),
            generation: 0,
        }
    }

    pub fn phase(&self) -> BannerPhase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Generation of the currently shown message. Only meaningful for a
    /// manual close targeting whatever is on screen right now.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show a message, replacing whatever is on screen. Returns the
    /// generation the auto-hide timer should be scheduled against.
    pub fn show(&mut self, message: impl Into<String>) -> u64 {
        self.generation += 1;
        self.phase = BannerPhase::Visible;
        self.message = message.into();
        self.generation
    }

    /// Begin hiding (auto-hide or manual close). Returns the generation
    /// for the fade-end timer when the transition actually happened.
    pub fn begin_close(&mut self, generation: u64) -> Option<u64> {
        if self.generation == generation && self.phase == BannerPhase::Visible {
            self.phase = BannerPhase::Fading;
            Some(self.generation)
        } else {
            None
        }
    }

    /// Finish the fade. True when the banner actually became hidden.
    pub fn finish_close(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.phase == BannerPhase::Fading {
            self.phase = BannerPhase::Hidden;
            self.message.clear();
            true
        } else {
            false
        }
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::new()
    }
}
