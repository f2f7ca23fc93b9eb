use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Duration;

/// Progress bar shown while the transport waits for the rate limit to reset.
#[derive(Clone)]
pub struct CooldownDisplay {
    bar: ProgressBar,
}

impl fmt::Debug for CooldownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooldownDisplay")
            .field("hidden", &self.bar.is_hidden())
            .finish()
    }
}

impl CooldownDisplay {
    /// Creates a visible display on stderr when `enabled`, a hidden one otherwise.
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::hidden();
        }

        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.red/yellow} {pos:>7}/{len:7} {wide_msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn start(&self, wait: Duration) {
        self.bar.reset();
        self.bar.set_position(0);
        self.bar
            .set_message(format!("Rate limit cooldown: {}s remaining", wait.as_secs()));
    }

    pub fn update(&self, elapsed: Duration, total: Duration) {
        let remaining = total.saturating_sub(elapsed);
        let percentage = if total.is_zero() {
            100
        } else {
            ((elapsed.as_millis() * 100) / total.as_millis()).min(100) as u64
        };

        self.bar.set_position(percentage);
        self.bar.set_message(format!(
            "Rate limit cooldown: {}s remaining",
            remaining.as_secs()
        ));
    }

    pub fn finish(&self) {
        self.bar.set_position(100);
        self.bar.set_message("Rate limit status: Ready");
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}
