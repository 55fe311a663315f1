use std::fmt;
use std::time::Duration;

/// Remaining session time split for display, e.g. `4m 5s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    /// Whole minutes and seconds in `ms`. Negative input counts as zero.
    pub fn from_millis(ms: i64) -> Self {
        let total = u64::try_from(ms).unwrap_or(0) / 1000;
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn from_duration(remaining: Duration) -> Self {
        let total = remaining.as_secs();
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {}s", self.minutes, self.seconds)
    }
}
