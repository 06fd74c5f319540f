//! Session settings and the fixed names the session works with.

use std::time::Duration;

use smart_default::SmartDefault;

/// Advertised local name of the peripheral to talk to.
pub const TARGET_NAME: &str = "Yudetamago config";

/// The command written to the peripheral.
pub const COMMAND: &str = "set_led 0 0 0 0\n";

/// Text that marks a response as complete.
pub const RESPONSE_MARKER: &str = "result";

/// Session settings.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct Config {
    /// How long to scan before giving up. `None` scans until cancelled.
    #[default(Some(Duration::from_secs(5)))]
    pub scan_duration: Option<Duration>,

    /// The ATT MTU to ask for.
    #[default(512)]
    pub mtu: u16,

    /// How to poll for the response.
    pub poll: PollPolicy,
}

impl Config {
    /// Set the scan duration. Zero means no deadline.
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = (!duration.is_zero()).then_some(duration);
        self
    }
}

/// Bounds on reading the response back.
///
/// The delay before the next read starts at `initial_delay` and doubles after every read that
/// did not carry the marker, up to `max_delay`.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct PollPolicy {
    /// Give up after this many reads. Zero is treated as one: the response is always read.
    #[default(50)]
    pub max_attempts: u32,

    /// Delay after the first incomplete response.
    #[default(Duration::from_millis(100))]
    pub initial_delay: Duration,

    /// Upper bound for the delay between reads.
    #[default(Duration::from_secs(2))]
    pub max_delay: Duration,
}

impl PollPolicy {
    /// The number of reads to attempt, at least one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The delay to wait after `attempt` (1-based) reads came back incomplete.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);

        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}
