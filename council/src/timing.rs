use std::time::Duration;

/// Intervals used by the agent and human-input loops.
///
/// Every interval is derived from a single time unit so tests can run the
/// whole protocol quickly with [`Timing::with_unit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Upper bound between two checks of an idle agent's gate.
    pub idle_poll: Duration,
    /// Delay between two hotkey polls of the voice source.
    pub input_poll: Duration,
    /// Pause after a handled hotkey so a held key is not seen twice.
    pub key_debounce: Duration,
    /// How long each presentation state stays on screen.
    pub present_hold: Duration,
    /// How long a mode switch waits for the previous input loop to exit.
    pub mode_join_timeout: Duration,
    /// Breather after delivering a typed line.
    pub settle: Duration,
}

impl Timing {
    pub fn with_unit(unit: Duration) -> Self {
        Self {
            idle_poll: unit / 10,
            input_poll: unit / 20,
            key_debounce: unit,
            present_hold: unit,
            mode_join_timeout: unit * 2,
            settle: unit / 20,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::with_unit(Duration::from_secs(1))
    }
}
