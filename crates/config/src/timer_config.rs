//! Reading timer configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_TICK_MS: u64 = 100;
const MAX_TICK_MS: u64 = 60_000;

/// Reading timer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    /// Interval between live display refreshes while a timer runs
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    /// Tick interval, held within the accepted range
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl ConfigSection for TimerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::in_range(
            self.tick_interval_ms,
            MIN_TICK_MS,
            MAX_TICK_MS,
            "timer.tick_interval_ms",
        )])
    }

    fn merge(&mut self, other: Self) {
        self.tick_interval_ms = other.tick_interval_ms;
    }

    fn restore_default(&mut self, field: &str) {
        if field == "timer.tick_interval_ms" {
            self.tick_interval_ms = Self::default().tick_interval_ms;
        }
    }

    fn section_name(&self) -> &'static str {
        "timer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_second() {
        let config = TimerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_tick_interval() {
        let mut config = TimerConfig::default();
        config.tick_interval_ms = 10;
        assert!(config.validate().is_err());

        config.tick_interval_ms = 120_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_never_leaves_range() {
        let mut config = TimerConfig::default();
        config.tick_interval_ms = 0;
        assert_eq!(config.tick_interval(), Duration::from_millis(100));

        config.tick_interval_ms = u64::MAX;
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_replace_invalid_restores_default() {
        let mut config = TimerConfig { tick_interval_ms: 0 };
        let replaced = config.replace_invalid();

        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].field, "timer.tick_interval_ms");
        assert_eq!(config, TimerConfig::default());
    }
}
