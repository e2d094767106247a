//! Session configuration
//!
//! Timer length and reveal cadence. Defaults mirror the production chat:
//! a 30 second timed conversation, a reveal every 5 messages before a
//! match and every 6 messages after one.

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Default length of the timed (Active) phase in seconds
pub const DEFAULT_ACTIVE_DURATION_SECS: u32 = 30;

/// Default pre-match reveal interval in messages
pub const DEFAULT_PRE_MATCH_INTERVAL: u32 = 5;

/// Default post-match reveal interval in messages since the last reveal
pub const DEFAULT_POST_MATCH_INTERVAL: u32 = 6;

/// Default share of the timer left when the "ending soon" reminder fires
pub const DEFAULT_REMINDER_FRACTION: f64 = 0.15;

/// Configuration for a single chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown length for the Active phase
    pub active_duration_secs: u32,
    /// Pre-match: reveal at every multiple of this message count
    pub pre_match_reveal_interval: u32,
    /// Post-match: reveal after this many messages since the last reveal
    pub post_match_reveal_interval: u32,
    /// Fraction of the duration at which `TimeRunningLow` is emitted (0 disables)
    pub reminder_fraction: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_duration_secs: DEFAULT_ACTIVE_DURATION_SECS,
            pre_match_reveal_interval: DEFAULT_PRE_MATCH_INTERVAL,
            post_match_reveal_interval: DEFAULT_POST_MATCH_INTERVAL,
            reminder_fraction: DEFAULT_REMINDER_FRACTION,
        }
    }
}

impl SessionConfig {
    /// Default configuration with a custom timer length
    pub fn with_duration(active_duration_secs: u32) -> Self {
        Self {
            active_duration_secs,
            ..Self::default()
        }
    }

    /// Parse from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(input: &str) -> SessionResult<Self> {
        let config: Self = toml::from_str(input)
            .map_err(|e| SessionError::config(format!("invalid session TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the state machine cannot run.
    pub fn validate(&self) -> SessionResult<()> {
        if self.active_duration_secs == 0 {
            return Err(SessionError::config("active_duration_secs must be at least 1"));
        }
        if self.pre_match_reveal_interval == 0 {
            return Err(SessionError::config(
                "pre_match_reveal_interval must be at least 1",
            ));
        }
        if self.post_match_reveal_interval == 0 {
            return Err(SessionError::config(
                "post_match_reveal_interval must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.reminder_fraction) {
            return Err(SessionError::config(
                "reminder_fraction must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }

    /// Remaining seconds at or below which the reminder fires.
    ///
    /// Zero means the reminder is disabled.
    pub fn reminder_threshold_secs(&self) -> u32 {
        if self.reminder_fraction <= 0.0 {
            return 0;
        }
        let raw = (f64::from(self.active_duration_secs) * self.reminder_fraction).floor();
        (raw as u32).min(self.active_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.active_duration_secs, 30);
        assert_eq!(config.pre_match_reveal_interval, 5);
        assert_eq!(config.post_match_reveal_interval, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reminder_threshold() {
        // 15% of 30s is 4.5s; the first whole second at or under it is 4
        assert_eq!(SessionConfig::default().reminder_threshold_secs(), 4);
        assert_eq!(SessionConfig::with_duration(10).reminder_threshold_secs(), 1);
        assert_eq!(SessionConfig::with_duration(3).reminder_threshold_secs(), 0);

        let disabled = SessionConfig {
            reminder_fraction: 0.0,
            ..SessionConfig::default()
        };
        assert_eq!(disabled.reminder_threshold_secs(), 0);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = SessionConfig::from_toml_str("active_duration_secs = 90\n").unwrap();
        assert_eq!(config.active_duration_secs, 90);
        assert_eq!(config.pre_match_reveal_interval, 5);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(SessionConfig::with_duration(0).validate().is_err());

        let config = SessionConfig {
            post_match_reveal_interval: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(SessionConfig::from_toml_str("pre_match_reveal_interval = 0").is_err());
        assert!(SessionConfig::from_toml_str("not valid toml =").is_err());
    }
}
