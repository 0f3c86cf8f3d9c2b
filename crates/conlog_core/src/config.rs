//! Rotation configuration.

use crate::error::{CoreError, CoreResult};
use std::time::Duration;

/// Free space kept in reserve on the storage medium. Below this the oldest
/// segment is deleted.
pub const DEFAULT_RESERVE_FREE_BYTES: u64 = 128 * 1024;

/// Size above which the open segment is rolled over.
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 32 * 1024;

/// Default period of the renewal timer.
pub const DEFAULT_RENEW_INTERVAL: Duration = Duration::from_secs(600);

/// Longest accepted renewal period (one year).
pub const MAX_RENEW_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Checks that a renewal period is positive and at most
/// [`MAX_RENEW_INTERVAL`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidConfig`] otherwise.
pub fn validate_renew_interval(interval: Duration) -> CoreResult<()> {
    if interval.is_zero() {
        return Err(CoreError::invalid_config("renew interval must be positive"));
    }
    if interval > MAX_RENEW_INTERVAL {
        return Err(CoreError::invalid_config(format!(
            "renew interval {}s exceeds {}s",
            interval.as_secs(),
            MAX_RENEW_INTERVAL.as_secs()
        )));
    }
    Ok(())
}

/// Capacity budget for the rotating log.
///
/// The two limits should be chosen so that deleting one oldest segment
/// plausibly brings free space back above the reserve; nothing checks this.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Free-space floor in bytes.
    pub reserve_free_bytes: u64,

    /// Maximum size of a segment before rotation.
    pub max_segment_size: u64,

    /// Period of the renewal timer started by the daemon.
    pub renew_interval: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            reserve_free_bytes: DEFAULT_RESERVE_FREE_BYTES,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            renew_interval: DEFAULT_RENEW_INTERVAL,
        }
    }
}

impl RotationConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-space floor.
    #[must_use]
    pub const fn reserve_free_bytes(mut self, bytes: u64) -> Self {
        self.reserve_free_bytes = bytes;
        self
    }

    /// Sets the maximum segment size.
    #[must_use]
    pub const fn max_segment_size(mut self, bytes: u64) -> Self {
        self.max_segment_size = bytes;
        self
    }

    /// Sets the renewal timer period.
    #[must_use]
    pub const fn renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = interval;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the renewal period is out of
    /// range.
    pub fn validate(&self) -> CoreResult<()> {
        validate_renew_interval(self.renew_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RotationConfig::default();
        assert_eq!(config.reserve_free_bytes, 128 * 1024);
        assert_eq!(config.max_segment_size, 32 * 1024);
        assert_eq!(config.renew_interval, Duration::from_secs(600));
    }

    #[test]
    fn builder_pattern() {
        let config = RotationConfig::new()
            .reserve_free_bytes(4096)
            .max_segment_size(1024)
            .renew_interval(Duration::from_secs(5));

        assert_eq!(config.reserve_free_bytes, 4096);
        assert_eq!(config.max_segment_size, 1024);
        assert_eq!(config.renew_interval.as_secs(), 5);
    }

    #[test]
    fn validate_renew_interval_range() {
        assert!(RotationConfig::default().validate().is_ok());
        assert!(RotationConfig::new()
            .renew_interval(MAX_RENEW_INTERVAL)
            .validate()
            .is_ok());

        for interval in [
            Duration::ZERO,
            MAX_RENEW_INTERVAL + Duration::from_secs(1),
            Duration::from_secs(u64::MAX),
        ] {
            let result = RotationConfig::new().renew_interval(interval).validate();
            assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
        }
    }
}
