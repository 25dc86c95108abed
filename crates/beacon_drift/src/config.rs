//! Scheduling tunables.

use std::time::Duration;

use crate::error::{DriftError, Result};

/// How long a processing slice may run and how long the host waits before
/// resuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingConfig {
    /// Work budget of a single slice. Checked after every unit of work.
    pub max_processing_time: Duration,
    /// Delay the host should leave before calling `resume` again.
    pub yield_delay: Duration,
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_processing_time.is_zero() {
            return Err(DriftError::InvalidConfig(
                "max_processing_time must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processing_time: Duration::from_millis(100),
            yield_delay: Duration::from_millis(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_validation() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_processing_time, Duration::from_millis(100));
        assert_eq!(config.yield_delay, Duration::from_millis(10));
        assert!(config.validate().is_ok());

        let zero = ProcessingConfig {
            max_processing_time: Duration::ZERO,
            ..config
        };
        assert!(matches!(zero.validate(), Err(DriftError::InvalidConfig(_))));
    }
}
