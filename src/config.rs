use core::time::Duration;

use crate::Error;

/// Construction-time configuration of a [`crate::WindowedStdDev`]
///
/// # Examples
///
/// ```
/// # use core::time::Duration;
/// # use ta_timed_statistics::{WindowConfig, WindowedStdDev};
/// let config = WindowConfig::new(Duration::from_secs(60))
///     .with_ddof(true)
///     .with_recompute_every(100_000);
///
/// let stats = WindowedStdDev::<f64>::with_config(config).unwrap();
/// assert!(stats.ddof());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowConfig {
    /// Length of the trailing window
    pub interval: Duration,
    /// Delta Degrees of Freedom, `true` divides by `count - 1`
    #[cfg_attr(feature = "serde", serde(default))]
    pub ddof: bool,
    /// Rebuild the running sums from the retained samples after this many
    /// pushes, `0` disables periodic recomputation
    #[cfg_attr(feature = "serde", serde(default))]
    pub recompute_every: usize,
}

impl WindowConfig {
    /// Creates a population-variance configuration with periodic recomputation disabled
    ///
    /// # Arguments
    ///
    /// * `interval` - Length of the trailing window
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            ddof: false,
            recompute_every: 0,
        }
    }

    /// Sets the Delta Degrees of Freedom
    pub const fn with_ddof(mut self, ddof: bool) -> Self {
        self.ddof = ddof;
        self
    }

    /// Sets the number of pushes between full recomputations
    pub const fn with_recompute_every(mut self, pushes: usize) -> Self {
        self.recompute_every = pushes;
        self
    }

    /// Checks that the configuration describes a usable window
    ///
    /// # Returns
    ///
    /// * `Result<(), Error>` - `Error::InvalidConfiguration` if the interval is zero
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval.is_zero() {
            return Err(Error::InvalidConfiguration {
                interval: self.interval,
            });
        }
        Ok(())
    }
}

impl From<Duration> for WindowConfig {
    fn from(interval: Duration) -> Self {
        Self::new(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        assert_eq!(
            WindowConfig::new(Duration::ZERO).validate(),
            Err(Error::InvalidConfiguration {
                interval: Duration::ZERO
            })
        );
        assert_eq!(WindowConfig::new(Duration::from_nanos(1)).validate(), Ok(()));
    }

    #[test]
    fn builders_override_defaults() {
        let config = WindowConfig::from(Duration::from_millis(250));
        assert!(!config.ddof);
        assert_eq!(config.recompute_every, 0);

        let config = config.with_ddof(true).with_recompute_every(64);
        assert!(config.ddof);
        assert_eq!(config.recompute_every, 64);
        assert_eq!(config.interval, Duration::from_millis(250));
    }
}
