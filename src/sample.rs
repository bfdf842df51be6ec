use core::time::Duration;

/// A single observation fed into a time-windowed statistic
///
/// The timestamp is a monotonic offset from an origin chosen by the feed, such as
/// the session start or the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample<T> {
    /// Time at which the value was observed
    pub timestamp: Duration,
    /// Observed value
    pub value: T,
}

impl<T> Sample<T> {
    /// Creates a new sample
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Time at which the value was observed
    /// * `value` - Observed value
    pub const fn new(timestamp: Duration, value: T) -> Self {
        Self { timestamp, value }
    }
}

impl<T> From<(Duration, T)> for Sample<T> {
    fn from((timestamp, value): (Duration, T)) -> Self {
        Self::new(timestamp, value)
    }
}
