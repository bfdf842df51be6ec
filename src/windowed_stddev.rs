use core::time::Duration;

use num_traits::Float;
use tracing::{debug, trace, warn};

use crate::{
    Error, Kbn, Sample, SampleRejection, WindowConfig,
    utils::{Deque, Max, Min, MonotonicQueue},
};

/// Fewest retained samples for which a dispersion statistic is reported
const MIN_SAMPLES: usize = 2;

/// Largest squared distance between the window mean and the reference value,
/// in units of the window variance, before the sums are rebuilt
const DRIFT_LIMIT: f64 = 1e4;

/// Mean offsets within this many ulps of the reference value are rounding, not drift
const DRIFT_ULPS: f64 = 16.0;

/// Standard deviation over a trailing time window of timestamped samples.
///
/// Every push appends a sample, evicts the samples that fell out of the window
/// `[now - interval, now]` and reports the standard deviation of what is left.
/// The first two raw moments are maintained incrementally, so a push costs O(1)
/// plus O(1) per evicted sample and never rescans the window.
///
/// Both moments are accumulated with Kahan-Babuska-Neumaier summation relative to
/// a reference value close to the data. The reference is moved to the incoming
/// value whenever the window collapses to a single sample, and the sums are rebuilt
/// around the window mean (see [`WindowedStdDev::recompute`]) when either
///
/// - every sample retained at the previous rebuild has been evicted, or
/// - the mean has drifted more than 100 standard deviations from the reference.
///
/// Each sample is rescanned at most once by the turnover rule, so the cost stays
/// amortized O(1) per push, and a gapless trending or level-shifting feed keeps
/// full precision.
///
/// The sample buffer grows with the busiest window seen and shrinks again as the
/// window thins out, so a replayed backlog does not pin its peak memory.
///
/// A window holding fewer than two samples has no dispersion and reports `None`.
///
/// Timestamps must be pushed in non-decreasing order. [`WindowedStdDev::push_value`]
/// does not check this, and out-of-order timestamps or non-finite values give an
/// unspecified (possibly NaN) result until the offending samples leave the window.
/// [`WindowedStdDev::try_push_value`] rejects such samples instead.
///
/// # Examples
///
/// ```
/// # use core::time::Duration;
/// # use ta_timed_statistics::WindowedStdDev;
/// # use assert_approx_eq::assert_approx_eq;
/// let mut stats = WindowedStdDev::<f64>::new(Duration::from_millis(1000)).unwrap();
///
/// assert_eq!(stats.push_value(Duration::from_millis(0), 10.0), None);
/// assert_approx_eq!(stats.push_value(Duration::from_millis(500), 20.0).unwrap(), 5.0);
///
/// // (0ms, 10.0) is now older than the window and is evicted
/// assert_approx_eq!(stats.push_value(Duration::from_millis(1500), 30.0).unwrap(), 5.0);
/// assert_eq!(stats.count(), 2);
/// assert_eq!(stats.evicted(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct WindowedStdDev<T> {
    /// Window configuration
    config: WindowConfig,
    /// Retained samples, oldest first
    window: Deque<Sample<T>>,
    /// Reference value the running sums are taken relative to
    shift: T,
    /// Sum of deviations from `shift`
    sum: Kbn<T>,
    /// Sum of squared deviations from `shift`
    sum_sq: Kbn<T>,
    /// Minimum
    min: MonotonicQueue<T, Min>,
    /// Maximum
    max: MonotonicQueue<T, Max>,
    /// Samples evicted by the most recent push
    evicted: usize,
    /// Samples retained at the last rebase that are still in the window
    pending: usize,
    /// Pushes since the sums were last rebuilt
    since_recompute: usize,
}

impl<T: Float + Default> WindowedStdDev<T> {
    /// Creates a population standard deviation over a trailing window of length `interval`
    ///
    /// # Arguments
    ///
    /// * `interval` - Length of the trailing window
    ///
    /// # Returns
    ///
    /// * `Result<Self, Error>` - `Error::InvalidConfiguration` if `interval` is zero
    pub fn new(interval: Duration) -> Result<Self, Error> {
        Self::with_config(WindowConfig::new(interval))
    }

    /// Creates the statistic from a full [`WindowConfig`]
    ///
    /// # Returns
    ///
    /// * `Result<Self, Error>` - `Error::InvalidConfiguration` if the configuration is invalid
    pub fn with_config(config: WindowConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            window: Deque::new(0),
            shift: T::zero(),
            sum: Kbn::default(),
            sum_sq: Kbn::default(),
            min: MonotonicQueue::new(0),
            max: MonotonicQueue::new(0),
            evicted: 0,
            pending: 0,
            since_recompute: 0,
        })
    }

    /// Returns the window configuration
    #[inline]
    pub const fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Returns the length of the trailing window
    #[inline]
    pub const fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Returns the Delta Degrees of Freedom
    ///
    /// # Returns
    ///
    /// * `bool` - True if the variance divides by `count - 1`
    #[inline]
    pub const fn ddof(&self) -> bool {
        self.config.ddof
    }

    /// Sets the Delta Degrees of Freedom
    ///
    /// # Arguments
    ///
    /// * `ddof` - True for the sample variance, false for the population variance
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    #[inline]
    pub const fn set_ddof(&mut self, ddof: bool) -> &mut Self {
        self.config.ddof = ddof;
        self
    }

    /// Clears every retained sample and running sum, keeping the configuration
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    pub fn reset(&mut self) -> &mut Self {
        self.window.reset();
        self.rebase(T::zero());
        self.min.reset();
        self.max.reset();
        self.evicted = 0;
        self.since_recompute = 0;
        self
    }

    /// Moves the reference value and zeroes the sums, valid only when every
    /// retained sample equals `shift` or the window is empty
    #[inline]
    fn rebase(&mut self, shift: T) {
        self.shift = shift;
        self.sum = Kbn::default();
        self.sum_sq = Kbn::default();
        self.pending = self.window.len();
    }

    /// Adds the new sample to the window and its running sums
    #[inline]
    fn admit(&mut self, timestamp: Duration, value: T) {
        let was_empty = self.window.is_empty();
        self.window.push_back(Sample::new(timestamp, value));

        if was_empty {
            self.rebase(value);
        } else {
            let d = value - self.shift;
            self.sum += d;
            self.sum_sq += d * d;
        }

        self.min.push(timestamp, value);
        self.max.push(timestamp, value);
    }

    /// Evicts every sample older than `now - interval`
    ///
    /// # Returns
    ///
    /// * `usize` - The number of samples evicted
    fn evict(&mut self, now: Duration) -> usize {
        // nothing is older than the start of the feed
        let Some(cutoff) = now.checked_sub(self.config.interval) else {
            return 0;
        };

        let mut evicted = 0;
        while let Some(&oldest) = self.window.front() {
            if oldest.timestamp >= cutoff {
                break;
            }
            self.window.pop_front();

            let d = oldest.value - self.shift;
            self.sum -= d;
            self.sum_sq -= d * d;
            self.pending = self.pending.saturating_sub(1);
            evicted += 1;
        }
        self.min.evict_before(cutoff);
        self.max.evict_before(cutoff);

        if evicted > 1 {
            trace!(
                evicted,
                ?cutoff,
                retained = self.window.len(),
                "evicted burst of expired samples"
            );
        }
        evicted
    }

    /// Updates the statistic with a new sample and returns the standard deviation of the window
    ///
    /// The sample is appended, every sample with `timestamp < now - interval` is evicted,
    /// and the standard deviation of the remaining samples is returned. A sample exactly
    /// `interval` old is still inside the window.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Time of the sample, non-decreasing across calls
    /// * `value` - The sampled value
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The standard deviation, or `None` while fewer than two samples are retained
    pub fn push_value(&mut self, timestamp: Duration, value: T) -> Option<T> {
        self.admit(timestamp, value);

        self.evicted = self.evict(timestamp);

        let periodic = if self.config.recompute_every > 0 {
            self.since_recompute += 1;
            self.since_recompute >= self.config.recompute_every
        } else {
            false
        };

        if self.evicted > 0 && self.window.len() == 1 {
            // only the new sample is left, its deviation from itself is exactly zero
            self.rebase(value);
        } else if periodic || self.turned_over() || self.drifted() {
            self.recompute();
        }

        self.stddev()
    }

    /// Every sample the sums were last anchored on has left the window
    #[inline]
    fn turned_over(&self) -> bool {
        self.evicted > 0 && self.pending == 0 && self.count() >= MIN_SAMPLES
    }

    /// The window mean has moved far enough from the reference value that the
    /// difference of raw moments starts cancelling significant digits
    #[inline]
    fn drifted(&self) -> bool {
        let Some((offset, m2)) = self.moments_about_shift() else {
            return false;
        };
        let (Some(limit), Some(ulps)) = (T::from(DRIFT_LIMIT), T::from(DRIFT_ULPS)) else {
            return false;
        };
        offset * offset > limit * m2 && offset.abs() > ulps * T::epsilon() * self.shift.abs()
    }

    /// Mean offset from the reference value and unclamped population variance
    #[inline]
    fn moments_about_shift(&self) -> Option<(T, T)> {
        if self.count() < MIN_SAMPLES {
            return None;
        }
        let n = T::from(self.count())?;
        let offset = self.sum.total() / n;
        Some((offset, self.sum_sq.total() / n - offset * offset))
    }

    /// Same as [`WindowedStdDev::push_value`] for an owned [`Sample`]
    #[inline]
    pub fn push_sample(&mut self, sample: Sample<T>) -> Option<T> {
        self.push_value(sample.timestamp, sample.value)
    }

    /// Validated form of [`WindowedStdDev::push_value`]
    ///
    /// Rejects non-finite values and timestamps earlier than the latest retained sample
    /// without touching the window.
    ///
    /// # Returns
    ///
    /// * `Result<Option<T>, Error>` - The standard deviation as from `push_value`, or
    ///   `Error::InvalidSample` if the sample was rejected
    ///
    /// # Examples
    ///
    /// ```
    /// # use core::time::Duration;
    /// # use ta_timed_statistics::{Error, SampleRejection, WindowedStdDev};
    /// let mut stats = WindowedStdDev::new(Duration::from_secs(1)).unwrap();
    /// stats.try_push_value(Duration::from_millis(10), 1.0).unwrap();
    ///
    /// assert_eq!(
    ///     stats.try_push_value(Duration::from_millis(20), f64::NAN),
    ///     Err(Error::InvalidSample {
    ///         timestamp: Duration::from_millis(20),
    ///         reason: SampleRejection::NonFinite,
    ///     })
    /// );
    /// assert_eq!(stats.count(), 1);
    /// ```
    pub fn try_push_value(&mut self, timestamp: Duration, value: T) -> Result<Option<T>, Error> {
        let rejection = if !value.is_finite() {
            Some(SampleRejection::NonFinite)
        } else {
            match self.latest_timestamp() {
                Some(latest) if timestamp < latest => Some(SampleRejection::OutOfOrder { latest }),
                _ => None,
            }
        };

        if let Some(reason) = rejection {
            warn!(?timestamp, %reason, "rejected sample");
            return Err(Error::InvalidSample { timestamp, reason });
        }

        Ok(self.push_value(timestamp, value))
    }

    /// Rebuilds the running sums from the retained samples around their mean
    ///
    /// Runs automatically once the window has turned over or its mean has drifted
    /// away from the reference value, and every `recompute_every` pushes when
    /// configured. Calling it directly is never required for accuracy.
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The statistics object
    pub fn recompute(&mut self) -> &mut Self {
        self.since_recompute = 0;

        let Some(n) = self.count_t() else {
            self.rebase(T::zero());
            return self;
        };

        let mut total = Kbn::<T>::default();
        for sample in self.window.iter() {
            total += sample.value;
        }
        let mean = total.total() / n;

        let mut sum = Kbn::<T>::default();
        let mut sum_sq = Kbn::<T>::default();
        for sample in self.window.iter() {
            let d = sample.value - mean;
            sum += d;
            sum_sq += d * d;
        }

        self.shift = mean;
        self.sum = sum;
        self.sum_sq = sum_sq;
        self.pending = self.window.len();

        debug!(
            count = self.window.len(),
            "rebuilt windowed sums around the current mean"
        );
        self
    }

    /// Returns the number of samples in the window
    #[inline]
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Returns true if no sample is retained
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    #[inline]
    fn count_t(&self) -> Option<T> {
        if self.window.is_empty() {
            None
        } else {
            T::from(self.window.len())
        }
    }

    /// Returns the number of samples evicted by the most recent push
    #[inline]
    pub const fn evicted(&self) -> usize {
        self.evicted
    }

    /// Returns the timestamp of the most recent sample
    #[inline]
    pub fn latest_timestamp(&self) -> Option<Duration> {
        self.window.back().map(|s| s.timestamp)
    }

    /// Returns the timestamp of the oldest retained sample
    #[inline]
    pub fn oldest_timestamp(&self) -> Option<Duration> {
        self.window.front().map(|s| s.timestamp)
    }

    /// Returns the most recent value pushed into the window
    #[inline]
    pub fn value(&self) -> Option<T> {
        self.window.back().map(|s| s.value)
    }

    /// Returns an iterator over the retained samples, oldest first
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.window.iter()
    }

    /// Returns the sum of the values in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sum, or `None` if the window is empty
    #[inline]
    pub fn sum(&self) -> Option<T> {
        let n = self.count_t()?;
        Some(self.shift * n + self.sum.total())
    }

    /// Returns the mean of the values in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The mean, or `None` if the window is empty
    #[inline]
    pub fn mean(&self) -> Option<T> {
        let n = self.count_t()?;
        Some(self.shift + self.sum.total() / n)
    }

    /// Returns the variance of the values in the window
    ///
    /// Derived from the raw moments as `sum_sq / n - mean^2`, clamped at zero to absorb
    /// rounding. Population variance by default, sample variance when `ddof` is set.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The variance, or `None` while fewer than two samples are retained
    #[inline]
    pub fn variance(&self) -> Option<T> {
        let (_, m2) = self.moments_about_shift()?;
        // NaN compares false and falls through
        let m2 = if m2 < T::zero() { T::zero() } else { m2 };

        if self.config.ddof {
            let n = T::from(self.count())?;
            Some(m2 * n / (n - T::one()))
        } else {
            Some(m2)
        }
    }

    /// Returns the standard deviation of the values in the window
    ///
    /// Standard deviation over a time window is the usual input for volatility bands
    /// and trend thresholds on irregularly sampled price and indicator series.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The standard deviation, or `None` while fewer than two samples are retained
    #[inline]
    pub fn stddev(&self) -> Option<T> {
        self.variance().map(T::sqrt)
    }

    /// Returns the Zscore of the most recent value
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The Zscore if the standard deviation is available and positive, None otherwise
    #[inline]
    pub fn zscore(&self) -> Option<T> {
        let value = self.value()?;
        let mean = self.mean()?;
        let stddev = self.stddev()?;

        if stddev > T::zero() {
            Some((value - mean) / stddev)
        } else {
            None
        }
    }

    /// Returns the minimum value in the window
    #[inline]
    pub fn min(&self) -> Option<T> {
        self.min.front()
    }

    /// Returns the maximum value in the window
    #[inline]
    pub fn max(&self) -> Option<T> {
        self.max.front()
    }
}
