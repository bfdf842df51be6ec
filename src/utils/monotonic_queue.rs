use core::{marker::PhantomData, time::Duration};

use super::Deque;

/// Trait for defining order policies for monotonic queue
///
/// # Methods
///
/// * `should_remove(existing: &T, new: &T) -> bool` - Returns true if the existing element is
///   dominated by the new one and can never become the front again
pub trait OrderPolicy<T> {
    fn should_remove(existing: &T, new: &T) -> bool;
}

/// Order policy for minimum
#[derive(Debug, Clone)]
pub struct Min;

/// Order policy for maximum
#[derive(Debug, Clone)]
pub struct Max;

impl<T: PartialOrd> OrderPolicy<T> for Min {
    #[inline]
    fn should_remove(existing: &T, new: &T) -> bool {
        existing >= new
    }
}

impl<T: PartialOrd> OrderPolicy<T> for Max {
    #[inline]
    fn should_remove(existing: &T, new: &T) -> bool {
        existing <= new
    }
}

// Pair of (value, timestamp)
type Entry<T> = (T, Duration);

/// Monotonic queue keyed by sample timestamp
///
/// Entries expire by age rather than by position, so the owner drives expiry
/// through [`MonotonicQueue::evict_before`] with the same cutoff it applies to
/// its own window.
///
/// # Type Parameters
///
/// * `T` - The type of the elements in the queue
/// * `O` - The order policy for the queue
#[derive(Debug, Clone)]
pub struct MonotonicQueue<T, O> {
    deque: Deque<Entry<T>>,
    _order: PhantomData<O>,
}

impl<T, O> MonotonicQueue<T, O>
where
    T: PartialOrd + Copy + Default,
    O: OrderPolicy<T>,
{
    /// Creates a new `MonotonicQueue` instance with the specified initial capacity.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            deque: Deque::new(capacity),
            _order: PhantomData,
        }
    }

    /// Pushes a new value observed at `timestamp`, dropping every entry it dominates
    ///
    /// # Arguments
    ///
    /// * `timestamp` - The timestamp of the value
    /// * `value` - The value to push into the queue
    #[inline]
    pub fn push(&mut self, timestamp: Duration, value: T) {
        while let Some(&(existing, _)) = self.deque.back() {
            if O::should_remove(&existing, &value) {
                self.deque.pop_back();
            } else {
                break;
            }
        }
        self.deque.push_back((value, timestamp));
    }

    /// Removes entries older than `cutoff` from the front of the queue
    #[inline]
    pub fn evict_before(&mut self, cutoff: Duration) {
        while let Some(&(_, timestamp)) = self.deque.front() {
            if timestamp < cutoff {
                self.deque.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns the front element of the queue
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The current extreme, or `None` if the queue is empty
    #[inline]
    pub fn front(&self) -> Option<T> {
        self.deque.front().map(|&(value, _)| value)
    }

    /// Resets the queue to its initial state
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.deque.reset();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::all)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_monotonic_queue_equal_values_handling() {
        let mut mq = MonotonicQueue::<_, Min>::new(3);
        mq.push(ms(0), 5);
        mq.push(ms(1), 5);
        mq.push(ms(2), 5);
        assert_eq!(mq.front(), Some(5));

        // the newest equal value survives the expiry of the older ones
        mq.evict_before(ms(2));
        assert_eq!(mq.front(), Some(5));

        mq.push(ms(3), 4);
        assert_eq!(mq.front(), Some(4));
    }

    #[test]
    fn test_monotonic_queue_min_sliding_time_window() {
        let input = [25.4, 26.2, 26.0, 26.1, 25.8, 25.9, 26.3, 26.2, 26.5];
        let interval = 200;
        let mut mq = MonotonicQueue::<_, Min>::new(0);
        let mut result = vec![];

        for (i, &val) in input.iter().enumerate() {
            let now = i as u64 * 100;
            mq.push(ms(now), val);
            mq.evict_before(ms(now.saturating_sub(interval)));
            if i >= 2 {
                result.push(mq.front().unwrap());
            }
        }
        assert_eq!(result, vec![25.4, 26.0, 25.8, 25.8, 25.8, 25.9, 26.2]);
    }

    #[test]
    fn test_monotonic_queue_max_irregular_spacing() {
        let mut mq = MonotonicQueue::<_, Max>::new(2);
        let feed = [(0, 31), (10, 4), (15, 52), (100, 2), (110, 36), (300, 1)];
        let mut result = Vec::new();

        for &(t, v) in &feed {
            mq.push(ms(t), v);
            mq.evict_before(ms(t.saturating_sub(90)));
            result.push(mq.front().unwrap());
        }

        assert_eq!(result, vec![31, 31, 52, 52, 36, 1]);
    }

    #[test]
    fn test_monotonic_reset() {
        let mut mq = MonotonicQueue::<_, Min>::new(3);
        mq.push(ms(0), 14);
        mq.push(ms(1), 12);
        assert_eq!(mq.front(), Some(12));

        mq.reset();
        assert_eq!(mq.front(), None);

        mq.push(ms(2), 20);
        assert_eq!(mq.front(), Some(20));
    }
}
