use core::time::Duration;

use thiserror::Error;

/// Errors produced while configuring or feeding a time-windowed statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The window length is not strictly positive
    #[error("invalid configuration: interval must be greater than zero, got {interval:?}")]
    InvalidConfiguration {
        /// The rejected window length
        interval: Duration,
    },

    /// A sample was rejected by the validated push path
    #[error("invalid sample at {timestamp:?}: {reason}")]
    InvalidSample {
        /// Timestamp of the rejected sample
        timestamp: Duration,
        /// Why the sample was rejected
        reason: SampleRejection,
    },
}

/// Reason a sample was refused by [`crate::WindowedStdDev::try_push_value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleRejection {
    /// The value is NaN or infinite
    #[error("value is not finite")]
    NonFinite,

    /// The timestamp is earlier than the most recent retained sample
    #[error("timestamp precedes the latest sample at {latest:?}")]
    OutOfOrder {
        /// Timestamp of the most recent retained sample
        latest: Duration,
    },
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_messages() {
        let err = Error::InvalidConfiguration {
            interval: Duration::ZERO,
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: interval must be greater than zero, got 0ns"
        );

        let err = Error::InvalidSample {
            timestamp: Duration::from_millis(5),
            reason: SampleRejection::OutOfOrder {
                latest: Duration::from_millis(7),
            },
        };
        assert_eq!(
            err.to_string(),
            "invalid sample at 5ms: timestamp precedes the latest sample at 7ms"
        );
    }
}
