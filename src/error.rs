use thiserror::Error;

/// Broad failure category of a [`ShareError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Parameters are inconsistent or out of range
    Configuration,
    /// The field has no free x-coordinates left for this session
    Exhaustion,
    /// Not enough material was supplied to reconstruct
    InsufficientShares,
    /// Malformed shares or a failure inside the runtime
    Internal,
}

/// Error type for splitting, packaging and recovery operations
#[derive(Error, Debug)]
pub enum ShareError {
    /// Invalid threshold value (must be 1 <= threshold)
    #[error("Invalid threshold value {0}")]
    InvalidThreshold(usize),

    /// Invalid total shares count (must be >= 1)
    #[error("Invalid share count {0}")]
    InvalidShareCount(usize),

    /// Threshold exceeds total shares
    #[error("Threshold {threshold} exceeds total shares {total_shares}")]
    ThresholdTooLarge { threshold: usize, total_shares: usize },

    /// A percentage parameter outside 1..=100
    #[error("Invalid {name} percentage {value}")]
    InvalidPercentage { name: &'static str, value: u32 },

    /// At least one trustee is required
    #[error("Invalid trustee count {0}")]
    InvalidTrustees(usize),

    /// The absolute threshold cannot be met by the trustees
    #[error("Absolute threshold {threshold} exceeds trustee count {trustees}")]
    ThresholdExceedsTrustees { threshold: usize, trustees: usize },

    /// Anonymity set smaller than the number of trustees
    #[error("Anonymity set size {size} is smaller than trustee count {trustees}")]
    AnonymitySetTooSmall { size: usize, trustees: usize },

    /// Hint layer parameters are inconsistent
    #[error("Invalid hint configuration: {hints} hints with threshold {threshold} for {trustees} trustees")]
    InvalidHints {
        hints: usize,
        threshold: usize,
        trustees: usize,
    },

    /// Generator does not cycle through every non-zero field element
    #[error("Generator {generator:#06x} is not primitive modulo {modulus:#07x}")]
    NonPrimitiveGenerator { generator: u16, modulus: u32 },

    /// Field tables were already built with different parameters
    #[error("Field tables already initialized with different parameters")]
    TablesAlreadyInitialized,

    /// No unused x-coordinates remain in the field
    #[error("Requested {requested} x-coordinates but only {available} remain")]
    CoordinatesExhausted { requested: usize, available: usize },

    /// Insufficient shares for reconstruction
    #[error("Need at least {needed} shares, got {got}")]
    InsufficientShares { needed: usize, got: usize },

    /// Hashed recovery exhausted every candidate
    #[error("Secret not found")]
    SecretNotFound,

    /// Access order refers to an entry outside the anonymity set
    #[error("Access order entry {index} is out of range for a set of {size}")]
    InvalidAccessOrder { index: usize, size: usize },

    /// Invalid share format or content
    #[error("Invalid share format")]
    InvalidShareFormat,

    /// Inconsistent share lengths
    #[error("Inconsistent share lengths")]
    InconsistentShareLength,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Random number generator error: {0}")]
    RngError(String),

    #[error("Worker pool error: {0}")]
    WorkerPoolError(String),
}

impl ShareError {
    /// Returns the category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidThreshold(_)
            | Self::InvalidShareCount(_)
            | Self::ThresholdTooLarge { .. }
            | Self::InvalidPercentage { .. }
            | Self::InvalidTrustees(_)
            | Self::ThresholdExceedsTrustees { .. }
            | Self::AnonymitySetTooSmall { .. }
            | Self::InvalidHints { .. }
            | Self::NonPrimitiveGenerator { .. }
            | Self::TablesAlreadyInitialized
            | Self::InvalidAccessOrder { .. }
            | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::CoordinatesExhausted { .. } => ErrorKind::Exhaustion,
            Self::InsufficientShares { .. } | Self::SecretNotFound => {
                ErrorKind::InsufficientShares
            }
            Self::InvalidShareFormat
            | Self::InconsistentShareLength
            | Self::RngError(_)
            | Self::WorkerPoolError(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ShareError::AnonymitySetTooSmall {
                size: 3,
                trustees: 5
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ShareError::CoordinatesExhausted {
                requested: 10,
                available: 2
            }
            .kind(),
            ErrorKind::Exhaustion
        );
        assert_eq!(ShareError::SecretNotFound.kind(), ErrorKind::InsufficientShares);
        assert_eq!(ShareError::InvalidShareFormat.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_messages() {
        let err = ShareError::ThresholdTooLarge {
            threshold: 4,
            total_shares: 3,
        };
        assert_eq!(err.to_string(), "Threshold 4 exceeds total shares 3");

        let err = ShareError::NonPrimitiveGenerator {
            generator: 1,
            modulus: 0x1100B,
        };
        assert_eq!(err.to_string(), "Generator 0x0001 is not primitive modulo 0x1100b");
    }
}
