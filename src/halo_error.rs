//! HaloError: Unified error type for mesh-halo public APIs
//!
//! Every decomposition, topology and exchange routine reports failure through
//! this type instead of panicking. None of these errors are recoverable
//! locally: a rank that receives one should stop participating, and the
//! driver should halt the run, since its peers may be blocked on a message
//! that will never arrive.

use thiserror::Error;

/// Unified error type for mesh-halo operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HaloError {
    /// A rank/process-count pair that does not describe a valid ring.
    #[error("Invalid topology: rank {rank} is not in 0..{size}")]
    InvalidTopology { rank: usize, size: usize },
    /// Decomposition or halo parameters that cannot produce a well-formed field.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// A send, receive, reduction or barrier reported a communication error.
    #[error("Transport failure with rank {neighbor}: {reason}")]
    TransportFailure { neighbor: usize, reason: String },
}

/// The specific parameter violation behind [`HaloError::InvalidConfiguration`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The halo must be strictly narrower than the owned slice.
    #[error("halo width {halo_width} must be less than local length {local_length}")]
    HaloTooWide {
        halo_width: usize,
        local_length: usize,
    },
    #[error("process count must be positive")]
    ZeroProcessCount,
    #[error("global domain length must be non-negative, got {0}")]
    NegativeLength(i64),
    /// The halo width passed to an exchange differs from the one the field was allocated with.
    #[error("field was allocated with halo width {field}, exchange requested {requested}")]
    HaloWidthMismatch { field: usize, requested: usize },
    /// The collective sum of local lengths does not reproduce the global length.
    #[error("local lengths sum to {reduced} across ranks, expected {expected}")]
    TotalLengthMismatch { expected: u64, reduced: u64 },
    /// Halo tags must fit under the smallest tag bound MPI guarantees.
    #[error("base tag {base_tag} leaves no room below the MPI tag bound {max}")]
    TagOutOfRange { base_tag: u16, max: u16 },
    /// A partition value that the near-equal split would not produce (e.g. deserialized).
    #[error("partition of rank {rank} does not match the near-equal split")]
    InconsistentPartition { rank: usize },
}

impl HaloError {
    /// Shorthand for the transport-failure variant.
    pub(crate) fn transport(neighbor: usize, reason: impl Into<String>) -> Self {
        HaloError::TransportFailure {
            neighbor,
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by bad parameters rather than communication.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HaloError::InvalidConfiguration(_) | HaloError::InvalidTopology { .. }
        )
    }
}
