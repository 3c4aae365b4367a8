//! Run parameters for a decomposition.

use crate::algs::communicator::{CommTag, HaloCommTags};
use crate::algs::partition::{GlobalDomain, partition};
use crate::halo_error::{ConfigError, HaloError};
use serde::{Deserialize, Serialize};

/// Parameters every rank must agree on before decomposing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Total number of mesh points.
    pub global_length: usize,
    /// Ghost cells on each side of every rank's slice.
    pub halo_width: usize,
    /// First of the two message tags used by halo exchange.
    pub base_tag: u16,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            global_length: 10_000,
            halo_width: 2,
            base_tag: HaloCommTags::DEFAULT_BASE.as_u16(),
        }
    }
}

impl DecompositionConfig {
    /// Largest tag every MPI implementation must accept (`MPI_TAG_UB` >= 32767).
    pub const MAX_TAG: u16 = 32_767;

    pub fn domain(&self) -> GlobalDomain {
        GlobalDomain::new(self.global_length)
    }

    pub fn tags(&self) -> HaloCommTags {
        HaloCommTags::from_base(CommTag::new(self.base_tag))
    }

    /// Check that every one of `process_count` slices can hold the halo and
    /// that both direction tags are valid MPI tags.
    ///
    /// The last rank always has the smallest slice, so only it is checked.
    pub fn validate(&self, process_count: usize) -> Result<(), HaloError> {
        // the exchange uses base_tag and base_tag + 1
        if self.base_tag >= Self::MAX_TAG {
            return Err(ConfigError::TagOutOfRange {
                base_tag: self.base_tag,
                max: Self::MAX_TAG,
            }
            .into());
        }
        let smallest = partition(self.domain(), process_count, process_count.saturating_sub(1))?;
        if self.halo_width >= smallest.local_length() {
            log::warn!(
                "{} points over {} ranks leaves rank {} with {} points, too few for halo width {}",
                self.global_length,
                process_count,
                smallest.rank(),
                smallest.local_length(),
                self.halo_width
            );
            return Err(ConfigError::HaloTooWide {
                halo_width: self.halo_width,
                local_length: smallest.local_length(),
            }
            .into());
        }
        Ok(())
    }
}
