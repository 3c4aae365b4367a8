//! Cyclic ring topology over the ranks of a communicator.
//!
//! Rank `r` of `P` talks to `(r - 1 + P) % P` and `(r + 1) % P`, so rank 0
//! and rank `P - 1` are neighbours. With a single rank both neighbours are
//! the rank itself.

use crate::algs::communicator::Communicator;
use crate::halo_error::HaloError;
use serde::{Deserialize, Serialize};

/// The two ring neighbours of one rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeighborPair {
    pub previous_rank: usize,
    pub next_rank: usize,
}

impl NeighborPair {
    /// Neighbours of the calling rank of `comm`.
    pub fn of<C: Communicator>(comm: &C) -> Result<Self, HaloError> {
        neighbors(comm.rank(), comm.size())
    }

    /// `true` when both neighbours are `rank` itself (a one-rank ring).
    #[inline]
    pub fn is_self(&self, rank: usize) -> bool {
        self.previous_rank == rank && self.next_rank == rank
    }
}

/// Ring neighbours of `rank` among `process_count` ranks.
///
/// # Errors
/// `InvalidTopology` if `process_count == 0` or `rank >= process_count`.
pub fn neighbors(rank: usize, process_count: usize) -> Result<NeighborPair, HaloError> {
    if rank >= process_count {
        return Err(HaloError::InvalidTopology {
            rank,
            size: process_count,
        });
    }
    Ok(NeighborPair {
        previous_rank: (rank + process_count - 1) % process_count,
        next_rank: (rank + 1) % process_count,
    })
}
