//! Static near-equal splitting of a 1-D domain across ranks.
//!
//! `n` points over `P` ranks: every rank gets `n / P` points and the first
//! `n % P` ranks get one extra. Slices are contiguous and ordered by rank,
//! so each rank can compute its own slice (and anybody else's) without
//! communication.

use crate::algs::communicator::Communicator;
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::{ConfigError, HaloError};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Total number of mesh points across all ranks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalDomain {
    pub length: usize,
}

impl GlobalDomain {
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl TryFrom<i64> for GlobalDomain {
    type Error = HaloError;

    fn try_from(length: i64) -> Result<Self, HaloError> {
        usize::try_from(length)
            .map(GlobalDomain::new)
            .map_err(|_| ConfigError::NegativeLength(length).into())
    }
}

/// One rank's contiguous slice of the global domain.
///
/// # Invariants
/// - `rank < process_count`
/// - the slice covers `global_start..global_start + local_length`
/// - over all ranks the slices tile `0..global_length` in rank order
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    rank: usize,
    process_count: usize,
    global_length: usize,
    local_length: usize,
    global_start: usize,
}

impl Partition {
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn process_count(&self) -> usize {
        self.process_count
    }

    #[inline]
    pub fn global_length(&self) -> usize {
        self.global_length
    }

    /// Number of points this rank owns.
    #[inline]
    pub fn local_length(&self) -> usize {
        self.local_length
    }

    /// Global index of the first owned point.
    #[inline]
    pub fn global_start(&self) -> usize {
        self.global_start
    }

    /// Global index of the last owned point, `None` for an empty slice.
    #[inline]
    pub fn global_end(&self) -> Option<usize> {
        (self.local_length > 0).then(|| self.global_start + self.local_length - 1)
    }

    /// Half-open range of owned global indices.
    #[inline]
    pub fn global_range(&self) -> Range<usize> {
        self.global_start..self.global_start + self.local_length
    }

    #[inline]
    pub fn contains(&self, global: usize) -> bool {
        self.global_range().contains(&global)
    }

    /// Local (owned-region) offset of a global index owned by this rank.
    pub fn to_local(&self, global: usize) -> Option<usize> {
        self.contains(global).then(|| global - self.global_start)
    }

    /// Global index of an owned-region offset.
    pub fn to_global(&self, local: usize) -> Option<usize> {
        (local < self.local_length).then(|| self.global_start + local)
    }
}

impl DebugInvariants for Partition {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Partition");
    }

    fn validate_invariants(&self) -> Result<(), HaloError> {
        let expected = partition(
            GlobalDomain::new(self.global_length),
            self.process_count,
            self.rank,
        )?;
        if expected != *self {
            return Err(ConfigError::InconsistentPartition { rank: self.rank }.into());
        }
        Ok(())
    }
}

/// Compute `rank`'s slice of `domain` split over `process_count` ranks.
///
/// # Errors
/// - `InvalidConfiguration(ZeroProcessCount)` if `process_count == 0`
/// - `InvalidTopology` if `rank >= process_count`
///
/// # Example
/// ```rust
/// # fn try_main() -> Result<(), mesh_halo::halo_error::HaloError> {
/// use mesh_halo::algs::partition::{partition, GlobalDomain};
/// let p = partition(GlobalDomain::new(10), 3, 1)?;
/// assert_eq!(p.local_length(), 3);
/// assert_eq!(p.global_start(), 4);
/// assert_eq!(p.global_end(), Some(6));
/// # Ok(())
/// # }
/// # try_main().unwrap();
/// ```
pub fn partition(
    domain: GlobalDomain,
    process_count: usize,
    rank: usize,
) -> Result<Partition, HaloError> {
    if process_count == 0 {
        return Err(ConfigError::ZeroProcessCount.into());
    }
    if rank >= process_count {
        return Err(HaloError::InvalidTopology {
            rank,
            size: process_count,
        });
    }
    let base = domain.length / process_count;
    let remainder = domain.length % process_count;
    let (local_length, global_start) = if rank < remainder {
        (base + 1, rank * (base + 1))
    } else {
        (base, rank * base + remainder)
    };
    Ok(Partition {
        rank,
        process_count,
        global_length: domain.length,
        local_length,
        global_start,
    })
}

/// Every rank's slice, in rank order.
pub fn partition_all(
    domain: GlobalDomain,
    process_count: usize,
) -> Result<Vec<Partition>, HaloError> {
    if process_count == 0 {
        return Err(ConfigError::ZeroProcessCount.into());
    }
    (0..process_count)
        .map(|rank| partition(domain, process_count, rank))
        .collect()
}

/// Rank owning global index `global`, or `None` past the end of the domain.
pub fn owner_of(domain: GlobalDomain, process_count: usize, global: usize) -> Option<usize> {
    if process_count == 0 || global >= domain.length {
        return None;
    }
    let base = domain.length / process_count;
    let remainder = domain.length % process_count;
    let wide = remainder * (base + 1);
    if global < wide {
        Some(global / (base + 1))
    } else {
        // global < length implies base > 0 here
        Some(remainder + (global - wide) / base)
    }
}

/// Difference between the largest and smallest slice (0 or 1 for a valid split).
pub fn imbalance(parts: &[Partition]) -> usize {
    match parts.iter().map(Partition::local_length).minmax() {
        MinMaxResult::NoElements => 0,
        MinMaxResult::OneElement(_) => 0,
        MinMaxResult::MinMax(lo, hi) => hi - lo,
    }
}

/// Collective check that the slices of all ranks add up to the global length.
///
/// Every rank must call this with its own partition. Returns the reduced
/// total on success.
pub fn verify_partition<C: Communicator>(comm: &C, part: &Partition) -> Result<u64, HaloError> {
    let reduced = comm.allreduce_sum(part.local_length() as u64)?;
    let expected = part.global_length() as u64;
    log::debug!(
        "[rank {}] local length {} of {}, reduced total {}",
        part.rank(),
        part.local_length(),
        expected,
        reduced
    );
    if reduced != expected {
        return Err(ConfigError::TotalLengthMismatch { expected, reduced }.into());
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadComm};

    #[test]
    fn ten_over_three() {
        let parts = partition_all(GlobalDomain::new(10), 3).unwrap();
        let lens: Vec<_> = parts.iter().map(|p| p.local_length()).collect();
        let starts: Vec<_> = parts.iter().map(|p| p.global_start()).collect();
        assert_eq!(lens, vec![4, 3, 3]);
        assert_eq!(starts, vec![0, 4, 7]);
        assert_eq!(parts[2].global_end(), Some(9));
    }

    #[test]
    fn empty_domain_gives_empty_slices() {
        let parts = partition_all(GlobalDomain::new(0), 4).unwrap();
        assert!(parts.iter().all(|p| p.local_length() == 0));
        assert!(parts.iter().all(|p| p.global_end().is_none()));
        assert_eq!(imbalance(&parts), 0);
    }

    #[test]
    fn fewer_points_than_ranks() {
        let parts = partition_all(GlobalDomain::new(2), 5).unwrap();
        let lens: Vec<_> = parts.iter().map(|p| p.local_length()).collect();
        assert_eq!(lens, vec![1, 1, 0, 0, 0]);
        assert_eq!(parts[4].global_start(), 2);
    }

    #[test]
    fn errors() {
        assert_eq!(
            partition(GlobalDomain::new(10), 0, 0),
            Err(HaloError::InvalidConfiguration(ConfigError::ZeroProcessCount))
        );
        assert_eq!(
            partition(GlobalDomain::new(10), 3, 3),
            Err(HaloError::InvalidTopology { rank: 3, size: 3 })
        );
        assert_eq!(
            GlobalDomain::try_from(-4),
            Err(HaloError::InvalidConfiguration(ConfigError::NegativeLength(-4)))
        );
    }

    #[test]
    fn local_global_mapping() {
        let p = partition(GlobalDomain::new(10), 3, 1).unwrap();
        assert_eq!(p.to_local(4), Some(0));
        assert_eq!(p.to_local(6), Some(2));
        assert_eq!(p.to_local(7), None);
        assert_eq!(p.to_global(2), Some(6));
        assert_eq!(p.to_global(3), None);
    }

    #[test]
    fn owner_matches_partitions() {
        for (n, np) in [(10, 3), (7, 7), (3, 5), (100, 8), (1, 1)] {
            let domain = GlobalDomain::new(n);
            let parts = partition_all(domain, np).unwrap();
            for g in 0..n {
                let owner = owner_of(domain, np, g).unwrap();
                assert!(parts[owner].contains(g), "n={n} P={np} g={g}");
            }
            assert_eq!(owner_of(domain, np, n), None);
        }
    }

    #[test]
    fn verify_on_single_rank() {
        let p = partition(GlobalDomain::new(12), 1, 0).unwrap();
        assert_eq!(verify_partition(&NoComm, &p), Ok(12));
        p.validate_invariants().unwrap();
    }

    #[test]
    fn verify_detects_disagreeing_ranks() {
        // rank 2 believes the domain has 15 points, the others 12
        let results = ThreadComm::run(3, |comm| {
            let n = if comm.rank() == 2 { 15 } else { 12 };
            let p = partition(GlobalDomain::new(n), comm.size(), comm.rank()).unwrap();
            verify_partition(&comm, &p)
        });
        // 4 + 4 + 5 = 13 matches neither 12 nor 15
        for (rank, r) in results.into_iter().enumerate() {
            assert!(
                matches!(
                    r,
                    Err(HaloError::InvalidConfiguration(
                        ConfigError::TotalLengthMismatch { .. }
                    ))
                ),
                "rank {rank}: {r:?}"
            );
        }
    }
}
