//! Per-rank decomposition context: partition → neighbours → fields → exchange.
//!
//! [`Decomposition::new`] is collective. It computes the calling rank's
//! slice and ring neighbours, verifies the split with a sum reduction, and
//! ends with a barrier so no rank starts exchanging before every rank has
//! a consistent view of the decomposition.

use crate::algs::communicator::{Communicator, HaloCommTags};
use crate::algs::halo_exchange::HaloExchanger;
use crate::algs::partition::{Partition, partition, verify_partition};
use crate::config::DecompositionConfig;
use crate::data::halo_field::HaloField;
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::HaloError;
use crate::topology::ring::NeighborPair;
use bytemuck::Pod;
use num_traits::Zero;

/// Everything one rank needs to allocate and refresh halo'd fields.
#[derive(Debug)]
pub struct Decomposition<'a, C> {
    comm: &'a C,
    partition: Partition,
    neighbors: NeighborPair,
    halo_width: usize,
    tags: HaloCommTags,
}

impl<'a, C: Communicator> Decomposition<'a, C> {
    /// Collective: every rank must call this with the same `cfg`.
    ///
    /// # Errors
    /// Configuration and topology errors are detected locally before any
    /// communication, so all ranks fail together on a bad `cfg`.
    pub fn new(comm: &'a C, cfg: &DecompositionConfig) -> Result<Self, HaloError> {
        let (rank, size) = (comm.rank(), comm.size());
        cfg.validate(size)?;
        let partition = partition(cfg.domain(), size, rank)?;
        partition.debug_assert_invariants();
        let neighbors = NeighborPair::of(comm)?;
        log::debug!(
            "[rank {rank}/{size}] owns {:?}, neighbours {} and {}",
            partition.global_range(),
            neighbors.previous_rank,
            neighbors.next_rank
        );
        verify_partition(comm, &partition)?;
        comm.barrier()?;
        Ok(Self {
            comm,
            partition,
            neighbors,
            halo_width: cfg.halo_width,
            tags: cfg.tags(),
        })
    }

    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn neighbors(&self) -> NeighborPair {
        self.neighbors
    }

    #[inline]
    pub fn halo_width(&self) -> usize {
        self.halo_width
    }

    #[inline]
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// Zero-filled field sized for this rank's slice.
    pub fn allocate_field<T: Copy + Zero>(&self) -> Result<HaloField<T>, HaloError> {
        HaloField::for_partition(&self.partition, self.halo_width)
    }

    pub fn exchanger(&self) -> HaloExchanger<'a, C> {
        HaloExchanger::with_tags(self.comm, self.neighbors, self.tags)
    }

    /// Refresh `field`'s halos from the ring neighbours.
    pub fn exchange<T: Pod>(&self, field: &mut HaloField<T>) -> Result<(), HaloError> {
        self.exchanger().exchange(field, self.halo_width)
    }
}
