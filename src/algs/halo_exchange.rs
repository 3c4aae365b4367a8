//! Ring halo exchange: refresh both ghost regions of a [`HaloField`] from
//! the owned boundaries of the two ring neighbours.
//!
//! Per call, each rank
//! 1. sends its first `hw` owned values to `previous_rank` and receives the
//!    next rank's first `hw` owned values into its high halo;
//! 2. sends its last `hw` owned values to `next_rank` and receives the
//!    previous rank's last `hw` owned values into its low halo.
//!
//! Each direction is one [`Communicator::sendrecv`], so no rank ever blocks
//! on a send while its peer blocks on one too. The directions use separate
//! tags ([`HaloCommTags`]); with two ranks both neighbours are the same peer
//! and the tags keep the two payloads apart. A one-rank ring is handled as a
//! local copy without touching the transport.
//!
//! Every rank of the ring must call `exchange` the same number of times
//! with the same halo width; a rank that skips a call leaves its neighbours
//! blocked.

use crate::algs::communicator::{Communicator, HaloCommTags};
use crate::algs::wire::{byte_len, cast_slice, decode_into};
use crate::data::halo_field::{HaloField, HaloRegion};
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::{ConfigError, HaloError};
use crate::topology::ring::NeighborPair;
use bytemuck::Pod;

/// Refresh `field`'s halos using the default direction tags.
///
/// # Errors
/// - `InvalidConfiguration` if `halo_width` differs from the field's or is
///   not smaller than its local length
/// - `InvalidTopology` if a neighbour is not a rank of `comm`
/// - `TransportFailure` if a payload is missing or has the wrong size
pub fn exchange<T, C>(
    field: &mut HaloField<T>,
    neighbors: NeighborPair,
    halo_width: usize,
    comm: &C,
) -> Result<(), HaloError>
where
    T: Pod,
    C: Communicator,
{
    HaloExchanger::new(comm, neighbors).exchange(field, halo_width)
}

/// Reusable exchanger bound to one communicator and neighbour pair.
#[derive(Debug)]
pub struct HaloExchanger<'a, C> {
    comm: &'a C,
    neighbors: NeighborPair,
    tags: HaloCommTags,
}

impl<'a, C: Communicator> HaloExchanger<'a, C> {
    pub fn new(comm: &'a C, neighbors: NeighborPair) -> Self {
        Self::with_tags(comm, neighbors, HaloCommTags::default())
    }

    pub fn with_tags(comm: &'a C, neighbors: NeighborPair, tags: HaloCommTags) -> Self {
        Self {
            comm,
            neighbors,
            tags,
        }
    }

    #[inline]
    pub fn neighbors(&self) -> NeighborPair {
        self.neighbors
    }

    #[inline]
    pub fn tags(&self) -> HaloCommTags {
        self.tags
    }

    fn check_neighbors(&self) -> Result<(), HaloError> {
        let size = self.comm.size();
        for rank in [self.neighbors.previous_rank, self.neighbors.next_rank] {
            if rank >= size {
                return Err(HaloError::InvalidTopology { rank, size });
            }
        }
        Ok(())
    }

    /// Refresh both halo regions of `field`.
    pub fn exchange<T: Pod>(
        &self,
        field: &mut HaloField<T>,
        halo_width: usize,
    ) -> Result<(), HaloError> {
        if halo_width != field.halo_width() {
            return Err(ConfigError::HaloWidthMismatch {
                field: field.halo_width(),
                requested: halo_width,
            }
            .into());
        }
        if halo_width >= field.local_length() {
            return Err(ConfigError::HaloTooWide {
                halo_width,
                local_length: field.local_length(),
            }
            .into());
        }
        self.check_neighbors()?;
        if halo_width == 0 {
            return Ok(());
        }

        let me = self.comm.rank();
        let NeighborPair {
            previous_rank,
            next_rank,
        } = self.neighbors;

        if self.neighbors.is_self(me) {
            log::trace!("[rank {me}] self exchange, width {halo_width}");
            field.wrap_self();
            field.debug_assert_invariants();
            return Ok(());
        }

        // toward previous: our low boundary -> previous; next's low boundary -> our high halo
        let mut incoming = vec![0u8; byte_len::<T>(halo_width)];
        log::trace!("[rank {me}] {halo_width} values to {previous_rank}, from {next_rank}");
        self.comm.sendrecv(
            previous_rank,
            cast_slice(field.low_boundary()),
            next_rank,
            &mut incoming,
            self.tags.to_previous,
        )?;
        decode_into(&incoming, field.region_mut(HaloRegion::HighHalo))
            .map_err(|e| HaloError::transport(next_rank, e))?;

        // toward next: our high boundary -> next; previous's high boundary -> our low halo
        log::trace!("[rank {me}] {halo_width} values to {next_rank}, from {previous_rank}");
        self.comm.sendrecv(
            next_rank,
            cast_slice(field.high_boundary()),
            previous_rank,
            &mut incoming,
            self.tags.to_next,
        )?;
        decode_into(&incoming, field.region_mut(HaloRegion::LowHalo))
            .map_err(|e| HaloError::transport(previous_rank, e))?;

        field.debug_assert_invariants();
        Ok(())
    }

    /// Refresh several fields with the same layout, one after another.
    ///
    /// Stops at the first error; fields after it are left untouched.
    pub fn exchange_all<T: Pod>(&self, fields: &mut [HaloField<T>]) -> Result<(), HaloError> {
        for field in fields.iter_mut() {
            let hw = field.halo_width();
            self.exchange(field, hw)?;
        }
        Ok(())
    }
}
