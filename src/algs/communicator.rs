//! Thin façade over in-process (threaded) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices*; every backend copies them, so no
//! rank ever observes another rank's memory. Point-to-point handles are
//! **waitable**, and [`Communicator::sendrecv`] waits on both before it
//! hands a payload to `halo_exchange.rs`. Delivery between an ordered pair
//! of ranks on one tag is FIFO.
//!
//! Besides point-to-point traffic a transport offers the two collectives the
//! decomposition needs: a sum reduction (to verify the split) and a barrier.
//! The handle is explicit; there is no process-wide communicator singleton.

use crate::algs::wire::expect_exact_len;
use crate::halo_error::HaloError;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Typed message tag.
///
/// MPI only guarantees tags up to 32767 (`MPI_TAG_UB`); keep halo tags
/// below that when running on `MpiComm`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(v: u16) -> Self {
        CommTag(v)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `k` slots above this one (wrapping).
    pub const fn offset(self, k: u16) -> Self {
        CommTag(self.0.wrapping_add(k))
    }
}

/// Tags for the two directions of a halo exchange.
///
/// Distinct tags keep the directions apart when both neighbours are the same
/// peer (two ranks).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HaloCommTags {
    /// Low boundary travelling to the previous rank's high halo.
    pub to_previous: CommTag,
    /// High boundary travelling to the next rank's low halo.
    pub to_next: CommTag,
}

impl HaloCommTags {
    pub const DEFAULT_BASE: CommTag = CommTag(0x4A10);

    pub const fn from_base(base: CommTag) -> Self {
        Self {
            to_previous: base,
            to_next: base.offset(1),
        }
    }
}

impl Default for HaloCommTags {
    fn default() -> Self {
        Self::from_base(Self::DEFAULT_BASE)
    }
}

/// Message-passing interface used by the decomposition core.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Post a send of `buf` to `peer`. The buffer is copied before returning.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive from `peer`; `buf` gives the expected size and the
    /// payload is handed back by [`Wait::wait`].
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Sum `value` over all ranks; every rank gets the total.
    fn allreduce_sum(&self, value: u64) -> Result<u64, HaloError>;
    /// Block until every rank has entered the barrier.
    fn barrier(&self) -> Result<(), HaloError>;

    /// Send `send` to `dest` and receive exactly `recv.len()` bytes from
    /// `source` on the same tag, without a circular wait between ring
    /// neighbours: the receive is posted before the send.
    fn sendrecv(
        &self,
        dest: usize,
        send: &[u8],
        source: usize,
        recv: &mut [u8],
        tag: CommTag,
    ) -> Result<(), HaloError> {
        let rx = self.irecv(source, tag.as_u16(), recv);
        let tx = self.isend(dest, tag.as_u16(), send);
        let got = rx.wait();
        // always drain the send before reporting
        let _ = tx.wait();
        match got {
            Some(data) => {
                expect_exact_len(data.len(), recv.len())
                    .map_err(|e| HaloError::transport(source, e))?;
                recv.copy_from_slice(&data);
                Ok(())
            }
            None => Err(HaloError::transport(
                source,
                format!("no data received on tag {:#06x}", tag.as_u16()),
            )),
        }
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-process communicator: rank 0 of 1.
///
/// Point-to-point calls are no-ops that never yield data; with one rank the
/// exchanger never issues them.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn allreduce_sum(&self, value: u64) -> Result<u64, HaloError> {
        Ok(value)
    }

    fn barrier(&self) -> Result<(), HaloError> {
        Ok(())
    }
}

// --- ThreadComm: one OS thread per rank inside a single process ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
    posted: Mutex<u64>,
    arrived: Condvar,
}

impl Mailbox {
    fn post(&self, key: Key, payload: Bytes) {
        self.slots.entry(key).or_default().push_back(payload);
        let mut posted = self.posted.lock();
        *posted = posted.wrapping_add(1);
        self.arrived.notify_all();
    }

    fn try_take(&self, key: &Key) -> Option<Bytes> {
        self.slots.get_mut(key)?.pop_front()
    }

    fn take(&self, key: Key) -> Bytes {
        loop {
            if let Some(payload) = self.try_take(&key) {
                return payload;
            }
            let mut posted = self.posted.lock();
            // re-check under the lock so a post between the two checks is not missed
            if let Some(payload) = self.try_take(&key) {
                return payload;
            }
            let seen = *posted;
            while *posted == seen {
                self.arrived.wait(&mut posted);
            }
        }
    }
}

#[derive(Default)]
struct ReduceState {
    arrived: usize,
    generation: u64,
    acc: u64,
    result: u64,
}

#[derive(Default)]
struct Collective {
    state: Mutex<ReduceState>,
    done: Condvar,
}

impl Collective {
    fn sum(&self, size: usize, value: u64) -> u64 {
        let mut st = self.state.lock();
        let generation = st.generation;
        st.acc = st.acc.wrapping_add(value);
        st.arrived += 1;
        if st.arrived == size {
            st.result = st.acc;
            st.acc = 0;
            st.arrived = 0;
            st.generation = st.generation.wrapping_add(1);
            self.done.notify_all();
            return st.result;
        }
        // `result` cannot be overwritten before we read it: the next
        // generation needs this rank to arrive first.
        while st.generation == generation {
            self.done.wait(&mut st);
        }
        st.result
    }
}

struct ThreadUniverse {
    size: usize,
    mailbox: Mailbox,
    collective: Collective,
}

/// In-process communicator: every rank runs on its own thread and shares
/// nothing with its peers but copied message payloads.
///
/// Build a set with [`ThreadComm::universe`] or run a closure on every rank
/// with [`ThreadComm::run`]. A rank that stops participating leaves its
/// peers blocked, exactly as it would under MPI.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    shared: Arc<ThreadUniverse>,
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .finish()
    }
}

impl ThreadComm {
    /// One communicator per rank, all attached to the same universe.
    pub fn universe(size: usize) -> Vec<ThreadComm> {
        let shared = Arc::new(ThreadUniverse {
            size,
            mailbox: Mailbox::default(),
            collective: Collective::default(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Run `f` on `size` ranks concurrently and return the results in rank order.
    ///
    /// A panic on any rank is re-raised on the caller once all threads are joined.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(ThreadComm) -> R + Sync,
    {
        let comms = Self::universe(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    scope.spawn(move || f(comm))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(r) => r,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

pub struct ThreadRecvHandle {
    shared: Arc<ThreadUniverse>,
    key: Key,
}

impl Wait for ThreadRecvHandle {
    /// Returns the whole message; callers check its length.
    fn wait(self) -> Option<Vec<u8>> {
        Some(self.shared.mailbox.take(self.key).to_vec())
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = ThreadRecvHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        debug_assert!(peer < self.shared.size, "send to rank {peer} outside universe");
        self.shared
            .mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> ThreadRecvHandle {
        debug_assert!(peer < self.shared.size, "receive from rank {peer} outside universe");
        ThreadRecvHandle {
            shared: Arc::clone(&self.shared),
            key: (peer, self.rank, tag),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn allreduce_sum(&self, value: u64) -> Result<u64, HaloError> {
        Ok(self.shared.collective.sum(self.shared.size, value))
    }

    fn barrier(&self) -> Result<(), HaloError> {
        self.shared.collective.sum(self.shared.size, 0);
        Ok(())
    }
}

static_assertions::assert_impl_all!(ThreadComm: Send, Sync);

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{CommTag, Communicator, HaloError, Wait, expect_exact_len};
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{
        Communicator as _, CommunicatorCollectives, Destination, Equivalence, Source,
    };

    /// Communicator over `MPI_COMM_WORLD`.
    ///
    /// Owns the MPI universe when it initialised MPI itself; dropping it then
    /// finalises MPI, so create one per program and keep it alive.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        _universe: Option<Universe>,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, HaloError> {
            let (world, universe) = match mpi::initialize() {
                Some(universe) => (universe.world(), Some(universe)),
                None => (SimpleCommunicator::world(), None),
            };
            let rank = usize::try_from(world.rank())
                .map_err(|_| HaloError::transport(0, "MPI reported a negative rank"))?;
            let size = usize::try_from(world.size())
                .map_err(|_| HaloError::transport(0, "MPI reported a negative size"))?;
            Ok(Self {
                world,
                _universe: universe,
                rank,
                size,
            })
        }

        /// Name of the processor this rank runs on.
        pub fn processor_name(&self) -> String {
            mpi::environment::processor_name().unwrap_or_default()
        }
    }

    /// Sends complete eagerly in `isend`.
    pub struct MpiSendHandle;

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            None
        }
    }

    /// The receive is performed when the handle is waited on.
    pub struct MpiRecvHandle {
        peer: i32,
        tag: i32,
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let world = SimpleCommunicator::world();
            let (data, _status) = world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        /// Standard-mode blocking send; prefer [`Communicator::sendrecv`] for
        /// symmetric patterns.
        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
            MpiSendHandle
        }

        fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> MpiRecvHandle {
            MpiRecvHandle {
                peer: peer as i32,
                tag: i32::from(tag),
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn allreduce_sum(&self, value: u64) -> Result<u64, HaloError> {
            let mut total = 0u64;
            self.world
                .all_reduce_into(&value, &mut total, SystemOperation::sum());
            Ok(total)
        }

        fn barrier(&self) -> Result<(), HaloError> {
            self.world.barrier();
            Ok(())
        }

        fn sendrecv(
            &self,
            dest: usize,
            send: &[u8],
            source: usize,
            recv: &mut [u8],
            tag: CommTag,
        ) -> Result<(), HaloError> {
            let tag = i32::from(tag.as_u16());
            let status = mpi::point_to_point::send_receive_into_with_tags(
                send,
                &self.world.process_at_rank(dest as i32),
                tag,
                recv,
                &self.world.process_at_rank(source as i32),
                tag,
            );
            let got = status.count(u8::equivalent_datatype()) as usize;
            expect_exact_len(got, recv.len()).map_err(|e| HaloError::transport(source, e))
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
