#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-halo
//!
//! mesh-halo splits a 1-D structured mesh across the ranks of a
//! message-passing job and keeps per-rank ghost (halo) cells in sync with the
//! data owned by each rank's neighbours.
//!
//! ## Features
//! - Near-equal contiguous partitioning of any domain length over any number of ranks
//! - Cyclic ring topology (rank 0 and rank P-1 are neighbours)
//! - Halo'd field storage with named low-halo / owned / high-halo ranges
//! - Deadlock-free two-direction halo exchange, including the one-rank self-exchange
//! - Pluggable communication backends (serial, threaded in-process, MPI)
//!
//! ## Usage
//!
//! ```rust
//! # fn try_main() -> Result<(), mesh_halo::halo_error::HaloError> {
//! use mesh_halo::prelude::*;
//!
//! let cfg = DecompositionConfig { global_length: 12, halo_width: 2, ..Default::default() };
//! let halos = ThreadComm::run(3, |comm| -> Result<Vec<f64>, HaloError> {
//!     let decomp = Decomposition::new(&comm, &cfg)?;
//!     let mut field = decomp.allocate_field::<f64>()?;
//!     field.fill_owned_with(|g| g as f64);
//!     decomp.exchange(&mut field)?;
//!     Ok(field.low_halo().to_vec())
//! });
//! // rank 0 mirrors the last two points of rank 2
//! assert_eq!(halos[0].as_ref().unwrap(), &vec![10.0, 11.0]);
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```
//!
//! Enable the `mpi-support` feature for [`algs::communicator::MpiComm`] and
//! run under `cargo mpirun`.

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod halo_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{
        CommTag, Communicator, HaloCommTags, NoComm, ThreadComm, Wait,
    };
    pub use crate::algs::decomposition::Decomposition;
    pub use crate::algs::halo_exchange::{HaloExchanger, exchange};
    pub use crate::algs::partition::{
        GlobalDomain, Partition, owner_of, partition, partition_all, verify_partition,
    };
    pub use crate::config::DecompositionConfig;
    pub use crate::data::halo_field::{HaloField, HaloLayout, HaloRegion};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::halo_error::{ConfigError, HaloError};
    pub use crate::topology::ring::{NeighborPair, neighbors};
}
