//! Re-export public algorithms.

pub mod communicator;
pub mod decomposition;
pub mod halo_exchange;
pub mod partition;
pub mod wire;

pub use decomposition::Decomposition;
pub use halo_exchange::{HaloExchanger, exchange};
pub use partition::{GlobalDomain, Partition, partition, partition_all};
