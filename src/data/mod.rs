//! Data module: rank-local field storage

pub mod halo_field;

pub use halo_field::{HaloField, HaloLayout, HaloRegion};
