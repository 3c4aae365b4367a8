//! Process topology.
//!
//! The decomposition arranges ranks on a ring: every rank exchanges halos
//! with its predecessor and successor, wrapping from the last rank to the
//! first.

pub mod ring;

pub use ring::{NeighborPair, neighbors};
