//! HaloField: a rank-local array with ghost cells on both ends.
//!
//! The buffer holds `local_length + 2 * halo_width` elements laid out as
//!
//! ```text
//! [ low halo | owned                     | high halo ]
//!   0..hw      hw..hw+L                    hw+L..L+2hw
//! ```
//!
//! The three ranges are computed once, at allocation, into a [`HaloLayout`].
//! The owning rank writes only the owned range; the halo ranges are written
//! only by [`crate::algs::halo_exchange`], which is why their mutable
//! accessors are crate-private.
//!
//! Code outside the crate cannot write a halo:
//!
//! ```compile_fail
//! use mesh_halo::data::halo_field::{HaloField, HaloRegion};
//! let mut f = HaloField::<f64>::allocate(4, 1).unwrap();
//! f.region_mut(HaloRegion::LowHalo)[0] = 1.0;
//! ```
//!
//! ```compile_fail
//! use mesh_halo::data::halo_field::HaloField;
//! let mut f = HaloField::<f64>::allocate(4, 1).unwrap();
//! f.clear_halos();
//! ```

use crate::algs::partition::Partition;
use crate::debug_invariants::DebugInvariants;
use crate::halo_error::{ConfigError, HaloError};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Names one of the three disjoint index ranges of a [`HaloField`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaloRegion {
    LowHalo,
    Owned,
    HighHalo,
}

/// Index ranges of a halo'd buffer.
///
/// # Invariants
/// - `halo_width < local_length`
/// - `low_halo`, `owned`, `high_halo` are adjacent, disjoint and cover
///   `0..local_length + 2 * halo_width`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HaloLayout {
    local_length: usize,
    halo_width: usize,
    low_halo: Range<usize>,
    owned: Range<usize>,
    high_halo: Range<usize>,
}

impl HaloLayout {
    /// # Errors
    /// `InvalidConfiguration(HaloTooWide)` unless `halo_width < local_length`.
    pub fn new(local_length: usize, halo_width: usize) -> Result<Self, HaloError> {
        if halo_width >= local_length {
            return Err(ConfigError::HaloTooWide {
                halo_width,
                local_length,
            }
            .into());
        }
        let owned_end = halo_width + local_length;
        Ok(Self {
            local_length,
            halo_width,
            low_halo: 0..halo_width,
            owned: halo_width..owned_end,
            high_halo: owned_end..owned_end + halo_width,
        })
    }

    #[inline]
    pub fn local_length(&self) -> usize {
        self.local_length
    }

    #[inline]
    pub fn halo_width(&self) -> usize {
        self.halo_width
    }

    /// Total buffer length, halos included.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.local_length + 2 * self.halo_width
    }

    #[inline]
    pub fn range(&self, region: HaloRegion) -> Range<usize> {
        match region {
            HaloRegion::LowHalo => self.low_halo.clone(),
            HaloRegion::Owned => self.owned.clone(),
            HaloRegion::HighHalo => self.high_halo.clone(),
        }
    }

    /// First `halo_width` owned indices: what the previous rank mirrors.
    pub fn low_boundary(&self) -> Range<usize> {
        self.owned.start..self.owned.start + self.halo_width
    }

    /// Last `halo_width` owned indices: what the next rank mirrors.
    pub fn high_boundary(&self) -> Range<usize> {
        self.owned.end - self.halo_width..self.owned.end
    }
}

impl DebugInvariants for HaloLayout {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HaloLayout");
    }

    fn validate_invariants(&self) -> Result<(), HaloError> {
        let rebuilt = HaloLayout::new(self.local_length, self.halo_width)?;
        if rebuilt != *self {
            return Err(ConfigError::HaloTooWide {
                halo_width: self.halo_width,
                local_length: self.local_length,
            }
            .into());
        }
        Ok(())
    }
}

/// Rank-local field storage with low and high ghost regions.
#[derive(Clone, Debug, PartialEq)]
pub struct HaloField<T> {
    layout: HaloLayout,
    data: Vec<T>,
    /// Global index of the first owned element, when built from a partition.
    global_start: Option<usize>,
}

impl<T: Copy + Zero> HaloField<T> {
    /// Allocate a zero-filled field.
    ///
    /// # Errors
    /// `InvalidConfiguration` unless `halo_width < local_length`.
    ///
    /// # Example
    /// ```rust
    /// use mesh_halo::data::halo_field::{HaloField, HaloRegion};
    /// let f = HaloField::<f64>::allocate(4, 2).unwrap();
    /// assert_eq!(f.as_slice().len(), 8);
    /// assert_eq!(f.layout().range(HaloRegion::Owned), 2..6);
    /// assert!(HaloField::<f64>::allocate(5, 5).is_err());
    /// ```
    pub fn allocate(local_length: usize, halo_width: usize) -> Result<Self, HaloError> {
        let layout = HaloLayout::new(local_length, halo_width)?;
        let data = vec![T::zero(); layout.total_len()];
        let field = Self {
            layout,
            data,
            global_start: None,
        };
        field.debug_assert_invariants();
        Ok(field)
    }

    /// Allocate a field sized for `part`'s owned slice.
    ///
    /// # Errors
    /// `InvalidConfiguration(InconsistentPartition)` if `part` is not the
    /// near-equal split it claims to be (e.g. hand-built or deserialized),
    /// plus the errors of [`HaloField::allocate`].
    pub fn for_partition(part: &Partition, halo_width: usize) -> Result<Self, HaloError> {
        part.validate_invariants()?;
        let mut field = Self::allocate(part.local_length(), halo_width)?;
        field.global_start = Some(part.global_start());
        Ok(field)
    }

    /// Set every owned element from its global index.
    ///
    /// Fields allocated without a partition number their owned cells from 0.
    pub fn fill_owned_with<F>(&mut self, mut f: F)
    where
        F: FnMut(usize) -> T,
    {
        let start = self.global_start.unwrap_or(0);
        for (i, v) in self.owned_mut().iter_mut().enumerate() {
            *v = f(start + i);
        }
    }

    /// Reset both halo regions to zero.
    pub(crate) fn clear_halos(&mut self) {
        self.region_mut(HaloRegion::LowHalo).fill(T::zero());
        self.region_mut(HaloRegion::HighHalo).fill(T::zero());
    }
}

impl<T> HaloField<T> {
    #[inline]
    pub fn layout(&self) -> &HaloLayout {
        &self.layout
    }

    #[inline]
    pub fn halo_width(&self) -> usize {
        self.layout.halo_width
    }

    #[inline]
    pub fn local_length(&self) -> usize {
        self.layout.local_length
    }

    #[inline]
    pub fn global_start(&self) -> Option<usize> {
        self.global_start
    }

    /// Read access to one region.
    #[inline]
    pub fn region(&self, region: HaloRegion) -> &[T] {
        &self.data[self.layout.range(region)]
    }

    #[inline]
    pub fn owned(&self) -> &[T] {
        self.region(HaloRegion::Owned)
    }

    #[inline]
    pub fn owned_mut(&mut self) -> &mut [T] {
        let r = self.layout.range(HaloRegion::Owned);
        &mut self.data[r]
    }

    #[inline]
    pub fn low_halo(&self) -> &[T] {
        self.region(HaloRegion::LowHalo)
    }

    #[inline]
    pub fn high_halo(&self) -> &[T] {
        self.region(HaloRegion::HighHalo)
    }

    /// The whole buffer, halos included, for stencil reads.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Owned values that the previous rank mirrors into its high halo.
    pub(crate) fn low_boundary(&self) -> &[T] {
        &self.data[self.layout.low_boundary()]
    }

    /// Owned values that the next rank mirrors into its low halo.
    pub(crate) fn high_boundary(&self) -> &[T] {
        &self.data[self.layout.high_boundary()]
    }

    /// Mutable access to any region; halo writes are reserved for the exchanger.
    pub(crate) fn region_mut(&mut self, region: HaloRegion) -> &mut [T] {
        let r = self.layout.range(region);
        &mut self.data[r]
    }

    /// Copy this rank's own boundaries into its own halos (one-rank ring).
    pub(crate) fn wrap_self(&mut self)
    where
        T: Copy,
    {
        let low = self.layout.low_boundary();
        let high = self.layout.high_boundary();
        let hi_halo = self.layout.range(HaloRegion::HighHalo);
        let lo_halo = self.layout.range(HaloRegion::LowHalo);
        // halos never overlap the owned range, so plain in-buffer copies suffice
        self.data.copy_within(low, hi_halo.start);
        self.data.copy_within(high, lo_halo.start);
    }
}

impl<T> DebugInvariants for HaloField<T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HaloField");
    }

    fn validate_invariants(&self) -> Result<(), HaloError> {
        self.layout.validate_invariants()?;
        if self.data.len() != self.layout.total_len() {
            return Err(ConfigError::HaloTooWide {
                halo_width: self.layout.halo_width,
                local_length: self.layout.local_length,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::partition::{GlobalDomain, partition};

    #[test]
    fn layout_ranges() {
        let l = HaloLayout::new(5, 2).unwrap();
        assert_eq!(l.range(HaloRegion::LowHalo), 0..2);
        assert_eq!(l.range(HaloRegion::Owned), 2..7);
        assert_eq!(l.range(HaloRegion::HighHalo), 7..9);
        assert_eq!(l.low_boundary(), 2..4);
        assert_eq!(l.high_boundary(), 5..7);
        assert_eq!(l.total_len(), 9);
    }

    #[test]
    fn halo_must_be_narrower_than_slice() {
        let err = HaloField::<f64>::allocate(5, 5).unwrap_err();
        assert_eq!(
            err,
            HaloError::InvalidConfiguration(ConfigError::HaloTooWide {
                halo_width: 5,
                local_length: 5
            })
        );
        assert!(HaloField::<f64>::allocate(0, 0).is_err());
        assert!(HaloField::<f64>::allocate(5, 4).is_ok());
    }

    #[test]
    fn zero_width_is_plain_array() {
        let f = HaloField::<i32>::allocate(3, 0).unwrap();
        assert_eq!(f.as_slice(), &[0, 0, 0]);
        assert!(f.low_halo().is_empty());
        assert!(f.high_halo().is_empty());
    }

    #[test]
    fn allocation_is_zeroed() {
        let f = HaloField::<f32>::allocate(6, 1).unwrap();
        assert!(f.as_slice().iter().all(|&v| v == 0.0));
        f.validate_invariants().unwrap();
    }

    #[test]
    fn fill_owned_uses_global_indices() {
        let p = partition(GlobalDomain::new(10), 3, 1).unwrap();
        let mut f = HaloField::<u64>::for_partition(&p, 1).unwrap();
        f.fill_owned_with(|g| g as u64);
        assert_eq!(f.as_slice(), &[0, 4, 5, 6, 0]);
        assert_eq!(f.global_start(), Some(4));
    }

    #[test]
    fn inconsistent_partition_is_rejected() {
        let bogus: Partition = serde_json::from_str(
            r#"{"rank":0,"process_count":1,"global_length":10,"local_length":3,"global_start":0}"#,
        )
        .unwrap();
        assert_eq!(
            HaloField::<f64>::for_partition(&bogus, 1).unwrap_err(),
            HaloError::InvalidConfiguration(ConfigError::InconsistentPartition { rank: 0 })
        );
    }

    #[test]
    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    #[should_panic(expected = "[invariants] HaloField")]
    fn corrupted_field_trips_invariant_check() {
        let mut f = HaloField::<i32>::allocate(4, 1).unwrap();
        f.data.pop();
        f.debug_assert_invariants();
    }

    #[test]
    fn wrap_self_mirrors_own_boundaries() {
        let mut f = HaloField::<i32>::allocate(4, 2).unwrap();
        f.owned_mut().copy_from_slice(&[1, 2, 3, 4]);
        f.wrap_self();
        assert_eq!(f.as_slice(), &[3, 4, 1, 2, 3, 4, 1, 2]);
        f.clear_halos();
        assert_eq!(f.as_slice(), &[0, 0, 1, 2, 3, 4, 0, 0]);
    }
}
