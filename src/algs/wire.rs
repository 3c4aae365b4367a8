//! Byte views of halo payloads.
//!
//! Halo messages are raw arrays of `Pod` elements whose length both sides
//! agree on ahead of time (the halo width), so there is no header on the
//! wire. Payloads use the native byte order of the sending host.

use bytemuck::Pod;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Number of bytes `count` elements of `T` occupy on the wire.
#[inline]
pub fn byte_len<T: Pod>(count: usize) -> usize {
    count * std::mem::size_of::<T>()
}

/// Copy a received payload into `out`.
///
/// The destination is reinterpreted rather than the source, so a payload
/// with arbitrary alignment (e.g. a `Vec<u8>` from the transport) is fine.
pub fn decode_into<T: Pod>(payload: &[u8], out: &mut [T]) -> Result<(), String> {
    expect_exact_len(payload.len(), byte_len::<T>(out.len()))?;
    cast_slice_mut(out).copy_from_slice(payload);
    Ok(())
}
