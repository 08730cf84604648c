//! Byte layout of packed arrays.
//!
//! Every entry starts at the next multiple of its own element size; there is
//! no global alignment. The same computation lays out the header fields and
//! the value bodies, so a buffer can be walked knowing only
//! `(element size, element count)` pairs.
//!
//! Example
//! ```
//! use hypack::layout::Layout;
//!
//! // u8 x 1, u16 x 1, u32 x 1
//! let layout = Layout::compute([(1, 1), (2, 1), (4, 1)], 0);
//! assert_eq!(layout.offsets, [0, 2, 4]);
//! assert_eq!(layout.byte_length, 8);
//! ```
use bytes::{Bytes, BytesMut};

use crate::{
    array::{ElementKind, TypedArray},
    error::{CodecError, CodecResult},
};

/// Offsets produced by [`Layout::compute`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    /// Start of each entry, in input order.
    pub offsets: Vec<usize>,
    /// Cursor after the last entry.
    pub byte_length: usize,
}

impl Layout {
    /// Lay out `(element_size, element_count)` entries starting at `start`.
    ///
    /// An element size of zero is treated as one. Arithmetic saturates, so
    /// absurd counts read from a hostile header produce a length that no
    /// buffer can satisfy instead of wrapping around.
    pub fn compute(entries: impl IntoIterator<Item = (usize, usize)>, start: usize) -> Self {
        let entries = entries.into_iter();
        let mut offsets = Vec::with_capacity(entries.size_hint().0);
        let mut cursor = start;

        for (element_size, count) in entries {
            let element_size = element_size.max(1);
            let misalignment = cursor % element_size;
            if misalignment != 0 {
                cursor = cursor.saturating_add(element_size - misalignment);
            }
            offsets.push(cursor);
            cursor = cursor.saturating_add(element_size.saturating_mul(count));
        }

        Self {
            offsets,
            byte_length: cursor,
        }
    }
}

/// Copy `arrays` into one buffer laid out from offset zero.
pub fn pack<'a>(arrays: impl IntoIterator<Item = &'a TypedArray>) -> Bytes {
    let arrays: Vec<&TypedArray> = arrays.into_iter().collect();
    let layout = Layout::compute(
        arrays
            .iter()
            .map(|array| (array.kind().byte_size(), array.len())),
        0,
    );

    let mut buffer = BytesMut::zeroed(layout.byte_length);
    for (array, offset) in arrays.iter().zip(&layout.offsets) {
        buffer[*offset..*offset + array.byte_len()].copy_from_slice(array.as_bytes());
    }
    buffer.freeze()
}

/// Result of [`unpack`].
#[derive(Debug, Clone)]
pub struct Unpacked {
    pub arrays: Vec<TypedArray>,
    /// Bytes covered by the unpacked entries, including padding.
    pub byte_length: usize,
}

/// Read `(kind, length)` entries laid out from offset zero. The returned
/// arrays share `buffer`.
pub fn unpack(buffer: &Bytes, entries: &[(ElementKind, usize)]) -> CodecResult<Unpacked> {
    let layout = Layout::compute(
        entries
            .iter()
            .map(|(kind, length)| (kind.byte_size(), *length)),
        0,
    );
    if layout.byte_length > buffer.len() {
        return Err(CodecError::malformed(format!(
            "expected at least {} bytes, found {}",
            layout.byte_length,
            buffer.len()
        )));
    }

    let arrays = entries
        .iter()
        .zip(&layout.offsets)
        .map(|((kind, length), offset)| {
            let end = offset + kind.byte_size() * length;
            TypedArray::from_bytes(*kind, buffer.slice(*offset..end))
        })
        .collect::<CodecResult<Vec<_>>>()?;

    Ok(Unpacked {
        arrays,
        byte_length: layout.byte_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_without_start() {
        let layout = Layout::compute([(1, 1), (2, 1), (4, 1)], 0);
        assert_eq!(layout.offsets, [0, 2, 4]);
        assert_eq!(layout.byte_length, 8);
    }

    #[test]
    fn offsets_with_start() {
        let layout = Layout::compute([(1, 5), (8, 5)], 3);
        assert_eq!(layout.offsets, [3, 8]);
        assert_eq!(layout.byte_length, 48);

        let layout = Layout::compute([(1, 5), (8, 5)], 4);
        assert_eq!(layout.offsets, [4, 16]);
        assert_eq!(layout.byte_length, 56);
    }

    #[test]
    fn empty_entries_still_pad() {
        let layout = Layout::compute([(1, 3), (8, 0), (1, 1)], 0);
        assert_eq!(layout.offsets, [0, 8, 8]);
        assert_eq!(layout.byte_length, 9);
    }

    #[test]
    fn saturates_on_huge_counts() {
        let layout = Layout::compute([(8, usize::MAX), (4, 1)], 0);
        assert_eq!(layout.byte_length, usize::MAX);
    }

    #[test]
    fn pack_then_unpack_every_kind() {
        let arrays = [
            TypedArray::from([1i8, 2]),
            TypedArray::from([3i16, 4, 5]),
            TypedArray::from([6i32, 7, 8, 9]),
            TypedArray::from([10i64, 11]),
            TypedArray::from([12u8, 13, 14, 15, 16, 17, 18, 19, 20]),
            TypedArray::from([21u16]),
            TypedArray::zeroed(ElementKind::Uint32, 9),
            TypedArray::from([31u64]),
            TypedArray::uint8_clamped(&[]),
            TypedArray::from([32f32, 33.33]),
            TypedArray::from([std::f64::consts::PI]),
        ];

        let buffer = pack(&arrays);
        let entries: Vec<_> = arrays.iter().map(|a| (a.kind(), a.len())).collect();
        let unpacked = unpack(&buffer, &entries).unwrap();

        assert_eq!(unpacked.arrays, arrays);
        assert_eq!(unpacked.byte_length, buffer.len());
    }

    #[test]
    fn unpack_short_buffer_fails() {
        let buffer = pack(&[TypedArray::from([1u32, 2])]);
        let err = unpack(&buffer, &[(ElementKind::Uint32, 3)]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBuffer(_)));
    }
}
