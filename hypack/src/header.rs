//! Buffer header.
//!
//! Layout, each field aligned to its own element size:
//!
//! ```text
//! u32        total value count N
//! u32        primary value count P (P <= N)
//! u32 x N    element count of each value
//! u16 x N    type code of each value
//! ...        value bodies, each aligned to its element size
//! ```
//!
//! Body offsets are not stored; they follow from the lengths, the type
//! codes and the element size the registry gives each code.
use bytes::Bytes;

use crate::{
    array::{ElementKind, TypedArray},
    dispatch::EncodedValue,
    error::{CodecError, CodecResult},
    layout::{Layout, unpack},
    registry::{TypeCode, TypeRegistry},
};

/// Decoded header of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub total: usize,
    pub primary_count: usize,
    pub lengths: Vec<u32>,
    pub types: Vec<TypeCode>,
    /// Byte offset of every value body.
    pub offsets: Vec<usize>,
    /// End of the metadata block.
    pub metadata_length: usize,
    /// End of the last value body.
    pub byte_length: usize,
}

/// Build the four header fields for `primary` followed by `extra`.
pub fn encode_header(
    primary: &[EncodedValue],
    extra: &[EncodedValue],
) -> CodecResult<[TypedArray; 4]> {
    let total = primary.len() + extra.len();
    let mut lengths = Vec::with_capacity(total);
    let mut types = Vec::with_capacity(total);

    for encoded in primary.iter().chain(extra) {
        let length = u32::try_from(encoded.array.len()).map_err(|_| {
            CodecError::CapacityExceeded(format!(
                "{} elements do not fit a u32 length",
                encoded.array.len()
            ))
        })?;
        lengths.push(length);
        types.push(encoded.code);
    }

    let count = |n: usize| {
        u32::try_from(n)
            .map_err(|_| CodecError::CapacityExceeded(format!("{n} values do not fit a u32 count")))
    };

    Ok([
        TypedArray::from([count(total)?]),
        TypedArray::from([count(primary.len())?]),
        TypedArray::from(lengths),
        TypedArray::from(types),
    ])
}

/// Parse the header of `buffer` and lay out its value bodies.
pub fn decode_header(buffer: &Bytes, registry: &TypeRegistry) -> CodecResult<Header> {
    let Some(total) = buffer.get(..4) else {
        return Err(CodecError::malformed(format!(
            "{} bytes cannot hold a value count",
            buffer.len()
        )));
    };
    let total = u32::from_le_bytes([total[0], total[1], total[2], total[3]]) as usize;

    let metadata = unpack(
        buffer,
        &[
            (ElementKind::Uint32, 1),
            (ElementKind::Uint32, 1),
            (ElementKind::Uint32, total),
            (ElementKind::Uint16, total),
        ],
    )?;
    let [_, primary_count, lengths, types] = metadata.arrays.as_slice() else {
        return Err(CodecError::malformed("incomplete metadata block"));
    };

    let primary_count = primary_count.get::<u32>(0).unwrap_or_default() as usize;
    let lengths = lengths.to_vec::<u32>().unwrap_or_default();
    let types = types.to_vec::<u16>().unwrap_or_default();

    if primary_count > total {
        return Err(CodecError::malformed(format!(
            "{primary_count} primary values declared out of {total}"
        )));
    }

    let sizes = types
        .iter()
        .map(|code| registry.byte_size(*code))
        .collect::<CodecResult<Vec<_>>>()?;
    let bodies = Layout::compute(
        sizes
            .into_iter()
            .zip(lengths.iter().map(|length| *length as usize)),
        metadata.byte_length,
    );

    if bodies.byte_length > buffer.len() {
        return Err(CodecError::malformed(format!(
            "header describes {} bytes but the buffer holds {}",
            bodies.byte_length,
            buffer.len()
        )));
    }

    Ok(Header {
        total,
        primary_count,
        lengths,
        types,
        offsets: bodies.offsets,
        metadata_length: metadata.byte_length,
        byte_length: bodies.byte_length,
    })
}
