//! Extended JSON structures.
//!
//! The structure is stored as JSON text like [`JsonType`](super::json::JsonType),
//! but every leaf JSON cannot express (native arrays, custom values, nested
//! extended structures) is encoded as a separate value of the buffer and
//! replaced in the text by a marker object:
//!
//! ```text
//! {"\u0008": <value index>}
//! ```
//!
//! Markers are assigned breadth first. On decode each marker is resolved
//! through the [`DecodeContext`], so a referenced native array comes back as
//! a view into the input buffer.
use log::trace;
use serde_json::{Map, Value as JsonValue};

use super::{
    skeleton::{MARKER_KEY, Skeleton, from_json},
    text::{from_code_array, to_code_array},
};
use crate::{
    array::{ElementKind, TypedArray},
    dispatch::{DecodeContext, DecodeInput, EncodeContext, ReferenceId},
    error::{CodecError, CodecResult},
    registry::ValueType,
    value::Value,
};

/// Built-in type for structures with out-of-band leaves, registered under
/// [`EXTENDED_JSON`](crate::registry::EXTENDED_JSON).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedJsonType;

impl ValueType for ExtendedJsonType {
    fn element_kind(&self) -> ElementKind {
        ElementKind::Uint16
    }

    fn try_encode(
        &self,
        value: &Value,
        ctx: &mut EncodeContext<'_>,
    ) -> CodecResult<Option<TypedArray>> {
        let root = match value {
            Value::List(_) | Value::Map(_) => value,
            Value::Extended(inner) if inner.is_list() || inner.is_map() => inner.as_ref(),
            _ => return Ok(None),
        };

        let skeleton = Skeleton::extended(root, |leaf| ctx.record(leaf))?;
        let text = serde_json::to_string(&skeleton.into_json())?;
        trace!("Extended structure serialized to {} bytes of JSON", text.len());
        to_code_array(&text, ElementKind::Uint16).map(Some)
    }

    fn decode(&self, input: DecodeInput, ctx: &mut DecodeContext<'_>) -> CodecResult<Value> {
        let text = from_code_array(input.array())?;
        let json: JsonValue = serde_json::from_str(&text)?;
        from_json(json, |object| match marker(object)? {
            Some(reference) => ctx.resolve(reference).map(Some),
            None => Ok(None),
        })
    }
}

/// Reference held by a marker object, if `object` is one.
fn marker(object: &Map<String, JsonValue>) -> CodecResult<Option<ReferenceId>> {
    let Some(index) = object.get(MARKER_KEY) else {
        return Ok(None);
    };
    index
        .as_u64()
        .and_then(|index| u32::try_from(index).ok())
        .map(|index| Some(ReferenceId(index)))
        .ok_or_else(|| CodecError::malformed(format!("invalid value reference {index}")))
}
