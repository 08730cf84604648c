//! Plain JSON structures.
//!
//! Lists and maps whose leaves are all scalars are serialized to JSON text
//! and stored as UTF-16 code units. Structures holding arrays or custom
//! values are left to the extended type.
use smallvec::{SmallVec, smallvec};

use super::{
    skeleton::{Skeleton, from_json},
    text::{from_code_array, to_code_array},
};
use crate::{
    array::{ElementKind, TypedArray},
    dispatch::{DecodeContext, DecodeInput, EncodeContext},
    error::CodecResult,
    registry::ValueType,
    value::Value,
};

/// Built-in type for plain structures, registered under
/// [`JSON`](crate::registry::JSON).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonType;

impl ValueType for JsonType {
    fn element_kind(&self) -> ElementKind {
        ElementKind::Uint16
    }

    fn try_encode(
        &self,
        value: &Value,
        _ctx: &mut EncodeContext<'_>,
    ) -> CodecResult<Option<TypedArray>> {
        if !(value.is_list() || value.is_map()) || !is_plain(value) {
            return Ok(None);
        }
        let text = serde_json::to_string(&Skeleton::plain(value)?.into_json())?;
        to_code_array(&text, ElementKind::Uint16).map(Some)
    }

    fn decode(&self, input: DecodeInput, _ctx: &mut DecodeContext<'_>) -> CodecResult<Value> {
        let text = from_code_array(input.array())?;
        from_json(serde_json::from_str(&text)?, |_| Ok(None))
    }
}

/// Whether `value` is made of lists, maps and scalars only.
pub fn is_plain(value: &Value) -> bool {
    let mut stack: SmallVec<[&Value; 16]> = smallvec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
            Value::List(items) => stack.extend(items),
            Value::Map(entries) => stack.extend(entries.values()),
            Value::Array(_) | Value::Extended(_) | Value::Custom(_) => return false,
        }
    }
    true
}
