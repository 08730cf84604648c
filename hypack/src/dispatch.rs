//! Per-value dispatch and the reference contexts threaded through it.
//!
//! Encoding a value picks its type code: native arrays are matched by kind,
//! anything else is offered to the registered types in ascending code order.
//! A type that stores sub-values out of band records them in the
//! [`EncodeContext`], which appends them to the extra-values pool and hands
//! back a [`ReferenceId`]. Decoding goes the other way: the code is looked up
//! directly and references are resolved through the [`DecodeContext`].
use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use log::trace;

use crate::{
    array::{ElementKind, TypedArray},
    error::{CodecError, CodecResult},
    header::Header,
    registry::{TypeCode, TypeEntry, TypeRegistry},
    value::Value,
};

/// Index of a value in the combined primary + extra value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceId(pub u32);

impl ReferenceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A value converted to its wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedValue {
    pub code: TypeCode,
    pub array: TypedArray,
}

/// State of one encode call: the registry and the extra-values pool.
pub struct EncodeContext<'r> {
    registry: &'r TypeRegistry,
    // Number of primary values; extra values are numbered after them.
    start_index: usize,
    extra: Vec<EncodedValue>,
}

impl<'r> EncodeContext<'r> {
    pub fn new(registry: &'r TypeRegistry, start_index: usize) -> Self {
        Self {
            registry,
            start_index,
            extra: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Encode `value` without storing it.
    pub fn encode(&mut self, value: &Value) -> CodecResult<EncodedValue> {
        let registry = self.registry;
        registry.encode_value(value, self)
    }

    /// Encode `value` into the extra-values pool and return its reference.
    ///
    /// Values recorded while encoding `value` land in the pool before it.
    pub fn record(&mut self, value: &Value) -> CodecResult<ReferenceId> {
        let encoded = self.encode(value)?;
        self.extra.push(encoded);
        let index = self.start_index + self.extra.len() - 1;
        u32::try_from(index)
            .map(ReferenceId)
            .map_err(|_| CodecError::CapacityExceeded(format!("value index {index} exceeds u32")))
    }

    pub fn extra(&self) -> &[EncodedValue] {
        &self.extra
    }

    pub fn into_extra(self) -> Vec<EncodedValue> {
        self.extra
    }
}

/// Body of one value handed to [`ValueType::decode`](crate::registry::ValueType::decode).
#[derive(Debug, Clone)]
pub struct DecodeInput {
    pub code: TypeCode,
    pub index: usize,
    /// Byte offset of the body in the buffer.
    pub offset: usize,
    array: TypedArray,
}

impl DecodeInput {
    pub fn new(code: TypeCode, index: usize, offset: usize, array: TypedArray) -> Self {
        Self {
            code,
            index,
            offset,
            array,
        }
    }

    /// The body viewed with the type's declared element kind.
    pub fn array(&self) -> &TypedArray {
        &self.array
    }

    pub fn into_array(self) -> TypedArray {
        self.array
    }

    /// Number of elements stored in the header.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The same bytes viewed as another element kind, without copying.
    pub fn view_as(&self, kind: ElementKind) -> CodecResult<TypedArray> {
        TypedArray::from_bytes(kind, self.array.bytes().clone())
    }
}

/// State of one decode call.
///
/// Resolved references are memoized, so a value referenced from several
/// places is decoded once and cloned.
pub struct DecodeContext<'a> {
    registry: &'a TypeRegistry,
    buffer: &'a Bytes,
    header: &'a Header,
    resolved: HashMap<usize, Value>,
    in_progress: HashSet<usize>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(registry: &'a TypeRegistry, buffer: &'a Bytes, header: &'a Header) -> Self {
        Self {
            registry,
            buffer,
            header,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn buffer(&self) -> &'a Bytes {
        self.buffer
    }

    pub fn header(&self) -> &'a Header {
        self.header
    }

    /// Decode the value a reference points to.
    pub fn resolve(&mut self, reference: ReferenceId) -> CodecResult<Value> {
        let index = reference.index();
        if let Some(value) = self.resolved.get(&index) {
            return Ok(value.clone());
        }
        let value = self.decode(index)?;
        self.resolved.insert(index, value.clone());
        Ok(value)
    }

    /// Decode value `index` without memoizing it.
    pub fn decode(&mut self, index: usize) -> CodecResult<Value> {
        if !self.in_progress.insert(index) {
            return Err(CodecError::malformed(format!(
                "value {index} references itself"
            )));
        }
        let registry = self.registry;
        let value = registry.decode_value(index, self);
        self.in_progress.remove(&index);
        value
    }
}

impl TypeRegistry {
    /// Pick the type of `value` and encode it.
    pub fn encode_value(
        &self,
        value: &Value,
        ctx: &mut EncodeContext<'_>,
    ) -> CodecResult<EncodedValue> {
        if let Value::Array(array) = value {
            return match self.native_code(array.kind()) {
                Some(code) => Ok(EncodedValue {
                    code,
                    array: array.clone(),
                }),
                None => Err(CodecError::UnencodableValue {
                    kind: array.kind().into(),
                }),
            };
        }

        for (code, ty) in self.encode_order() {
            let Some(array) = ty.try_encode(value, ctx)? else {
                continue;
            };
            if array.kind() != ty.element_kind() {
                return Err(CodecError::ElementKindMismatch {
                    code: *code,
                    expected: ty.element_kind(),
                    found: array.kind(),
                });
            }
            trace!(
                "Encoded {} as type {} ({} elements)",
                value.kind_name(),
                code,
                array.len()
            );
            return Ok(EncodedValue { code: *code, array });
        }

        Err(CodecError::UnencodableValue {
            kind: value.kind_name(),
        })
    }

    /// Decode value `index` of the buffer held by `ctx`.
    pub fn decode_value(&self, index: usize, ctx: &mut DecodeContext<'_>) -> CodecResult<Value> {
        let header = ctx.header();
        let (Some(&code), Some(&length), Some(&offset)) = (
            header.types.get(index),
            header.lengths.get(index),
            header.offsets.get(index),
        ) else {
            return Err(CodecError::malformed(format!(
                "reference to value {index} but the buffer holds {}",
                header.total
            )));
        };

        let entry = self.get(code).ok_or(CodecError::UnknownTypeCode(code))?;
        let kind = entry.element_kind();
        let end = (length as usize)
            .checked_mul(kind.byte_size())
            .and_then(|size| offset.checked_add(size))
            .filter(|end| *end <= ctx.buffer().len())
            .ok_or_else(|| {
                CodecError::malformed(format!(
                    "value {index} runs past the buffer end {}",
                    ctx.buffer().len()
                ))
            })?;
        let array = TypedArray::from_bytes(kind, ctx.buffer().slice(offset..end))?;

        match entry {
            TypeEntry::Native(_) => Ok(Value::Array(array)),
            TypeEntry::Registered(ty) => {
                ty.decode(DecodeInput::new(code, index, offset, array), ctx)
            }
        }
    }
}
