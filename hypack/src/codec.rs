//! Whole-buffer encode and decode.
use bytes::Bytes;
use log::trace;

use crate::{
    dispatch::{DecodeContext, EncodeContext, EncodedValue},
    error::{CodecError, CodecResult},
    header::{Header, decode_header, encode_header},
    layout::pack,
    registry::{TypeConfig, TypeRegistry},
    value::Value,
};

/// Packs a list of values into one self-describing buffer and back.
///
/// ```rust
/// use hypack::{Codec, TypeConfig, TypedArray, Value};
///
/// let mut codec = Codec::new();
/// codec.add_types([TypeConfig::text()]);
///
/// let values = vec![Value::from("hello"), TypedArray::from([1.5f64, 2.5]).into()];
/// let buffer = codec.encode(&values).unwrap();
/// assert_eq!(codec.decode(&buffer).unwrap(), values);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Codec {
    registry: TypeRegistry,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    /// A codec for native arrays only.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
        }
    }

    pub fn with_configs(configs: impl IntoIterator<Item = TypeConfig>) -> Self {
        Self {
            registry: TypeRegistry::with_configs(configs),
        }
    }

    pub fn from_registry(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// See [`TypeRegistry::set_types`].
    pub fn set_types(&mut self, configs: impl IntoIterator<Item = TypeConfig>) {
        self.registry.set_types(configs);
    }

    /// See [`TypeRegistry::add_types`].
    pub fn add_types(&mut self, configs: impl IntoIterator<Item = TypeConfig>) {
        self.registry.add_types(configs);
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Encode `values` as the primary values of a new buffer.
    ///
    /// Fails without output if any value, or any sub-value recorded while
    /// encoding it, has no matching type.
    pub fn encode(&self, values: &[Value]) -> CodecResult<Bytes> {
        let mut ctx = EncodeContext::new(&self.registry, values.len());
        let primary = values
            .iter()
            .map(|value| ctx.encode(value))
            .collect::<CodecResult<Vec<EncodedValue>>>()?;
        let extra = ctx.into_extra();

        let header = encode_header(&primary, &extra)?;
        let buffer = pack(
            header
                .iter()
                .chain(primary.iter().chain(&extra).map(|encoded| &encoded.array)),
        );

        trace!(
            "Encoded {} primary and {} extra values into {} bytes",
            primary.len(),
            extra.len(),
            buffer.len()
        );
        Ok(buffer)
    }

    /// Decode the primary values of `buffer`.
    ///
    /// Extra values are materialized only when a primary value references
    /// them. Native arrays are returned as views into `buffer`.
    pub fn decode(&self, buffer: &Bytes) -> CodecResult<Vec<Value>> {
        let header = self.decode_header(buffer)?;
        let mut ctx = DecodeContext::new(&self.registry, buffer, &header);
        let values = (0..header.primary_count)
            .map(|index| ctx.decode(index))
            .collect::<CodecResult<Vec<_>>>()?;

        trace!(
            "Decoded {} of {} values from {} bytes",
            values.len(),
            header.total,
            buffer.len()
        );
        Ok(values)
    }

    pub fn decode_header(&self, buffer: &Bytes) -> CodecResult<Header> {
        decode_header(buffer, &self.registry)
    }

    /// Decode the single value `index` of `buffer`, primary or extra.
    pub fn decode_value(&self, buffer: &Bytes, index: usize) -> CodecResult<Value> {
        let header = self.decode_header(buffer)?;
        if index >= header.total {
            return Err(CodecError::malformed(format!(
                "value {index} requested but the buffer holds {}",
                header.total
            )));
        }
        DecodeContext::new(&self.registry, buffer, &header).decode(index)
    }
}
