//! Native fixed-width arrays.
//!
//! A [`TypedArray`] is an element kind plus the little-endian bytes of its
//! elements. Arrays produced by decoding borrow the encoded buffer through
//! [`Bytes`] reference counting, so reading a value back never copies its body.
use bytes::Bytes;
use strum::{Display, EnumIs, EnumIter, IntoStaticStr};

use crate::{
    error::{CodecError, CodecResult},
    registry::TypeCode,
};

/// Element kinds of the native arrays, numbered by their wire type code.
///
/// Codes 1 to 31 are reserved for native kinds; only 1 to 11 are in use.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIs,
    EnumIter,
    IntoStaticStr,
)]
#[repr(u16)]
pub enum ElementKind {
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    BigInt64 = 4,
    Uint8 = 5,
    Uint16 = 6,
    Uint32 = 7,
    BigUint64 = 8,
    /// Bytes that were clamped to `0..=255` by the producer.
    Uint8Clamped = 9,
    Float32 = 10,
    Float64 = 11,
}

impl ElementKind {
    /// Number of bytes of one element.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 | ElementKind::Uint8Clamped => 1,
            ElementKind::Int16 | ElementKind::Uint16 => 2,
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float32 => 4,
            ElementKind::BigInt64 | ElementKind::BigUint64 | ElementKind::Float64 => 8,
        }
    }

    /// Default wire type code of this kind.
    #[inline]
    pub const fn type_code(self) -> TypeCode {
        self as TypeCode
    }

    pub const fn from_type_code(code: TypeCode) -> Option<Self> {
        Some(match code {
            1 => ElementKind::Int8,
            2 => ElementKind::Int16,
            3 => ElementKind::Int32,
            4 => ElementKind::BigInt64,
            5 => ElementKind::Uint8,
            6 => ElementKind::Uint16,
            7 => ElementKind::Uint32,
            8 => ElementKind::BigUint64,
            9 => ElementKind::Uint8Clamped,
            10 => ElementKind::Float32,
            11 => ElementKind::Float64,
            _ => return None,
        })
    }

    /// Inclusive range of integers representable by one element, or `None`
    /// for floating point kinds.
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            ElementKind::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            ElementKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            ElementKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            ElementKind::BigInt64 => Some((i64::MIN as i128, i64::MAX as i128)),
            ElementKind::Uint8 | ElementKind::Uint8Clamped => Some((0, u8::MAX as i128)),
            ElementKind::Uint16 => Some((0, u16::MAX as i128)),
            ElementKind::Uint32 => Some((0, u32::MAX as i128)),
            ElementKind::BigUint64 => Some((0, u64::MAX as i128)),
            ElementKind::Float32 | ElementKind::Float64 => None,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar types that can be stored in a [`TypedArray`].
pub trait Element: Copy + sealed::Sealed {
    const KIND: ElementKind;

    /// Whether arrays of `kind` can be read as `Self`.
    #[inline]
    fn readable_from(kind: ElementKind) -> bool {
        kind == Self::KIND
    }

    fn write_le(self, out: &mut Vec<u8>);

    /// Read one element; `bytes` is exactly `KIND.byte_size()` long.
    fn read_le(bytes: &[u8]) -> Self;

    /// Widen to an integer, `None` for floats.
    fn to_i128(self) -> Option<i128>;

    /// Narrow an integer already checked against `KIND.integer_range()`.
    fn from_i128(value: i128) -> Self;
}

macro_rules! impl_element {
    (int: $($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn to_i128(self) -> Option<i128> {
                    Some(self as i128)
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value as $ty
                }
            }
        )*
    };
    (float: $($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn to_i128(self) -> Option<i128> {
                    None
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_element!(int:
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => BigInt64,
    u16 => Uint16,
    u32 => Uint32,
    u64 => BigUint64,
);
impl_element!(float: f32 => Float32, f64 => Float64);

impl sealed::Sealed for u8 {}

impl Element for u8 {
    const KIND: ElementKind = ElementKind::Uint8;

    #[inline]
    fn readable_from(kind: ElementKind) -> bool {
        matches!(kind, ElementKind::Uint8 | ElementKind::Uint8Clamped)
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        Some(self as i128)
    }

    #[inline]
    fn from_i128(value: i128) -> Self {
        value as u8
    }
}

/// A fixed-width array of one [`ElementKind`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypedArray {
    kind: ElementKind,
    bytes: Bytes,
}

impl TypedArray {
    /// Copy `values` into a new array of kind `T::KIND`.
    pub fn from_slice<T: Element>(values: &[T]) -> Self {
        let mut out = Vec::with_capacity(values.len() * T::KIND.byte_size());
        for value in values {
            value.write_le(&mut out);
        }
        Self {
            kind: T::KIND,
            bytes: Bytes::from(out),
        }
    }

    /// Build a [`ElementKind::Uint8Clamped`] array.
    pub fn uint8_clamped(values: &[u8]) -> Self {
        Self {
            kind: ElementKind::Uint8Clamped,
            bytes: Bytes::copy_from_slice(values),
        }
    }

    /// An array of `len` zero elements.
    pub fn zeroed(kind: ElementKind, len: usize) -> Self {
        Self {
            kind,
            bytes: Bytes::from(vec![0u8; len * kind.byte_size()]),
        }
    }

    /// Wrap raw little-endian element bytes without copying.
    pub fn from_bytes(kind: ElementKind, bytes: Bytes) -> CodecResult<Self> {
        if bytes.len() % kind.byte_size() != 0 {
            return Err(CodecError::malformed(format!(
                "{} bytes is not a whole number of {} elements",
                bytes.len(),
                kind
            )));
        }
        Ok(Self { kind, bytes })
    }

    /// Convert integers into an array of `kind`, failing on the first value
    /// that does not fit. Float kinds accept every value.
    pub(crate) fn from_integers(
        kind: ElementKind,
        values: impl ExactSizeIterator<Item = u32>,
    ) -> CodecResult<Self> {
        let mut out = Vec::with_capacity(values.len() * kind.byte_size());
        for value in values {
            if let Some((min, max)) = kind.integer_range() {
                let wide = value as i128;
                if wide < min || wide > max {
                    return Err(CodecError::CharacterCodeOverflow {
                        code: value as i128,
                        kind,
                    });
                }
            }
            match kind {
                ElementKind::Int8 => i8::from_i128(value as i128).write_le(&mut out),
                ElementKind::Int16 => i16::from_i128(value as i128).write_le(&mut out),
                ElementKind::Int32 => i32::from_i128(value as i128).write_le(&mut out),
                ElementKind::BigInt64 => i64::from_i128(value as i128).write_le(&mut out),
                ElementKind::Uint8 | ElementKind::Uint8Clamped => out.push(value as u8),
                ElementKind::Uint16 => u16::from_i128(value as i128).write_le(&mut out),
                ElementKind::Uint32 => value.write_le(&mut out),
                ElementKind::BigUint64 => (value as u64).write_le(&mut out),
                ElementKind::Float32 => (value as f32).write_le(&mut out),
                ElementKind::Float64 => (value as f64).write_le(&mut out),
            }
        }
        Ok(Self {
            kind,
            bytes: Bytes::from(out),
        })
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.byte_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The shared byte handle backing this array.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Read element `index` as `T`. Returns `None` when `T` does not match
    /// the array kind or the index is out of range.
    pub fn get<T: Element>(&self, index: usize) -> Option<T> {
        if !T::readable_from(self.kind) || index >= self.len() {
            return None;
        }
        let size = self.kind.byte_size();
        Some(T::read_le(&self.bytes[index * size..(index + 1) * size]))
    }

    /// Copy every element out as `T`, or `None` on a kind mismatch.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if !T::readable_from(self.kind) {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(self.kind.byte_size())
                .map(T::read_le)
                .collect(),
        )
    }

    /// Every element widened to an integer. Floats are rejected.
    pub(crate) fn integers(&self) -> Option<Vec<i128>> {
        macro_rules! widen {
            ($ty:ty) => {
                self.bytes
                    .chunks_exact(size_of::<$ty>())
                    .map(|chunk| <$ty>::read_le(chunk).to_i128())
                    .collect()
            };
        }
        match self.kind {
            ElementKind::Int8 => widen!(i8),
            ElementKind::Int16 => widen!(i16),
            ElementKind::Int32 => widen!(i32),
            ElementKind::BigInt64 => widen!(i64),
            ElementKind::Uint8 | ElementKind::Uint8Clamped => widen!(u8),
            ElementKind::Uint16 => widen!(u16),
            ElementKind::Uint32 => widen!(u32),
            ElementKind::BigUint64 => widen!(u64),
            ElementKind::Float32 | ElementKind::Float64 => None,
        }
    }
}

impl std::fmt::Debug for TypedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind, self.len())
    }
}

impl<T: Element> From<&[T]> for TypedArray {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Element> From<Vec<T>> for TypedArray {
    fn from(values: Vec<T>) -> Self {
        Self::from_slice(&values)
    }
}

impl<T: Element, const N: usize> From<[T; N]> for TypedArray {
    fn from(values: [T; N]) -> Self {
        Self::from_slice(&values)
    }
}
