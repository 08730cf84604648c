//! Self-describing binary codec for typed arrays and nested structures.
//!
//! A buffer holds a list of values. Each value is stored as a little-endian
//! native array tagged with a type code; a small header records the count,
//! element length and type code of every value so the buffer can be decoded
//! with nothing but a [`TypeRegistry`] that knows the same codes.
//!
//! Native arrays ([`TypedArray`]) are written as is. Every other value goes
//! through a registered [`ValueType`]: the built-ins cover text, plain JSON
//! structures and extended structures whose array or custom leaves are
//! stored as separate values and referenced from the JSON text.
//!
//! ```rust
//! use hypack::{BuiltinSet, Codec, TypeConfig, TypedArray, Value};
//! use strum::IntoEnumIterator;
//!
//! let codec = Codec::with_configs(BuiltinSet::iter().map(TypeConfig::builtin));
//!
//! let samples: Value = [
//!     ("name", Value::from("sample")),
//!     ("samples", TypedArray::from([0.5f32, 1.0, 1.5]).into()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let buffer = codec.encode(&[samples.clone()]).unwrap();
//! assert_eq!(codec.decode(&buffer).unwrap(), [samples]);
//! ```

pub mod array;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod header;
pub mod layout;
pub mod registry;
pub mod types;
pub mod value;

pub use array::{ElementKind, TypedArray};
pub use codec::Codec;
pub use error::{CodecError, CodecResult};
pub use registry::{BuiltinSet, TypeConfig, TypeRegistry, ValueType};
pub use value::Value;
