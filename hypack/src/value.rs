//! Dynamic values accepted by [`Codec::encode`](crate::Codec::encode).
use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use downcast_rs::{DowncastSync, impl_downcast};
pub use serde_json::Number;
use strum::{EnumIs, EnumTryAs};

use crate::array::TypedArray;

/// Opaque caller values carried by [`Value::Custom`].
///
/// Implemented for every `Clone + PartialEq + Debug + Send + Sync + 'static`
/// type; a registered [`ValueType`](crate::registry::ValueType) downcasts it
/// back to the concrete type.
pub trait CustomValue: DowncastSync + Debug {
    fn eq_dyn(&self, other: &dyn CustomValue) -> bool;
}
impl_downcast!(sync CustomValue);

impl<T> CustomValue for T
where
    T: Clone + PartialEq + Debug + Send + Sync + 'static,
{
    fn eq_dyn(&self, other: &dyn CustomValue) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

/// A value the codec can pack.
///
/// `List` and `Map` are the plain structures; `Array`, `Custom` and
/// `Extended` are the leaves an extended structure stores out of band.
#[derive(Debug, Clone, EnumIs, EnumTryAs)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    /// Keys are kept sorted; insertion order is not recorded and decoded
    /// maps iterate in key order.
    Map(BTreeMap<String, Value>),
    Array(TypedArray),
    /// A structure that must be encoded as an extended structure even when
    /// a plain JSON type is also registered. Decodes to the inner value.
    Extended(Box<Value>),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    /// Wrap any [`CustomValue`].
    pub fn custom<T: CustomValue>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    pub fn extended(value: impl Into<Value>) -> Self {
        Value::Extended(Box::new(value.into()))
    }

    /// Downcast a [`Value::Custom`] to `T`.
    pub fn downcast_custom<T: CustomValue>(&self) -> Option<&T> {
        match self {
            Value::Custom(custom) => custom.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Array(_) => "array",
            Value::Extended(_) => "extended",
            Value::Custom(_) => "custom",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Extended(a), Value::Extended(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<TypedArray> for Value {
    fn from(value: TypedArray) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for Value {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
