//! Type registry
//!
//! The registry maps wire type codes to [`TypeEntry`] values. Two kinds of
//! entries exist:
//!
//! - [`TypeEntry::Native`]: a native array kind, copied to the wire as is.
//! - [`TypeEntry::Registered`]: a [`ValueType`] that converts values to and
//!   from a native array, possibly recording sub-values as references.
//!
//! Code ranges:
//! - `1..=31`: native arrays (see [`ElementKind::type_code`])
//! - `32..=99`: built-in types ([`TEXT`], [`JSON`], [`EXTENDED_JSON`])
//! - `100..`: free for callers ([`FIRST_CUSTOM`])
//!
//! Example:
//! ```rust
//! # use hypack::registry::{TypeConfig, TypeRegistry, EXTENDED_JSON};
//! let mut registry = TypeRegistry::new();
//! registry.add_types([TypeConfig::extended_json()]);
//! assert!(registry.get(EXTENDED_JSON).is_some());
//! ```
use std::{collections::HashMap, sync::Arc};

use log::debug;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    array::{ElementKind, TypedArray},
    dispatch::{DecodeContext, DecodeInput, EncodeContext},
    error::{CodecError, CodecResult},
    types::{ejson::ExtendedJsonType, json::JsonType, text::TextType},
    value::Value,
};

/// Wire identifier of a value's encoding.
pub type TypeCode = u16;

/// UTF-16 text.
pub const TEXT: TypeCode = 32;
/// Plain JSON structure.
pub const JSON: TypeCode = 33;
/// JSON structure with out-of-band leaves.
pub const EXTENDED_JSON: TypeCode = 34;
/// First code free for caller types.
pub const FIRST_CUSTOM: TypeCode = 100;

/// A type that converts values to and from a native array.
pub trait ValueType: Send + Sync {
    /// Kind of the array produced by [`Self::try_encode`]; its byte size
    /// drives the alignment of the value body.
    fn element_kind(&self) -> ElementKind;

    /// Encode `value`, or return `Ok(None)` if this type does not handle it.
    ///
    /// Sub-values stored out of band are recorded through
    /// [`EncodeContext::record`].
    fn try_encode(
        &self,
        value: &Value,
        ctx: &mut EncodeContext<'_>,
    ) -> CodecResult<Option<TypedArray>>;

    /// Rebuild a value from its body. References recorded at encode time
    /// are resolved through [`DecodeContext::resolve`].
    fn decode(&self, input: DecodeInput, ctx: &mut DecodeContext<'_>) -> CodecResult<Value>;
}

/// Registry entry for one type code.
#[derive(Clone)]
pub enum TypeEntry {
    Native(ElementKind),
    Registered(Arc<dyn ValueType>),
}

impl TypeEntry {
    pub fn element_kind(&self) -> ElementKind {
        match self {
            TypeEntry::Native(kind) => *kind,
            TypeEntry::Registered(ty) => ty.element_kind(),
        }
    }
}

impl PartialEq for TypeEntry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeEntry::Native(a), TypeEntry::Native(b)) => a == b,
            (TypeEntry::Registered(a), TypeEntry::Registered(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeEntry::Native(kind) => write!(f, "Native({kind})"),
            TypeEntry::Registered(ty) => write!(f, "Registered({})", ty.element_kind()),
        }
    }
}

/// Named groups of built-in types, parseable from configuration strings.
///
/// ```rust
/// # use hypack::registry::BuiltinSet;
/// let set: BuiltinSet = "extended-json".parse().unwrap();
/// assert_eq!(set, BuiltinSet::ExtendedJson);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum BuiltinSet {
    NativeArrays,
    Text,
    Json,
    ExtendedJson,
}

/// An ordered set of `(code, entry)` pairs merged into a registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeConfig {
    entries: Vec<(TypeCode, TypeEntry)>,
}

impl TypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every native array kind under its default code.
    pub fn native_arrays() -> Self {
        ElementKind::iter().fold(Self::new(), |config, kind| {
            config.with_native(kind.type_code(), kind)
        })
    }

    pub fn text() -> Self {
        Self::new().with_type(TEXT, TextType)
    }

    pub fn json() -> Self {
        Self::new().with_type(JSON, JsonType)
    }

    pub fn extended_json() -> Self {
        Self::new().with_type(EXTENDED_JSON, ExtendedJsonType)
    }

    pub fn builtin(set: BuiltinSet) -> Self {
        match set {
            BuiltinSet::NativeArrays => Self::native_arrays(),
            BuiltinSet::Text => Self::text(),
            BuiltinSet::Json => Self::json(),
            BuiltinSet::ExtendedJson => Self::extended_json(),
        }
    }

    pub fn with_native(mut self, code: TypeCode, kind: ElementKind) -> Self {
        self.entries.push((code, TypeEntry::Native(kind)));
        self
    }

    pub fn with_type(self, code: TypeCode, ty: impl ValueType + 'static) -> Self {
        self.with_shared_type(code, Arc::new(ty))
    }

    pub fn with_shared_type(mut self, code: TypeCode, ty: Arc<dyn ValueType>) -> Self {
        self.entries.push((code, TypeEntry::Registered(ty)));
        self
    }

    pub fn entries(&self) -> &[(TypeCode, TypeEntry)] {
        &self.entries
    }
}

/// The active set of types of a [`Codec`](crate::Codec).
///
/// Lookups by code and by native kind are hash lookups. Registered types
/// are tried in ascending code order when encoding.
#[derive(Clone)]
pub struct TypeRegistry {
    entries: HashMap<TypeCode, TypeEntry>,
    native_codes: HashMap<ElementKind, TypeCode>,
    encode_order: Vec<(TypeCode, Arc<dyn ValueType>)>,
}

impl TypeRegistry {
    /// A registry holding the native array types only.
    pub fn new() -> Self {
        Self::with_configs([TypeConfig::native_arrays()])
    }

    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            native_codes: HashMap::new(),
            encode_order: Vec::new(),
        }
    }

    pub fn with_configs(configs: impl IntoIterator<Item = TypeConfig>) -> Self {
        let mut registry = Self::empty();
        registry.add_types(configs);
        registry
    }

    /// Replace the active types with the union of `configs`.
    pub fn set_types(&mut self, configs: impl IntoIterator<Item = TypeConfig>) {
        debug!("Replacing {} registered type codes", self.entries.len());
        self.entries.clear();
        self.add_types(configs);
    }

    /// Merge `configs` into the active types, left to right. A code that is
    /// already present is overwritten.
    pub fn add_types(&mut self, configs: impl IntoIterator<Item = TypeConfig>) {
        for config in configs {
            for (code, entry) in config.entries {
                match self.entries.insert(code, entry) {
                    Some(previous) if previous != self.entries[&code] => {
                        debug!(
                            "Type code {} overwritten: {:?} -> {:?}",
                            code, previous, self.entries[&code]
                        );
                    }
                    Some(_) => {}
                    None => debug!("Type code {} registered as {:?}", code, self.entries[&code]),
                }
            }
        }
        self.rebuild_indexes();
    }

    fn rebuild_indexes(&mut self) {
        let codes = self.codes();

        self.native_codes.clear();
        self.encode_order.clear();
        for code in codes {
            match &self.entries[&code] {
                TypeEntry::Native(kind) => {
                    self.native_codes.entry(*kind).or_insert(code);
                }
                TypeEntry::Registered(ty) => self.encode_order.push((code, ty.clone())),
            }
        }
    }

    pub fn get(&self, code: TypeCode) -> Option<&TypeEntry> {
        self.entries.get(&code)
    }

    /// Element byte size of `code`.
    pub fn byte_size(&self, code: TypeCode) -> CodecResult<usize> {
        self.get(code)
            .map(|entry| entry.element_kind().byte_size())
            .ok_or(CodecError::UnknownTypeCode(code))
    }

    /// Code under which arrays of `kind` are encoded, the lowest one if the
    /// kind is registered several times.
    pub fn native_code(&self, kind: ElementKind) -> Option<TypeCode> {
        self.native_codes.get(&kind).copied()
    }

    pub(crate) fn encode_order(&self) -> &[(TypeCode, Arc<dyn ValueType>)] {
        &self.encode_order
    }

    /// Registered codes in ascending order.
    pub fn codes(&self) -> Vec<TypeCode> {
        let mut codes: Vec<TypeCode> = self.entries.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TypeRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for code in self.codes() {
            map.entry(&code, &self.entries[&code]);
        }
        map.finish()
    }
}
