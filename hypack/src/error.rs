use thiserror::Error;

use crate::{array::ElementKind, registry::TypeCode};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("No registered type accepts value of kind '{kind}'")]
    UnencodableValue { kind: &'static str },

    #[error("Type code {0} is not present in the registry")]
    UnknownTypeCode(TypeCode),

    #[error("Character code {code} does not fit in a {kind} element")]
    CharacterCodeOverflow { code: i128, kind: ElementKind },

    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("Text payload is not valid UTF-16")]
    MalformedText,

    #[error("Type {code} declares {expected} elements but encoded {found} elements")]
    ElementKindMismatch {
        code: TypeCode,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Mapping key {0:?} is reserved for extended structure references")]
    ReservedKey(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        CodecError::MalformedBuffer(message.into())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
