//! UTF-16 text.
//!
//! Text is stored as its UTF-16 code units, one unit per element. The
//! helpers also accept other element kinds so callers can pack narrow text
//! (e.g. Latin-1 into `Uint8`) under a custom type code.
use crate::{
    array::{ElementKind, TypedArray},
    dispatch::{DecodeContext, DecodeInput, EncodeContext},
    error::{CodecError, CodecResult},
    registry::ValueType,
    value::Value,
};

/// Built-in type for [`Value::String`], registered under
/// [`TEXT`](crate::registry::TEXT).
#[derive(Debug, Clone, Copy, Default)]
pub struct TextType;

impl ValueType for TextType {
    fn element_kind(&self) -> ElementKind {
        ElementKind::Uint16
    }

    fn try_encode(
        &self,
        value: &Value,
        _ctx: &mut EncodeContext<'_>,
    ) -> CodecResult<Option<TypedArray>> {
        match value {
            Value::String(text) => to_code_array(text, ElementKind::Uint16).map(Some),
            _ => Ok(None),
        }
    }

    fn decode(&self, input: DecodeInput, _ctx: &mut DecodeContext<'_>) -> CodecResult<Value> {
        from_code_array(input.array()).map(Value::String)
    }
}

/// Store the UTF-16 code units of `text` in an array of `kind`.
///
/// Fails with [`CodecError::CharacterCodeOverflow`] on the first unit that
/// does not fit an integer `kind`.
pub fn to_code_array(text: &str, kind: ElementKind) -> CodecResult<TypedArray> {
    let units: Vec<u16> = text.encode_utf16().collect();
    if kind == ElementKind::Uint16 {
        return Ok(TypedArray::from(units));
    }
    TypedArray::from_integers(kind, units.into_iter().map(u32::from))
}

/// Read text back from the code units stored in `array`.
pub fn from_code_array(array: &TypedArray) -> CodecResult<String> {
    let units = match array.to_vec::<u16>() {
        Some(units) => units,
        None => code_units(array)?,
    };
    String::from_utf16(&units).map_err(|_| CodecError::MalformedText)
}

fn code_units(array: &TypedArray) -> CodecResult<Vec<u16>> {
    let overflow = |code: i128| CodecError::CharacterCodeOverflow {
        code,
        kind: ElementKind::Uint16,
    };

    if let Some(codes) = array.integers() {
        return codes
            .into_iter()
            .map(|code| u16::try_from(code).map_err(|_| overflow(code)))
            .collect();
    }

    let floats: Vec<f64> = match array.kind() {
        ElementKind::Float32 => array
            .to_vec::<f32>()
            .unwrap_or_default()
            .into_iter()
            .map(f64::from)
            .collect(),
        _ => array.to_vec::<f64>().unwrap_or_default(),
    };
    floats
        .into_iter()
        .map(|code| {
            if code.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&code) {
                Ok(code as u16)
            } else {
                Err(overflow(code as i128))
            }
        })
        .collect()
}
