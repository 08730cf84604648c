use hypack::{
    BuiltinSet, Codec, CodecError, ElementKind, TypeConfig, TypedArray, Value,
    registry::{EXTENDED_JSON, JSON},
    types::{MARKER_KEY, MAX_DEPTH},
};
use strum::IntoEnumIterator;

fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    entries.into_iter().collect()
}

fn native_arrays() -> Vec<Value> {
    [
        TypedArray::from([1i8, 2]),
        TypedArray::from([3i16, 4, 5]),
        TypedArray::from([6i32, 7, 8, 9]),
        TypedArray::from([10i64, 11]),
        TypedArray::from([12u8, 13, 14, 15, 16, 17, 18, 19, 20]),
        TypedArray::from([21u16]),
        TypedArray::zeroed(ElementKind::Uint32, 9),
        TypedArray::from([31u64]),
        TypedArray::uint8_clamped(&[]),
        TypedArray::from([32.0f32, 33.33]),
        TypedArray::from([std::f64::consts::PI]),
    ]
    .into_iter()
    .map(Value::from)
    .collect()
}

#[test]
fn plain_structure_roundtrip() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::json()]);
    let values = [map([("text", Value::from("hello world"))])];

    let buffer = codec.encode(&values).expect("plain structure");
    assert_eq!(codec.decode_header(&buffer).expect("header").types, [JSON]);
    assert_eq!(codec.decode(&buffer).expect("decodable"), values);
}

#[test]
fn extended_structure_recovers_arrays() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let value = map([
        ("image", TypedArray::from(vec![255u8; 25]).into()),
        (
            "nested",
            map([("arr", Value::List(vec![TypedArray::from([3i16, 4, 5]).into()]))]),
        ),
    ]);

    let buffer = codec.encode(std::slice::from_ref(&value)).expect("extended structure");
    let header = codec.decode_header(&buffer).expect("header");
    assert_eq!(header.total, 3);
    assert_eq!(header.primary_count, 1);
    assert_eq!(header.types[0], EXTENDED_JSON);

    let decoded = codec.decode(&buffer).expect("decodable");
    assert_eq!(decoded, [value]);

    let Value::Map(root) = &decoded[0] else {
        panic!("expected a map, got {:?}", decoded[0]);
    };
    let image = root["image"].try_as_array_ref().expect("image is an array");
    assert_eq!(image.kind(), ElementKind::Uint8);
    assert_eq!(image.len(), 25);
}

#[test]
fn deep_structure_with_every_kind() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let value = map([
        ("image", TypedArray::from(vec![255u8; 25]).into()),
        (
            "a",
            map([("b", map([("c", Value::List(native_arrays()))]))]),
        ),
        (
            "d",
            map([
                ("string", Value::from("hello")),
                ("boolean", Value::from(true)),
                ("number", Value::from(1)),
                ("null", Value::Null),
            ]),
        ),
    ]);

    let buffer = codec.encode(std::slice::from_ref(&value)).expect("encodable");
    assert_eq!(codec.decode(&buffer).expect("decodable"), [value]);
}

#[test]
fn arrays_alongside_a_structure_nesting_them() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let mut values = native_arrays();
    values.push(map([
        ("image", TypedArray::from(vec![255u8; 100]).into()),
        ("a", map([("b", map([("c", Value::List(native_arrays()))]))])),
    ]));

    let buffer = codec.encode(&values).expect("encodable");
    let header = codec.decode_header(&buffer).expect("header");
    assert_eq!(header.primary_count, 12);
    assert_eq!(header.total, 12 + 12);
    assert_eq!(codec.decode(&buffer).expect("decodable"), values);
}

#[test]
fn nested_extended_structures() {
    let codec = Codec::with_configs([
        TypeConfig::native_arrays(),
        TypeConfig::json(),
        TypeConfig::extended_json(),
    ]);
    let inner = Value::extended(Value::List(vec![Value::from("leaf")]));
    let value = Value::List(vec![inner, TypedArray::from([1u8]).into()]);

    let buffer = codec.encode(std::slice::from_ref(&value)).expect("encodable");
    let header = codec.decode_header(&buffer).expect("header");
    assert_eq!(header.types[0], EXTENDED_JSON);
    assert!(header.types[1..].contains(&EXTENDED_JSON));

    let expected = Value::List(vec![
        Value::List(vec![Value::from("leaf")]),
        TypedArray::from([1u8]).into(),
    ]);
    assert_eq!(codec.decode(&buffer).expect("decodable"), [expected]);
}

#[test]
fn shared_leaves_decode_equal() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let shared: Value = TypedArray::from([4u16, 2]).into();
    let value = Value::List(vec![shared.clone(), shared.clone(), shared]);

    let buffer = codec.encode(std::slice::from_ref(&value)).expect("encodable");
    assert_eq!(codec.decode(&buffer).expect("decodable"), [value]);
}

#[test]
fn reserved_key_is_refused() {
    let codec = Codec::with_configs(BuiltinSet::iter().map(TypeConfig::builtin));
    let hostile = map([
        (MARKER_KEY, Value::from(0)),
        ("bytes", TypedArray::from([1u8]).into()),
    ]);
    assert!(matches!(
        codec.encode(&[hostile]),
        Err(CodecError::ReservedKey(_))
    ));

    // Plain JSON has no markers, so the key is ordinary there.
    let plain = map([(MARKER_KEY, Value::from(0))]);
    let buffer = codec.encode(std::slice::from_ref(&plain)).expect("plain structure");
    assert_eq!(codec.decode(&buffer).expect("decodable"), [plain]);
}

fn nest(depth: usize, leaf: Value) -> Value {
    (0..depth).fold(leaf, |inner, _| Value::List(vec![inner]))
}

#[test]
fn plain_depth_limit_is_symmetric() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::json()]);

    let deepest = nest(MAX_DEPTH, Value::from("bottom"));
    let buffer = codec.encode(std::slice::from_ref(&deepest)).expect("within the limit");
    assert_eq!(codec.decode(&buffer).expect("decodable"), [deepest]);

    assert!(matches!(
        codec.encode(&[nest(200, Value::from("bottom"))]),
        Err(CodecError::CapacityExceeded(_))
    ));
}

#[test]
fn extended_depth_limit_is_symmetric() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let leaf = || Value::from(TypedArray::from([7u16]));

    // The marker object around the leaf is the last allowed level.
    let deepest = nest(MAX_DEPTH - 1, leaf());
    let buffer = codec.encode(std::slice::from_ref(&deepest)).expect("within the limit");
    assert_eq!(codec.decode(&buffer).expect("decodable"), [deepest]);

    for depth in [MAX_DEPTH, 200] {
        assert!(matches!(
            codec.encode(&[nest(depth, leaf())]),
            Err(CodecError::CapacityExceeded(_))
        ));
    }
}

#[test]
fn map_keys_decode_sorted() {
    let codec = Codec::with_configs([TypeConfig::native_arrays(), TypeConfig::extended_json()]);
    let value = map([
        ("zeta", Value::from(1)),
        ("alpha", TypedArray::from([1u8]).into()),
        ("mid", Value::Null),
    ]);

    let buffer = codec.encode(std::slice::from_ref(&value)).expect("encodable");
    let decoded = codec.decode(&buffer).expect("decodable");
    let Value::Map(entries) = &decoded[0] else {
        panic!("expected a map, got {:?}", decoded[0]);
    };
    let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
    assert_eq!(keys, ["alpha", "mid", "zeta"]);
    assert_eq!(decoded, [value]);
}
