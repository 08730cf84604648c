use bytes::Bytes;
use hypack::{
    Codec, ElementKind, TypedArray, Value,
    layout::{Layout, unpack},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use strum::IntoEnumIterator;

fn every_kind() -> Vec<TypedArray> {
    vec![
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
}

#[test]
fn pack_and_unpack_every_kind() {
    let arrays = every_kind();
    let buffer = hypack::layout::pack(&arrays);

    let descriptors: Vec<_> = arrays.iter().map(|a| (a.kind(), a.len())).collect();
    let unpacked = unpack(&buffer, &descriptors).expect("descriptors match the packed arrays");

    assert_eq!(unpacked.arrays, arrays);
    assert_eq!(unpacked.byte_length, buffer.len());
    assert!(unpacked.arrays[8].is_empty());
    assert_eq!(unpacked.arrays[8].kind(), ElementKind::Uint8Clamped);
}

#[test]
fn three_arrays_roundtrip() {
    let arrays = vec![
        TypedArray::from([1i8, 2]),
        TypedArray::from([6i32, 7, 8, 9]),
        TypedArray::from([std::f64::consts::PI]),
    ];
    let buffer = hypack::layout::pack(&arrays);
    let unpacked = unpack(
        &buffer,
        &[
            (ElementKind::Int8, 2),
            (ElementKind::Int32, 4),
            (ElementKind::Float64, 1),
        ],
    )
    .expect("buffer holds three arrays");

    assert_eq!(unpacked.arrays, arrays);
    assert_eq!(unpacked.arrays[2].get::<f64>(0), Some(std::f64::consts::PI));
}

#[test]
fn codec_roundtrips_every_kind() {
    let codec = Codec::new();
    let values: Vec<Value> = every_kind().into_iter().map(Value::from).collect();

    let buffer = codec.encode(&values).expect("native arrays are always encodable");
    let decoded = codec.decode(&buffer).expect("buffer was produced by the same codec");
    assert_eq!(decoded, values);

    let header = codec.decode_header(&buffer).expect("valid header");
    let codes: Vec<_> = ElementKind::iter().map(ElementKind::type_code).collect();
    assert_eq!(header.types, codes);
    assert_eq!(header.byte_length, buffer.len());
}

#[test]
fn decoded_arrays_share_the_buffer() {
    let codec = Codec::new();
    let buffer = codec
        .encode(&[TypedArray::from([7u32, 8, 9]).into()])
        .expect("encodable");
    let decoded = codec.decode(&buffer).expect("decodable");

    let array = decoded[0].try_as_array_ref().expect("a native array");
    let range = buffer.as_ptr_range();
    assert!(range.contains(&array.as_bytes().as_ptr()));
}

fn random_array(rng: &mut ChaCha20Rng, kinds: &[ElementKind]) -> TypedArray {
    let kind = kinds[rng.random_range(0..kinds.len())];
    let len = rng.random_range(0..24);
    let bytes: Vec<u8> = (0..len * kind.byte_size()).map(|_| rng.random()).collect();
    TypedArray::from_bytes(kind, Bytes::from(bytes)).expect("whole elements")
}

#[test]
fn random_sequences_stay_aligned() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    let kinds: Vec<ElementKind> = ElementKind::iter().collect();
    let codec = Codec::new();

    for _ in 0..64 {
        let count = rng.random_range(0..16);
        let arrays: Vec<TypedArray> = (0..count).map(|_| random_array(&mut rng, &kinds)).collect();
        let start = rng.random_range(0..9);

        let layout = Layout::compute(arrays.iter().map(|a| (a.kind().byte_size(), a.len())), start);
        let mut cursor = start;
        for (array, offset) in arrays.iter().zip(&layout.offsets) {
            let size = array.kind().byte_size();
            assert_eq!(offset % size, 0);
            assert!(*offset >= cursor && *offset - cursor < size);
            cursor = offset + array.byte_len();
        }
        assert_eq!(layout.byte_length, cursor);

        let values: Vec<Value> = arrays.into_iter().map(Value::from).collect();
        let buffer = codec.encode(&values).expect("native arrays are always encodable");
        let header = codec.decode_header(&buffer).expect("valid header");
        for (code, offset) in header.types.iter().zip(&header.offsets) {
            let size = codec.registry().byte_size(*code).expect("registered code");
            assert_eq!(offset % size, 0);
        }
        assert_eq!(codec.decode(&buffer).expect("decodable"), values);
    }
}
