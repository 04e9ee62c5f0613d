use mp4schema::{
    FourCC, NodeKind, ParseOptions, Value, default_registry, parse_file, read_box_header,
};

fn make_minimal_file() -> Vec<u8> {
    // [ftyp box]
    // size: 24 (0x18), type: "ftyp", payload: 16 bytes
    let mut v = Vec::new();

    // size = 24
    v.extend_from_slice(&24u32.to_be_bytes());
    v.extend_from_slice(b"ftyp");
    // major brand "isom"
    v.extend_from_slice(b"isom");
    // minor version
    v.extend_from_slice(&512u32.to_be_bytes());
    // two compatible brands; the schema describes only the first
    v.extend_from_slice(b"isom");
    v.extend_from_slice(b"avc1");

    v
}

#[test]
fn read_single_ftyp_header() {
    let data = make_minimal_file();

    let hdr = read_box_header(&data, 0).expect("read_box_header failed");

    assert_eq!(hdr.start, 0);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.typ, FourCC(*b"ftyp"));
}

#[test]
fn short_header_is_truncated() {
    let data = make_minimal_file();
    let err = read_box_header(&data[..6], 0).unwrap_err();
    assert!(matches!(err, mp4schema::Error::TruncatedBox { offset: 0, available: 6, .. }));
}

#[test]
fn ftyp_fields_and_trailing_brands() {
    let data = make_minimal_file();
    let root =
        parse_file(default_registry(), &data, ParseOptions::default()).expect("parse failed");

    assert_eq!(root.children().len(), 1);
    let ftyp = &root.children()[0];
    assert_eq!(ftyp.typ(), FourCC(*b"ftyp"));
    assert_eq!(ftyp.kind(), &NodeKind::Leaf);
    assert_eq!(ftyp.get("major_brand").unwrap(), Value::from("isom"));
    assert_eq!(ftyp.get("minor_version").unwrap(), Value::Uint(512));
    assert_eq!(ftyp.get("compatible_brands").unwrap(), Value::from("isom"));
    assert_eq!(ftyp.get("trailing").unwrap(), Value::Bytes(b"avc1".to_vec()));
    assert_eq!(ftyp.byte_len(), 24);
}

#[test]
fn top_level_leaves_reserialize_byte_exact() {
    let mut data = make_minimal_file();
    // free: size=8, no payload
    data.extend_from_slice(&8u32.to_be_bytes());
    data.extend_from_slice(b"free");
    // mdat: size=16, 8 bytes payload
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

    let mut root = parse_file(default_registry(), &data, ParseOptions::default()).unwrap();
    let types: Vec<_> = root.children().iter().map(|c| c.typ()).collect();
    assert_eq!(types, [FourCC(*b"ftyp"), FourCC(*b"free"), FourCC(*b"mdat")]);
    assert!(!root.children()[1].has("trailing"));

    assert_eq!(root.serialize().unwrap(), data);
}
