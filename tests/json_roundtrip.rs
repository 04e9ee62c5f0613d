use mp4schema::{FourCC, Node, ParseOptions, default_registry, parse_file, to_json_tree};
use serde_json::Value as Json;

/// [ftyp] [free] [mdat] with an extra compatible brand on ftyp.
fn minimal_mp4() -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(b"isom");
    data.extend_from_slice(&512u32.to_be_bytes());
    data.extend_from_slice(b"isom");
    data.extend_from_slice(b"avc1");

    data.extend_from_slice(&8u32.to_be_bytes());
    data.extend_from_slice(b"free");

    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]);
    data
}

fn to_json(root: &Node, with_fields: bool) -> Json {
    serde_json::to_value(to_json_tree(root, default_registry(), with_fields)).unwrap()
}

#[test]
fn json_tree_lists_top_level_boxes() {
    let root = parse_file(default_registry(), &minimal_mp4(), ParseOptions::default()).unwrap();
    let json = to_json(&root, false);
    let boxes = json.as_array().unwrap();
    assert_eq!(boxes.len(), 3);

    let summary: Vec<(&str, u64, u64)> = boxes
        .iter()
        .map(|b| {
            (
                b["typ"].as_str().unwrap(),
                b["offset"].as_u64().unwrap(),
                b["size"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(summary, [("ftyp", 0, 24), ("free", 24, 8), ("mdat", 32, 16)]);

    assert_eq!(boxes[0]["full_name"], "File Type Box");
    assert_eq!(boxes[0]["kind"], "leaf");
    assert_eq!(boxes[0]["header_size"], 8);
    assert!(boxes[0]["fields"].is_null());
}

#[test]
fn json_tree_includes_field_values() {
    let root = parse_file(default_registry(), &minimal_mp4(), ParseOptions::default()).unwrap();
    let json = to_json(&root, true);
    let fields = json[0]["fields"].as_array().unwrap();

    let minor = fields.iter().find(|f| f["name"] == "minor_version").unwrap();
    assert_eq!(minor["value"], serde_json::json!({ "uint": 512 }));
    assert_eq!(minor["offset"], 12);
    assert_eq!(minor["len"], 4);

    let brand = fields.iter().find(|f| f["name"] == "major_brand").unwrap();
    assert_eq!(brand["value"], serde_json::json!({ "text": "isom" }));

    // raw runs are reported by length only
    let trailing = fields.iter().find(|f| f["name"] == "trailing").unwrap();
    assert_eq!(trailing["len"], 4);
    assert!(trailing["value"].is_null());
}

#[test]
fn json_tree_nests_children() {
    let reg = default_registry();
    let tkhd = Node::new(reg, FourCC(*b"tkhd")).unwrap();
    let trak = Node::container(reg, FourCC(*b"trak"), [tkhd]).unwrap();
    let moov = Node::container(
        reg,
        FourCC(*b"moov"),
        [Node::new(reg, FourCC(*b"mvhd")).unwrap(), trak],
    )
    .unwrap();

    let json = to_json(&moov, false);
    assert_eq!(json[0]["kind"], "container");
    assert_eq!(json[0]["size"], 216);

    let children = json[0]["children"].as_array().unwrap();
    assert_eq!(children[0]["typ"], "mvhd");
    assert_eq!(children[0]["header_size"], 12);
    assert_eq!(children[1]["typ"], "trak");
    assert_eq!(children[1]["offset"], 116);
    assert_eq!(children[1]["children"][0]["offset"], 124);
}

#[test]
fn json_tree_marks_unknown_boxes() {
    let mut data = 12u32.to_be_bytes().to_vec();
    data.extend_from_slice(b"zzzz");
    data.extend_from_slice(&[1, 2, 3, 4]);

    let root = parse_file(default_registry(), &data, ParseOptions::default()).unwrap();
    let json = to_json(&root, true);
    assert_eq!(json[0]["kind"], "opaque");
    assert_eq!(json[0]["full_name"], "");
    let payload = json[0]["fields"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(payload["name"], "payload");
    assert_eq!(payload["len"], 4);
}
