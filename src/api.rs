use crate::{
    boxes::{Node, NodeKind},
    element::{Element, Value},
    registry::Registry,
    util::hex_dump,
};
use serde::Serialize;

/// A JSON-serializable view of one box of a parsed or built tree.
///
/// Suitable for UIs and for the JSON output of `mp4dump`.
#[derive(Debug, Serialize)]
pub struct JsonBox {
    /// Byte offset of this box from the start of the serialized tree
    pub offset: u64,
    /// Encoded length of the box including header and children
    pub size: u64,
    /// 0 for the file root, 8 for basic boxes, 12 for full boxes
    pub header_size: u64,
    /// Four-character box type code (e.g. "ftyp", "moov")
    pub typ: String,
    /// Human-readable name from the schema, empty for unknown types
    pub full_name: String,
    /// "leaf", "container" or "opaque"
    pub kind: String,
    /// Field values in layout order; `None` unless requested
    pub fields: Option<Vec<JsonField>>,
    /// Child boxes for container types
    pub children: Option<Vec<JsonBox>>,
}

#[derive(Debug, Serialize)]
pub struct JsonField {
    pub name: String,
    /// Offset relative to the start of the box
    pub offset: u64,
    pub len: u64,
    /// Decoded value; raw byte runs are reported by length only
    pub value: Option<Value>,
}

/// Build the JSON view of `root`.
///
/// A header-less root (the whole file) is flattened into its top-level boxes.
///
/// # Example
/// ```no_run
/// use mp4schema::{api::to_json_tree, default_registry, parse_file, ParseOptions};
///
/// let data = std::fs::read("video.mp4")?;
/// let reg = default_registry();
/// let root = parse_file(reg, &data, ParseOptions::default())?;
/// println!("{}", serde_json::to_string_pretty(&to_json_tree(&root, reg, true))?);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn to_json_tree(root: &Node, registry: &Registry, with_fields: bool) -> Vec<JsonBox> {
    if root.header_len() == 0 && root.is_container() {
        let mut offset = 0u64;
        root.children()
            .iter()
            .map(|c| {
                let b = build_box(c, offset, registry, with_fields);
                offset += b.size;
                b
            })
            .collect()
    } else {
        vec![build_box(root, 0, registry, with_fields)]
    }
}

fn build_box(node: &Node, offset: u64, registry: &Registry, with_fields: bool) -> JsonBox {
    let full_name = registry
        .get(&node.typ())
        .map(|e| e.name.clone())
        .unwrap_or_default();

    let (kind_str, children) = match node.kind() {
        NodeKind::Leaf => ("leaf".to_string(), None),
        NodeKind::Opaque => ("opaque".to_string(), None),
        NodeKind::Container(kids) => {
            let mut pos = offset + node.header_len() as u64;
            let child_nodes = kids
                .iter()
                .map(|c| {
                    let b = build_box(c, pos, registry, with_fields);
                    pos += b.size;
                    b
                })
                .collect();
            ("container".to_string(), Some(child_nodes))
        }
    };

    let fields = with_fields.then(|| {
        node.fields()
            .map(|(name, off, el)| JsonField {
                name: name.to_string(),
                offset: off as u64,
                len: el.byte_len() as u64,
                value: match el {
                    Element::Raw(_) => None,
                    other => Some(other.value()),
                },
            })
            .collect()
    });

    JsonBox {
        offset,
        size: node.byte_len() as u64,
        header_size: node.header_len() as u64,
        typ: node.typ().to_string(),
        full_name,
        kind: kind_str,
        fields,
        children,
    }
}

/// Result of a hex dump operation containing the formatted hex output.
#[derive(Debug, Serialize)]
pub struct HexDump {
    /// Starting offset of the dumped data
    pub offset: u64,
    /// Actual number of bytes that were dumped
    pub length: u64,
    /// Formatted hex dump string with addresses and ASCII representation
    pub hex: String,
}

/// Hex-dump up to `max_len` bytes of `data` starting at `offset`.
///
/// Never reads past the end of `data`; the returned length may be smaller than
/// `max_len`, and is 0 when `offset` is at or beyond the end.
pub fn hex_range(data: &[u8], offset: u64, max_len: u64) -> HexDump {
    let size = data.len() as u64;
    let available = size.saturating_sub(offset);
    let to_read = available.min(max_len);

    if to_read == 0 {
        return HexDump {
            offset,
            length: 0,
            hex: String::new(),
        };
    }

    let start = offset as usize;
    let bytes = &data[start..start + to_read as usize];
    HexDump {
        offset,
        length: to_read,
        hex: hex_dump(bytes, offset),
    }
}
