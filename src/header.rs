//! Fixed header fields shared by every framed box.

use crate::boxes::FourCC;
use crate::element::{ElementKind, ElementSpec, Value};
use serde::{Deserialize, Serialize};

/// Which framing a box carries before its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderKind {
    /// No framing; only the synthetic file root uses this.
    None,
    /// `size` + `type`.
    Basic,
    /// `size` + `type` + `version` + `flags`.
    Full,
}

impl HeaderKind {
    pub fn byte_len(self) -> usize {
        match self {
            HeaderKind::None => 0,
            HeaderKind::Basic => 8,
            HeaderKind::Full => 12,
        }
    }
}

/// Field list for the header of a box of type `typ`.
pub fn header_fields(kind: HeaderKind, typ: FourCC) -> Vec<ElementSpec> {
    let basic = || {
        vec![
            ElementSpec::new("size", ElementKind::U32, 0u32),
            ElementSpec::new("type", ElementKind::Text, Value::Bytes(typ.0.to_vec())),
        ]
    };
    match kind {
        HeaderKind::None => Vec::new(),
        HeaderKind::Basic => basic(),
        HeaderKind::Full => {
            let mut fields = basic();
            fields.push(ElementSpec::new("version", ElementKind::U8, 0u32));
            fields.push(ElementSpec::new("flags", ElementKind::U24, 0u32));
            fields
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_header_extends_basic() {
        let typ = FourCC(*b"mvhd");
        let names: Vec<_> = header_fields(HeaderKind::Full, typ)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["size", "type", "version", "flags"]);
        assert!(header_fields(HeaderKind::None, typ).is_empty());
    }

    #[test]
    fn header_lengths_match_fields() {
        for kind in [HeaderKind::None, HeaderKind::Basic, HeaderKind::Full] {
            let len: usize = header_fields(kind, FourCC(*b"free"))
                .iter()
                .map(|f| f.build().unwrap().byte_len())
                .sum();
            assert_eq!(len, kind.byte_len());
        }
    }
}
