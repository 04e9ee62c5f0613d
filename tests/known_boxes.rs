use mp4schema::registry::Layout;
use mp4schema::{FourCC, HeaderKind, Node, default_registry};

fn cc(s: &[u8; 4]) -> FourCC {
    FourCC(*s)
}

#[test]
fn known_box_ftyp() {
    let entry = default_registry().get(&cc(b"ftyp")).unwrap();
    assert_eq!(entry.name, "File Type Box");
    assert_eq!(entry.parent, Some(cc(b"file")));
    let names: Vec<_> = entry.layout.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["major_brand", "minor_version", "compatible_brands"]);
}

#[test]
fn known_box_classifies_container() {
    let reg = default_registry();
    for typ in [b"moov", b"trak", b"mdia", b"minf", b"dinf", b"stbl", b"edts", b"mvex"] {
        assert!(reg.get(&cc(typ)).unwrap().is_container(), "{}", cc(typ));
    }
    for typ in [b"ftyp", b"mdat", b"mvhd", b"stsd", b"stco"] {
        assert!(!reg.get(&cc(typ)).unwrap().is_container(), "{}", cc(typ));
    }
    assert_eq!(reg.get(&cc(b"file")).unwrap().layout, Layout::Container);
}

#[test]
fn known_box_classifies_full_box() {
    let reg = default_registry();
    assert_eq!(reg.get(&cc(b"mvhd")).unwrap().header, HeaderKind::Full);
    assert_eq!(reg.get(&cc(b"mdat")).unwrap().header, HeaderKind::Basic);
    assert_eq!(reg.get(&cc(b"file")).unwrap().header, HeaderKind::None);

    let mvhd = Node::new(reg, cc(b"mvhd")).unwrap();
    assert_eq!(mvhd.header_len(), 12);
    assert_eq!(mvhd.get("version").unwrap().as_uint(), Some(0));
}

#[test]
fn known_box_flag_overrides() {
    let reg = default_registry();
    for (typ, flags) in [(b"tkhd", 3), (b"vmhd", 1), (b"url ", 1), (b"mdhd", 0)] {
        let node = Node::new(reg, cc(typ)).unwrap();
        assert_eq!(node.get("flags").unwrap().as_uint(), Some(flags), "{}", cc(typ));
    }
}

#[test]
fn known_box_parents_exist() {
    let reg = default_registry();
    for entry in reg.entries() {
        let Some(parent) = entry.parent else { continue };
        let p = reg.get(&parent).unwrap_or_else(|| panic!("{} has unknown parent", entry.typ));
        // sample and data entries trail a leaf table that counts them
        if !p.is_container() {
            assert!(
                p.layout.fields().iter().any(|f| f.name == "entry_count"),
                "{} sits inside leaf {}",
                entry.typ,
                parent
            );
        }
    }
}

#[test]
fn built_in_catalogue_is_shared() {
    assert!(std::ptr::eq(default_registry(), default_registry()));
    assert!(default_registry().len() >= 30);
}
