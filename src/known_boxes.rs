//! Built-in box catalogue.
//!
//! Pure data: each entry names a box, where it lives, how it is framed and the
//! fixed fields of its body. Variable-length tables (sample sizes, chunk
//! offsets, ...) are not described; their bytes survive a parse as trailing
//! data on the leaf.

use crate::boxes::FourCC;
use crate::element::{ElementKind, ElementKind::*, ElementSpec, Value};
use crate::header::HeaderKind::{Basic, Full, None as Bare};
use crate::registry::{Quantity::*, SchemaEntry};

/// Type code of the header-less whole-file root.
pub const FILE: FourCC = FourCC(*b"file");

// 16.16 / 2.30 fixed point identity transform
const UNITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

fn f(name: &str, kind: ElementKind, default: impl Into<Value>) -> ElementSpec {
    ElementSpec::new(name, kind, default)
}

pub fn catalogue() -> Vec<SchemaEntry> {
    vec![
        SchemaEntry::container(b"file", Bare)
            .named("File")
            .cardinality(true, One),
        SchemaEntry::leaf(b"ftyp", Basic, vec![
            f("major_brand", Text, "isom"),
            f("minor_version", U32, 0u32),
            f("compatible_brands", Text, "mp41"),
        ])
        .named("File Type Box")
        .within(b"file")
        .cardinality(true, One),
        SchemaEntry::container(b"moov", Basic)
            .named("Movie Box")
            .within(b"file")
            .cardinality(true, One),
        SchemaEntry::leaf(b"mdat", Basic, vec![])
            .named("Media Data Box")
            .within(b"file")
            .cardinality(false, Any),
        SchemaEntry::leaf(b"free", Basic, vec![])
            .named("Free Space Box")
            .cardinality(false, Any),
        SchemaEntry::leaf(b"skip", Basic, vec![])
            .named("Free Space Box")
            .cardinality(false, Any),
        SchemaEntry::leaf(b"mvhd", Full, vec![
            f("creation_time", U32, 0u32),
            f("modification_time", U32, 0u32),
            // milliseconds
            f("timescale", U32, 1000u32),
            // undetermined
            f("duration", U32, 0xffff_ffffu32),
            f("rate", U32, 0x0001_0000u32),
            f("volume", U16, 0x0100u32),
            f("reserved", Padding, 10u32),
            f("matrix", U32Array, UNITY_MATRIX.to_vec()),
            f("pre_defined", Padding, 24u32),
            f("next_track_ID", U32, 0xffff_ffffu32),
        ])
        .named("Movie Header Box")
        .within(b"moov")
        .cardinality(true, One),
        SchemaEntry::container(b"trak", Basic)
            .named("Track Box")
            .within(b"moov")
            .cardinality(true, OneOrMore),
        SchemaEntry::container(b"mvex", Basic)
            .named("Movie Extends Box")
            .within(b"moov")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::leaf(b"trex", Full, vec![
            f("track_ID", U32, 1u32),
            f("default_sample_description_index", U32, 1u32),
            f("default_sample_duration", U32, 0u32),
            f("default_sample_size", U32, 0u32),
            f("default_sample_flags", U32, 0u32),
        ])
        .named("Track Extends Box")
        .within(b"mvex")
        .cardinality(true, OneOrMore),
        SchemaEntry::container(b"udta", Basic)
            .named("User Data Box")
            .cardinality(false, ZeroOrOne),
        // flags: 0x1 enabled, 0x2 in movie, 0x4 in preview
        SchemaEntry::leaf(b"tkhd", Full, vec![
            f("creation_time", U32, 0u32),
            f("modification_time", U32, 0u32),
            f("track_ID", U32, 1u32),
            f("reserved", Padding, 4u32),
            f("duration", U32, 0u32),
            f("reserved2", Padding, 8u32),
            f("layer", U16, 0u32),
            f("alternate_group", U16, 0u32),
            f("volume", U16, 0x0100u32),
            f("reserved3", Padding, 2u32),
            f("matrix", U32Array, UNITY_MATRIX.to_vec()),
            f("width", U32, 0u32),
            f("height", U32, 0u32),
        ])
        .named("Track Header Box")
        .within(b"trak")
        .with_override("flags", 0x0000_0003u32)
        .cardinality(true, One),
        SchemaEntry::container(b"tref", Basic)
            .named("Track Reference Box")
            .within(b"trak")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::container(b"edts", Basic)
            .named("Edit Box")
            .within(b"trak")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::leaf(b"elst", Full, vec![f("entry_count", U32, 0u32)])
            .named("Edit List Box")
            .within(b"edts")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::container(b"mdia", Basic)
            .named("Media Box")
            .within(b"trak")
            .cardinality(true, One),
        SchemaEntry::leaf(b"mdhd", Full, vec![
            f("creation_time", U32, 0u32),
            f("modification_time", U32, 0u32),
            f("timescale", U32, 1000u32),
            f("duration", U32, 0xffff_ffffu32),
            // packed ISO 639-2/T code
            f("language", U16, 0u32),
            f("pre_defined", U16, 0u32),
        ])
        .named("Media Header Box")
        .within(b"mdia")
        .cardinality(true, One),
        SchemaEntry::leaf(b"hdlr", Full, vec![
            f("pre_defined", U32, 0u32),
            // 'vide', 'soun' or 'hint'
            f("handler_type", Text, "vide"),
            f("reserved", Padding, 12u32),
            f("name", Text, "VideoHandler\0"),
        ])
        .named("Handler Reference Box")
        .within(b"mdia")
        .cardinality(true, One),
        SchemaEntry::container(b"minf", Basic)
            .named("Media Information Box")
            .within(b"mdia")
            .cardinality(true, One),
        SchemaEntry::leaf(b"vmhd", Full, vec![
            f("graphicsmode", U16, 0u32),
            f("opcolor", U16Array, vec![0u32, 0, 0]),
        ])
        .named("Video Media Header Box")
        .within(b"minf")
        .with_override("flags", 0x0000_0001u32)
        .cardinality(false, ZeroOrOne),
        SchemaEntry::leaf(b"smhd", Full, vec![
            // 8.8 fixed point, 0 = center
            f("balance", U16, 0u32),
            f("reserved", U16, 0u32),
        ])
        .named("Sound Media Header Box")
        .within(b"minf")
        .cardinality(false, ZeroOrOne),
        SchemaEntry::container(b"dinf", Basic)
            .named("Data Information Box")
            .within(b"minf")
            .cardinality(true, One),
        // entries follow as child boxes; keep entry_count in step
        SchemaEntry::leaf(b"dref", Full, vec![f("entry_count", U32, 0u32)])
            .named("Data Reference Box")
            .within(b"dinf")
            .cardinality(true, One),
        // flag 0x1: media is in the same file, no location
        SchemaEntry::leaf(b"url ", Full, vec![f("location", Text, "")])
            .named("Data Entry URL Box")
            .within(b"dref")
            .with_override("flags", 0x0000_0001u32)
            .cardinality(true, OneOrMore),
        SchemaEntry::container(b"stbl", Basic)
            .named("Sample Table Box")
            .within(b"minf")
            .cardinality(true, One),
        SchemaEntry::leaf(b"stsd", Full, vec![f("entry_count", U32, 0u32)])
            .named("Sample Description Box")
            .within(b"stbl")
            .cardinality(true, One),
        SchemaEntry::leaf(b"avc1", Basic, vec![
            f("reserved", Padding, 6u32),
            f("data_reference_index", U16, 1u32),
            f("pre_defined", U16, 0u32),
            f("reserved2", Padding, 2u32),
            f("pre_defined2", U32Array, vec![0u32, 0, 0]),
            f("width", U16, 0u32),
            f("height", U16, 0u32),
            f("horizresolution", U32, 0x0048_0000u32),
            f("vertresolution", U32, 0x0048_0000u32),
            f("reserved3", Padding, 4u32),
            f("frame_count", U16, 1u32),
            f("compressorname", Padding, 32u32),
            f("depth", U16, 0x0018u32),
            f("pre_defined3", U16, 0xffffu32),
        ])
        .named("AVC Sample Entry")
        .within(b"stsd")
        .cardinality(false, Any),
        SchemaEntry::leaf(b"stts", Full, vec![f("entry_count", U32, 0u32)])
            .named("Decoding Time to Sample Box")
            .within(b"stbl")
            .cardinality(true, One),
        SchemaEntry::leaf(b"ctts", Full, vec![f("entry_count", U32, 0u32)])
            .named("Composition Time to Sample Box")
            .within(b"stbl")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::leaf(b"stss", Full, vec![f("entry_count", U32, 0u32)])
            .named("Sync Sample Box")
            .within(b"stbl")
            .cardinality(false, ZeroOrOne),
        SchemaEntry::leaf(b"stsz", Full, vec![
            f("sample_size", U32, 0u32),
            f("sample_count", U32, 0u32),
        ])
        .named("Sample Size Box")
        .within(b"stbl")
        .cardinality(true, One),
        SchemaEntry::leaf(b"stsc", Full, vec![f("entry_count", U32, 0u32)])
            .named("Sample To Chunk Box")
            .within(b"stbl")
            .cardinality(true, One),
        SchemaEntry::leaf(b"stco", Full, vec![f("entry_count", U32, 0u32)])
            .named("Chunk Offset Box")
            .within(b"stbl")
            .cardinality(true, One),
    ]
}
