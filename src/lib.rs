pub mod api;
pub mod boxes;
pub mod element;
pub mod error;
pub mod header;
pub mod known_boxes;
pub mod parser;
pub mod registry;
pub mod util;

pub use api::{hex_range, to_json_tree};
pub use boxes::{Config, FourCC, Node, NodeKind};
pub use element::{Element, ElementKind, ElementSpec, Value};
pub use error::{Error, Result};
pub use header::HeaderKind;
pub use parser::{ParseOptions, SizePolicy, parse_file, read_box_header};
pub use registry::{Registry, SchemaEntry, default_registry};
