use crate::element::{Element, Value, bytes_to_text};
use crate::error::{Error, Result};
use crate::header::{HeaderKind, header_fields};
use crate::registry::{Layout, Registry};
use crate::util::span;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl FromStr for FourCC {
    type Err = String;

    /// Accepts four chars, each a single byte (U+0000..=U+00FF).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes: Vec<u8> = s
            .chars()
            .map(|c| u8::try_from(c as u32))
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| format!("'{s}' is not a byte string"))?;
        <[u8; 4]>::try_from(bytes.as_slice())
            .map(FourCC)
            .map_err(|_| format!("'{s}' is not four characters"))
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&bytes_to_text(&self.0))
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-instance field overrides applied at construction.
pub type Config = BTreeMap<String, Value>;

/// Field holding the bytes of a leaf box beyond its schema layout.
pub const TRAILING: &str = "trailing";
/// Field holding the body of an opaque box.
pub const PAYLOAD: &str = "payload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Body is the schema's fixed fields.
    Leaf,
    /// Body is child boxes, in document order.
    Container(Vec<Node>),
    /// Type not in the registry; body kept verbatim.
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    offset: usize,
    element: Element,
}

/// One box: its named fields laid out back to back, plus children for containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    typ: FourCC,
    header: HeaderKind,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    fields_len: usize,
    kind: NodeKind,
}

impl Node {
    fn empty(typ: FourCC, header: HeaderKind, kind: NodeKind) -> Self {
        Self {
            typ,
            header,
            fields: Vec::new(),
            index: HashMap::new(),
            fields_len: 0,
            kind,
        }
    }

    /// Build a box of type `typ` holding its schema defaults.
    pub fn new(registry: &Registry, typ: FourCC) -> Result<Self> {
        Self::with_config(registry, typ, &Config::new())
    }

    /// Build a box, then apply the schema's fixed overrides and `config` on top.
    ///
    /// Keys that name no field are ignored in both layers.
    pub fn with_config(registry: &Registry, typ: FourCC, config: &Config) -> Result<Self> {
        let entry = registry.get(&typ).ok_or(Error::SchemaMissing(typ))?;
        let kind = match entry.layout {
            Layout::Container => NodeKind::Container(Vec::new()),
            Layout::Fields(_) => NodeKind::Leaf,
        };
        let mut node = Node::empty(typ, entry.header, kind);
        for spec in header_fields(entry.header, typ).iter().chain(entry.layout.fields()) {
            node.push_field(&spec.name, spec.build()?)?;
        }
        for (name, value) in entry.overrides.iter().chain(config) {
            if node.has(name) {
                node.set(name, value.clone())?;
            } else {
                trace!(typ = %typ, field = %name, "ignoring override for missing field");
            }
        }
        Ok(node)
    }

    /// Build a container and append `children` in order.
    pub fn container(
        registry: &Registry,
        typ: FourCC,
        children: impl IntoIterator<Item = Node>,
    ) -> Result<Self> {
        let mut node = Self::new(registry, typ)?;
        for child in children {
            node.add(child)?;
        }
        Ok(node)
    }

    /// Header-less container for a whole file.
    pub fn root(typ: FourCC) -> Self {
        Node::empty(typ, HeaderKind::None, NodeKind::Container(Vec::new()))
    }

    /// Box of an unregistered type: basic header plus `payload_len` uninterpreted bytes.
    pub fn opaque(typ: FourCC, payload_len: usize) -> Result<Self> {
        let mut node = Node::empty(typ, HeaderKind::Basic, NodeKind::Opaque);
        for spec in header_fields(HeaderKind::Basic, typ) {
            node.push_field(&spec.name, spec.build()?)?;
        }
        node.push_field(PAYLOAD, Element::Raw(vec![0; payload_len]))?;
        Ok(node)
    }

    fn push_field(&mut self, name: &str, element: Element) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(Error::DuplicateField(name.to_string()));
        }
        let len = element.byte_len();
        self.index.insert(name.to_string(), self.fields.len());
        self.fields.push(Field {
            name: name.to_string(),
            offset: self.fields_len,
            element,
        });
        self.fields_len += len;
        Ok(())
    }

    /// Append a field at the current end of a leaf or opaque box.
    pub fn add_field(&mut self, name: &str, element: Element) -> Result<&mut Self> {
        if self.is_container() {
            return Err(Error::WrongNodeKind {
                typ: self.typ,
                expected: "leaf box",
            });
        }
        self.push_field(name, element)?;
        Ok(self)
    }

    /// Append a child to a container.
    pub fn add(&mut self, child: Node) -> Result<&mut Self> {
        match &mut self.kind {
            NodeKind::Container(children) => {
                children.push(child);
                Ok(self)
            }
            _ => Err(Error::WrongNodeKind {
                typ: self.typ,
                expected: "container",
            }),
        }
    }

    pub fn typ(&self) -> FourCC {
        self.typ
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn header_kind(&self) -> HeaderKind {
        self.header
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    pub fn header_len(&self) -> usize {
        self.header.byte_len()
    }

    /// Total encoded length: own fields plus, for containers, every child.
    pub fn byte_len(&self) -> usize {
        self.fields_len + self.children().iter().map(Node::byte_len).sum::<usize>()
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&i| &self.fields[i].element)
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.element(name)
            .map(Element::value)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?;
        self.fields[i]
            .element
            .set(&value.into())
            .map_err(|e| e.for_field(name))
    }

    /// Byte offset of a field relative to the start of this box.
    pub fn offset(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|&i| self.fields[i].offset)
    }

    /// `(name, offset, element)` for every field in layout order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, usize, &Element)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset, &f.element))
    }

    /// Value of the `size` field as last loaded or stored.
    pub fn declared_size(&self) -> Option<u32> {
        self.get("size").ok().and_then(|v| v.as_uint())
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Container(children) => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        match &mut self.kind {
            NodeKind::Container(children) => children,
            _ => &mut [],
        }
    }

    /// Child by its synthetic slot key (`box_0`, `box_1`, ...).
    pub fn child(&self, key: &str) -> Option<&Node> {
        let i: usize = key.strip_prefix("box_")?.parse().ok()?;
        self.children().get(i)
    }

    /// First descendant of type `typ`, depth first.
    pub fn find(&self, typ: FourCC) -> Option<&Node> {
        self.children()
            .iter()
            .find_map(|c| if c.typ == typ { Some(c) } else { c.find(typ) })
    }

    pub fn find_mut(&mut self, typ: FourCC) -> Option<&mut Node> {
        let pos = self.children().iter().position(|c| c.typ == typ);
        match pos {
            Some(i) => self.children_mut().get_mut(i),
            None => self.children_mut().iter_mut().find_map(|c| c.find_mut(typ)),
        }
    }

    /// Descendants matching a dotted path such as `moov.trak[1].mdia`.
    ///
    /// A bracketed index picks one match among siblings; without it every match
    /// is followed.
    pub fn select(&self, path: &str) -> Vec<&Node> {
        let mut current: Vec<&Node> = vec![self];
        for seg in path.split('.') {
            let (name, idx) = parse_segment(seg);
            let Ok(typ) = name.parse::<FourCC>() else {
                return Vec::new();
            };
            let mut next = Vec::new();
            for node in &current {
                let mut matches: Vec<&Node> =
                    node.children().iter().filter(|c| c.typ == typ).collect();
                match idx {
                    Some(i) => next.extend(matches.get(i).copied()),
                    None => next.append(&mut matches),
                }
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }

    pub fn find_path(&self, path: &str) -> Option<&Node> {
        self.select(path).into_iter().next()
    }

    /// Encode the whole tree into a fresh buffer of exactly `byte_len()` bytes.
    ///
    /// Every `size` field in the tree is rewritten to its box's length first.
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.byte_len()];
        self.store(&mut buf, 0)?;
        Ok(buf)
    }

    /// Encode into `buf` at `offset`, returning the number of bytes written.
    pub fn store(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let len = self.byte_len();
        span(offset, len, buf.len())?;
        if self.has("size") {
            let size = u32::try_from(len).map_err(|_| Error::TooLarge { typ: self.typ, len })?;
            self.set("size", size)?;
        }
        for f in &self.fields {
            f.element.store(buf, offset + f.offset)?;
        }
        let mut pos = offset + self.fields_len;
        if let NodeKind::Container(children) = &mut self.kind {
            for child in children {
                pos += child.store(buf, pos)?;
            }
        }
        Ok(len)
    }

    /// Load this box's own fields from `buf` at `offset`.
    ///
    /// Children are not touched and the loaded `size` is not checked against
    /// `byte_len()`; the container parser reconciles both.
    pub fn deserialize(&mut self, buf: &[u8], offset: usize) -> Result<()> {
        for f in &mut self.fields {
            f.element.load(buf, offset + f.offset)?;
        }
        Ok(())
    }
}

fn parse_segment(seg: &str) -> (&str, Option<usize>) {
    if let Some(l) = seg.find('[') {
        let name = &seg[..l];
        if let Some(r) = seg[l + 1..].find(']') {
            let idx = seg[l + 1..l + 1 + r].parse::<usize>().ok();
            return (name, idx);
        }
        (name, None)
    } else {
        (seg, None)
    }
}
