use crate::boxes::{FourCC, Node, TRAILING};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::header::HeaderKind;
use crate::known_boxes::FILE;
use crate::registry::Registry;
use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace, warn};

/// How declared sizes of 0 and 0xFFFFFFFF are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// Sizes are literal; a zero size is an `InfiniteLoop` error.
    #[default]
    Strict,
    /// 0 and 0xFFFFFFFF mean "up to the end of the enclosing range".
    OpenEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub size_policy: SizePolicy,
    /// Reject missing mandatory children and repeated singletons.
    pub enforce_cardinality: bool,
    /// Maximum container nesting below the node being parsed.
    pub max_depth: Option<usize>,
}

impl ParseOptions {
    pub fn with_size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }

    pub fn with_cardinality(mut self, enforce: bool) -> Self {
        self.enforce_cardinality = enforce;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// The 8 bytes every framed box starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub size: u32,
    pub typ: FourCC,
    /// Offset of the header in the parsed buffer.
    pub start: usize,
}

const BASIC_HEADER_LEN: usize = 8;

/// Peek the size and type of the box starting at `start`.
pub fn read_box_header(buf: &[u8], start: usize) -> Result<BoxHeader> {
    let available = buf.len().saturating_sub(start);
    if available < BASIC_HEADER_LEN {
        return Err(Error::TruncatedBox {
            offset: start,
            declared: BASIC_HEADER_LEN as u64,
            available,
        });
    }
    let size = BigEndian::read_u32(&buf[start..start + 4]);
    let mut typ = [0u8; 4];
    typ.copy_from_slice(&buf[start + 4..start + 8]);
    Ok(BoxHeader {
        size,
        typ: FourCC(typ),
        start,
    })
}

/// Number of bytes the box described by `hdr` occupies, given `available`
/// bytes left in the enclosing range.
fn resolve_size(hdr: &BoxHeader, available: usize, policy: SizePolicy) -> Result<usize> {
    let size = match (hdr.size, policy) {
        (0, SizePolicy::Strict) => {
            return Err(Error::InfiniteLoop {
                typ: hdr.typ,
                offset: hdr.start,
            });
        }
        (0 | u32::MAX, SizePolicy::OpenEnded) => available,
        (size, _) => size as usize,
    };
    if size < BASIC_HEADER_LEN {
        return Err(Error::InvalidSize {
            typ: hdr.typ,
            size: size as u64,
            min_len: BASIC_HEADER_LEN,
        });
    }
    if size > available {
        return Err(Error::TruncatedBox {
            offset: hdr.start,
            declared: size as u64,
            available,
        });
    }
    Ok(size)
}

/// Parse a whole file into a header-less root container.
///
/// Uses the registry's `file` entry when present, a bare root otherwise.
pub fn parse_file(registry: &Registry, buf: &[u8], options: ParseOptions) -> Result<Node> {
    let mut root = match registry.get(&FILE) {
        Some(entry) if entry.is_container() && entry.header == HeaderKind::None => {
            Node::new(registry, FILE)?
        }
        _ => Node::root(FILE),
    };
    root.parse(registry, buf, options)?;
    Ok(root)
}

impl Node {
    /// Parse all of `buf` as a run of boxes and append them as children.
    ///
    /// On failure the children parsed so far are kept.
    pub fn parse(&mut self, registry: &Registry, buf: &[u8], options: ParseOptions) -> Result<()> {
        self.parse_range(registry, buf, 0, buf.len(), options, 0)
    }

    fn parse_range(
        &mut self,
        registry: &Registry,
        buf: &[u8],
        start: usize,
        end: usize,
        options: ParseOptions,
        depth: usize,
    ) -> Result<()> {
        if !self.is_container() {
            return Err(Error::WrongNodeKind {
                typ: self.typ(),
                expected: "container",
            });
        }
        if let Some(limit) = options.max_depth {
            if depth > limit {
                return Err(Error::TooDeep { depth: limit });
            }
        }

        let buf = &buf[..end];
        let mut pos = start;
        while pos < end {
            let hdr = read_box_header(buf, pos)?;
            let size = resolve_size(&hdr, end - pos, options.size_policy)?;
            let box_end = pos + size;

            let child = match registry.get(&hdr.typ) {
                // header-less types would re-read their own header forever
                Some(entry) if entry.header == HeaderKind::None => {
                    return Err(Error::InfiniteLoop {
                        typ: hdr.typ,
                        offset: pos,
                    });
                }
                Some(entry) if entry.is_container() => {
                    let mut node = Node::new(registry, hdr.typ)?;
                    let header_len = node.header_len();
                    if header_len > size {
                        return Err(Error::InvalidSize {
                            typ: hdr.typ,
                            size: size as u64,
                            min_len: header_len,
                        });
                    }
                    node.deserialize(buf, pos)?;
                    debug!(offset = pos, typ = %hdr.typ, size, "container");
                    node.parse_range(registry, buf, pos + header_len, box_end, options, depth + 1)?;
                    node
                }
                Some(_) => {
                    let mut node = Node::new(registry, hdr.typ)?;
                    let fixed = node.byte_len();
                    if fixed > size {
                        return Err(Error::InvalidSize {
                            typ: hdr.typ,
                            size: size as u64,
                            min_len: fixed,
                        });
                    }
                    node.deserialize(buf, pos)?;
                    if size > fixed {
                        trace!(typ = %hdr.typ, extra = size - fixed, "keeping trailing bytes");
                        node.add_field(TRAILING, Element::Raw(buf[pos + fixed..box_end].to_vec()))?;
                    }
                    debug!(offset = pos, typ = %hdr.typ, size, "leaf");
                    node
                }
                None => {
                    warn!(offset = pos, typ = %hdr.typ, size, "unknown box kept opaque");
                    let mut node = Node::opaque(hdr.typ, size - BASIC_HEADER_LEN)?;
                    node.deserialize(buf, pos)?;
                    node
                }
            };

            self.add(child)?;
            pos = box_end;
        }

        if options.enforce_cardinality {
            registry.check_children(self)?;
        }
        Ok(())
    }
}
