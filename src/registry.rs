use crate::boxes::{Config, FourCC, Node};
use crate::element::{ElementSpec, Value};
use crate::error::{Error, Result};
use crate::header::HeaderKind;
use crate::known_boxes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// How many boxes of a type a parent may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    One,
    ZeroOrOne,
    OneOrMore,
    Any,
}

impl Quantity {
    pub fn allows_many(self) -> bool {
        matches!(self, Quantity::OneOrMore | Quantity::Any)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub mandatory: bool,
    pub quantity: Quantity,
}

/// What follows a box's header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Child boxes only.
    Container,
    /// Fixed fields, in order.
    Fields(Vec<ElementSpec>),
}

impl Layout {
    pub fn fields(&self) -> &[ElementSpec] {
        match self {
            Layout::Container => &[],
            Layout::Fields(fields) => fields,
        }
    }
}

/// Everything the engine knows about one box type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub typ: FourCC,
    /// Human-readable name, e.g. "File Type Box".
    #[serde(default)]
    pub name: String,
    /// Box type expected to contain this one.
    #[serde(default)]
    pub parent: Option<FourCC>,
    pub header: HeaderKind,
    pub layout: Layout,
    /// Field values forced for every instance of this type (e.g. flag bits).
    #[serde(default, skip_serializing_if = "Config::is_empty")]
    pub overrides: Config,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
}

impl SchemaEntry {
    pub fn leaf(typ: &[u8; 4], header: HeaderKind, fields: Vec<ElementSpec>) -> Self {
        Self::with_layout(typ, header, Layout::Fields(fields))
    }

    pub fn container(typ: &[u8; 4], header: HeaderKind) -> Self {
        Self::with_layout(typ, header, Layout::Container)
    }

    fn with_layout(typ: &[u8; 4], header: HeaderKind, layout: Layout) -> Self {
        Self {
            typ: FourCC(*typ),
            name: String::new(),
            parent: None,
            header,
            layout,
            overrides: Config::new(),
            cardinality: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn within(mut self, parent: &[u8; 4]) -> Self {
        self.parent = Some(FourCC(*parent));
        self
    }

    pub fn with_override(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.overrides.insert(field.to_string(), value.into());
        self
    }

    pub fn cardinality(mut self, mandatory: bool, quantity: Quantity) -> Self {
        self.cardinality = Some(Cardinality { mandatory, quantity });
        self
    }

    pub fn is_container(&self) -> bool {
        matches!(self.layout, Layout::Container)
    }
}

/// Catalogue of box schemas keyed by type code.
///
/// Immutable once shared; build it with [`Registry::with_entry`] or load it
/// from JSON with [`Registry::from_json`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    map: HashMap<FourCC, SchemaEntry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with `entry` added, replacing any entry of the same type.
    pub fn with_entry(mut self, entry: SchemaEntry) -> Self {
        self.map.insert(entry.typ, entry);
        self
    }

    pub fn get(&self, typ: &FourCC) -> Option<&SchemaEntry> {
        self.map.get(typ)
    }

    pub fn contains(&self, typ: &FourCC) -> bool {
        self.map.contains_key(typ)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All entries, ordered by type code.
    pub fn entries(&self) -> Vec<&SchemaEntry> {
        let mut entries: Vec<_> = self.map.values().collect();
        entries.sort_by_key(|e| e.typ);
        entries
    }

    /// Entries whose declared parent is `parent`, ordered by type code.
    pub fn children_of(&self, parent: FourCC) -> Vec<&SchemaEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.parent == Some(parent))
            .collect()
    }

    /// Load a catalogue from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<SchemaEntry> = serde_json::from_str(json)?;
        Ok(entries.into_iter().collect())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries())?)
    }

    /// Check a container's children against the cardinality of every entry
    /// declared to live inside it.
    pub fn check_children(&self, parent: &Node) -> Result<()> {
        for entry in self.children_of(parent.typ()) {
            let Some(card) = entry.cardinality else {
                continue;
            };
            let count = parent
                .children()
                .iter()
                .filter(|c| c.typ() == entry.typ)
                .count();
            if card.mandatory && count == 0 {
                return Err(Error::MissingMandatory {
                    parent: parent.typ(),
                    child: entry.typ,
                });
            }
            if !card.quantity.allows_many() && count > 1 {
                return Err(Error::TooMany {
                    parent: parent.typ(),
                    child: entry.typ,
                    count,
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<SchemaEntry> for Registry {
    fn from_iter<I: IntoIterator<Item = SchemaEntry>>(iter: I) -> Self {
        iter.into_iter().fold(Registry::new(), Registry::with_entry)
    }
}

/// The built-in catalogue, built on first use and shared read-only afterwards.
pub fn default_registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| known_boxes::catalogue().into_iter().collect())
}
