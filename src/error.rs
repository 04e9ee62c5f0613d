//! Error types for the box engine.

use crate::boxes::FourCC;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No schema entry exists for a box type that has to be built from one.
    #[error("no schema for box type '{0}'")]
    SchemaMissing(FourCC),

    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// A load or store would touch bytes outside the buffer.
    #[error("out of bounds: {len} bytes at offset {offset}, buffer holds {available}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// A box declares more bytes than remain in the enclosing range.
    #[error("truncated box at offset {offset}: declared {declared} bytes, {available} available")]
    TruncatedBox {
        offset: usize,
        declared: u64,
        available: usize,
    },

    /// A zero size would never advance the parse cursor.
    #[error("zero-sized box '{typ}' at offset {offset}")]
    InfiniteLoop { typ: FourCC, offset: usize },

    /// Declared size cannot hold the box's header or fixed fields.
    #[error("box '{typ}' declares size {size}, smaller than its {min_len}-byte layout")]
    InvalidSize {
        typ: FourCC,
        size: u64,
        min_len: usize,
    },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("box '{typ}' is not a {expected}")]
    WrongNodeKind { typ: FourCC, expected: &'static str },

    #[error("box '{typ}' is {len} bytes, too large for a 32-bit size")]
    TooLarge { typ: FourCC, len: usize },

    #[error("box nesting exceeds depth {depth}")]
    TooDeep { depth: usize },

    #[error("'{parent}' is missing mandatory child '{child}'")]
    MissingMandatory { parent: FourCC, child: FourCC },

    #[error("'{parent}' holds {count} '{child}' boxes, at most one allowed")]
    TooMany {
        parent: FourCC,
        child: FourCC,
        count: usize,
    },

    /// Malformed JSON schema catalogue.
    #[error("schema: {0}")]
    Schema(#[from] serde_json::Error),
}

impl Error {
    /// Attach a field name to a value error raised below the field table.
    pub(crate) fn for_field(self, name: &str) -> Error {
        match self {
            Error::InvalidValue { reason, .. } => Error::InvalidValue {
                field: name.to_string(),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
