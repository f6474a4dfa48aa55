//! Error types for the cty msgpack codec.
//!
//! Encoding failures are [`SerializationError`]s, decoding failures are
//! [`DeserializationError`]s, and values that do not fit their declared type
//! are [`ValidationError`]s. The public entry points wrap all three in
//! [`Error`], which also records which operation failed and on what.

use std::fmt;

use thiserror::Error;

use crate::path::{Path, PathStep};

/// Result type for the public codec entry points.
pub type Result<T> = std::result::Result<T, Error>;

/// The encode direction failed.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A value declared as `dynamic` does not wrap a concretely typed value
    #[error("value for dynamic type must wrap a typed value, got {found}")]
    DynamicMalformed {
        /// What was found instead
        found: &'static str,
    },
    /// An object was declared but the value is not an attribute container
    #[error("value for object type must be an attribute map, got {found}")]
    ValueForObject {
        /// What was found instead
        found: &'static str,
    },
    /// An object value lacks an attribute its type requires
    #[error("object value is missing required attribute {name:?}")]
    MissingAttribute {
        /// Attribute name
        name: String,
    },
    /// An object value has an attribute its type does not declare
    #[error("object value has undeclared attribute {name:?}")]
    UndeclaredAttribute {
        /// Attribute name
        name: String,
    },
    /// A map was declared but the value is not a keyed container
    #[error("value for map type must be a keyed map, got {found}")]
    ValueForMap {
        /// What was found instead
        found: &'static str,
    },
    /// A list or set was declared but the value is not a sequence
    #[error("value for list or set type must be a sequence, got {found}")]
    ValueForListSet {
        /// What was found instead
        found: &'static str,
    },
    /// A tuple was declared but the value is not a tuple of matching length
    #[error("value for tuple type must be a tuple of {expected} elements, got {found}")]
    ValueForTuple {
        /// Number of declared element types
        expected: usize,
        /// What was found instead
        found: String,
    },
    /// Something reached the packer that msgpack cannot represent
    #[error("value of kind {found} is not msgpack serializable as {ty}")]
    NotMsgpackSerializable {
        /// What was found
        found: &'static str,
        /// Declared type
        ty: String,
    },
    /// A container or string is longer than msgpack can describe
    #[error("length {0} exceeds the msgpack limit")]
    LengthOverflow(usize),
    /// The type descriptor of a dynamic value could not be written
    #[error("type descriptor: {0}")]
    TypeDescriptor(#[from] serde_json::Error),
    /// Marker or payload write failure
    #[error("write: {0}")]
    Write(#[from] rmp::encode::ValueWriteError),
    /// IO failure
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// The decode direction failed.
#[derive(Debug, Error)]
pub enum DeserializationError {
    /// Input ended in the middle of a value
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// The reserved msgpack marker byte was found
    #[error("reserved msgpack marker 0x{0:02x}")]
    ReservedMarker(u8),
    /// A msgpack string was not valid UTF-8
    #[error("invalid utf-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Bytes remained after the top-level value
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    /// Containers nested deeper than the configured limit
    #[error("nesting depth exceeds limit of {limit}")]
    DepthLimitExceeded {
        /// Configured maximum depth
        limit: usize,
    },
    /// The payload of a refined-unknown extension could not be decoded
    #[error("malformed refinement payload: {source}")]
    MalformedRefinements {
        /// Underlying failure
        source: Box<DeserializationError>,
    },
    /// A refinement field held the wrong kind of data
    #[error("refinement field {field}: {reason}")]
    RefinementField {
        /// Name of the refinement field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },
    /// The dynamic envelope's type descriptor is not JSON
    #[error("Failed to decode dynamic value type spec from JSON: {0}")]
    DynamicTypeJson(#[source] serde_json::Error),
    /// The dynamic envelope's type descriptor is JSON but not a type
    #[error("invalid dynamic value type spec: {0}")]
    DynamicTypeSpec(#[source] TypeSpecError),
    /// IO failure
    #[error("io: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for DeserializationError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DeserializationError::UnexpectedEof
        } else {
            DeserializationError::Io(e)
        }
    }
}

/// A JSON type descriptor does not describe a type.
#[derive(Debug, Error)]
pub enum TypeSpecError {
    /// A bare string that names no primitive type
    #[error("unknown primitive type name: {0:?}")]
    UnknownPrimitive(String),
    /// The descriptor has the wrong shape
    #[error("invalid type specification: {0}")]
    Invalid(String),
    /// An object descriptor whose attribute spec is not a JSON object
    #[error("object type spec must be a JSON object, got {0}")]
    ObjectSpec(String),
    /// A tuple descriptor whose element spec is not a JSON array
    #[error("tuple type spec must be a JSON array, got {0}")]
    TupleSpec(String),
}

/// A raw value does not conform to the type it was validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
    path: Path,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
            path: Path::root(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records that the failing value sits under `step` of its parent.
    pub(crate) fn within(mut self, step: PathStep) -> Self {
        self.path.prepend(step);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "At {}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Which of the three failure families an [`Error`] belongs to.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ErrorKind {
    /// Records that the failing value sits under `step` of its parent. Only
    /// validation errors carry a path; the others pass through unchanged.
    pub(crate) fn within(self, step: PathStep) -> Self {
        match self {
            ErrorKind::Validation(e) => ErrorKind::Validation(e.within(step)),
            other => other,
        }
    }
}

/// Diagnostic context attached by every public entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Entry point that failed
    pub operation: &'static str,
    /// Display form of the declared type
    pub type_name: String,
    /// Whether the value involved was null (always false when decoding)
    pub is_null: bool,
    /// Whether the value involved was unknown (always false when decoding)
    pub is_unknown: bool,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {} (null={}, unknown={})",
            self.operation, self.type_name, self.is_null, self.is_unknown
        )
    }
}

/// Error returned by the public encode/decode entry points.
#[derive(Debug, Error)]
#[error("{context}: {kind}")]
pub struct Error {
    context: ErrorContext,
    #[source]
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(context: ErrorContext, kind: impl Into<ErrorKind>) -> Self {
        Error {
            context,
            kind: kind.into(),
        }
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Check if encoding failed.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization(_))
    }

    /// Check if the input bytes could not be decoded.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization(_))
    }

    /// Check if a value did not conform to its type.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_with_path() {
        let err = ValidationError::new("expected number")
            .within(PathStep::Index(3))
            .within(PathStep::Attribute("ports".to_string()));
        assert_eq!(err.to_string(), "At .ports[3]: expected number");
        assert_eq!(err.message(), "expected number");
    }

    #[test]
    fn test_validation_error_display_at_root() {
        let err = ValidationError::new("expected bool");
        assert_eq!(err.to_string(), "expected bool");
    }

    #[test]
    fn test_io_eof_maps_to_unexpected_eof() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(
            DeserializationError::from(io),
            DeserializationError::UnexpectedEof
        ));
    }

    #[test]
    fn test_error_predicates_and_context() {
        let context = ErrorContext {
            operation: "cty_from_msgpack",
            type_name: "string".to_string(),
            is_null: false,
            is_unknown: false,
        };
        let err = Error::new(context, DeserializationError::TrailingBytes(2));
        assert!(err.is_deserialization());
        assert!(!err.is_serialization());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "cty_from_msgpack failed for string (null=false, unknown=false): 2 trailing bytes after value"
        );
    }
}
