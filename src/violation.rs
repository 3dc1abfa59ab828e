use jsonschema::error::ValidationErrorKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    TypeMismatch,
    MissingRequired,
    EnumViolation,
    FormatMismatch,
    OneOfNoMatch,
    AnyOfNoMatch,
    Other,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::EnumViolation => "ENUM_VIOLATION",
            Self::FormatMismatch => "FORMAT_MISMATCH",
            Self::OneOfNoMatch => "ONEOF_NO_MATCH",
            Self::AnyOfNoMatch => "ANYOF_NO_MATCH",
            Self::Other => "SCHEMA_VIOLATION",
        }
    }
}

/// Maps a `jsonschema` error kind onto the coarser kinds used in messages
pub fn map_violation_kind(kind: &ValidationErrorKind) -> ViolationKind {
    match kind {
        ValidationErrorKind::Type { .. } => ViolationKind::TypeMismatch,
        ValidationErrorKind::Required { .. } => ViolationKind::MissingRequired,
        ValidationErrorKind::Enum { .. } => ViolationKind::EnumViolation,
        ValidationErrorKind::Format { .. } => ViolationKind::FormatMismatch,
        ValidationErrorKind::OneOfNotValid { .. } => ViolationKind::OneOfNoMatch,
        ValidationErrorKind::AnyOf { .. } => ViolationKind::AnyOfNoMatch,
        _ => ViolationKind::Other,
    }
}

/// A single schema failure, located inside the validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub kind: ViolationKind,
    pub location: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] at {} - {}", self.kind.as_str(), self.location, self.message)
    }
}
