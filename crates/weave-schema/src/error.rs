//! Build-time error taxonomy.
//!
//! Every error in this module is fatal to process startup: a schema that
//! fails to assemble is never served in a partially built state.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::operation::OperationKind;

/// Errors that can occur while assembling the merged schema.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A fragment file is missing, unreadable or malformed, or a domain
    /// declares operations without a matching resolver fragment.
    #[error("Discovery error{}: {message}", display_path(.path))]
    Discovery {
        /// File the error was found in, when it came from disk.
        path: Option<PathBuf>,
        /// Description of the problem.
        message: String,
    },

    /// SDL fields do not line up with the persistence model.
    #[error("Naming mismatch: {} field(s) have no persistence counterpart: {}", .mismatches.len(), join(.mismatches))]
    NamingMismatch {
        /// Every unmatched field across all fragments.
        mismatches: Vec<FieldMismatch>,
    },

    /// Two fragments declare the same type or field incompatibly.
    #[error(
        "Schema conflict on {type_name}{}: declared by '{first}' and '{second}' ({detail})",
        .field.as_ref().map(|f| format!(".{f}")).unwrap_or_default()
    )]
    SchemaConflict {
        /// Type the conflict was found on.
        type_name: String,
        /// Field name, or `None` for a type-level conflict.
        field: Option<String>,
        /// Domain of the fragment that declared it first.
        first: String,
        /// Domain of the fragment that collided with it.
        second: String,
        /// What differs between the two declarations.
        detail: String,
    },

    /// Operations declared in SDL that have no resolver.
    #[error("Unbound operation(s): {}", join(.operations))]
    UnboundOperation {
        /// Every operation missing a resolver.
        operations: Vec<UnboundOperation>,
    },
}

impl BuildError {
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            path: None,
            message: message.into(),
        }
    }

    pub fn discovery_at(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Discovery {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Attaches a source path to a discovery error that has none yet.
    #[must_use]
    pub fn with_path(self, source: &Path) -> Self {
        match self {
            Self::Discovery { path: None, message } => Self::Discovery {
                path: Some(source.to_path_buf()),
                message,
            },
            other => other,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "DISCOVERY_ERROR",
            Self::NamingMismatch { .. } => "NAMING_MISMATCH",
            Self::SchemaConflict { .. } => "SCHEMA_CONFLICT",
            Self::UnboundOperation { .. } => "UNBOUND_OPERATION",
        }
    }
}

/// A schema field with no counterpart in its persistence model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub domain: String,
    pub type_name: String,
    pub field: String,
    pub model: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.field)
    }
}

/// An operation with no resolver in its domain's resolver fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundOperation {
    pub domain: String,
    pub kind: OperationKind,
    pub name: String,
}

impl fmt::Display for UnboundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} (domain '{}')", self.kind, self.name, self.domain)
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_mismatch_lists_every_field() {
        let err = BuildError::NamingMismatch {
            mismatches: vec![
                FieldMismatch {
                    domain: "car".into(),
                    type_name: "Car".into(),
                    field: "mileage".into(),
                    model: "Car".into(),
                },
                FieldMismatch {
                    domain: "car".into(),
                    type_name: "Car".into(),
                    field: "color".into(),
                    model: "Car".into(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("car.mileage"));
        assert!(message.contains("car.color"));
        assert_eq!(err.error_code(), "NAMING_MISMATCH");
    }

    #[test]
    fn test_conflict_message_names_both_fragments() {
        let err = BuildError::SchemaConflict {
            type_name: "Car".into(),
            field: Some("make".into()),
            first: "car".into(),
            second: "garage".into(),
            detail: "`String` vs `Int`".into(),
        };
        let message = err.to_string();
        assert!(message.contains("Car.make"));
        assert!(message.contains("'car'"));
        assert!(message.contains("'garage'"));
    }

    #[test]
    fn test_with_path_only_fills_missing_path() {
        let err = BuildError::discovery("bad").with_path(Path::new("car.sdl"));
        assert!(err.to_string().contains("car.sdl"));

        let err = BuildError::discovery_at("a.sdl", "bad").with_path(Path::new("b.sdl"));
        assert!(err.to_string().contains("a.sdl"));
    }
}
