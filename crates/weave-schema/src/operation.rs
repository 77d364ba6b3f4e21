//! Root operation kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three GraphQL root operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// Name of the root type holding operations of this kind.
    #[must_use]
    pub fn root_type_name(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }

    /// Maps a type name to an operation kind if it is a root type.
    #[must_use]
    pub fn from_root_type(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.root_type_name() == name)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_type_name())
    }
}

/// Returns true for `Query`, `Mutation` and `Subscription`.
#[must_use]
pub fn is_root_type(name: &str) -> bool {
    OperationKind::from_root_type(name).is_some()
}
