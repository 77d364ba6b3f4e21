//! Access annotations (`@requireAuth`, `@skipAuth`).
//!
//! Annotations are read from SDL directives on types and fields. An
//! operation without any annotation resolves to `requireAuth`: absence of
//! `@skipAuth` never opens an operation to anonymous callers.

use std::fmt;

use async_graphql_parser::Positioned;
use async_graphql_parser::types::ConstDirective;
use async_graphql_value::ConstValue;
use serde::Serialize;

/// Directive names recognised as access markers.
pub mod names {
    pub const REQUIRE_AUTH: &str = "requireAuth";
    pub const SKIP_AUTH: &str = "skipAuth";
}

/// Declarative access marker attached to a type or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AccessAnnotation {
    /// Caller must be authenticated; when `roles` is non-empty the identity
    /// must carry at least one of them.
    RequireAuth { roles: Vec<String> },
    /// Operation proceeds regardless of authentication state.
    SkipAuth,
}

impl AccessAnnotation {
    #[must_use]
    pub fn require_auth() -> Self {
        Self::RequireAuth { roles: Vec::new() }
    }

    /// `requireAuth` constrained to the given roles (sorted, deduplicated).
    #[must_use]
    pub fn require_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        roles.sort();
        roles.dedup();
        Self::RequireAuth { roles }
    }

    #[must_use]
    pub fn requires_authentication(&self) -> bool {
        matches!(self, Self::RequireAuth { .. })
    }

    /// Roles any one of which satisfies this annotation. Empty when no role
    /// constraint applies.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        match self {
            Self::RequireAuth { roles } => roles,
            Self::SkipAuth => &[],
        }
    }
}

impl fmt::Display for AccessAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipAuth => write!(f, "@{}", names::SKIP_AUTH),
            Self::RequireAuth { roles } if roles.is_empty() => {
                write!(f, "@{}", names::REQUIRE_AUTH)
            }
            Self::RequireAuth { roles } => {
                let quoted: Vec<String> = roles.iter().map(|r| format!("\"{r}\"")).collect();
                write!(f, "@{}(roles: [{}])", names::REQUIRE_AUTH, quoted.join(", "))
            }
        }
    }
}

/// Where an operation's effective annotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationSource {
    Field,
    Type,
    Default,
}

impl fmt::Display for AnnotationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("field"),
            Self::Type => f.write_str("type"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// The single annotation that governs an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveAnnotation {
    pub annotation: AccessAnnotation,
    pub source: AnnotationSource,
}

impl EffectiveAnnotation {
    /// Field annotation, else enclosing type annotation, else `requireAuth`.
    #[must_use]
    pub fn resolve(field: Option<&AccessAnnotation>, ty: Option<&AccessAnnotation>) -> Self {
        match (field, ty) {
            (Some(annotation), _) => Self {
                annotation: annotation.clone(),
                source: AnnotationSource::Field,
            },
            (None, Some(annotation)) => Self {
                annotation: annotation.clone(),
                source: AnnotationSource::Type,
            },
            (None, None) => Self {
                annotation: AccessAnnotation::require_auth(),
                source: AnnotationSource::Default,
            },
        }
    }
}

/// Extracts the access annotation from a directive list.
///
/// Accepts `@requireAuth`, `@requireAuth(roles: "admin")`,
/// `@requireAuth(roles: ["admin", "owner"])` (also spelled `role:`) and
/// `@skipAuth`. Both markers on one element, or a repeated marker, is an
/// error because the element would not have exactly one annotation.
pub(crate) fn from_directives(
    directives: &[Positioned<ConstDirective>],
) -> Result<Option<AccessAnnotation>, String> {
    let mut found: Option<AccessAnnotation> = None;

    for directive in directives {
        let annotation = match directive.node.name.node.as_str() {
            names::SKIP_AUTH => AccessAnnotation::SkipAuth,
            names::REQUIRE_AUTH => {
                let argument = directive
                    .node
                    .get_argument("roles")
                    .or_else(|| directive.node.get_argument("role"));
                match argument {
                    Some(value) => AccessAnnotation::require_roles(roles_from_value(&value.node)?),
                    None => AccessAnnotation::require_auth(),
                }
            }
            _ => continue,
        };

        if let Some(previous) = &found {
            return Err(format!(
                "conflicting access annotations {previous} and {annotation}"
            ));
        }
        found = Some(annotation);
    }

    Ok(found)
}

fn roles_from_value(value: &ConstValue) -> Result<Vec<String>, String> {
    match value {
        ConstValue::String(role) => Ok(vec![role.clone()]),
        ConstValue::Enum(role) => Ok(vec![role.to_string()]),
        ConstValue::List(items) => items
            .iter()
            .map(|item| match item {
                ConstValue::String(role) => Ok(role.clone()),
                ConstValue::Enum(role) => Ok(role.to_string()),
                other => Err(format!("role must be a string, found {other}")),
            })
            .collect(),
        other => Err(format!("roles must be a string or list of strings, found {other}")),
    }
}
