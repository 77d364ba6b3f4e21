//! Error types for the GraphQL layer.
//!
//! Build-time failures wrap [`BuildError`]; request-time failures are scoped
//! to one operation and surface as GraphQL errors with a `code` extension.

use std::fmt;

use async_graphql::ErrorExtensions;
use weave_schema::BuildError;

use crate::gate::AccessError;
use crate::resolver::ResolverError;

/// Errors produced while building or executing an assembled schema.
#[derive(Debug)]
pub enum GraphQLError {
    /// Discovery, naming, conflict or binding failure.
    Build(BuildError),

    /// The merged definition could not be turned into an executable schema.
    SchemaBuildFailed(String),

    /// Access gate denied an operation.
    Access(AccessError),

    /// A resolver failed.
    Resolver {
        /// `Type.field` that failed.
        operation: String,
        source: ResolverError,
    },

    /// Batch request rejected as a whole.
    BatchRejected(String),

    /// Internal error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(err) => write!(f, "{err}"),
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::Access(err) => write!(f, "{err}"),
            Self::Resolver { operation, source } => {
                write!(f, "{operation} failed: {source}")
            }
            Self::BatchRejected(msg) => write!(f, "Batch rejected: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Build(err) => Some(err),
            Self::Access(err) => Some(err),
            Self::Resolver { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl GraphQLError {
    /// HTTP status code for hosts exposing the service over HTTP.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Build(_) | Self::SchemaBuildFailed(_) | Self::Internal(_) => 500,
            Self::Access(AccessError::Unauthorized { .. }) => 401,
            Self::Access(AccessError::Forbidden { .. }) => 403,
            Self::Resolver { source, .. } => match source.code.as_str() {
                "NOT_FOUND" => 404,
                "BAD_USER_INPUT" => 400,
                _ => 500,
            },
            Self::BatchRejected(_) => 400,
        }
    }

    /// Value of the `code` extension on the GraphQL error.
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::Build(err) => err.error_code(),
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::Access(err) => err.error_code(),
            Self::Resolver { source, .. } => &source.code,
            Self::BatchRejected(_) => "BATCH_REJECTED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<BuildError> for GraphQLError {
    fn from(err: BuildError) -> Self {
        Self::Build(err)
    }
}

impl From<AccessError> for GraphQLError {
    fn from(err: AccessError) -> Self {
        Self::Access(err)
    }
}

impl ErrorExtensions for GraphQLError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code().to_string();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let unauthorized = GraphQLError::Access(AccessError::Unauthorized {
            operation: "Query.cars".into(),
        });
        assert_eq!(unauthorized.status_code(), 401);

        let forbidden = GraphQLError::Access(AccessError::Forbidden {
            operation: "Query.cars".into(),
            required: vec!["admin".into()],
        });
        assert_eq!(forbidden.status_code(), 403);

        let missing = GraphQLError::Resolver {
            operation: "Query.car".into(),
            source: ResolverError::not_found("Car 9"),
        };
        assert_eq!(missing.status_code(), 404);
        assert_eq!(GraphQLError::BatchRejected("too big".into()).status_code(), 400);
    }

    #[test]
    fn test_error_codes() {
        let build = GraphQLError::from(BuildError::discovery("missing root"));
        assert_eq!(build.error_code(), "DISCOVERY_ERROR");
        assert_eq!(
            GraphQLError::SchemaBuildFailed("x".into()).error_code(),
            "SCHEMA_BUILD_FAILED"
        );
        let resolver = GraphQLError::Resolver {
            operation: "Query.car".into(),
            source: ResolverError::new("boom").with_code("UPSTREAM"),
        };
        assert_eq!(resolver.error_code(), "UPSTREAM");
        assert_eq!(resolver.to_string(), "Query.car failed: boom");
    }

    #[test]
    fn test_extension_carries_code() {
        let err = GraphQLError::Access(AccessError::Unauthorized {
            operation: "Query.cars".into(),
        })
        .extend();
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("UNAUTHORIZED")));
    }
}
