//! Access gate evaluated for every operation at request time.
//!
//! | annotation            | Unauthenticated | Authenticated              |
//! |-----------------------|-----------------|----------------------------|
//! | `@skipAuth`           | allowed         | allowed                    |
//! | `@requireAuth`        | Unauthorized    | allowed                    |
//! | `@requireAuth(roles)` | Unauthorized    | allowed if any role held, else Forbidden |
//!
//! A denial is terminal for that operation only.

use tracing::{debug, warn};
use weave_schema::AccessAnnotation;

use crate::identity::RequestAuth;

/// Request-time access failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// No verified identity for an operation requiring authentication.
    #[error("Unauthorized: {operation} requires authentication")]
    Unauthorized { operation: String },

    /// Identity lacks every role the operation accepts.
    #[error("Forbidden: {operation} requires one of the roles [{}]", .required.join(", "))]
    Forbidden {
        operation: String,
        required: Vec<String>,
    },
}

impl AccessError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

/// Stateless evaluator for access annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Checks `annotation` for `operation` against the request state.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] or [`AccessError::Forbidden`].
    pub fn check(
        annotation: &AccessAnnotation,
        auth: &RequestAuth,
        operation: &str,
    ) -> Result<(), AccessError> {
        let roles = match annotation {
            AccessAnnotation::SkipAuth => return Ok(()),
            AccessAnnotation::RequireAuth { roles } => roles,
        };

        let Some(identity) = auth.identity() else {
            debug!(operation, "Denied unauthenticated request");
            return Err(AccessError::Unauthorized {
                operation: operation.to_string(),
            });
        };

        if roles.is_empty() || identity.has_any_role(roles) {
            return Ok(());
        }

        warn!(
            operation,
            subject = %identity.subject,
            required = ?roles,
            "Denied request lacking required role"
        );
        Err(AccessError::Forbidden {
            operation: operation.to_string(),
            required: roles.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn admin() -> RequestAuth {
        RequestAuth::Authenticated(Identity::new("ada").with_role("admin"))
    }

    fn member() -> RequestAuth {
        RequestAuth::Authenticated(Identity::new("bob").with_role("member"))
    }

    #[test]
    fn test_skip_auth_always_passes() {
        let skip = AccessAnnotation::SkipAuth;
        assert!(AccessGate::check(&skip, &RequestAuth::Unauthenticated, "Query.cars").is_ok());
        assert!(AccessGate::check(&skip, &member(), "Query.cars").is_ok());
    }

    #[test]
    fn test_require_auth_rejects_unauthenticated() {
        let err = AccessGate::check(
            &AccessAnnotation::require_auth(),
            &RequestAuth::Unauthenticated,
            "Query.cars",
        )
        .unwrap_err();
        assert_eq!(
            err,
            AccessError::Unauthorized {
                operation: "Query.cars".into()
            }
        );
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_role_constraint() {
        let annotation = AccessAnnotation::require_roles(["admin"]);
        assert!(AccessGate::check(&annotation, &admin(), "Mutation.deleteCar").is_ok());

        let err = AccessGate::check(&annotation, &member(), "Mutation.deleteCar").unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert!(err.to_string().contains("[admin]"));

        let err =
            AccessGate::check(&annotation, &RequestAuth::Unauthenticated, "Mutation.deleteCar")
                .unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_any_of_roles() {
        let annotation = AccessAnnotation::require_roles(["admin", "member"]);
        assert!(AccessGate::check(&annotation, &member(), "Query.cars").is_ok());
    }
}
