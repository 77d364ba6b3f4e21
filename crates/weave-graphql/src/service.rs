//! Request entry point: credential validation plus execution.

use std::fmt;
use std::sync::Arc;

use async_graphql::{Request, Response};

use crate::error::GraphQLError;
use crate::executable::ExecutableSchema;
use crate::identity::{CredentialValidator, RequestAuth};

/// Resolves each request's authentication state and executes it against a
/// shared executable schema.
#[derive(Clone)]
pub struct SchemaService {
    executable: Arc<ExecutableSchema>,
    validator: Arc<dyn CredentialValidator>,
}

impl SchemaService {
    #[must_use]
    pub fn new(executable: Arc<ExecutableSchema>, validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            executable,
            validator,
        }
    }

    #[must_use]
    pub fn executable(&self) -> &ExecutableSchema {
        &self.executable
    }

    /// Executes a request. `credential` is the raw authorization value, with
    /// or without a `Bearer ` prefix.
    pub async fn execute(&self, credential: Option<&str>, request: impl Into<Request>) -> Response {
        let auth = RequestAuth::from_credential(self.validator.as_ref(), credential).await;
        self.executable.execute(request, auth).await
    }

    /// Executes a batch sharing one credential.
    ///
    /// # Errors
    ///
    /// Returns [`GraphQLError::BatchRejected`] if the batch is not accepted.
    pub async fn execute_batch(
        &self,
        credential: Option<&str>,
        requests: Vec<Request>,
    ) -> Result<Vec<Response>, GraphQLError> {
        let auth = RequestAuth::from_credential(self.validator.as_ref(), credential).await;
        self.executable.execute_batch(requests, auth).await
    }
}

impl fmt::Debug for SchemaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaService")
            .field("executable", &self.executable)
            .finish_non_exhaustive()
    }
}
