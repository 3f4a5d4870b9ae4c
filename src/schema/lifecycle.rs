use crate::error::{DynagraphError, Result};

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, ServerError};
use std::sync::OnceLock;

/// Two-phase holder of the process-wide schema.
///
/// Starts uninitialized and becomes ready exactly once, after discovery and
/// synthesis have completed. Requests issued before then are rejected without
/// reaching the store.
#[derive(Default)]
pub struct SchemaState {
    schema: OnceLock<Schema>,
}

impl SchemaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, schema: Schema) -> Result<()> {
        self.schema.set(schema).map_err(|_| {
            DynagraphError::SchemaGeneration("Schema has already been initialized".to_string())
        })
    }

    pub fn get(&self) -> Option<&Schema> {
        self.schema.get()
    }

    pub fn is_ready(&self) -> bool {
        self.schema.get().is_some()
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        match self.schema.get() {
            Some(schema) => schema.execute(request).await,
            None => {
                tracing::debug!("Rejecting request received before the schema was ready");
                Response::from_errors(vec![ServerError::new(
                    DynagraphError::NotReady.to_string(),
                    None,
                )])
            }
        }
    }
}
