//! Two-step create-then-publish protocol over a [`DataverseApi`].

use tracing::{info, warn};

use crate::api::{CreatedDataset, DataverseApi, PublishResult};
use crate::error::PublishError;
use crate::payload::SerializedPayload;

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Creates and publishes datasets through an explicitly constructed API
/// client.
///
/// Calls are issued one at a time and never retried; creating the same
/// payload twice creates two datasets.
#[derive(Debug, Clone)]
pub struct DatasetPublisher<A> {
    api: A,
}

impl<A> DatasetPublisher<A>
where
    A: DataverseApi,
{
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Creates a draft dataset in `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Remote`] when the server does not answer
    /// `201 Created`; the error carries the raw response body.
    pub async fn create(
        &self,
        parent: &str,
        payload: &SerializedPayload,
    ) -> Result<CreatedDataset, PublishError> {
        match self.api.create_dataset(parent, payload).await {
            Ok(created) => {
                info!(
                    parent,
                    id = created.id,
                    persistent_id = %created.persistent_id,
                    "dataset created"
                );
                Ok(created)
            }
            Err(err) => {
                if let PublishError::Remote { status, body, .. } = &err {
                    warn!(parent, status, body = %body_preview(body), "dataset creation rejected");
                }
                Err(err)
            }
        }
    }

    /// Publishes a draft dataset as a new major version.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Remote`] on any non-success status.
    pub async fn publish(&self, persistent_id: &str) -> Result<PublishResult, PublishError> {
        let result = self.api.publish_dataset(persistent_id).await?;
        info!(persistent_id, status = %result.status, "dataset published");
        Ok(result)
    }
}

/// Collapses whitespace and truncates a response body for log output.
fn body_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
