//! Port for the two Dataverse API calls a run needs.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PublishError;
use crate::payload::SerializedPayload;

/// Identifiers assigned to a freshly created draft dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDataset {
    /// Numeric database id.
    pub id: u64,
    /// Persistent identifier, e.g. `doi:10.5072/FK2/ABCDEF`.
    pub persistent_id: String,
}

/// Outcome of publishing a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// Numeric database id reported by the server, when present.
    pub id: Option<u64>,
    /// Persistent identifier that was published.
    pub persistent_id: String,
    /// Status reported in the response envelope.
    pub status: String,
    /// Full response document.
    pub response: Value,
}

/// Dataverse operations used by the publisher.
///
/// Implementations issue exactly one request per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataverseApi: Send + Sync {
    /// Creates a draft dataset in the `parent` collection.
    ///
    /// Succeeds only on `201 Created`.
    async fn create_dataset(
        &self,
        parent: &str,
        payload: &SerializedPayload,
    ) -> Result<CreatedDataset, PublishError>;

    /// Publishes the draft as a new major version.
    async fn publish_dataset(&self, persistent_id: &str) -> Result<PublishResult, PublishError>;
}
