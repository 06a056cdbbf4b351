//! Error types for the maptest-data crate.
//!
//! Each stage of a run has its own semantic error enum built with
//! `thiserror`; [`RunError`] aggregates them so a single failure aborts the
//! whole run.

use thiserror::Error;

/// Errors raised while sampling coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplingError {
    /// The requested dimensionality is neither a point (2) nor a box (4).
    #[error("invalid argument: dimensionality must be 2 or 4, got {dimensionality}")]
    InvalidArgument {
        /// Dimensionality supplied by the caller.
        dimensionality: usize,
    },
}

/// Errors raised while rendering a dataset payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A required descriptor field is absent or blank.
    #[error("template error: required field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Coordinates do not have the shape the document variant requires.
    #[error("template error: {field} expects {expected} components, got {actual}")]
    ShapeMismatch {
        /// Document field the coordinates were destined for.
        field: &'static str,
        /// Component count the field requires.
        expected: usize,
        /// Component count supplied.
        actual: usize,
    },

    /// The typed document could not be serialized.
    #[error("failed to serialize dataset payload: {message}")]
    Serialization {
        /// Serializer error message.
        message: String,
    },
}

/// Errors raised while talking to the Dataverse API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The server answered with an unexpected status.
    #[error("remote error: {operation} returned status {status}: {body}")]
    Remote {
        /// Operation that failed (`create` or `publish`).
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("transport error during {operation}: {message}")]
    Transport {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// The response body was not the expected JSON document.
    #[error("failed to decode {operation} response: {message}")]
    Decode {
        /// Operation whose response failed to decode.
        operation: &'static str,
        /// Decoder error message.
        message: String,
    },

    /// The server URL cannot be extended into an API endpoint.
    #[error("invalid endpoint for server '{server_url}': {message}")]
    InvalidEndpoint {
        /// Configured server URL.
        server_url: String,
        /// Description of the problem.
        message: String,
    },
}

impl PublishError {
    /// Returns the raw response body when the server rejected the request.
    #[must_use]
    pub fn remote_body(&self) -> Option<&str> {
        match self {
            Self::Remote { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Errors that abort a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Coordinate sampling failed.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    /// Payload rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// A Dataverse API call failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
    /// Writing run output failed.
    #[error("failed to write run output: {message}")]
    Output {
        /// Underlying I/O error message.
        message: String,
    },
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        Self::Output {
            message: err.to_string(),
        }
    }
}
