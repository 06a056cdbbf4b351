//! Synthetic geographic test datasets for Dataverse map view experiments.
//!
//! This crate generates datasets carrying random spatial metadata and
//! deposits them into a Dataverse installation through its native API. Two
//! binaries share the library:
//!
//! - `archaeology-testdata` creates datasets with up to three RD points and
//!   up to two RD bounding boxes in the `dansTemporalSpatial` block.
//! - `dccd-testdata` creates datasets with exactly one WGS84 point in the
//!   `dccd` block.
//!
//! # Overview
//!
//! A run is a pipeline: [`CoordinateSampler`] draws coordinates,
//! [`DatasetVariant::describe`] turns them into a [`DatasetDescriptor`],
//! [`PayloadRenderer`] produces the native JSON payload and
//! [`DatasetPublisher`] creates then publishes each dataset over a
//! [`DataverseApi`] client.
//!
//! # Example
//!
//! ```
//! use maptest_data::{DatasetVariant, PayloadRenderer, RunContext};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let context = RunContext::from_rng(&mut rng, "20240101120000".to_owned());
//! let descriptor = DatasetVariant::Dccd
//!     .describe(&mut rng, &context, 0)
//!     .expect("valid descriptor");
//! let payload = PayloadRenderer::default()
//!     .render(&descriptor)
//!     .expect("payload renders");
//!
//! assert!(payload.as_str().contains("\"dccd-location\""));
//! ```

mod api;
pub mod cli;
mod coordinates;
mod descriptor;
mod error;
mod http;
mod payload;
mod publisher;
mod runner;

pub use api::{CreatedDataset, DataverseApi, PublishResult};
pub use coordinates::{
    BoxEdges, CoordinatePoint, CoordinateSampler, CoordinateSet, CoordinateSystem, Dimensionality,
};
pub use descriptor::{DatasetDescriptor, DatasetLocations, DatasetVariant, LocationPlan, RunContext};
pub use error::{PublishError, RenderError, RunError, SamplingError};
pub use http::{ClientSettings, HttpDataverseApi};
pub use payload::{
    CitationDefaults, DatasetDocument, FieldValue, MetadataField, PayloadRenderer,
    SerializedPayload, TypeClass,
};
pub use publisher::DatasetPublisher;
pub use runner::{RunSettings, publish_datasets, render_datasets};
