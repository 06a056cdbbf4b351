//! Dataset descriptors and the per-variant generation policy.
//!
//! A [`DatasetDescriptor`] is built once per iteration from the run context
//! and freshly sampled coordinates, then handed to the payload renderer.

use rand::Rng;
use uuid::{Builder, Uuid};

use crate::coordinates::{
    CoordinatePoint, CoordinateSampler, CoordinateSet, CoordinateSystem, Dimensionality,
};
use crate::error::SamplingError;

/// Largest number of points drawn for one archaeology dataset.
const MAX_POINTS: usize = 3;

/// Largest number of boxes drawn for one archaeology dataset.
const MAX_BOXES: usize = 2;

/// Keyword prefix shared by every generated dataset.
const KEYWORD_PREFIX: &str = "maptest";

/// Identity shared by all datasets of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    run_id: Uuid,
    timestamp: String,
}

impl RunContext {
    /// Creates a context with an explicit run id and timestamp.
    #[must_use]
    pub const fn new(run_id: Uuid, timestamp: String) -> Self {
        Self { run_id, timestamp }
    }

    /// Creates a context whose run id is drawn from `rng`.
    ///
    /// The id is a well-formed version 4 UUID, so a seeded generator yields
    /// the same id on every run.
    #[must_use]
    pub fn from_rng<R>(rng: &mut R, timestamp: String) -> Self
    where
        R: Rng + ?Sized,
    {
        let run_id = Builder::from_random_bytes(rng.random()).into_uuid();
        Self { run_id, timestamp }
    }

    /// Identifier appended to every dataset title of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run timestamp formatted as `%Y%m%d%H%M%S`.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Keyword attached to every dataset of this run.
    #[must_use]
    pub fn keyword(&self) -> String {
        format!("{KEYWORD_PREFIX} {}", self.timestamp)
    }
}

/// Number of points and boxes chosen for one archaeology dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationPlan {
    /// Points to generate.
    pub points: usize,
    /// Boxes to generate.
    pub boxes: usize,
}

impl LocationPlan {
    /// Draws a plan with 0-3 points and 0-2 boxes.
    ///
    /// When no points are drawn at least one box is, so every dataset has a
    /// location.
    #[must_use]
    pub fn choose<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let points = rng.random_range(0..=MAX_POINTS);
        let min_boxes = usize::from(points == 0);
        let boxes = rng.random_range(min_boxes..=MAX_BOXES);
        Self { points, boxes }
    }
}

/// Locations embedded in a dataset, in one of the two document shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetLocations {
    /// Independent lists of points and boxes.
    PointsAndBoxes {
        /// Point locations.
        points: CoordinateSet,
        /// Box locations.
        boxes: CoordinateSet,
    },
    /// Exactly one point.
    SinglePoint {
        /// Coordinate system of the point.
        system: CoordinateSystem,
        /// The point.
        point: CoordinatePoint,
    },
}

/// Everything needed to render one dataset payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    /// Dataset title.
    pub title: String,
    /// Subject keyword.
    pub keyword: String,
    /// Run identifier.
    pub id: Uuid,
    /// Run timestamp.
    pub timestamp: String,
    /// Generated locations.
    pub locations: DatasetLocations,
}

/// The two generator flavours and their fixed settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetVariant {
    /// Archaeology data station: RD points and boxes.
    Archaeology,
    /// DCCD collection: one WGS84 point.
    Dccd,
}

impl DatasetVariant {
    /// Coordinate system used by this variant.
    #[must_use]
    pub const fn coordinate_system(self) -> CoordinateSystem {
        match self {
            Self::Archaeology => CoordinateSystem::Rd,
            Self::Dccd => CoordinateSystem::Wgs84,
        }
    }

    /// Collection alias new datasets are created in unless overridden.
    #[must_use]
    pub const fn default_parent(self) -> &'static str {
        match self {
            Self::Archaeology => "root",
            Self::Dccd => "dccd",
        }
    }

    /// Server targeted unless overridden.
    #[must_use]
    pub const fn default_server_url(self) -> &'static str {
        match self {
            Self::Archaeology => "https://dev.archaeology.datastations.nl",
            Self::Dccd => "https://dev.dataverse.nl",
        }
    }

    /// Builds the descriptor for dataset number `index` of a run.
    ///
    /// # Errors
    ///
    /// Propagates [`SamplingError`] from the coordinate sampler.
    ///
    /// # Example
    ///
    /// ```
    /// use maptest_data::{DatasetLocations, DatasetVariant, RunContext};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// let context = RunContext::from_rng(&mut rng, "20240101120000".to_owned());
    /// let descriptor = DatasetVariant::Dccd
    ///     .describe(&mut rng, &context, 0)
    ///     .expect("sampling succeeds");
    ///
    /// assert!(descriptor.title.starts_with("Test DCCD dataset 0"));
    /// assert!(matches!(descriptor.locations, DatasetLocations::SinglePoint { .. }));
    /// ```
    pub fn describe<R>(
        self,
        rng: &mut R,
        context: &RunContext,
        index: usize,
    ) -> Result<DatasetDescriptor, SamplingError>
    where
        R: Rng + ?Sized,
    {
        let sampler = CoordinateSampler::new(self.coordinate_system());
        let (title, locations) = match self {
            Self::Archaeology => {
                let plan = LocationPlan::choose(rng);
                let points =
                    sampler.generate(rng, plan.points, Dimensionality::Point.components())?;
                let boxes = sampler.generate(rng, plan.boxes, Dimensionality::Box.components())?;
                (
                    archaeology_title(index, plan, context.run_id()),
                    DatasetLocations::PointsAndBoxes { points, boxes },
                )
            }
            Self::Dccd => {
                let point = sampler.sample_point(rng);
                (
                    format!(
                        "Test DCCD dataset {index} with 1 point location {}",
                        context.run_id()
                    ),
                    DatasetLocations::SinglePoint {
                        system: sampler.system(),
                        point,
                    },
                )
            }
        };

        Ok(DatasetDescriptor {
            title,
            keyword: context.keyword(),
            id: context.run_id(),
            timestamp: context.timestamp().to_owned(),
            locations,
        })
    }
}

fn archaeology_title(index: usize, plan: LocationPlan, run_id: Uuid) -> String {
    let point_suffix = if plan.points == 1 { "" } else { "s" };
    let box_suffix = if plan.boxes == 1 { "" } else { "es" };
    format!(
        "Test dataset {index} with {} point{point_suffix} and {} box{box_suffix} {run_id}",
        plan.points, plan.boxes
    )
}
