//! Coordinate sampling for synthetic dataset locations.
//!
//! Uniform samples in `[0, 1)` are rescaled into either the Dutch RD
//! projected system (metres, floored) or WGS84 latitude/longitude (degrees).
//! The random generator is supplied by the caller, so a seeded generator
//! yields identical coordinates on every run.

use rand::Rng;

use crate::error::SamplingError;

/// Target coordinate system for generated locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    /// Dutch national grid; axis 0 is easting, axis 1 is northing.
    Rd,
    /// Global geodetic system; axis 0 is latitude, axis 1 is longitude.
    Wgs84,
}

/// Linear mapping from a unit sample onto one axis.
#[derive(Debug, Clone, Copy)]
struct AxisScale {
    span: f64,
    offset: f64,
}

impl AxisScale {
    const fn new(span: f64, offset: f64) -> Self {
        Self { span, offset }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "rescaling unit samples onto an axis is inherently floating point"
    )]
    fn apply(self, sample: f64) -> f64 {
        sample * self.span + self.offset
    }
}

/// RD easting covers 0 to 280 km.
const RD_EAST: AxisScale = AxisScale::new(280_000.0, 0.0);
/// RD northing covers 300 to 625 km.
const RD_NORTH: AxisScale = AxisScale::new(325_000.0, 300_000.0);
const WGS84_LATITUDE: AxisScale = AxisScale::new(180.0, -90.0);
const WGS84_LONGITUDE: AxisScale = AxisScale::new(360.0, -180.0);

/// Edges of a bounding box expressed in the box's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxEdges {
    /// Northern edge (northing or latitude).
    pub north: f64,
    /// Eastern edge (easting or longitude).
    pub east: f64,
    /// Southern edge (northing or latitude).
    pub south: f64,
    /// Western edge (easting or longitude).
    pub west: f64,
}

impl CoordinateSystem {
    /// Scales for axes 0 and 1; axes 2 and 3 reuse them for the second corner.
    const fn axes(self) -> [AxisScale; 2] {
        match self {
            Self::Rd => [RD_EAST, RD_NORTH],
            Self::Wgs84 => [WGS84_LATITUDE, WGS84_LONGITUDE],
        }
    }

    /// Whether generated values are floored to whole units.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Rd)
    }

    /// Scheme label used by the spatial metadata fields.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Rd => "RD (in m.)",
            Self::Wgs84 => "longitude/latitude (degrees)",
        }
    }

    /// Returns the `(x, y)` reading of a point: easting/northing for RD,
    /// longitude/latitude for WGS84.
    #[must_use]
    pub const fn point_xy(self, point: [f64; 2]) -> (f64, f64) {
        let [first, second] = point;
        match self {
            Self::Rd => (first, second),
            Self::Wgs84 => (second, first),
        }
    }

    /// Interprets a quadruple as box edges.
    ///
    /// RD boxes are stored as east, north, west, south; WGS84 boxes as
    /// north, east, south, west.
    #[must_use]
    pub const fn box_edges(self, corners: [f64; 4]) -> BoxEdges {
        let [a, b, c, d] = corners;
        match self {
            Self::Rd => BoxEdges {
                north: b,
                east: a,
                south: d,
                west: c,
            },
            Self::Wgs84 => BoxEdges {
                north: a,
                east: b,
                south: c,
                west: d,
            },
        }
    }

    /// Formats a coordinate value for the metadata document.
    ///
    /// RD values are already floored, so they print without a fraction.
    #[must_use]
    pub fn format_value(self, value: f64) -> String {
        if self.is_integral() {
            format!("{value:.0}")
        } else {
            value.to_string()
        }
    }
}

/// Number of components per generated location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    /// A single point: two components.
    Point,
    /// A bounding box given by two corners: four components.
    Box,
}

impl Dimensionality {
    /// Component count for this dimensionality.
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Point => 2,
            Self::Box => 4,
        }
    }
}

impl TryFrom<usize> for Dimensionality {
    type Error = SamplingError;

    fn try_from(dimensionality: usize) -> Result<Self, Self::Error> {
        match dimensionality {
            2 => Ok(Self::Point),
            4 => Ok(Self::Box),
            _ => Err(SamplingError::InvalidArgument { dimensionality }),
        }
    }
}

/// A generated location: a point or a two-corner box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinatePoint {
    /// Two components.
    Point([f64; 2]),
    /// Four components, read as two corners.
    Box([f64; 4]),
}

impl CoordinatePoint {
    /// Returns the raw components in axis order.
    #[must_use]
    pub fn components(&self) -> &[f64] {
        match self {
            Self::Point(values) => values,
            Self::Box(values) => values,
        }
    }

    /// Returns the dimensionality of this location.
    #[must_use]
    pub const fn dimensionality(&self) -> Dimensionality {
        match self {
            Self::Point(_) => Dimensionality::Point,
            Self::Box(_) => Dimensionality::Box,
        }
    }
}

/// An ordered, immutable collection of generated locations.
///
/// All locations share one coordinate system and one dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    system: CoordinateSystem,
    dimensionality: Dimensionality,
    points: Vec<CoordinatePoint>,
}

impl CoordinateSet {
    /// Returns an empty set for the given system and dimensionality.
    #[must_use]
    pub const fn empty(system: CoordinateSystem, dimensionality: Dimensionality) -> Self {
        Self {
            system,
            dimensionality,
            points: Vec::new(),
        }
    }

    /// Coordinate system of every location in the set.
    #[must_use]
    pub const fn system(&self) -> CoordinateSystem {
        self.system
    }

    /// Dimensionality of every location in the set.
    #[must_use]
    pub const fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// Generated locations in draw order.
    #[must_use]
    pub fn points(&self) -> &[CoordinatePoint] {
        &self.points
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no locations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the locations in draw order.
    pub fn iter(&self) -> std::slice::Iter<'_, CoordinatePoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a CoordinatePoint;
    type IntoIter = std::slice::Iter<'a, CoordinatePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draws uniformly distributed locations in one coordinate system.
///
/// # Example
///
/// ```
/// use maptest_data::{CoordinateSampler, CoordinateSystem};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let sampler = CoordinateSampler::new(CoordinateSystem::Rd);
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let boxes = sampler.generate(&mut rng, 2, 4).expect("valid dimensionality");
///
/// assert_eq!(boxes.len(), 2);
/// assert!(boxes.iter().all(|b| b.components().len() == 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateSampler {
    system: CoordinateSystem,
}

impl CoordinateSampler {
    /// Creates a sampler for the given coordinate system.
    #[must_use]
    pub const fn new(system: CoordinateSystem) -> Self {
        Self { system }
    }

    /// Coordinate system this sampler produces.
    #[must_use]
    pub const fn system(&self) -> CoordinateSystem {
        self.system
    }

    /// Generates `count` locations with `dimensionality` components each.
    ///
    /// Draws `count * dimensionality` uniform samples from `rng`, in location
    /// order and axis order within a location.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidArgument`] when `dimensionality` is not
    /// 2 or 4. No samples are drawn in that case.
    pub fn generate<R>(
        &self,
        rng: &mut R,
        count: usize,
        dimensionality: usize,
    ) -> Result<CoordinateSet, SamplingError>
    where
        R: Rng + ?Sized,
    {
        let dimensionality = Dimensionality::try_from(dimensionality)?;
        let points = (0..count)
            .map(|_| self.sample_location(rng, dimensionality))
            .collect();

        Ok(CoordinateSet {
            system: self.system,
            dimensionality,
            points,
        })
    }

    /// Draws a single two-component point.
    #[must_use]
    pub fn sample_point<R>(&self, rng: &mut R) -> CoordinatePoint
    where
        R: Rng + ?Sized,
    {
        self.sample_location(rng, Dimensionality::Point)
    }

    fn sample_location<R>(&self, rng: &mut R, dimensionality: Dimensionality) -> CoordinatePoint
    where
        R: Rng + ?Sized,
    {
        let [first, second] = self.system.axes();
        match dimensionality {
            Dimensionality::Point => CoordinatePoint::Point([
                self.sample_axis(rng, first),
                self.sample_axis(rng, second),
            ]),
            Dimensionality::Box => CoordinatePoint::Box([
                self.sample_axis(rng, first),
                self.sample_axis(rng, second),
                self.sample_axis(rng, first),
                self.sample_axis(rng, second),
            ]),
        }
    }

    fn sample_axis<R>(&self, rng: &mut R, axis: AxisScale) -> f64
    where
        R: Rng + ?Sized,
    {
        let value = axis.apply(rng.random::<f64>());
        if self.system.is_integral() {
            value.floor()
        } else {
            value
        }
    }
}
