//! Dataverse dataset documents built from descriptors.
//!
//! The native API expects every metadata value wrapped in a field record
//! (`typeName`, `multiple`, `typeClass`, `value`). Documents are assembled as
//! typed values and serialized with `serde_json`, so a field can never be
//! left out or injected by string substitution.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::coordinates::{CoordinatePoint, CoordinateSet, CoordinateSystem, Dimensionality};
use crate::descriptor::{DatasetDescriptor, DatasetLocations};
use crate::error::RenderError;

const LICENSE_NAME: &str = "CC0 1.0";
const LICENSE_URI: &str = "http://creativecommons.org/publicdomain/zero/1.0";
const DEFAULT_AUTHOR: &str = "Maptest, Generator";
const DEFAULT_CONTACT_NAME: &str = "Maptest Generator";
const DEFAULT_CONTACT_EMAIL: &str = "maptest@example.org";
const DEFAULT_SUBJECT: &str = "Other";
const DESCRIPTION: &str =
    "Synthetic dataset with random locations, generated for map view testing.";

/// Value class of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeClass {
    /// Free text.
    Primitive,
    /// Nested record of named sub-fields.
    Compound,
    /// Value from a fixed vocabulary.
    ControlledVocabulary,
}

/// Value carried by a metadata field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// One text value.
    Single(String),
    /// Several text values.
    Many(Vec<String>),
    /// Records of named sub-fields.
    Compound(Vec<BTreeMap<String, MetadataField>>),
}

/// One metadata field record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataField {
    type_name: String,
    multiple: bool,
    type_class: TypeClass,
    value: FieldValue,
}

impl MetadataField {
    fn primitive(type_name: &str, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.to_owned(),
            multiple: false,
            type_class: TypeClass::Primitive,
            value: FieldValue::Single(value.into()),
        }
    }

    fn vocabulary(type_name: &str, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.to_owned(),
            multiple: false,
            type_class: TypeClass::ControlledVocabulary,
            value: FieldValue::Single(value.into()),
        }
    }

    fn vocabulary_list(type_name: &str, values: Vec<String>) -> Self {
        Self {
            type_name: type_name.to_owned(),
            multiple: true,
            type_class: TypeClass::ControlledVocabulary,
            value: FieldValue::Many(values),
        }
    }

    fn compound(type_name: &str, entries: Vec<Vec<Self>>) -> Self {
        let records = entries
            .into_iter()
            .map(|fields| {
                fields
                    .into_iter()
                    .map(|field| (field.type_name.clone(), field))
                    .collect()
            })
            .collect();
        Self {
            type_name: type_name.to_owned(),
            multiple: true,
            type_class: TypeClass::Compound,
            value: FieldValue::Compound(records),
        }
    }

    /// Field name as known to the metadata block.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field value.
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataBlock {
    display_name: &'static str,
    fields: Vec<MetadataField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct License {
    name: &'static str,
    uri: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetVersion {
    license: License,
    metadata_blocks: BTreeMap<&'static str, MetadataBlock>,
}

/// Typed Dataverse dataset document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDocument {
    dataset_version: DatasetVersion,
}

impl DatasetDocument {
    /// Looks up a field by block and type name.
    #[must_use]
    pub fn field(&self, block: &str, type_name: &str) -> Option<&MetadataField> {
        self.dataset_version
            .metadata_blocks
            .get(block)?
            .fields
            .iter()
            .find(|field| field.type_name == type_name)
    }
}

/// A rendered JSON payload ready to be sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPayload(String);

impl SerializedPayload {
    /// Returns the JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_json_text(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl fmt::Display for SerializedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Citation details that are the same for every generated dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationDefaults {
    /// Author name, `Last, First`.
    pub author: String,
    /// Contact person.
    pub contact_name: String,
    /// Contact e-mail address.
    pub contact_email: String,
    /// Subject from the citation vocabulary.
    pub subject: String,
}

impl Default for CitationDefaults {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_owned(),
            contact_name: DEFAULT_CONTACT_NAME.to_owned(),
            contact_email: DEFAULT_CONTACT_EMAIL.to_owned(),
            subject: DEFAULT_SUBJECT.to_owned(),
        }
    }
}

/// Builds dataset documents from descriptors.
///
/// # Example
///
/// ```
/// use maptest_data::{DatasetVariant, PayloadRenderer, RunContext};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(3);
/// let context = RunContext::from_rng(&mut rng, "20240101120000".to_owned());
/// let descriptor = DatasetVariant::Archaeology
///     .describe(&mut rng, &context, 0)
///     .expect("sampling succeeds");
///
/// let payload = PayloadRenderer::default().render(&descriptor).expect("renders");
/// assert!(payload.as_str().contains("dansTemporalSpatial"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadRenderer {
    citation: CitationDefaults,
}

impl PayloadRenderer {
    /// Creates a renderer with custom citation details.
    #[must_use]
    pub const fn new(citation: CitationDefaults) -> Self {
        Self { citation }
    }

    /// Renders a descriptor into pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the title or keyword is blank, when
    /// coordinates have the wrong shape, or when serialization fails.
    pub fn render(&self, descriptor: &DatasetDescriptor) -> Result<SerializedPayload, RenderError> {
        let document = self.document(descriptor)?;
        serde_json::to_string_pretty(&document)
            .map(SerializedPayload)
            .map_err(|err| RenderError::Serialization {
                message: err.to_string(),
            })
    }

    /// Builds the typed document for a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when a required field is blank or coordinates
    /// have the wrong shape.
    pub fn document(&self, descriptor: &DatasetDescriptor) -> Result<DatasetDocument, RenderError> {
        let title = required("title", &descriptor.title)?;
        let keyword = required("keyword", &descriptor.keyword)?;

        let mut metadata_blocks = BTreeMap::new();
        metadata_blocks.insert(
            "citation",
            MetadataBlock {
                display_name: "Citation Metadata",
                fields: self.citation_fields(title, keyword),
            },
        );

        match &descriptor.locations {
            DatasetLocations::PointsAndBoxes { points, boxes } => {
                metadata_blocks.insert(
                    "dansTemporalSpatial",
                    MetadataBlock {
                        display_name: "Temporal and Spatial Coverage",
                        fields: spatial_fields(points, boxes)?,
                    },
                );
            }
            DatasetLocations::SinglePoint { system, point } => {
                metadata_blocks.insert(
                    "dccd",
                    MetadataBlock {
                        display_name: "DCCD Metadata",
                        fields: vec![dccd_location(*system, point)?],
                    },
                );
            }
        }

        Ok(DatasetDocument {
            dataset_version: DatasetVersion {
                license: License {
                    name: LICENSE_NAME,
                    uri: LICENSE_URI,
                },
                metadata_blocks,
            },
        })
    }

    fn citation_fields(&self, title: &str, keyword: &str) -> Vec<MetadataField> {
        vec![
            MetadataField::primitive("title", title),
            MetadataField::compound(
                "author",
                vec![vec![MetadataField::primitive(
                    "authorName",
                    self.citation.author.as_str(),
                )]],
            ),
            MetadataField::compound(
                "datasetContact",
                vec![vec![
                    MetadataField::primitive(
                        "datasetContactName",
                        self.citation.contact_name.as_str(),
                    ),
                    MetadataField::primitive(
                        "datasetContactEmail",
                        self.citation.contact_email.as_str(),
                    ),
                ]],
            ),
            MetadataField::compound(
                "dsDescription",
                vec![vec![MetadataField::primitive(
                    "dsDescriptionValue",
                    DESCRIPTION,
                )]],
            ),
            MetadataField::vocabulary_list("subject", vec![self.citation.subject.clone()]),
            MetadataField::compound(
                "keyword",
                vec![vec![MetadataField::primitive("keywordValue", keyword)]],
            ),
        ]
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RenderError> {
    if value.trim().is_empty() {
        return Err(RenderError::MissingField { field });
    }
    Ok(value)
}

fn expect_point(field: &'static str, location: &CoordinatePoint) -> Result<[f64; 2], RenderError> {
    match location {
        CoordinatePoint::Point(values) => Ok(*values),
        CoordinatePoint::Box(_) => Err(shape_mismatch(field, Dimensionality::Point, location)),
    }
}

fn expect_box(field: &'static str, location: &CoordinatePoint) -> Result<[f64; 4], RenderError> {
    match location {
        CoordinatePoint::Box(values) => Ok(*values),
        CoordinatePoint::Point(_) => Err(shape_mismatch(field, Dimensionality::Box, location)),
    }
}

fn shape_mismatch(
    field: &'static str,
    expected: Dimensionality,
    location: &CoordinatePoint,
) -> RenderError {
    RenderError::ShapeMismatch {
        field,
        expected: expected.components(),
        actual: location.dimensionality().components(),
    }
}

fn spatial_fields(
    points: &CoordinateSet,
    boxes: &CoordinateSet,
) -> Result<Vec<MetadataField>, RenderError> {
    let mut fields = Vec::with_capacity(2);

    if !points.is_empty() {
        let system = points.system();
        let entries = points
            .iter()
            .map(|location| -> Result<Vec<MetadataField>, RenderError> {
                let (x, y) = system.point_xy(expect_point("dansSpatialPoint", location)?);
                Ok(vec![
                    MetadataField::vocabulary("dansSpatialPointScheme", system.scheme()),
                    MetadataField::primitive("dansSpatialPointX", system.format_value(x)),
                    MetadataField::primitive("dansSpatialPointY", system.format_value(y)),
                ])
            })
            .collect::<Result<Vec<_>, _>>()?;
        fields.push(MetadataField::compound("dansSpatialPoint", entries));
    }

    if !boxes.is_empty() {
        let system = boxes.system();
        let entries = boxes
            .iter()
            .map(|location| -> Result<Vec<MetadataField>, RenderError> {
                let edges = system.box_edges(expect_box("dansSpatialBox", location)?);
                Ok(vec![
                    MetadataField::vocabulary("dansSpatialBoxScheme", system.scheme()),
                    MetadataField::primitive(
                        "dansSpatialBoxNorth",
                        system.format_value(edges.north),
                    ),
                    MetadataField::primitive("dansSpatialBoxEast", system.format_value(edges.east)),
                    MetadataField::primitive(
                        "dansSpatialBoxSouth",
                        system.format_value(edges.south),
                    ),
                    MetadataField::primitive("dansSpatialBoxWest", system.format_value(edges.west)),
                ])
            })
            .collect::<Result<Vec<_>, _>>()?;
        fields.push(MetadataField::compound("dansSpatialBox", entries));
    }

    Ok(fields)
}

fn dccd_location(
    system: CoordinateSystem,
    point: &CoordinatePoint,
) -> Result<MetadataField, RenderError> {
    let (longitude, latitude) = system.point_xy(expect_point("dccd-location", point)?);
    Ok(MetadataField::compound(
        "dccd-location",
        vec![vec![
            MetadataField::primitive("dccd-latitude", system.format_value(latitude)),
            MetadataField::primitive("dccd-longitude", system.format_value(longitude)),
        ]],
    ))
}
