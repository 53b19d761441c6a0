//! Plain view types handed to list, print and report consumers.
//!
//! These carry already-grouped, already-titled data. They contain no markup;
//! presentation is owned by the caller.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::RequestAggregate;
use crate::entities::{FieldSchema, ResultCapture, ResultValue};
use crate::enums::{ExamType, InstanceState};
use crate::ids::{DefinitionId, FieldId, InstanceId, RequestId};
use crate::sections::{SectionBucket, SectionKey, SectionTitles};

/// One captured result as shown in a report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultView {
    pub field_id: FieldId,
    pub field_name: String,
    pub value: ResultValue,
    pub unit: Option<String>,
    pub reference: Option<String>,
    pub out_of_range: bool,
    pub observations: Option<String>,
}

impl From<&ResultCapture> for ResultView {
    fn from(capture: &ResultCapture) -> Self {
        Self {
            field_id: capture.field_id,
            field_name: capture.field_name.clone(),
            value: capture.value.clone(),
            unit: capture.unit.clone(),
            reference: capture.reference.clone(),
            out_of_range: capture.out_of_range,
            observations: capture.observations.clone(),
        }
    }
}

/// A titled section of captured results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SectionView {
    pub key: SectionKey,
    pub title: String,
    pub results: Vec<ResultView>,
}

impl SectionView {
    #[must_use]
    pub fn from_bucket(bucket: &SectionBucket<'_, ResultCapture>, titles: &SectionTitles) -> Self {
        Self {
            title: titles.title_for(&bucket.key).to_string(),
            key: bucket.key.clone(),
            results: bucket.items.iter().map(|c| ResultView::from(*c)).collect(),
        }
    }
}

/// A titled section of field definitions, used by authoring screens.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FieldSectionView {
    pub key: SectionKey,
    pub title: String,
    pub fields: Vec<FieldSchema>,
}

impl FieldSectionView {
    #[must_use]
    pub fn from_bucket(bucket: &SectionBucket<'_, FieldSchema>, titles: &SectionTitles) -> Self {
        Self {
            title: titles.title_for(&bucket.key).to_string(),
            key: bucket.key.clone(),
            fields: bucket.items.iter().map(|f| (*f).clone()).collect(),
        }
    }
}

/// One exam instance with its grouped results and nested children.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct InstanceView {
    pub instance_id: InstanceId,
    pub definition_id: DefinitionId,
    pub code: String,
    pub name: String,
    pub exam_type: ExamType,
    pub state: InstanceState,
    pub completed_at: Option<DateTime<Utc>>,
    pub sections: Vec<SectionView>,
    /// Required fields still lacking a capture.
    pub missing_required: Vec<String>,
    pub children: Vec<InstanceView>,
}

/// Everything a list or print view needs for one request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RequestView {
    pub request_id: RequestId,
    pub aggregate: RequestAggregate,
    pub exams: Vec<InstanceView>,
}
