use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::field::FieldSchema;
use crate::enums::ExamType;
use crate::ids::{CategoryId, DefinitionId, FieldId};

/// Shape of an exam definition.
///
/// Each variant carries only the parts that are meaningful for it, so a
/// composite can never hold fields and a simple exam can never hold children.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExamKind {
    Simple {
        fields: Vec<FieldSchema>,
    },
    Composite {
        children: Vec<DefinitionId>,
        is_profile: bool,
    },
    Hybrid {
        fields: Vec<FieldSchema>,
        children: Vec<DefinitionId>,
        is_profile: bool,
    },
}

impl ExamKind {
    #[must_use]
    pub const fn exam_type(&self) -> ExamType {
        match self {
            Self::Simple { .. } => ExamType::Simple,
            Self::Composite { .. } => ExamType::Composite,
            Self::Hybrid { .. } => ExamType::Hybrid,
        }
    }

    /// Own fields, in display order. Empty for composites.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        match self {
            Self::Simple { fields } | Self::Hybrid { fields, .. } => fields,
            Self::Composite { .. } => &[],
        }
    }

    /// Child definition references, in display order. Empty for simple exams.
    #[must_use]
    pub fn children(&self) -> &[DefinitionId] {
        match self {
            Self::Composite { children, .. } | Self::Hybrid { children, .. } => children,
            Self::Simple { .. } => &[],
        }
    }

    #[must_use]
    pub const fn is_profile(&self) -> bool {
        match self {
            Self::Composite { is_profile, .. } | Self::Hybrid { is_profile, .. } => *is_profile,
            Self::Simple { .. } => false,
        }
    }
}

/// A coded catalog entry describing a reusable exam template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExamDefinition {
    pub id: DefinitionId,
    pub code: String,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub kind: ExamKind,
    /// `false` is a soft delete: excluded from new requests, kept for history.
    pub active: bool,
    pub sample_instructions: Option<String>,
    pub analysis_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamDefinition {
    #[must_use]
    pub const fn exam_type(&self) -> ExamType {
        self.kind.exam_type()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        self.kind.fields()
    }

    #[must_use]
    pub fn children(&self) -> &[DefinitionId] {
        self.kind.children()
    }

    #[must_use]
    pub const fn is_profile(&self) -> bool {
        self.kind.is_profile()
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldSchema> {
        self.fields().iter().find(|f| f.id == id)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields().iter().filter(|f| f.required)
    }

    #[must_use]
    pub fn references(&self, child: DefinitionId) -> bool {
        self.children().contains(&child)
    }
}
