//! Authoring inputs for catalog definitions.
//!
//! Inputs are flat: they carry an [`ExamType`] plus every part a definition
//! might own. Create and update validate the combination and build the typed
//! [`ExamKind`](lab_core::entities::ExamKind) from it.

use lab_core::enums::{DataType, ExamType};
use lab_core::ids::{CategoryId, DefinitionId, FieldId};
use serde::{Deserialize, Serialize};

/// One field as submitted by an author.
///
/// `order` is not part of the input; it is always derived from the field's
/// position in [`DefinitionInput::fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInput {
    /// Id of a field already owned by the definition being updated. Unknown
    /// ids are ignored and a fresh id is assigned.
    #[serde(default)]
    pub id: Option<FieldId>,
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldInput {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: None,
            name: name.into(),
            data_type,
            unit: None,
            reference: None,
            section: None,
            required: false,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: FieldId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A full definition as submitted for create or update.
///
/// Updates replace the field and child lists wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionInput {
    pub code: String,
    pub name: String,
    pub exam_type: ExamType,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
    #[serde(default)]
    pub children: Vec<DefinitionId>,
    /// Ignored for simple exams, which are never profiles.
    #[serde(default)]
    pub is_profile: bool,
    #[serde(default)]
    pub sample_instructions: Option<String>,
    #[serde(default)]
    pub analysis_method: Option<String>,
}

impl DefinitionInput {
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, exam_type: ExamType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            exam_type,
            category_id: None,
            fields: Vec::new(),
            children: Vec::new(),
            is_profile: false,
            sample_instructions: None,
            analysis_method: None,
        }
    }

    #[must_use]
    pub fn simple(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(code, name, ExamType::Simple)
    }

    #[must_use]
    pub fn composite(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(code, name, ExamType::Composite)
    }

    #[must_use]
    pub fn hybrid(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(code, name, ExamType::Hybrid)
    }

    #[must_use]
    pub fn field(mut self, field: FieldInput) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn child(mut self, child: DefinitionId) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub const fn profile(mut self, is_profile: bool) -> Self {
        self.is_profile = is_profile;
        self
    }

    #[must_use]
    pub const fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn sample_instructions(mut self, text: impl Into<String>) -> Self {
        self.sample_instructions = Some(text.into());
        self
    }

    #[must_use]
    pub fn analysis_method(mut self, text: impl Into<String>) -> Self {
        self.analysis_method = Some(text.into());
        self
    }
}
