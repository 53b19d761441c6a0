//! Definition validation.
//!
//! Field-level problems are collected and reported together as
//! `CoreError::Validation`. Shape and composition problems stop at the first
//! one found and are reported as `CoreError::InvalidComposition`.

use std::collections::HashSet;

use lab_core::entities::{ExamDefinition, ExamKind, FieldSchema};
use lab_core::enums::{DataType, ExamType};
use lab_core::errors::{CoreError, FieldViolation};
use lab_core::ids::{CategoryId, DefinitionId, FieldId};
use lab_core::sections::normalize_section;

use crate::graph::CompositionGraph;
use crate::inputs::{DefinitionInput, FieldInput};
use crate::service::EngineSettings;
use crate::store::Catalog;

/// A validated definition body, ready to be stamped with id and timestamps.
#[derive(Debug)]
pub(crate) struct DefinitionDraft {
    pub code: String,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub kind: ExamKind,
    pub sample_instructions: Option<String>,
    pub analysis_method: Option<String>,
}

/// Validate `input` against the catalog.
///
/// `target` is the stored definition being updated, `None` on create. Field
/// ids are kept for inputs naming a field `target` already owns; every other
/// field draws a fresh id from `next_field_id`.
pub(crate) fn validate_definition(
    catalog: &Catalog,
    settings: &EngineSettings,
    target: Option<&ExamDefinition>,
    input: DefinitionInput,
    next_field_id: impl FnMut() -> FieldId,
) -> Result<DefinitionDraft, CoreError> {
    let self_id = target.map(|t| t.id);

    let violations = field_violations(catalog, settings, self_id, &input);
    if !violations.is_empty() {
        return Err(CoreError::Validation(violations));
    }
    check_composition(catalog, settings, self_id, &input)?;

    let existing = target.map_or(&[][..], ExamDefinition::fields);
    let DefinitionInput {
        code,
        name,
        exam_type,
        category_id,
        fields,
        children,
        is_profile,
        sample_instructions,
        analysis_method,
    } = input;
    let fields = build_fields(fields, existing, next_field_id);
    let kind = match exam_type {
        ExamType::Simple => ExamKind::Simple { fields },
        ExamType::Composite => ExamKind::Composite {
            children,
            is_profile,
        },
        ExamType::Hybrid => ExamKind::Hybrid {
            fields,
            children,
            is_profile,
        },
    };

    Ok(DefinitionDraft {
        code: code.trim().to_string(),
        name: name.trim().to_string(),
        category_id,
        kind,
        sample_instructions: trimmed(sample_instructions),
        analysis_method: trimmed(analysis_method),
    })
}

fn field_violations(
    catalog: &Catalog,
    settings: &EngineSettings,
    self_id: Option<DefinitionId>,
    input: &DefinitionInput,
) -> Vec<FieldViolation> {
    let mut out = Vec::new();

    let code = input.code.trim();
    if code.is_empty() {
        out.push(FieldViolation::new("code", "must not be empty"));
    } else if code.chars().count() > settings.max_code_len {
        out.push(FieldViolation::new(
            "code",
            format!("must be at most {} characters", settings.max_code_len),
        ));
    } else if let Some(owner) = catalog.id_for_code(code).filter(|id| Some(*id) != self_id) {
        out.push(FieldViolation::new(
            "code",
            format!("'{code}' is already used by definition {owner}"),
        ));
    }

    if input.name.trim().is_empty() {
        out.push(FieldViolation::new("name", "must not be empty"));
    }

    let mut names = HashSet::new();
    for (i, field) in input.fields.iter().enumerate() {
        let name = field.name.trim();
        if name.is_empty() {
            out.push(FieldViolation::new(format!("fields[{i}].name"), "must not be empty"));
        } else if !names.insert(name.to_lowercase()) {
            out.push(FieldViolation::new(
                format!("fields[{i}].name"),
                format!("duplicate field name '{name}'"),
            ));
        }
        if field.data_type == DataType::Select
            && field.options.iter().all(|o| o.trim().is_empty())
        {
            out.push(FieldViolation::new(
                format!("fields[{i}].options"),
                "select fields need at least one option",
            ));
        }
    }

    out
}

fn check_composition(
    catalog: &Catalog,
    settings: &EngineSettings,
    self_id: Option<DefinitionId>,
    input: &DefinitionInput,
) -> Result<(), CoreError> {
    let shape = |reason: &str| CoreError::InvalidComposition {
        definition_id: self_id,
        offending_id: None,
        reason: reason.to_string(),
    };
    let fail = |offending_id: DefinitionId, reason: &str| CoreError::InvalidComposition {
        definition_id: self_id,
        offending_id: Some(offending_id),
        reason: reason.to_string(),
    };

    if input.exam_type == ExamType::Composite {
        if !input.fields.is_empty() {
            return Err(shape("composite exams cannot own fields"));
        }
        if input.children.is_empty() {
            return Err(shape("composite exams need at least one child"));
        }
    }

    if input.exam_type == ExamType::Simple {
        return match input.children.first() {
            Some(child) => Err(fail(*child, "simple exams cannot have children")),
            None => Ok(()),
        };
    }

    let mut graph = CompositionGraph::from_definitions(catalog.values());
    if let Some(id) = self_id {
        graph.clear_children(&id);
    }

    let mut seen = HashSet::new();
    for &child_id in &input.children {
        if !seen.insert(child_id) {
            return Err(fail(child_id, "child is listed more than once"));
        }
        if Some(child_id) == self_id {
            return Err(fail(child_id, "a definition cannot contain itself"));
        }
        let Some(child) = catalog.get(child_id) else {
            return Err(fail(child_id, "child definition does not exist"));
        };
        if child.is_profile() {
            return Err(fail(child_id, "profiles cannot be nested inside other exams"));
        }
        if !child.active && !settings.allow_inactive_children {
            return Err(fail(child_id, "child definition is inactive"));
        }
        if let Some(id) = self_id {
            if graph.would_cycle(&id, &child_id) {
                return Err(fail(child_id, "adding this child would create a cycle"));
            }
        }
    }

    if input.is_profile {
        if let Some(id) = self_id {
            let mut parents = graph.parents(&id);
            parents.sort();
            if let Some(parent) = parents.first() {
                return Err(fail(
                    *parent,
                    "definition is listed as a child and cannot become a profile",
                ));
            }
        }
    }

    Ok(())
}

fn build_fields(
    inputs: Vec<FieldInput>,
    existing: &[FieldSchema],
    mut next_field_id: impl FnMut() -> FieldId,
) -> Vec<FieldSchema> {
    let owned: HashSet<FieldId> = existing.iter().map(|f| f.id).collect();
    let mut used = HashSet::new();

    inputs
        .into_iter()
        .enumerate()
        .map(|(position, input)| {
            let id = input
                .id
                .filter(|id| owned.contains(id) && used.insert(*id))
                .unwrap_or_else(&mut next_field_id);
            let options = if input.data_type == DataType::Select {
                input
                    .options
                    .iter()
                    .map(|o| o.trim())
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            } else {
                Vec::new()
            };
            FieldSchema {
                id,
                name: input.name.trim().to_string(),
                data_type: input.data_type,
                unit: trimmed(input.unit),
                reference: trimmed(input.reference),
                section: normalize_section(input.section.as_deref()),
                order: u32::try_from(position).unwrap_or(u32::MAX),
                required: input.required,
                options,
            }
        })
        .collect()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> impl FnMut() -> FieldId {
        let mut next = 100;
        move || {
            next += 1;
            FieldId(next)
        }
    }

    #[test]
    fn order_is_derived_from_position() {
        let fields = build_fields(
            vec![
                FieldInput::new("b", DataType::Text),
                FieldInput::new("a", DataType::Text),
            ],
            &[],
            sequence(),
        );
        let orders: Vec<_> = fields.iter().map(|f| (f.name.as_str(), f.order)).collect();
        assert_eq!(orders, vec![("b", 0), ("a", 1)]);
    }

    #[test]
    fn known_field_ids_survive_and_unknown_are_replaced() {
        let existing = build_fields(vec![FieldInput::new("pH", DataType::Number)], &[], || {
            FieldId(7)
        });
        let fields = build_fields(
            vec![
                FieldInput::new("Densidad", DataType::Number).with_id(FieldId(999)),
                FieldInput::new("pH", DataType::Number).with_id(FieldId(7)),
                FieldInput::new("pH copia", DataType::Number).with_id(FieldId(7)),
            ],
            &existing,
            sequence(),
        );
        let ids: Vec<_> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![FieldId(101), FieldId(7), FieldId(102)]);
    }

    #[test]
    fn blank_optionals_are_dropped() {
        let mut input = FieldInput::new(" Color ", DataType::Text)
            .unit("  ")
            .reference(" Amarillo ")
            .section("   ");
        input.options = vec!["ignored".into()];
        let field = &build_fields(vec![input], &[], sequence())[0];

        assert_eq!(field.name, "Color");
        assert_eq!(field.unit, None);
        assert_eq!(field.reference.as_deref(), Some("Amarillo"));
        assert_eq!(field.section, None);
        assert!(field.options.is_empty());
    }

    #[test]
    fn field_level_problems_are_collected() {
        let catalog = Catalog::default();
        let input = DefinitionInput::hybrid("   ", "")
            .field(FieldInput::new("", DataType::Select));
        let violations = field_violations(&catalog, &EngineSettings::default(), None, &input);
        let paths: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();

        assert_eq!(paths, vec!["code", "name", "fields[0].name", "fields[0].options"]);
    }

    fn shape_reason(input: &DefinitionInput) -> Option<String> {
        match check_composition(&Catalog::default(), &EngineSettings::default(), None, input) {
            Err(CoreError::InvalidComposition {
                offending_id: None,
                reason,
                ..
            }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn composite_shape_is_a_composition_error() {
        let with_fields = DefinitionInput::composite("C", "C")
            .child(DefinitionId(1))
            .field(FieldInput::new("x", DataType::Number));
        let childless = DefinitionInput::composite("C", "C");

        assert_eq!(
            shape_reason(&with_fields).as_deref(),
            Some("composite exams cannot own fields")
        );
        assert_eq!(
            shape_reason(&childless).as_deref(),
            Some("composite exams need at least one child")
        );
        assert!(field_violations(&Catalog::default(), &EngineSettings::default(), None, &with_fields).is_empty());
    }

    #[test]
    fn code_length_counts_characters() {
        let catalog = Catalog::default();
        let settings = EngineSettings {
            max_code_len: 4,
            ..EngineSettings::default()
        };
        let ok = DefinitionInput::simple("ÑÑÑÑ", "x");
        let long = DefinitionInput::simple("ABCDE", "x");

        assert!(field_violations(&catalog, &settings, None, &ok).is_empty());
        assert_eq!(field_violations(&catalog, &settings, None, &long).len(), 1);
    }
}
