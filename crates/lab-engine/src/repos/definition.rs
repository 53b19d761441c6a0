//! Definition repository: authoring, activation toggles and catalog queries.

use chrono::Utc;
use lab_core::audit_detail::DefinitionChangedDetail;
use lab_core::entities::ExamDefinition;
use lab_core::enums::{AuditAction, EntityType};
use lab_core::errors::CoreError;
use lab_core::ids::{DefinitionId, FieldId};
use lab_core::responses::FieldSectionView;
use lab_core::sections::{SectionTitles, group_by_section};

use crate::graph::CompositionGraph;
use crate::inputs::DefinitionInput;
use crate::service::{LabService, detail};
use crate::store::code_key;
use crate::validation::validate_definition;

fn changed_detail(def: &ExamDefinition) -> DefinitionChangedDetail {
    DefinitionChangedDetail {
        code: def.code.clone(),
        exam_type: def.exam_type().as_str().to_string(),
        fields: u32::try_from(def.fields().len()).unwrap_or(u32::MAX),
        children: u32::try_from(def.children().len()).unwrap_or(u32::MAX),
    }
}

impl LabService {
    /// Validate and store a new definition.
    ///
    /// # Errors
    ///
    /// `Validation` for field-level problems, `InvalidComposition` for shape
    /// and child list problems.
    pub fn create_definition(&self, input: DefinitionInput) -> Result<ExamDefinition, CoreError> {
        let mut catalog = self.catalog.write();
        let draft = validate_definition(&catalog, self.settings(), None, input, || {
            FieldId(self.field_ids.next())
        })
        .inspect_err(|e| tracing::warn!(error = %e, "definition rejected"))?;

        let now = Utc::now();
        let def = ExamDefinition {
            id: DefinitionId(self.definition_ids.next()),
            code: draft.code,
            name: draft.name,
            category_id: draft.category_id,
            kind: draft.kind,
            active: true,
            sample_instructions: draft.sample_instructions,
            analysis_method: draft.analysis_method,
            created_at: now,
            updated_at: now,
        };
        catalog.put(def.clone());
        drop(catalog);

        self.record(
            EntityType::ExamDefinition,
            def.id,
            AuditAction::Created,
            detail(&changed_detail(&def)),
        );
        tracing::info!(definition_id = %def.id, code = %def.code, exam_type = %def.exam_type(), "created exam definition");
        Ok(def)
    }

    /// Replace a definition's body. Field and child lists are replaced wholesale.
    ///
    /// Existing instances keep the shape they were created with.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, otherwise as [`Self::create_definition`].
    pub fn update_definition(
        &self,
        id: DefinitionId,
        input: DefinitionInput,
    ) -> Result<ExamDefinition, CoreError> {
        let mut catalog = self.catalog.write();
        let current = catalog.require(id)?.clone();
        let draft = validate_definition(&catalog, self.settings(), Some(&current), input, || {
            FieldId(self.field_ids.next())
        })
        .inspect_err(|e| tracing::warn!(definition_id = %id, error = %e, "update rejected"))?;

        let def = ExamDefinition {
            code: draft.code,
            name: draft.name,
            category_id: draft.category_id,
            kind: draft.kind,
            sample_instructions: draft.sample_instructions,
            analysis_method: draft.analysis_method,
            updated_at: Utc::now(),
            ..current
        };
        catalog.put(def.clone());
        drop(catalog);

        self.record(
            EntityType::ExamDefinition,
            id,
            AuditAction::Updated,
            detail(&changed_detail(&def)),
        );
        tracing::info!(definition_id = %id, code = %def.code, "updated exam definition");
        Ok(def)
    }

    /// Soft-delete a definition. Existing instances are untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn deactivate(&self, id: DefinitionId) -> Result<ExamDefinition, CoreError> {
        self.set_active(id, false)
    }

    /// Make a deactivated definition available for new requests again.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn activate(&self, id: DefinitionId) -> Result<ExamDefinition, CoreError> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: DefinitionId, active: bool) -> Result<ExamDefinition, CoreError> {
        let mut catalog = self.catalog.write();
        let def = catalog.get_mut(id)?;
        if def.active == active {
            return Ok(def.clone());
        }
        def.active = active;
        def.updated_at = Utc::now();
        let def = def.clone();
        drop(catalog);

        let action = if active {
            AuditAction::Activated
        } else {
            AuditAction::Deactivated
        };
        self.record(EntityType::ExamDefinition, id, action, None);
        tracing::info!(definition_id = %id, active, "toggled exam definition");
        Ok(def)
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn get_definition(&self, id: DefinitionId) -> Result<ExamDefinition, CoreError> {
        self.catalog.read().require(id).cloned()
    }

    /// Look a definition up by code, ignoring letter case.
    ///
    /// # Errors
    ///
    /// `NotFound` if no definition carries the code.
    pub fn find_by_code(&self, code: &str) -> Result<ExamDefinition, CoreError> {
        let catalog = self.catalog.read();
        catalog
            .id_for_code(code)
            .and_then(|id| catalog.get(id))
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityType::ExamDefinition, code_key(code)))
    }

    /// All definitions ordered by code.
    #[must_use]
    pub fn list_definitions(&self, include_inactive: bool) -> Vec<ExamDefinition> {
        let mut defs: Vec<_> = self
            .catalog
            .read()
            .values()
            .filter(|d| include_inactive || d.active)
            .cloned()
            .collect();
        defs.sort_by(|a, b| a.code.cmp(&b.code));
        defs
    }

    /// Definitions that list `id` as a child, ordered by code.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn parents_of(&self, id: DefinitionId) -> Result<Vec<ExamDefinition>, CoreError> {
        let catalog = self.catalog.read();
        catalog.require(id)?;
        let graph = CompositionGraph::from_definitions(catalog.values());
        let mut parents: Vec<_> = graph
            .parents(&id)
            .into_iter()
            .filter_map(|p| catalog.get(p).cloned())
            .collect();
        parents.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(parents)
    }

    /// Snapshot of the parent → child graph of the whole catalog.
    #[must_use]
    pub fn composition_graph(&self) -> CompositionGraph {
        CompositionGraph::from_definitions(self.catalog.read().values())
    }

    /// A definition's own fields grouped into titled sections.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn definition_sections(
        &self,
        id: DefinitionId,
        titles: &SectionTitles,
    ) -> Result<Vec<FieldSectionView>, CoreError> {
        let def = self.get_definition(id)?;
        Ok(group_by_section(def.fields())
            .iter()
            .map(|bucket| FieldSectionView::from_bucket(bucket, titles))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_core::enums::{DataType, ExamType};
    use lab_core::errors::FieldViolation;
    use lab_core::sections::SectionKey;
    use pretty_assertions::assert_eq;

    use crate::inputs::FieldInput;
    use crate::test_support::helpers::{glucose, test_service};

    fn composition_reason(err: CoreError) -> (Option<DefinitionId>, String) {
        match err {
            CoreError::InvalidComposition {
                offending_id,
                reason,
                ..
            } => (offending_id, reason),
            other => panic!("expected InvalidComposition, got {other:?}"),
        }
    }

    #[test]
    fn create_assigns_ids_and_order() {
        let svc = test_service();
        let def = svc
            .create_definition(
                DefinitionInput::simple("HEMO", "Hemograma")
                    .field(FieldInput::new("Hemoglobina", DataType::Number).section("Serie roja"))
                    .field(FieldInput::new("Leucocitos", DataType::Number).section("Serie blanca")),
            )
            .unwrap();

        assert_eq!(def.exam_type(), ExamType::Simple);
        assert!(def.active);
        let orders: Vec<u32> = def.fields().iter().map(|f| f.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_ne!(def.fields()[0].id, def.fields()[1].id);
    }

    #[test]
    fn duplicate_code_is_a_validation_error() {
        let svc = test_service();
        svc.create_definition(glucose()).unwrap();
        let err = svc
            .create_definition(DefinitionInput::simple("glu", "Otra glucosa"))
            .unwrap_err();
        match err {
            CoreError::Validation(v) => assert_eq!(v[0].field, "code"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn composite_rejects_unknown_and_duplicate_children() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();

        let (offending, _) = composition_reason(
            svc.create_definition(DefinitionInput::composite("P1", "Perfil").child(DefinitionId(999)))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(DefinitionId(999)));

        let (offending, reason) = composition_reason(
            svc.create_definition(
                DefinitionInput::composite("P2", "Perfil")
                    .child(glu.id)
                    .child(glu.id),
            )
            .unwrap_err(),
        );
        assert_eq!(offending, Some(glu.id));
        assert!(reason.contains("more than once"));
    }

    #[test]
    fn composite_shape_problems_are_composition_errors() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();

        let (offending, reason) = composition_reason(
            svc.create_definition(
                DefinitionInput::composite("C", "Perfil")
                    .child(glu.id)
                    .field(FieldInput::new("x", DataType::Number)),
            )
            .unwrap_err(),
        );
        assert_eq!(offending, None);
        assert!(reason.contains("cannot own fields"));

        let profile = svc
            .create_definition(DefinitionInput::composite("P", "Perfil").child(glu.id))
            .unwrap();
        let err = svc
            .update_definition(profile.id, DefinitionInput::composite("P", "Perfil"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidComposition {
                definition_id: Some(id),
                offending_id: None,
                ..
            } if id == profile.id
        ));
        assert_eq!(svc.list_definitions(true).len(), 2);
    }

    #[test]
    fn simple_with_children_is_rejected() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        let (offending, _) = composition_reason(
            svc.create_definition(DefinitionInput::simple("X", "X").child(glu.id))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(glu.id));
    }

    #[test]
    fn simple_profile_flag_is_ignored() {
        let svc = test_service();
        let def = svc.create_definition(glucose().profile(true)).unwrap();
        assert!(!def.is_profile());
    }

    #[test]
    fn profiles_cannot_be_nested() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        let profile = svc
            .create_definition(DefinitionInput::composite("PERF", "Perfil").child(glu.id).profile(true))
            .unwrap();

        let (offending, _) = composition_reason(
            svc.create_definition(DefinitionInput::composite("OUTER", "Outer").child(profile.id))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(profile.id));
    }

    #[test]
    fn becoming_a_profile_while_referenced_names_the_parent() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        let inner = svc
            .create_definition(DefinitionInput::composite("INNER", "Inner").child(glu.id))
            .unwrap();
        let outer = svc
            .create_definition(DefinitionInput::composite("OUTER", "Outer").child(inner.id))
            .unwrap();

        let (offending, _) = composition_reason(
            svc.update_definition(
                inner.id,
                DefinitionInput::composite("INNER", "Inner").child(glu.id).profile(true),
            )
            .unwrap_err(),
        );
        assert_eq!(offending, Some(outer.id));
    }

    #[test]
    fn update_cannot_create_a_cycle() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        let a = svc
            .create_definition(DefinitionInput::composite("A", "A").child(glu.id))
            .unwrap();
        let b = svc
            .create_definition(DefinitionInput::composite("B", "B").child(a.id))
            .unwrap();

        let (offending, reason) = composition_reason(
            svc.update_definition(a.id, DefinitionInput::composite("A", "A").child(b.id))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(b.id));
        assert!(reason.contains("cycle"));

        let (offending, _) = composition_reason(
            svc.update_definition(a.id, DefinitionInput::hybrid("A", "A").child(a.id))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(a.id));
        assert!(!svc.composition_graph().has_cycles());
    }

    #[test]
    fn inactive_children_are_rejected_by_default() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        svc.deactivate(glu.id).unwrap();
        let (offending, _) = composition_reason(
            svc.create_definition(DefinitionInput::composite("P", "P").child(glu.id))
                .unwrap_err(),
        );
        assert_eq!(offending, Some(glu.id));
    }

    #[test]
    fn update_keeps_known_field_ids() {
        let svc = test_service();
        let def = svc.create_definition(glucose()).unwrap();
        let kept = def.fields()[0].id;

        let updated = svc
            .update_definition(
                def.id,
                DefinitionInput::simple("GLU", "Glucosa sérica")
                    .field(FieldInput::new("Nota", DataType::Longtext))
                    .field(FieldInput::new("Glucosa", DataType::Number).with_id(kept).required()),
            )
            .unwrap();

        assert_eq!(updated.fields()[1].id, kept);
        assert_eq!(updated.fields()[1].order, 1);
        assert_ne!(updated.fields()[0].id, kept);
        assert_eq!(updated.created_at, def.created_at);
        assert_eq!(updated.name, "Glucosa sérica");
    }

    #[test]
    fn queries_are_ordered_by_code() {
        let svc = test_service();
        let glu = svc.create_definition(glucose()).unwrap();
        let b = svc
            .create_definition(DefinitionInput::composite("B-PERF", "B").child(glu.id))
            .unwrap();
        let a = svc
            .create_definition(DefinitionInput::hybrid("A-PERF", "A").child(glu.id))
            .unwrap();
        svc.deactivate(b.id).unwrap();

        let codes = |defs: Vec<ExamDefinition>| defs.into_iter().map(|d| d.code).collect::<Vec<_>>();
        assert_eq!(codes(svc.list_definitions(false)), vec!["A-PERF", "GLU"]);
        assert_eq!(codes(svc.list_definitions(true)), vec!["A-PERF", "B-PERF", "GLU"]);
        assert_eq!(codes(svc.parents_of(glu.id).unwrap()), vec!["A-PERF", "B-PERF"]);
        assert_eq!(svc.find_by_code("a-perf").unwrap().id, a.id);
        assert!(matches!(
            svc.find_by_code("NOPE"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn validation_reports_every_problem() {
        let svc = test_service();
        let err = svc
            .create_definition(DefinitionInput::simple("", " ").field(FieldInput::new(" ", DataType::Text)))
            .unwrap_err();
        let CoreError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            violations,
            vec![
                FieldViolation::new("code", "must not be empty"),
                FieldViolation::new("name", "must not be empty"),
                FieldViolation::new("fields[0].name", "must not be empty"),
            ]
        );
    }

    #[test]
    fn definition_sections_group_fields() {
        let svc = test_service();
        let def = svc
            .create_definition(
                DefinitionInput::simple("EGO", "Orina")
                    .field(FieldInput::new("Nota", DataType::Longtext))
                    .field(FieldInput::new("Color", DataType::Text).section("fisico"))
                    .field(FieldInput::new("Leucocitos", DataType::Number).section("micro"))
                    .field(FieldInput::new("Aspecto", DataType::Text).section("fisico")),
            )
            .unwrap();

        let titles = SectionTitles::default().with_title("fisico", "Examen físico");
        let sections = svc.definition_sections(def.id, &titles).unwrap();
        let summary: Vec<_> = sections
            .iter()
            .map(|s| (s.title.as_str(), s.fields.len()))
            .collect();
        assert_eq!(summary, vec![("Examen físico", 2), ("micro", 1), ("General", 1)]);
        assert_eq!(sections[2].key, SectionKey::Unsectioned);
    }
}
