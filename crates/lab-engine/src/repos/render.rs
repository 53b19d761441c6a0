//! Read-side views of requests for list, print and report consumers.

use lab_core::aggregate::aggregate;
use lab_core::entities::ExamInstance;
use lab_core::errors::CoreError;
use lab_core::ids::{InstanceId, RequestId};
use lab_core::responses::{InstanceView, RequestView, SectionView};
use lab_core::sections::{SectionTitles, group_by_section};

use crate::service::LabService;

impl LabService {
    /// Everything needed to show one request: its aggregate plus every
    /// top-level instance with grouped results and nested children.
    ///
    /// # Errors
    ///
    /// `NotFound` if an instance references a definition or child that no
    /// longer exists.
    pub fn render_request(
        &self,
        request_id: RequestId,
        titles: &SectionTitles,
    ) -> Result<RequestView, CoreError> {
        let roots = self.instances_for_request(request_id);
        let exams = roots
            .iter()
            .map(|inst| self.instance_view(inst, titles))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RequestView {
            request_id,
            aggregate: aggregate(&roots),
            exams,
        })
    }

    /// View of a single instance and its subtree.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown instance.
    pub fn render_instance(
        &self,
        id: InstanceId,
        titles: &SectionTitles,
    ) -> Result<InstanceView, CoreError> {
        let inst = self.snapshot(id)?;
        self.instance_view(&inst, titles)
    }

    fn instance_view(
        &self,
        inst: &ExamInstance,
        titles: &SectionTitles,
    ) -> Result<InstanceView, CoreError> {
        let (code, name) = {
            let catalog = self.catalog.read();
            let def = catalog.require(inst.definition_id)?;
            (def.code.clone(), def.name.clone())
        };

        let sections = group_by_section(&inst.captures)
            .iter()
            .map(|bucket| SectionView::from_bucket(bucket, titles))
            .collect();

        let children = inst
            .child_ids
            .iter()
            .map(|child| {
                let child = self.snapshot(*child)?;
                self.instance_view(&child, titles)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InstanceView {
            instance_id: inst.id,
            definition_id: inst.definition_id,
            code,
            name,
            exam_type: inst.exam_type,
            state: inst.state,
            completed_at: inst.completed_at,
            sections,
            missing_required: inst.missing_required(),
            children,
        })
    }
}
