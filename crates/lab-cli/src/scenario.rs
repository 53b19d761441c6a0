//! Catalog and request scenario files.
//!
//! Files reference child exams by code, since ids only exist once the
//! definitions are stored. Loading orders the catalog so every child is
//! created before the parents that list it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, bail};
use lab_core::entities::{ExamDefinition, ExamInstance};
use lab_core::enums::ExamType;
use lab_core::ids::{DefinitionId, InstanceId, RequestId};
use lab_engine::LabService;
use lab_engine::graph::CompositionGraph;
use lab_engine::inputs::{DefinitionInput, FieldInput};
use serde::Deserialize;

/// A catalog file: a flat list of exam definitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub exams: Vec<ExamEntry>,
}

/// One exam as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamEntry {
    pub code: String,
    pub name: String,
    pub exam_type: ExamType,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
    /// Child exam codes.
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub is_profile: bool,
    #[serde(default)]
    pub sample_instructions: Option<String>,
    #[serde(default)]
    pub analysis_method: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// A catalog plus the requests to replay against it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioFile {
    #[serde(flatten)]
    pub catalog: CatalogFile,
    #[serde(default)]
    pub requests: Vec<RequestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEntry {
    pub id: i64,
    #[serde(default)]
    pub orders: Vec<OrderEntry>,
}

/// One exam ordered on a request.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntry {
    pub code: String,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    /// Complete the whole instance tree, children first, after capturing.
    #[serde(default)]
    pub complete: bool,
}

/// A value typed into one field of the ordered exam or one of its children.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultEntry {
    /// Code of the exam in the ordered tree that owns the field. Defaults to
    /// the ordered exam itself.
    #[serde(default)]
    pub exam: Option<String>,
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub observations: Option<String>,
}

/// Parse a TOML or JSON file, chosen by extension.
///
/// # Errors
///
/// Fails if the file cannot be read or does not parse.
pub fn read_file<T>(path: &Path) -> anyhow::Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    } else {
        toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

fn code_key(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Create every catalog entry in `service`, children first.
///
/// Entries marked inactive are deactivated after the whole catalog exists,
/// so they can still be listed as children.
///
/// # Errors
///
/// Fails on an unknown child code, a composition cycle, or the first entry
/// the engine rejects.
pub fn load_catalog(service: &LabService, catalog: &CatalogFile) -> anyhow::Result<Vec<ExamDefinition>> {
    let mut entries: HashMap<String, &ExamEntry> = HashMap::new();
    let mut graph: CompositionGraph<String> = CompositionGraph::new();

    for entry in &catalog.exams {
        let key = code_key(&entry.code);
        if entries.insert(key.clone(), entry).is_some() {
            bail!("exam code {} appears more than once", entry.code);
        }
        graph.add_node(key);
    }
    for entry in &catalog.exams {
        for child in &entry.children {
            let child_key = code_key(child);
            if !entries.contains_key(&child_key) {
                bail!("exam {} lists unknown child code {child}", entry.code);
            }
            graph.add_edge(code_key(&entry.code), child_key);
        }
    }

    let Some(order) = graph.toposort() else {
        let member = graph.cycle_member().unwrap_or_default();
        bail!("exam composition has a cycle through {member}");
    };

    let mut ids: HashMap<String, DefinitionId> = HashMap::new();
    let mut created = Vec::with_capacity(order.len());
    for key in order {
        let Some(entry) = entries.get(&key) else {
            continue;
        };
        let input = definition_input(entry, &ids)?;
        let def = service
            .create_definition(input)
            .with_context(|| format!("exam {} was rejected", entry.code))?;
        tracing::debug!(code = %def.code, id = %def.id, "catalog entry created");
        ids.insert(key, def.id);
        created.push(def);
    }

    for entry in catalog.exams.iter().filter(|e| !e.active) {
        if let Some(id) = ids.get(&code_key(&entry.code)) {
            service
                .deactivate(*id)
                .with_context(|| format!("failed to deactivate exam {}", entry.code))?;
        }
    }

    Ok(created)
}

fn definition_input(
    entry: &ExamEntry,
    ids: &HashMap<String, DefinitionId>,
) -> anyhow::Result<DefinitionInput> {
    let children = entry
        .children
        .iter()
        .map(|code| {
            ids.get(&code_key(code))
                .copied()
                .with_context(|| format!("child {code} of {} was not created", entry.code))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(DefinitionInput {
        code: entry.code.clone(),
        name: entry.name.clone(),
        exam_type: entry.exam_type,
        category_id: None,
        fields: entry.fields.clone(),
        children,
        is_profile: entry.is_profile,
        sample_instructions: entry.sample_instructions.clone(),
        analysis_method: entry.analysis_method.clone(),
    })
}

/// Instantiate, capture and complete every order of every request.
///
/// Returns the replayed request ids in file order.
///
/// # Errors
///
/// Fails on the first order, capture, or completion the engine rejects.
pub fn replay_requests(service: &LabService, requests: &[RequestEntry]) -> anyhow::Result<Vec<RequestId>> {
    let mut replayed = Vec::with_capacity(requests.len());
    for request in requests {
        let request_id = RequestId(request.id);
        for order in &request.orders {
            replay_order(service, request_id, order)
                .with_context(|| format!("request {} order {}", request.id, order.code))?;
        }
        replayed.push(request_id);
    }
    Ok(replayed)
}

fn replay_order(service: &LabService, request_id: RequestId, order: &OrderEntry) -> anyhow::Result<()> {
    let def = service.find_by_code(&order.code)?;
    let root = service.instantiate(request_id, def.id)?;
    let tree = instance_tree(service, root.id)?;

    for result in &order.results {
        let code = result.exam.as_deref().unwrap_or(&order.code);
        let (instance, definition) = tree
            .iter()
            .find(|(_, d)| d.code.eq_ignore_ascii_case(code.trim()))
            .with_context(|| format!("exam {code} is not part of this order"))?;
        let field = definition
            .fields()
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(result.field.trim()))
            .with_context(|| format!("exam {code} has no field {}", result.field))?;

        service
            .capture(instance.id, field.id, &result.value, result.observations.as_deref())
            .with_context(|| format!("capturing {} on {code}", field.name))?;
    }

    if order.complete {
        // Post-order, so children complete before their parents.
        for (instance, definition) in &tree {
            service
                .complete(instance.id)
                .with_context(|| format!("completing {}", definition.code))?;
        }
    }
    Ok(())
}

/// The instance tree under `root` in post-order, paired with definitions.
fn instance_tree(
    service: &LabService,
    root: InstanceId,
) -> anyhow::Result<Vec<(ExamInstance, ExamDefinition)>> {
    let inst = service.get_instance(root)?;
    let mut out = Vec::new();
    for child in &inst.child_ids {
        out.extend(instance_tree(service, *child)?);
    }
    let def = service.get_definition(inst.definition_id)?;
    out.push((inst, def));
    Ok(out)
}
