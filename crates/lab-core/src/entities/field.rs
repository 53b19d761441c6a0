use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DataType;
use crate::ids::FieldId;

/// One reportable attribute of an exam definition.
///
/// `order` is owned by the definition: it is always the field's position in
/// the definition's field list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FieldSchema {
    pub id: FieldId,
    pub name: String,
    pub data_type: DataType,
    pub unit: Option<String>,
    /// Reference expression, e.g. `70-110`, `<200`, `negativo`.
    pub reference: Option<String>,
    /// Raw section key. `None` places the field in the unsectioned bucket.
    pub section: Option<String>,
    pub order: u32,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSchema {
    /// Resolve a select option case-insensitively, returning its stored spelling.
    #[must_use]
    pub fn match_option(&self, raw: &str) -> Option<&str> {
        let wanted = raw.trim().to_lowercase();
        self.options
            .iter()
            .find(|opt| opt.trim().to_lowercase() == wanted)
            .map(String::as_str)
    }
}
