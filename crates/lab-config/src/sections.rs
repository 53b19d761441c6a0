//! Section display titles.

use std::collections::BTreeMap;

use lab_core::sections::{DEFAULT_UNSECTIONED_TITLE, SectionTitles};
use serde::{Deserialize, Serialize};

fn default_unsectioned_label() -> String {
    DEFAULT_UNSECTIONED_TITLE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionsConfig {
    /// Title shown for fields that carry no section.
    #[serde(default = "default_unsectioned_label")]
    pub unsectioned_label: String,

    /// Raw section key to display title.
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            unsectioned_label: default_unsectioned_label(),
            titles: BTreeMap::new(),
        }
    }
}

impl SectionsConfig {
    /// Build the presentation title map.
    #[must_use]
    pub fn titles(&self) -> SectionTitles {
        self.titles.iter().fold(
            SectionTitles::new(self.unsectioned_label.clone()),
            |titles, (key, title)| titles.with_title(key.clone(), title.clone()),
        )
    }
}
