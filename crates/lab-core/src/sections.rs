//! Section grouping for fields and captured results.
//!
//! Buckets are keyed by the raw section string (trimmed, case-sensitive) and
//! appear in first-seen order of the input. Items without a section land in a
//! single unsectioned bucket that is always last. Display titles live in a
//! separate [`SectionTitles`] map supplied by the caller, so renaming a section
//! for display never touches stored data.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{FieldSchema, ResultCapture};

/// Default display title of the unsectioned bucket.
pub const DEFAULT_UNSECTIONED_TITLE: &str = "General";

/// Anything that can be placed into a section bucket.
pub trait Sectioned {
    /// Raw section key as stored.
    fn section(&self) -> Option<&str>;
    /// Position within the owning definition.
    fn order(&self) -> u32;
}

impl Sectioned for FieldSchema {
    fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    fn order(&self) -> u32 {
        self.order
    }
}

impl Sectioned for ResultCapture {
    fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    fn order(&self) -> u32 {
        self.order
    }
}

/// Key of a section bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Named(String),
    Unsectioned,
}

impl SectionKey {
    /// Build a key from a raw stored section. Blank sections are unsectioned.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        normalize_section(raw).map_or(Self::Unsectioned, Self::Named)
    }

    #[must_use]
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unsectioned => None,
        }
    }
}

/// Trim a raw section, mapping blank input to `None`.
#[must_use]
pub fn normalize_section(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// One bucket of grouped items.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBucket<'a, T> {
    pub key: SectionKey,
    pub items: Vec<&'a T>,
}

/// Partition items into ordered section buckets.
///
/// Bucket order is first-seen order of `items`; the unsectioned bucket, if
/// any, is moved to the end. Within a bucket items are sorted by `order`,
/// ties keeping their input order.
pub fn group_by_section<'a, T, I>(items: I) -> Vec<SectionBucket<'a, T>>
where
    T: Sectioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut buckets: Vec<SectionBucket<'a, T>> = Vec::new();
    let mut index: HashMap<SectionKey, usize> = HashMap::new();

    for item in items {
        let key = SectionKey::from_raw(item.section());
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push(SectionBucket {
                key,
                items: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[slot].items.push(item);
    }

    for bucket in &mut buckets {
        bucket.items.sort_by_key(|item| item.order());
    }

    if let Some(pos) = buckets
        .iter()
        .position(|b| b.key == SectionKey::Unsectioned)
    {
        let unsectioned = buckets.remove(pos);
        buckets.push(unsectioned);
    }

    buckets
}

/// Presentation-only mapping from section key to display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SectionTitles {
    #[serde(default)]
    titles: HashMap<String, String>,
    unsectioned: String,
}

impl Default for SectionTitles {
    fn default() -> Self {
        Self::new(DEFAULT_UNSECTIONED_TITLE)
    }
}

impl SectionTitles {
    #[must_use]
    pub fn new(unsectioned: impl Into<String>) -> Self {
        Self {
            titles: HashMap::new(),
            unsectioned: unsectioned.into(),
        }
    }

    /// Override the display title of a section key.
    #[must_use]
    pub fn with_title(mut self, key: impl Into<String>, title: impl Into<String>) -> Self {
        self.set_title(key, title);
        self
    }

    pub fn set_title(&mut self, key: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(key.into().trim().to_string(), title.into());
    }

    /// Display title for a key. Defaults to the key itself.
    #[must_use]
    pub fn title_for<'a>(&'a self, key: &'a SectionKey) -> &'a str {
        match key {
            SectionKey::Named(name) => self.titles.get(name).map_or(name.as_str(), String::as_str),
            SectionKey::Unsectioned => &self.unsectioned,
        }
    }
}
