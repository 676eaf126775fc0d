//! Reference catalogs (medicines, lab and radiology procedures) and the
//! fuzzy index built over their labels.

pub mod fuzzy;
pub mod loader;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use loader::{CatalogError, CatalogLoad, CatalogSource};

/// Similarity cutoff used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Category of medicine catalogs.
pub const MEDICINE: &str = "medicine";
/// Category of lab, radiology and procedure catalogs.
pub const PROCEDURE: &str = "procedure";

/// One reference item from a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display string, used for matching.
    pub label: String,
    /// Opaque identifier such as a SKU code.
    pub code: Option<String>,
    /// Which catalog the entry came from ("medicine", "procedure", ...).
    pub category: String,
    /// Every other field of the source row, passed through untouched.
    pub attributes: Map<String, Value>,
}

impl CatalogEntry {
    /// Build an entry from a JSON row using the given field mapping.
    /// Returns `None` for rows that are not objects or have no usable label.
    pub fn from_record(record: &Value, schema: &CatalogSchema) -> Option<Self> {
        let obj = record.as_object()?;
        let label = obj.get(&schema.label_field).and_then(value_as_text)?;
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let code = schema
            .code_field
            .as_ref()
            .and_then(|f| obj.get(f))
            .and_then(value_as_text)
            .filter(|c| !c.is_empty());
        Some(Self {
            label: label.to_string(),
            code,
            category: schema.category.clone(),
            attributes: obj.clone(),
        })
    }

    /// A passthrough field of the source row as text, if it has one.
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .get(key)
            .and_then(value_as_text)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Strings are taken as-is; numeric codes are common in SKU sheets.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Field mapping for one catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSchema {
    /// Row field holding the display label.
    pub label_field: String,
    /// Row field holding the code, if the catalog has one.
    pub code_field: Option<String>,
    /// Category tag stamped on every entry of this catalog.
    pub category: String,
}

impl CatalogSchema {
    pub fn new(label_field: &str, code_field: Option<&str>, category: &str) -> Self {
        Self {
            label_field: label_field.to_string(),
            code_field: code_field.map(str::to_string),
            category: category.to_string(),
        }
    }

    /// Medicine SKU sheet (`medicine_desc` / `sku_code`).
    pub fn medicines() -> Self {
        Self::new("medicine_desc", Some("sku_code"), MEDICINE)
    }

    /// Lab and procedure sheet, which reuses the medicine column names.
    pub fn procedures() -> Self {
        Self::new("medicine_desc", Some("sku_code"), PROCEDURE)
    }

    /// Procedure SKU list as served to the radiology screens.
    pub fn procedure_sku_list() -> Self {
        Self::new("name", Some("code"), PROCEDURE)
    }
}

/// Index build options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexOptions {
    /// Maximum normalized score (0 = exact) still counted as a match.
    pub threshold: f64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: Arc<CatalogEntry>,
    key: Vec<char>,
}

/// Read-only fuzzy index over catalog labels.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexedEntry>,
    options: IndexOptions,
}

impl CatalogIndex {
    /// Build an index. Entries with a blank label are dropped.
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>, options: IndexOptions) -> Self {
        let entries: Vec<IndexedEntry> = entries
            .into_iter()
            .filter(|e| !e.label.trim().is_empty())
            .map(|entry| IndexedEntry {
                key: fuzzy::fold(&entry.label),
                entry: Arc::new(entry),
            })
            .collect();
        tracing::debug!(
            entries = entries.len(),
            threshold = options.threshold,
            "built catalog index"
        );
        Self { entries, options }
    }

    /// An index with no entries; every search comes back empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert raw JSON rows into entries with `schema`, skipping bad rows.
    pub fn entries_from_records<'a>(
        records: impl IntoIterator<Item = &'a Value>,
        schema: &CatalogSchema,
    ) -> Vec<CatalogEntry> {
        records
            .into_iter()
            .filter_map(|r| CatalogEntry::from_record(r, schema))
            .collect()
    }

    /// Build one index spanning several catalogs, each with its own schema.
    pub fn merge<'a>(
        catalogs: impl IntoIterator<Item = (&'a [Value], &'a CatalogSchema)>,
        options: IndexOptions,
    ) -> Self {
        let entries = catalogs
            .into_iter()
            .flat_map(|(records, schema)| Self::entries_from_records(records, schema));
        Self::build(entries, options)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Best matches first, at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Arc<CatalogEntry>> {
        self.search_scored(query, limit)
            .into_iter()
            .map(|(entry, _)| entry)
            .collect()
    }

    /// Like [`search`](Self::search) but keeps each entry's score.
    pub fn search_scored(&self, query: &str, limit: usize) -> Vec<(Arc<CatalogEntry>, f64)> {
        let query = fuzzy::fold(query.trim());
        if query.is_empty() || limit == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let s = fuzzy::score(&query, &e.key);
                (s <= self.options.threshold).then_some((i, s))
            })
            .collect();

        hits.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| self.entries[a.0].key.len().cmp(&self.entries[b.0].key.len()))
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(limit);

        hits.into_iter()
            .map(|(i, s)| (Arc::clone(&self.entries[i].entry), s))
            .collect()
    }

    /// Entries of one category under their own options. Entries are shared
    /// with `self`, not copied.
    pub fn subset(&self, category: &str, options: IndexOptions) -> Self {
        let entries: Vec<IndexedEntry> = self
            .entries
            .iter()
            .filter(|e| e.entry.category == category)
            .cloned()
            .collect();
        tracing::debug!(
            category,
            entries = entries.len(),
            threshold = options.threshold,
            "built catalog subset"
        );
        Self { entries, options }
    }
}
