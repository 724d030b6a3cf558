//! Translation set builder: turns sheet rows into one ordered key → value map
//! per configured language and writes each map as a versioned JSON artifact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::LanguageSpec;
use crate::sheet::TabularSource;
use crate::version::artifact_name;

/// Entry identifying the language of a set; always the first entry.
pub const SEED_KEY: &str = "key";

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSet {
    locale: String,
    entries: IndexMap<String, String>,
}

impl TranslationSet {
    fn seeded(locale: &str) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(SEED_KEY.to_string(), locale.to_string());
        Self {
            locale: locale.to_string(),
            entries,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    pub fn file_name(&self, version: u64) -> String {
        artifact_name(&self.locale, version)
    }

    /// Pretty JSON, two-space indent, seed entry first then sheet row order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// Builds one set per language in `spec`, reading data rows after `header_row`.
/// A repeated key keeps the value of its last row.
pub fn build<S: TabularSource + ?Sized>(
    source: &S,
    spec: &LanguageSpec,
    header_row: usize,
) -> Vec<TranslationSet> {
    let mut sets: Vec<TranslationSet> = spec
        .entries
        .iter()
        .map(|lang| TranslationSet::seeded(&lang.locale))
        .collect();

    let mut rows = 0usize;
    for row in (header_row + 1)..source.row_count() {
        let key = source.cell(row, spec.key_column).to_text();
        for (lang, set) in spec.entries.iter().zip(sets.iter_mut()) {
            let value = source.cell(row, lang.column).to_text();
            if let Some(previous) = set.entries.insert(key.clone(), value) {
                debug!(row, key = %key, locale = %lang.locale, previous = %previous, "Duplicate key, last row wins");
            }
        }
        rows += 1;
    }

    info!(
        rows,
        languages = sets.len(),
        "[BUILD] Translation sets built"
    );
    sets
}

/// Writes every set to `dir/<locale>_<version>.json`, replacing existing files.
pub fn write_artifacts(
    sets: &[TranslationSet],
    version: u64,
    dir: &Path,
) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(sets.len());
    for set in sets {
        let path = dir.join(set.file_name(version));
        let json = set.to_json().map_err(io::Error::other)?;
        fs::write(&path, json)?;
        debug!(path = %path.display(), entries = set.len(), "[BUILD] Wrote artifact");
        written.push(path);
    }
    info!(count = written.len(), version, dir = %dir.display(), "[BUILD] Artifacts written");
    Ok(written)
}
