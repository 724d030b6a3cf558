use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One target language: short code, locale tag and the sheet column holding its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub locale: String,
    pub column: usize,
}

impl Language {
    pub fn new(code: &str, locale: &str, column: usize) -> Self {
        Self {
            code: code.to_string(),
            locale: locale.to_string(),
            column,
        }
    }
}

/// Which columns to read: the translation key column plus one column per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    #[serde(default = "default_key_column")]
    pub key_column: usize,
    #[serde(default = "default_languages")]
    pub entries: Vec<Language>,
}

fn default_key_column() -> usize {
    2
}

fn default_languages() -> Vec<Language> {
    vec![
        Language::new("fr", "fr_FR", 3),
        Language::new("en", "en_EN", 4),
        Language::new("de", "de_DE", 5),
        Language::new("es", "es_ES", 6),
        Language::new("it", "it_IT", 7),
        Language::new("pt", "pt_PT", 8),
        Language::new("nl", "nl_NL", 9),
    ]
}

impl Default for LanguageSpec {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            entries: default_languages(),
        }
    }
}

impl LanguageSpec {
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|l| l.locale.as_str())
    }

    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("language list is empty".to_string());
        }
        for (i, lang) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|other| other.code == lang.code) {
                return Err(format!("duplicate language code '{}'", lang.code));
            }
            if self.entries[..i].iter().any(|other| other.locale == lang.locale) {
                return Err(format!("duplicate locale tag '{}'", lang.locale));
            }
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            key_column = self.key_column,
            languages = self.entries.len(),
            "Loaded language spec"
        );
        debug!(?self, "Language spec (full debug)");
    }
}

/// A bucket plus an optional folder prefix: the unit that is listed, purged and uploaded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketScope {
    pub bucket: String,
    folder: Option<String>,
}

impl BucketScope {
    pub fn new(bucket: impl Into<String>, folder: Option<&str>) -> Self {
        let folder = folder
            .map(|f| f.trim_matches('/').to_string())
            .filter(|f| !f.is_empty());
        Self {
            bucket: bucket.into(),
            folder,
        }
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Prefix used when listing the scope: `folder/`, or empty for the whole bucket.
    pub fn list_prefix(&self) -> String {
        match &self.folder {
            Some(folder) => format!("{folder}/"),
            None => String::new(),
        }
    }

    /// Full remote object name for an artifact file name.
    pub fn object_name(&self, file_name: &str) -> String {
        format!("{}{}", self.list_prefix(), file_name)
    }
}
