/// `load_config` module: loads the static YAML config and merges environment overrides
/// into the fully resolved [`CliConfig`].
///
/// Secrets do not belong in the YAML: the credentials path (and, for CI, the bucket)
/// can be injected through `LOCALE_BUCKET_CREDENTIALS` and `LOCALE_BUCKET_BUCKET`.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use locale_bucket_core::config::{BucketScope, LanguageSpec};
use locale_bucket_core::network::DEFAULT_PROBE_HOST;
use locale_bucket_core::notify::NotifyConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const CREDENTIALS_ENV: &str = "LOCALE_BUCKET_CREDENTIALS";
pub const BUCKET_ENV: &str = "LOCALE_BUCKET_BUCKET";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetSection {
    #[serde(default = "default_sheet_name")]
    pub name: String,
    #[serde(default = "default_header_offset")]
    pub header_row: usize,
    #[serde(default = "default_header_offset")]
    pub header_column: usize,
}

fn default_sheet_name() -> String {
    "Translations".to_string()
}

fn default_header_offset() -> usize {
    2
}

fn default_probe_host() -> String {
    DEFAULT_PROBE_HOST.to_string()
}

impl Default for SheetSection {
    fn default() -> Self {
        Self {
            name: default_sheet_name(),
            header_row: default_header_offset(),
            header_column: default_header_offset(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageSection {
    pub scope: BucketScope,
    pub credentials: PathBuf,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub sheet: SheetSection,
    pub languages: LanguageSpec,
    pub storage: StorageSection,
    pub reachability_host: String,
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    credentials: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sheet: SheetSection,
    #[serde(default)]
    languages: LanguageSpec,
    storage: RawStorage,
    #[serde(default = "default_probe_host")]
    reachability_host: String,
    #[serde(default)]
    notify: NotifyConfig,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Loads a static YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let bucket = match env_override(BUCKET_ENV).or(raw.storage.bucket) {
        Some(bucket) if !bucket.trim().is_empty() => bucket,
        _ => {
            error!("No bucket configured");
            anyhow::bail!("storage.bucket must be set (or {BUCKET_ENV})");
        }
    };

    let credentials = match env_override(CREDENTIALS_ENV)
        .map(PathBuf::from)
        .or(raw.storage.credentials)
    {
        Some(path) => path,
        None => {
            error!("No credentials file configured");
            anyhow::bail!("storage.credentials must be set (or {CREDENTIALS_ENV})");
        }
    };

    if let Err(problem) = raw.languages.validate() {
        error!(problem = %problem, "Invalid language configuration");
        anyhow::bail!("Invalid languages section: {problem}");
    }

    if raw.notify.enabled
        && (raw.notify.project.is_empty()
            || raw.notify.region.is_empty()
            || raw.notify.function_name.is_empty())
    {
        error!(
            project = %raw.notify.project,
            region = %raw.notify.region,
            function_name = %raw.notify.function_name,
            "Notification enabled with incomplete settings"
        );
        anyhow::bail!("notify.enabled requires project, region and function_name");
    }

    let scope = BucketScope::new(bucket, raw.storage.folder.as_deref());
    info!(
        bucket = %scope.bucket,
        folder = scope.folder().unwrap_or(""),
        sheet = %raw.sheet.name,
        notify = raw.notify.enabled,
        "Config loaded and merged successfully"
    );
    raw.languages.trace_loaded();

    Ok(CliConfig {
        sheet: raw.sheet,
        languages: raw.languages,
        storage: StorageSection { scope, credentials },
        reachability_host: raw.reachability_host,
        notify: raw.notify,
    })
}
