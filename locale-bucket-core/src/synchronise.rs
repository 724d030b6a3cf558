//! High-level pipeline: sheet → translation sets → versioned bucket publication.
//!
//! One call to [`synchronise`] performs a full run against a bucket scope:
//!   - logs the sheet header and warns about configured languages without a header label
//!   - resolves the next version from the remote listing (before any file is named)
//!   - builds one translation set per language and writes `<locale>_<version>.json` locally
//!   - checks the network, deletes the previous artifacts, uploads and publishes the new ones
//!   - purges local versioned artifacts and, when configured, notifies the version bump
//!
//! # Error Handling
//! Three failures stop a run early and are returned as [`SynchroniseError`]:
//! the sheet has no data rows below its header, the version cannot be resolved,
//! or the artifacts cannot be written. All happen before any remote mutation. Everything later is best effort and shows up in
//! the returned [`SynchroniseReport`] instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{BucketScope, LanguageSpec};
use crate::contract::{Notifier, ObjectStore, ReachabilityProbe};
use crate::publisher::{PublishReport, PublishStage, Publisher};
use crate::sheet::{extract_sheet_header, HeaderMap, TabularSource};
use crate::translation;

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SynchroniseConfig {
    pub languages: LanguageSpec,
    pub header_row: usize,
    pub header_column: usize,
    pub scope: BucketScope,
    /// Directory where artifacts are written and later purged.
    pub work_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum SynchroniseError {
    #[error("sheet has no data rows below header row {header_row}")]
    NoDataRows { header_row: usize },

    #[error("could not resolve the next version: {0}")]
    VersionResolution(String),

    #[error("could not write translation artifacts: {0}")]
    Artifacts(#[from] io::Error),
}

#[derive(Debug)]
pub struct SynchroniseReport {
    pub header: HeaderMap,
    pub artifacts: Vec<PathBuf>,
    pub publish: PublishReport,
    /// `None` when no notification was attempted.
    pub notified: Option<bool>,
}

pub async fn synchronise<T, S, P>(
    config: &SynchroniseConfig,
    source: &T,
    store: &S,
    probe: &P,
    notifier: Option<&dyn Notifier>,
) -> Result<SynchroniseReport, SynchroniseError>
where
    T: TabularSource + ?Sized,
    S: ObjectStore + ?Sized,
    P: ReachabilityProbe + ?Sized,
{
    info!(
        bucket = %config.scope.bucket,
        folder = config.scope.folder().unwrap_or(""),
        "[SYNC] Starting publication run"
    );

    if source.row_count() <= config.header_row + 1 {
        error!(
            header_row = config.header_row,
            rows = source.row_count(),
            "[SYNC] No data rows below the header, nothing published"
        );
        return Err(SynchroniseError::NoDataRows {
            header_row: config.header_row,
        });
    }

    let header = extract_sheet_header(source, config.header_row, config.header_column);
    info!(labels = ?header.labels(), "[SYNC] Sheet header");
    for lang in &config.languages.entries {
        if header.column(&lang.code).is_none() {
            warn!(code = %lang.code, column = lang.column, "[SYNC] No header label for configured language");
        }
    }

    let mut publisher = Publisher::new(store, config.scope.clone(), config.work_dir.clone());
    let version = publisher
        .resolve_version()
        .await
        .map_err(|e| SynchroniseError::VersionResolution(e.to_string()))?;

    let sets = translation::build(source, &config.languages, config.header_row);
    let artifacts = match translation::write_artifacts(&sets, version, &config.work_dir) {
        Ok(paths) => paths,
        Err(e) => {
            publisher.fail("writing local artifacts failed");
            return Err(e.into());
        }
    };

    if !probe.is_reachable().await {
        publisher.fail("network unreachable, nothing deleted or uploaded");
        let publish = PublishReport {
            old_version: publisher.old_version(),
            new_version: publisher.new_version(),
            deleted: Default::default(),
            uploads: Default::default(),
            purged: Vec::new(),
            stage: publisher.stage(),
        };
        return Ok(SynchroniseReport {
            header,
            artifacts,
            publish,
            notified: None,
        });
    }

    let deleted = publisher.delete_old().await;
    let uploads = publisher.upload_all(config.languages.locales()).await;
    let purged = publisher.purge_local();
    publisher.finish();

    let publish = PublishReport {
        old_version: publisher.old_version(),
        new_version: publisher.new_version(),
        deleted,
        uploads,
        purged,
        stage: publisher.stage(),
    };

    let notified = match notifier {
        Some(notifier) if !publish.uploads.uploaded.is_empty() => {
            match notifier.notify(publish.new_version, &publish.uploads.uploaded).await {
                Ok(()) => Some(true),
                Err(e) => {
                    error!(error = %e, version = publish.new_version, "[SYNC][NOTIFY] Notification failed, continuing");
                    Some(false)
                }
            }
        }
        Some(_) => {
            warn!("[SYNC][NOTIFY] Nothing uploaded, skipping notification");
            None
        }
        None => None,
    };

    if publish.stage == PublishStage::Done {
        info!(
            version = publish.new_version,
            uploaded = publish.uploads.uploaded.len(),
            deleted = publish.deleted.deleted.len(),
            "[SYNC] Publication run complete"
        );
    }

    Ok(SynchroniseReport {
        header,
        artifacts,
        publish,
        notified,
    })
}
