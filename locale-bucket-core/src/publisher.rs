//! Versioned publisher: moves a bucket scope from the previous artifact set to
//! the new one.
//!
//! Stages run in order `Idle → VersionResolved → OldDeleted → Uploading →
//! LocalPurged → Done`; [`PublishStage::Error`] absorbs any step that cannot
//! continue. The store gives no transactional guarantees, so each step makes as
//! much progress as it can: a failed delete, upload or access grant is logged
//! and the batch carries on.
//!
//! Known race: the version is resolved from one listing and nothing re-checks
//! it before upload. A second writer publishing in between can produce the
//! same version number; a single writer per scope is assumed.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::BucketScope;
use crate::contract::{AclEntry, ObjectStore, StoreError};
use crate::version::{artifact_name, is_versioned_artifact, latest_version};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Idle,
    VersionResolved,
    OldDeleted,
    Uploading { index: usize, total: usize },
    LocalPurged,
    Done,
    Error,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStage::Idle => write!(f, "idle"),
            PublishStage::VersionResolved => write!(f, "version-resolved"),
            PublishStage::OldDeleted => write!(f, "old-deleted"),
            PublishStage::Uploading { index, total } => write!(f, "uploading({index} of {total})"),
            PublishStage::LocalPurged => write!(f, "local-purged"),
            PublishStage::Done => write!(f, "done"),
            PublishStage::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Remote names that were stored.
    pub uploaded: Vec<String>,
    /// Locales whose local artifact was missing.
    pub skipped: Vec<String>,
    /// Remote names whose upload failed.
    pub failed: Vec<String>,
    /// Uploaded remote names that could not be made public.
    pub not_public: Vec<String>,
}

/// Summary of one publication run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub old_version: u64,
    pub new_version: u64,
    pub deleted: DeleteOutcome,
    pub uploads: UploadOutcome,
    pub purged: Vec<PathBuf>,
    pub stage: PublishStage,
}

pub struct Publisher<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    scope: BucketScope,
    work_dir: PathBuf,
    stage: PublishStage,
    old_version: u64,
    new_version: u64,
}

impl<'a, S: ObjectStore + ?Sized> Publisher<'a, S> {
    pub fn new(store: &'a S, scope: BucketScope, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            scope,
            work_dir: work_dir.into(),
            stage: PublishStage::Idle,
            old_version: 0,
            new_version: 0,
        }
    }

    pub fn stage(&self) -> PublishStage {
        self.stage
    }

    pub fn scope(&self) -> &BucketScope {
        &self.scope
    }

    pub fn old_version(&self) -> u64 {
        self.old_version
    }

    pub fn new_version(&self) -> u64 {
        self.new_version
    }

    fn advance(&mut self, next: PublishStage) {
        if self.stage == PublishStage::Error {
            debug!(attempted = %next, "[PUBLISH] Ignoring transition out of error stage");
            return;
        }
        debug!(from = %self.stage, to = %next, "[PUBLISH] Stage transition");
        self.stage = next;
    }

    /// Marks the run as failed; later transitions are ignored.
    pub fn fail(&mut self, reason: &str) {
        error!(stage = %self.stage, reason, "[PUBLISH][ERROR] Publication aborted");
        self.stage = PublishStage::Error;
    }

    /// Lists the scope and fixes `new_version = max(existing) + 1`.
    pub async fn resolve_version(&mut self) -> Result<u64, StoreError> {
        let prefix = self.scope.list_prefix();
        let objects = match self.store.list_objects(&prefix).await {
            Ok(objects) => objects,
            Err(e) => {
                self.fail(&format!("listing {}/{prefix} failed: {e}", self.scope.bucket));
                return Err(e);
            }
        };
        self.old_version = latest_version(objects.iter().map(|o| o.name.as_str()));
        self.new_version = self.old_version + 1;
        info!(
            bucket = %self.scope.bucket,
            prefix = %prefix,
            objects = objects.len(),
            old_version = self.old_version,
            new_version = self.new_version,
            "[PUBLISH] Version resolved"
        );
        self.advance(PublishStage::VersionResolved);
        Ok(self.new_version)
    }

    /// Lists the scope again and deletes everything found.
    pub async fn delete_old(&mut self) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();
        let prefix = self.scope.list_prefix();
        let objects = match self.store.list_objects(&prefix).await {
            Ok(objects) => objects,
            Err(e) => {
                error!(error = %e, prefix = %prefix, "[PUBLISH][DELETE] Listing before delete failed, nothing deleted");
                self.advance(PublishStage::OldDeleted);
                return outcome;
            }
        };

        for object in objects {
            match self.store.delete_object(&object.name).await {
                Ok(()) => {
                    info!(object = %object.name, "[PUBLISH][DELETE] Deleted");
                    outcome.deleted.push(object.name);
                }
                Err(e) => {
                    error!(object = %object.name, error = %e, "[PUBLISH][DELETE] Delete failed, skipping");
                    outcome.failed.push(object.name);
                }
            }
        }
        info!(
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            "[PUBLISH][DELETE] Old artifacts removed"
        );
        self.advance(PublishStage::OldDeleted);
        outcome
    }

    /// Uploads `<locale>_<new_version>.json` from the working directory for each locale,
    /// then makes it publicly readable.
    pub async fn upload_all<'l, I>(&mut self, locales: I) -> UploadOutcome
    where
        I: IntoIterator<Item = &'l str>,
    {
        let locales: Vec<&str> = locales.into_iter().collect();
        let total = locales.len();
        let mut outcome = UploadOutcome::default();

        for (i, locale) in locales.into_iter().enumerate() {
            self.advance(PublishStage::Uploading { index: i + 1, total });
            let file_name = artifact_name(locale, self.new_version);
            let local_path = self.work_dir.join(&file_name);
            let remote_name = self.scope.object_name(&file_name);

            let content = match fs::read(&local_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %local_path.display(), error = %e, "[PUBLISH][UPLOAD] Local artifact missing, skipping");
                    outcome.skipped.push(locale.to_string());
                    continue;
                }
            };

            info!(object = %remote_name, bytes = content.len(), "[PUBLISH][UPLOAD] Uploading");
            if let Err(e) = self
                .store
                .upload_object(&remote_name, content, JSON_CONTENT_TYPE)
                .await
            {
                error!(object = %remote_name, error = %e, "[PUBLISH][UPLOAD] Upload failed, skipping");
                outcome.failed.push(remote_name);
                continue;
            }

            match ensure_public(self.store, &remote_name).await {
                Ok(granted) => {
                    info!(object = %remote_name, granted, "[PUBLISH][UPLOAD] Object is publicly readable");
                }
                Err(e) => {
                    error!(object = %remote_name, error = %e, "[PUBLISH][UPLOAD] Making object public failed");
                    outcome.not_public.push(remote_name.clone());
                }
            }
            outcome.uploaded.push(remote_name);
        }

        info!(
            uploaded = outcome.uploaded.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "[PUBLISH][UPLOAD] Upload batch finished"
        );
        outcome
    }

    /// Deletes every `*_<digits>.json` file in the working directory.
    pub fn purge_local(&mut self) -> Vec<PathBuf> {
        let purged = purge_versioned_files(&self.work_dir);
        self.advance(PublishStage::LocalPurged);
        purged
    }

    pub fn finish(&mut self) {
        self.advance(PublishStage::Done);
        info!(
            stage = %self.stage,
            old_version = self.old_version,
            new_version = self.new_version,
            "[PUBLISH] Publication finished"
        );
    }
}

/// Grants anonymous read on `name` unless such a grant already exists.
/// Returns `true` when a new entry was inserted.
pub async fn ensure_public<S: ObjectStore + ?Sized>(store: &S, name: &str) -> Result<bool, StoreError> {
    let entries = store.list_acl(name).await?;
    if entries.iter().any(AclEntry::is_public_read) {
        debug!(object = name, "Public read already granted");
        return Ok(false);
    }
    store.insert_acl(name, AclEntry::public_read()).await?;
    Ok(true)
}

/// Removes files named like versioned artifacts from `dir`, whoever produced them.
pub fn purge_versioned_files(dir: &Path) -> Vec<PathBuf> {
    let mut purged = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(dir = %dir.display(), error = %e, "[PUBLISH][PURGE] Cannot read working directory");
            return purged;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_artifact = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_versioned_artifact);
        if !is_artifact {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "[PUBLISH][PURGE] Removed local artifact");
                purged.push(path);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "[PUBLISH][PURGE] Failed to remove local artifact");
            }
        }
    }
    purged.sort();
    info!(count = purged.len(), dir = %dir.display(), "[PUBLISH][PURGE] Local artifacts purged");
    purged
}
