//! # contract: seams between the publication pipeline and the outside world
//!
//! The pipeline talks to three collaborators through the traits defined here:
//! - [`ObjectStore`]: list, delete, upload and grant access to objects in one bucket
//! - [`ReachabilityProbe`]: decides whether the network is usable before anything is deleted
//! - [`Notifier`]: tells an external service that a new version was published
//!
//! All traits are annotated for `mockall`, so tests (and downstream crates with the
//! `test-export-mocks` feature) get `MockObjectStore`, `MockReachabilityProbe` and
//! `MockNotifier` for free.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Error returned by remote store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// An object as reported by a store listing or upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Full object name, folder prefix included.
    pub name: String,
    pub size: Option<u64>,
}

impl RemoteObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
        }
    }
}

/// One access-control entry on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub entity: String,
    pub role: String,
}

pub const ALL_USERS: &str = "allUsers";
pub const READER: &str = "READER";

impl AclEntry {
    /// Anonymous read access.
    pub fn public_read() -> Self {
        Self {
            entity: ALL_USERS.to_string(),
            role: READER.to_string(),
        }
    }

    pub fn is_public_read(&self) -> bool {
        self.entity == ALL_USERS && self.role == READER
    }
}

/// Object operations against one bucket. Calls are issued one at a time by the publisher.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object whose name starts with `prefix` (empty prefix: whole bucket).
    async fn list_objects(&self, prefix: &str) -> Result<Vec<RemoteObject>, StoreError>;

    async fn delete_object(&self, name: &str) -> Result<(), StoreError>;

    /// Store `content` under `name`, replacing any object of that name.
    async fn upload_object(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<RemoteObject, StoreError>;

    async fn list_acl(&self, name: &str) -> Result<Vec<AclEntry>, StoreError>;

    async fn insert_acl(&self, name: &str, entry: AclEntry) -> Result<(), StoreError>;
}

/// Network availability check run before any remote mutation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Receives the version bump once a publication uploaded at least one artifact.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, version: u64, files: &[String]) -> Result<(), crate::notify::NotifyError>;
}
