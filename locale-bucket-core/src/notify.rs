//! Version-bump notification to an HTTP cloud function.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::contract::Notifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub function_name: String,
}

impl NotifyConfig {
    /// `https://<region>-<project>.cloudfunctions.net/<function_name>`
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}-{}.cloudfunctions.net/{}",
            self.region, self.project, self.function_name
        )
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Serialize)]
struct VersionBump<'a> {
    version: u64,
    files: &'a [String],
}

pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(client: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, version: u64, files: &[String]) -> Result<(), NotifyError> {
        info!(endpoint = %self.endpoint, version, "[NOTIFY] Posting version bump");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&VersionBump { version, files })
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(endpoint = %self.endpoint, status = status.as_u16(), "[NOTIFY] Unexpected status");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!(endpoint = %self.endpoint, version, "[NOTIFY] Version bump acknowledged");
        Ok(())
    }
}
