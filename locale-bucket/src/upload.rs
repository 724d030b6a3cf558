#![doc = "Cloud Storage integration: implements the core `ObjectStore` contract against the GCS JSON API."]
//
//! # Storage session (CLI <-> Core)
//!
//! [`GcsClient`] is the bridge between the CLI workflow and the publication
//! pipeline in `locale-bucket-core`. One client is opened per run with a bearer
//! token obtained from the configured credentials, handed to the pipeline by
//! reference and released when it goes out of scope at the end of the run.
//!
//! - List: `GET /storage/v1/b/{bucket}/o?prefix=` (paginated with `pageToken`)
//! - Delete: `DELETE /storage/v1/b/{bucket}/o/{object}`
//! - Upload: `POST /upload/storage/v1/b/{bucket}/o?uploadType=media&name=`
//! - ACL: `GET` / `POST /storage/v1/b/{bucket}/o/{object}/acl`
//!
//! Object names are percent-encoded as a single path segment, so a folder
//! prefix such as `i18n/` travels as `i18n%2F`.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;

use locale_bucket_core::contract::{AclEntry, ObjectStore, RemoteObject, StoreError};

use crate::credentials::Credentials;

pub const API_BASE: &str = "https://storage.googleapis.com/storage/v1";
pub const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    #[serde(default)]
    size: Option<String>,
}

impl From<ObjectResource> for RemoteObject {
    fn from(resource: ObjectResource) -> Self {
        RemoteObject {
            name: resource.name,
            size: resource.size.and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AclList {
    #[serde(default)]
    items: Vec<AclEntry>,
}

pub struct GcsClient {
    client: reqwest::Client,
    token: String,
    bucket: String,
    api_base: String,
    upload_base: String,
}

impl GcsClient {
    /// Exchanges `credentials` for a token and opens a session on `bucket`.
    pub async fn connect(
        client: reqwest::Client,
        credentials: &Credentials,
        bucket: &str,
    ) -> Result<Self> {
        let token = credentials.access_token(&client).await?;
        tracing::info!(bucket, kind = credentials.kind(), "Opened Cloud Storage session");
        Ok(Self::with_token(client, token, bucket))
    }

    pub fn with_token(client: reqwest::Client, token: String, bucket: &str) -> Self {
        Self {
            client,
            token,
            bucket: bucket.to_string(),
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Points the client at another API root (emulators, proxies).
    pub fn with_endpoints(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn url(base: &str, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(base)?;
        url.path_segments_mut()
            .map_err(|_| format!("{base} cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn objects_url(&self) -> Result<Url, StoreError> {
        Self::url(&self.api_base, &["b", &self.bucket, "o"])
    }

    fn object_url(&self, name: &str) -> Result<Url, StoreError> {
        Self::url(&self.api_base, &["b", &self.bucket, "o", name])
    }

    fn acl_url(&self, name: &str) -> Result<Url, StoreError> {
        Self::url(&self.api_base, &["b", &self.bucket, "o", name, "acl"])
    }

    fn upload_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = Self::url(&self.upload_base, &["b", &self.bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        Ok(url)
    }
}

/// Turns a non-success response into an error carrying status and body.
async fn checked(response: Response, action: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = status.as_u16(), body = %body, action, "Cloud Storage request failed");
    Err(format!("{action} failed with {status}: {body}").into())
}

impl Drop for GcsClient {
    fn drop(&mut self) {
        tracing::debug!(bucket = %self.bucket, "Cloud Storage session released");
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<RemoteObject>, StoreError> {
        tracing::info!(bucket = %self.bucket, prefix, "Listing objects");
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.objects_url()?)
                .bearer_auth(&self.token)
                .query(&[("prefix", prefix)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = checked(request.send().await?, "list objects").await?;
            let page: ObjectList = response.json().await?;
            objects.extend(page.items.into_iter().map(RemoteObject::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::info!(count = objects.len(), prefix, "Fetched object listing");
        Ok(objects)
    }

    async fn delete_object(&self, name: &str) -> Result<(), StoreError> {
        tracing::info!(bucket = %self.bucket, object = name, "Deleting object");
        let response = self
            .client
            .delete(self.object_url(name)?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        checked(response, "delete object").await?;
        Ok(())
    }

    async fn upload_object(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<RemoteObject, StoreError> {
        tracing::info!(bucket = %self.bucket, object = name, bytes = content.len(), "Uploading object");
        let response = self
            .client
            .post(self.upload_url(name)?)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await?;
        let resource: ObjectResource = checked(response, "upload object").await?.json().await?;
        Ok(resource.into())
    }

    async fn list_acl(&self, name: &str) -> Result<Vec<AclEntry>, StoreError> {
        let response = self
            .client
            .get(self.acl_url(name)?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let acl: AclList = checked(response, "list object ACL").await?.json().await?;
        Ok(acl.items)
    }

    async fn insert_acl(&self, name: &str, entry: AclEntry) -> Result<(), StoreError> {
        tracing::info!(object = name, entity = %entry.entity, role = %entry.role, "Granting object access");
        let response = self
            .client
            .post(self.acl_url(name)?)
            .bearer_auth(&self.token)
            .json(&entry)
            .send()
            .await?;
        checked(response, "insert object ACL").await?;
        Ok(())
    }
}
