//! Google Drive Client
//!
//! Thin binding over the Drive v3 REST API: folder search/create, multipart
//! upload, paginated listing and media download.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::auth::{Credentials, TokenProvider};
use super::{FolderId, StorageError, StorageGateway, StoredFile, UploadMetadata, UploadResult};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,createdTime,size,description,properties)";
const PAGE_SIZE: &str = "1000";

/// Drive endpoint configuration
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_url: String,
    pub upload_url: String,
    /// None = wait as long as the backend takes
    pub timeout: Option<Duration>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<StoredFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Drive API client
pub struct DriveClient {
    config: DriveConfig,
    tokens: TokenProvider,
    http: reqwest::Client,
}

impl DriveClient {
    pub fn new(config: DriveConfig, credentials: Credentials, scope: &str) -> Result<Self, StorageError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            tokens: TokenProvider::new(credentials, scope, http.clone()),
            config,
            http,
        })
    }

    /// Look up a folder by exact name
    pub async fn find_folder(&self, name: &str) -> Result<Option<FolderId>, StorageError> {
        let q = format!(
            "mimeType='{}' and name='{}' and trashed=false",
            FOLDER_MIME,
            escape_query(name)
        );
        let files = self.query(&q, "files(id,name)").await?;
        Ok(files.into_iter().next().map(|f| FolderId(f.id)))
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, StorageError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/files", self.config.api_url);

        let response = self.http
            .post(&url)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME }))
            .send()
            .await?;

        let created: CreatedFile = parse(response).await?;
        tracing::info!("✅ Created new folder: {}", name);
        Ok(FolderId(created.id))
    }

    /// Image files in the folder (used by the dataset tool)
    pub async fn list_images(&self, folder: &FolderId) -> Result<Vec<StoredFile>, StorageError> {
        let q = format!(
            "'{}' in parents and mimeType contains 'image/' and trashed=false",
            escape_query(folder.as_str())
        );
        self.query(&q, LIST_FIELDS).await
    }

    /// Raw file content
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>, StorageError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/files/{}", self.config.api_url, file_id);

        let response = self.http
            .get(&url)
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        let response = check(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Run a files.list query, following page tokens
    async fn query(&self, q: &str, fields: &str) -> Result<Vec<StoredFile>, StorageError> {
        let url = format!("{}/files", self.config.api_url);
        let fields = if fields.contains("nextPageToken") {
            fields.to_string()
        } else {
            format!("nextPageToken,{}", fields)
        };

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.tokens.access_token().await?;
            let mut params = vec![
                ("q", q.to_string()),
                ("spaces", "drive".to_string()),
                ("fields", fields.clone()),
                ("pageSize", PAGE_SIZE.to_string()),
            ];
            if let Some(page) = &page_token {
                params.push(("pageToken", page.clone()));
            }

            let response = self.http
                .get(&url)
                .bearer_auth(token)
                .query(&params)
                .send()
                .await?;

            let page: FileList = parse(response).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl StorageGateway for DriveClient {
    async fn ensure_folder(&self, name: &str) -> Result<FolderId, StorageError> {
        if let Some(id) = self.find_folder(name).await? {
            return Ok(id);
        }
        self.create_folder(name).await
    }

    async fn upload(
        &self,
        folder: &FolderId,
        bytes: Vec<u8>,
        filename: &str,
        metadata: &UploadMetadata,
    ) -> Result<UploadResult, StorageError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/files", self.config.upload_url);

        let file_metadata = json!({
            "name": filename,
            "parents": [folder.as_str()],
            "description": metadata.description,
            "properties": metadata.properties,
        });

        let boundary = format!("oralscan-{}", Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &file_metadata, &metadata.mime_type, &bytes);

        let response = self.http
            .post(&url)
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", "id,name,webViewLink")])
            .header(CONTENT_TYPE, format!("multipart/related; boundary={}", boundary))
            .body(body)
            .send()
            .await?;

        let created: CreatedFile = parse(response).await?;
        tracing::info!("✅ Uploaded: {} ({})", filename, created.id);

        Ok(UploadResult {
            file_name: created.name.unwrap_or_else(|| filename.to_string()),
            file_id: created.id,
            web_link: created.web_view_link,
        })
    }

    async fn list(&self, folder: &FolderId) -> Result<Vec<StoredFile>, StorageError> {
        let q = format!("'{}' in parents and trashed=false", escape_query(folder.as_str()));
        self.query(&q, LIST_FIELDS).await
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Escape a value for use inside a single-quoted Drive query literal
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// JSON metadata part + media part, as Drive's multipart upload expects
fn multipart_related(boundary: &str, metadata: &serde_json::Value, mime_type: &str, media: &[u8]) -> Vec<u8> {
    let meta = metadata.to_string();
    let mut body = Vec::with_capacity(media.len() + meta.len() + 256);

    body.extend_from_slice(format!("--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n", boundary).as_bytes());
    body.extend_from_slice(meta.as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\nContent-Type: {}\r\n\r\n", boundary, mime_type).as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    body
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    tracing::error!("Drive API error ({}): {}", status, message);
    Err(StorageError::Api { status, message })
}

async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, StorageError> {
    check(response).await?
        .json()
        .await
        .map_err(|e| StorageError::Parse(e.to_string()))
}
