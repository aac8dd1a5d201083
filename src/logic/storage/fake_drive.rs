//! In-process stand-in for the Drive REST API, for tests.
//!
//! Serves folder search/create, multipart upload, paginated listing and media
//! download on 127.0.0.1 with an ephemeral port. Requests must carry
//! `Bearer test-token`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::auth::{Credentials, SCOPE_DRIVE_FILE};
use super::{DriveClient, DriveConfig, FolderId, StoredFile};

pub const TEST_TOKEN: &str = "test-token";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

struct Entry {
    file: StoredFile,
    parent: Option<String>,
    bytes: Vec<u8>,
}

struct FakeState {
    entries: Vec<Entry>,
    next_id: usize,
    page_size: usize,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeDrive {
    base_url: String,
    state: Shared,
}

impl FakeDrive {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            entries: Vec::new(),
            next_id: 1,
            page_size: 1000,
        }));

        let app = Router::new()
            .route("/files", get(list_files).post(create_folder))
            .route("/files/:id", get(download_file))
            .route("/upload/files", post(upload_file))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> DriveConfig {
        DriveConfig {
            api_url: self.base_url.clone(),
            upload_url: format!("{}/upload", self.base_url),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    pub fn client(&self) -> DriveClient {
        self.client_with_token(TEST_TOKEN)
    }

    pub fn client_with_token(&self, token: &str) -> DriveClient {
        DriveClient::new(self.config(), Credentials::StaticToken(token.to_string()), SCOPE_DRIVE_FILE).unwrap()
    }

    pub fn set_page_size(&self, size: usize) {
        self.state.lock().page_size = size;
    }

    pub fn folder_count(&self) -> usize {
        self.state.lock().entries.iter().filter(|e| is_folder(&e.file)).count()
    }

    /// Files (not folders) stored so far
    pub fn files(&self) -> Vec<StoredFile> {
        self.state.lock().entries.iter()
            .filter(|e| !is_folder(&e.file))
            .map(|e| e.file.clone())
            .collect()
    }

    pub fn bytes_of(&self, id: &str) -> Option<Vec<u8>> {
        self.state.lock().entries.iter()
            .find(|e| e.file.id == id)
            .map(|e| e.bytes.clone())
    }

    /// Seed a folder directly
    pub fn add_folder(&self, name: &str) -> FolderId {
        let mut state = self.state.lock();
        let id = state.new_id("folder");
        state.entries.push(Entry {
            file: StoredFile {
                id: id.clone(),
                name: name.to_string(),
                mime_type: Some(FOLDER_MIME.to_string()),
                ..Default::default()
            },
            parent: None,
            bytes: Vec::new(),
        });
        FolderId(id)
    }

    /// Seed a file directly
    pub fn add_file(
        &self,
        folder: &FolderId,
        name: &str,
        mime_type: &str,
        properties: &[(&str, &str)],
        bytes: Vec<u8>,
    ) -> String {
        let mut state = self.state.lock();
        let id = state.new_id("file");
        state.entries.push(Entry {
            file: StoredFile {
                id: id.clone(),
                name: name.to_string(),
                mime_type: Some(mime_type.to_string()),
                created_time: Some("2024-02-15T10:30:00.000Z".to_string()),
                size: Some(bytes.len().to_string()),
                properties: properties.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Default::default()
            },
            parent: Some(folder.0.clone()),
            bytes,
        });
        id
    }
}

impl FakeState {
    fn new_id(&mut self, kind: &str) -> String {
        let id = format!("{}-{}", kind, self.next_id);
        self.next_id += 1;
        id
    }
}

fn is_folder(file: &StoredFile) -> bool {
    file.mime_type.as_deref() == Some(FOLDER_MIME)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "code": 401, "message": "Invalid Credentials" } })),
    )
        .into_response()
}

/// Value of a single-quoted literal following `marker` in a query
fn quoted_after<'a>(q: &'a str, marker: &str) -> Option<&'a str> {
    let start = q.find(marker)? + marker.len();
    let rest = &q[start..];
    let end = rest.find("' and").unwrap_or(rest.len().saturating_sub(1));
    Some(&rest[..end])
}

fn unescape(value: &str) -> String {
    value.replace("\\'", "'").replace("\\\\", "\\")
}

async fn list_files(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let offset: usize = params.get("pageToken").and_then(|t| t.parse().ok()).unwrap_or(0);
    let state = state.lock();

    let matches: Vec<&StoredFile> = if q.contains(&format!("mimeType='{}'", FOLDER_MIME)) {
        let name = quoted_after(&q, "name='").map(unescape).unwrap_or_default();
        state.entries.iter()
            .filter(|e| is_folder(&e.file) && e.file.name == name)
            .map(|e| &e.file)
            .collect()
    } else {
        let parent = q.strip_prefix('\'')
            .and_then(|rest| rest.split_once("' in parents"))
            .map(|(id, _)| unescape(id))
            .unwrap_or_default();
        let images_only = q.contains("mimeType contains 'image/'");

        state.entries.iter()
            .filter(|e| e.parent.as_deref() == Some(parent.as_str()))
            .filter(|e| !images_only || e.file.mime_type.as_deref().unwrap_or("").starts_with("image/"))
            .map(|e| &e.file)
            .collect()
    };

    let end = (offset + state.page_size).min(matches.len());
    let page = &matches[offset.min(end)..end];
    let mut body = json!({ "files": page });
    if end < matches.len() {
        body["nextPageToken"] = Value::String(end.to_string());
    }

    Json(body).into_response()
}

async fn create_folder(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock();
    let id = state.new_id("folder");
    state.entries.push(Entry {
        file: StoredFile {
            id: id.clone(),
            name,
            mime_type: Some(FOLDER_MIME.to_string()),
            ..Default::default()
        },
        parent: None,
        bytes: Vec::new(),
    });

    Json(json!({ "id": id })).into_response()
}

async fn upload_file(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let boundary = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once("boundary="))
        .map(|(_, b)| b.trim().to_string());

    let Some(boundary) = boundary else {
        return (StatusCode::BAD_REQUEST, "missing boundary").into_response();
    };
    let Some(parts) = split_related(&body, &boundary) else {
        return (StatusCode::BAD_REQUEST, "malformed multipart body").into_response();
    };
    let [(_, meta), (media_headers, media)] = parts.as_slice() else {
        return (StatusCode::BAD_REQUEST, "expected two parts").into_response();
    };

    let meta: Value = match serde_json::from_slice(meta) {
        Ok(meta) => meta,
        Err(_) => return (StatusCode::BAD_REQUEST, "bad metadata").into_response(),
    };
    let mime_type = media_headers
        .lines()
        .find_map(|l| l.strip_prefix("Content-Type: "))
        .unwrap_or("")
        .to_string();
    let properties: BTreeMap<String, String> = meta["properties"]
        .as_object()
        .map(|o| o.iter().map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string())).collect())
        .unwrap_or_default();

    let name = meta["name"].as_str().unwrap_or_default().to_string();
    let parent = meta["parents"][0].as_str().map(str::to_string);

    let mut state = state.lock();
    let id = state.new_id("file");
    state.entries.push(Entry {
        file: StoredFile {
            id: id.clone(),
            name: name.clone(),
            mime_type: Some(mime_type),
            created_time: Some("2024-02-15T10:30:00.000Z".to_string()),
            size: Some(media.len().to_string()),
            description: meta["description"].as_str().map(str::to_string),
            properties,
        },
        parent,
        bytes: media.clone(),
    });

    Json(json!({
        "id": id,
        "name": name,
        "webViewLink": format!("https://drive.example/file/d/{}/view", id),
    }))
    .into_response()
}

async fn download_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    match state.lock().entries.iter().find(|e| e.file.id == id) {
        Some(entry) => entry.bytes.clone().into_response(),
        None => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

/// Split a multipart/related body into (headers, content) pairs
fn split_related(body: &[u8], boundary: &str) -> Option<Vec<(String, Vec<u8>)>> {
    let delimiter = format!("--{}", boundary);
    let separator = format!("\r\n{}", delimiter);

    let mut rest = body.strip_prefix(delimiter.as_bytes())?;
    let mut parts = Vec::new();

    while let Some(after) = rest.strip_prefix(b"\r\n") {
        let header_end = find(after, b"\r\n\r\n")?;
        let headers = String::from_utf8_lossy(&after[..header_end]).to_string();
        let content = &after[header_end + 4..];

        let end = find(content, separator.as_bytes())?;
        parts.push((headers, content[..end].to_vec()));
        rest = &content[end + separator.len()..];
    }

    Some(parts)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
