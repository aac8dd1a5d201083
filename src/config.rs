//! Configuration module

use std::env;
use std::time::Duration;

use crate::logic::classifier::{Policy, PolicyError, DEFAULT_BOUNDARY};
use crate::logic::decoder::IMG_SIZE;
use crate::logic::storage::drive::{DEFAULT_API_URL, DEFAULT_UPLOAD_URL};
use crate::logic::storage::{Credentials, DriveConfig, ServiceAccountKey, StorageError, DEFAULT_FOLDER_NAME};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// ONNX model file
    pub model_path: String,

    /// Model input edge length
    pub img_size: u32,

    /// Policy preset name (two_zone, three_zone)
    pub classifier_policy: String,

    /// Two-zone decision boundary as given; parsed by `load_policy`
    pub decision_boundary: Option<String>,

    /// JSON zone table, overrides the preset when set
    pub policy_file: Option<String>,

    /// Remote folder for uploads
    pub drive_folder_name: String,

    /// Inline service account JSON
    pub service_account_key: Option<String>,

    /// Service account JSON file, used when no inline key is given
    pub service_account_file: String,

    /// Pre-issued bearer token, skips the JWT exchange
    pub drive_access_token: Option<String>,

    pub drive_api_url: String,
    pub drive_upload_url: String,

    /// Storage request timeout; None waits indefinitely
    pub drive_timeout_secs: Option<u64>,

    /// Request body limit in MiB
    pub body_limit_mb: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            environment: non_empty("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),

            model_path: non_empty("MODEL_PATH")
                .unwrap_or_else(|| "oral_cancer_model.onnx".to_string()),

            img_size: non_empty("IMG_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(IMG_SIZE),

            classifier_policy: non_empty("CLASSIFIER_POLICY")
                .unwrap_or_else(|| "two_zone".to_string()),

            decision_boundary: non_empty("DECISION_BOUNDARY"),

            policy_file: non_empty("POLICY_FILE"),

            drive_folder_name: non_empty("DRIVE_FOLDER_NAME")
                .unwrap_or_else(|| DEFAULT_FOLDER_NAME.to_string()),

            service_account_key: non_empty("SERVICE_ACCOUNT_KEY"),

            service_account_file: non_empty("SERVICE_ACCOUNT_FILE")
                .unwrap_or_else(|| "service-account-key.json".to_string()),

            drive_access_token: non_empty("DRIVE_ACCESS_TOKEN"),

            drive_api_url: non_empty("DRIVE_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),

            drive_upload_url: non_empty("DRIVE_UPLOAD_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),

            drive_timeout_secs: non_empty("DRIVE_TIMEOUT_SECS")
                .and_then(|t| t.parse().ok()),

            body_limit_mb: non_empty("BODY_LIMIT_MB")
                .and_then(|m| m.parse().ok())
                .unwrap_or(20),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Classification policy: the JSON table if configured, else the preset
    pub fn load_policy(&self) -> Result<Policy, PolicyError> {
        match &self.policy_file {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| PolicyError::Load(format!("{}: {}", path, e)))?;
                Policy::from_json(&json)
            }
            None => Policy::preset(&self.classifier_policy, self.boundary()?),
        }
    }

    /// Configured boundary, or the default when unset. A value that is not
    /// a number is an error rather than a silent fallback.
    pub fn boundary(&self) -> Result<f64, PolicyError> {
        match &self.decision_boundary {
            Some(raw) => raw.trim().parse().map_err(|_| {
                PolicyError::Load(format!("DECISION_BOUNDARY '{}' is not a number", raw))
            }),
            None => Ok(DEFAULT_BOUNDARY),
        }
    }

    /// Storage credentials, in order: access token, inline key, key file
    pub fn credentials(&self) -> Result<Credentials, StorageError> {
        if let Some(token) = &self.drive_access_token {
            return Ok(Credentials::StaticToken(token.clone()));
        }
        if let Some(json) = &self.service_account_key {
            return ServiceAccountKey::from_json(json).map(Credentials::ServiceAccount);
        }
        ServiceAccountKey::from_file(&self.service_account_file).map(Credentials::ServiceAccount)
    }

    pub fn drive_config(&self) -> DriveConfig {
        DriveConfig {
            api_url: self.drive_api_url.trim_end_matches('/').to_string(),
            upload_url: self.drive_upload_url.trim_end_matches('/').to_string(),
            timeout: self.drive_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}
