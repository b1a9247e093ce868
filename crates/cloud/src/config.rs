//! Gateway configuration loaded from environment variables.
//!
//! | Variable                | Required | Default                                  |
//! |-------------------------|----------|------------------------------------------|
//! | `CLOUD_BACKEND`         | no       | `live` (`memory` for in-process fakes)   |
//! | `S3_BUCKET`             | yes      |                                          |
//! | `S3_REGION`             | no       | `auto`                                   |
//! | `S3_ENDPOINT`           | no       | AWS default (set for R2 / MinIO)         |
//! | `S3_ACCESS_KEY_ID`      | no       | default credential chain                 |
//! | `S3_SECRET_ACCESS_KEY`  | no       | default credential chain                 |
//! | `S3_PUBLIC_BASE_URL`    | yes      |                                          |
//! | `S3_PRESIGN_TTL_SECS`   | no       | `900`                                    |
//! | `STREAM_ACCOUNT_ID`     | yes      |                                          |
//! | `STREAM_API_TOKEN`      | yes      |                                          |
//! | `STREAM_API_BASE`       | no       | `https://api.cloudflare.com/client/v4`   |
//! | `STREAM_DELIVERY_BASE`  | yes      |                                          |

use std::time::Duration;

use crate::error::CloudError;

/// Default presigned URL lifetime (15 minutes).
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 900;

pub const DEFAULT_STREAM_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Which gateway implementations the process wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudBackend {
    Live,
    Memory,
}

impl CloudBackend {
    pub fn from_env() -> Result<Self, CloudError> {
        match std::env::var("CLOUD_BACKEND").as_deref() {
            Err(_) | Ok("live") => Ok(Self::Live),
            Ok("memory") => Ok(Self::Memory),
            Ok(other) => Err(CloudError::Configuration(format!(
                "CLOUD_BACKEND must be 'live' or 'memory', got '{other}'"
            ))),
        }
    }
}

/// Object storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Public base URL objects are served from (CDN or bucket domain).
    pub public_base_url: String,
    pub presign_ttl: Duration,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, CloudError> {
        let presign_ttl_secs = match std::env::var("S3_PRESIGN_TTL_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                CloudError::Configuration(format!(
                    "S3_PRESIGN_TTL_SECS must be a number of seconds, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_PRESIGN_TTL_SECS,
        };

        Ok(Self {
            bucket: required("S3_BUCKET")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".into()),
            endpoint: optional("S3_ENDPOINT"),
            access_key_id: optional("S3_ACCESS_KEY_ID"),
            secret_access_key: optional("S3_SECRET_ACCESS_KEY"),
            public_base_url: required("S3_PUBLIC_BASE_URL")?,
            presign_ttl: Duration::from_secs(presign_ttl_secs),
        })
    }
}

/// Managed video service settings.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub account_id: String,
    pub api_token: String,
    pub api_base: String,
    /// Public base URL for playback manifests and poster frames.
    pub delivery_base: String,
}

impl StreamConfig {
    pub fn from_env() -> Result<Self, CloudError> {
        Ok(Self {
            account_id: required("STREAM_ACCOUNT_ID")?,
            api_token: required("STREAM_API_TOKEN")?,
            api_base: std::env::var("STREAM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_STREAM_API_BASE.into()),
            delivery_base: required("STREAM_DELIVERY_BASE")?,
        })
    }
}

fn required(var: &str) -> Result<String, CloudError> {
    optional(var).ok_or_else(|| CloudError::Configuration(format!("{var} must be set")))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
