//! Platform REST client
//!
//! Blocking client for the threat-intel platform v2 API. Requests are signed
//! with the platform's HMAC scheme:
//!
//! ```text
//! Authorization: TC <access_id>:<base64(HMAC-SHA256(secret, "<path?query>:<METHOD>:<timestamp>"))>
//! Timestamp:     <unix seconds>
//! ```

use std::io::Read;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::Config;
use crate::error::PlatformError;

use super::types::{EntityHandle, PlatformResponse};

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// CONSTANTS
// ============================================================================

const REQUEST_TIMEOUT_SECS: u64 = 30;
const HASH_BLOCK_SIZE: usize = 4096;

// ============================================================================
// CLIENT TRAIT
// ============================================================================

/// Read access to platform entities
pub trait PlatformClient {
    /// Fetch one entity, asking the platform to include the named sections
    /// (e.g. `attributes`, `tags`).
    fn single(
        &self,
        handle: &EntityHandle,
        includes: &[&str],
    ) -> Result<PlatformResponse, PlatformError>;

    /// Hex SHA-256 of the file the platform holds for a document or report
    fn file_hash(&self, handle: &EntityHandle) -> Result<String, PlatformError>;
}

// ============================================================================
// REST CLIENT
// ============================================================================

pub struct RestPlatformClient {
    agent: ureq::Agent,
    api_path: String,
    access_id: Option<String>,
    secret_key: Option<String>,
}

impl RestPlatformClient {
    pub fn new(
        api_path: impl Into<String>,
        access_id: Option<String>,
        secret_key: Option<String>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();

        Self {
            agent,
            api_path: api_path.into(),
            access_id,
            secret_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_path.clone(),
            config.api_access_id.clone(),
            config.api_secret_key.clone(),
        )
    }

    /// Check if client is configured
    pub fn is_configured(&self) -> bool {
        self.access_id.is_some() && self.secret_key.is_some()
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Absolute URL for an entity, optionally with a trailing sub-resource
    fn entity_url(&self, handle: &EntityHandle, suffix: Option<&str>) -> Result<Url, PlatformError> {
        let mut url = Url::parse(&self.api_path)
            .map_err(|e| PlatformError::InvalidUrl(format!("{}: {}", self.api_path, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PlatformError::InvalidUrl(self.api_path.clone()))?;
            segments.pop_if_empty().extend(handle.path_segments());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url.query_pairs_mut().append_pair("owner", &handle.owner);
        Ok(url)
    }

    /// Build the `Authorization` header value for a request
    pub fn authorization(
        &self,
        path_and_query: &str,
        method: &str,
        timestamp: &str,
    ) -> Result<String, PlatformError> {
        let (access_id, secret_key) = match (&self.access_id, &self.secret_key) {
            (Some(id), Some(key)) => (id, key),
            _ => return Err(PlatformError::NotConfigured),
        };

        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .map_err(|e| PlatformError::Signature(e.to_string()))?;
        mac.update(format!("{}:{}:{}", path_and_query, method, timestamp).as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        Ok(format!("TC {}:{}", access_id, signature))
    }

    fn get(&self, url: &Url) -> Result<ureq::Response, PlatformError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let authorization = self.authorization(&path, "GET", &timestamp)?;

        tracing::debug!("GET {}", url);

        let response = self.agent
            .get(url.as_str())
            .set("Timestamp", &timestamp)
            .set("Authorization", &authorization)
            .call();

        match response {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(_, resp)) => Ok(resp),
            Err(e) => Err(PlatformError::Network(e.to_string())),
        }
    }
}

impl std::fmt::Debug for RestPlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestPlatformClient")
            .field("api_path", &self.api_path)
            .field("access_id", &self.access_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl PlatformClient for RestPlatformClient {
    fn single(
        &self,
        handle: &EntityHandle,
        includes: &[&str],
    ) -> Result<PlatformResponse, PlatformError> {
        let mut url = self.entity_url(handle, None)?;
        {
            let mut query = url.query_pairs_mut();
            for include in includes {
                query.append_pair(&include_param(include), "true");
            }
        }

        let resp = self.get(&url)?;
        let status = resp.status();
        let body = resp.into_string()?;

        Ok(PlatformResponse { status, body })
    }

    fn file_hash(&self, handle: &EntityHandle) -> Result<String, PlatformError> {
        let url = self.entity_url(handle, Some("download"))?;
        let resp = self.get(&url)?;
        if resp.status() >= 400 {
            return Err(PlatformError::Network(format!(
                "download of {} failed with status {}",
                handle.path(),
                resp.status()
            )));
        }

        Ok(sha256_hex(resp.into_reader())?)
    }
}

/// `attributes` -> `includeAttributes`
fn include_param(include: &str) -> String {
    let mut chars = include.chars();
    match chars.next() {
        Some(first) => format!("include{}{}", first.to_uppercase(), chars.as_str()),
        None => "include".to_string(),
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

/// Stream a reader through SHA-256 in 4 KB blocks
pub fn sha256_hex<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BLOCK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
