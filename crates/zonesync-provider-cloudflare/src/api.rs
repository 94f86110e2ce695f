//! Cloudflare API v4 client
//!
//! Only the four calls the provider needs:
//!
//! ```http
//! GET    /zones?name=example.com
//! GET    /zones/:zone_id/dns_records?name=www.example.com&type=A&page=1&per_page=100
//! POST   /zones/:zone_id/dns_records
//! DELETE /zones/:zone_id/dns_records/:record_id
//! ```
//!
//! Every response uses the v4 envelope (`success`, `errors`, `result`,
//! `result_info`). HTTP failures and `success: false` both become
//! `Error::Protocol`; connection problems become `Error::Transport`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zonesync_core::{Error, Result};

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page when listing
pub const PAGE_SIZE: u32 = 100;

/// A DNS record as the API represents it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Assigned by Cloudflare; absent on records we are about to create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub record_type: String,

    pub name: String,

    pub content: String,

    /// Seconds, 1 meaning "automatic"
    pub ttl: u32,

    #[serde(default)]
    pub proxied: bool,

    /// MX preference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl DnsRecord {
    pub fn new(
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
        proxied: bool,
        priority: Option<u16>,
    ) -> Self {
        Self {
            id: None,
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
            ttl,
            proxied,
            priority,
        }
    }
}

/// Calls the provider makes against Cloudflare
#[async_trait]
pub trait CloudflareApi: Send + Sync {
    /// Resolve a zone name (no trailing dot) to its id
    async fn zone_id(&self, zone_name: &str) -> Result<String>;

    /// All records of one (name, type) in a zone, across every page
    async fn list_records(&self, zone_id: &str, name: &str, record_type: &str)
    -> Result<Vec<DnsRecord>>;

    async fn create_record(&self, zone_id: &str, record: &DnsRecord) -> Result<DnsRecord>;

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()>;
}

/// API credentials
#[derive(Clone)]
pub enum Auth {
    /// Scoped API token, sent as a bearer token
    Token(String),
    /// Global API key with the account email
    Key { key: String, email: String },
}

// Custom Debug implementation that hides the credentials
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            Auth::Key { email, .. } => f
                .debug_struct("Key")
                .field("key", &"<REDACTED>")
                .field("email", email)
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ZoneRef {
    id: String,
}

/// reqwest-backed client
pub struct CloudflareClient {
    base_url: String,
    auth: Auth,
    client: reqwest::Client,
}

impl CloudflareClient {
    /// Create a client for `base_url` (no trailing slash needed)
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            client,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Token(token) => request.bearer_auth(token),
            Auth::Key { key, email } => request
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<(T, Option<ResultInfo>)> {
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::transport("cloudflare", format!("HTTP request failed: {e}")))?;

        let envelope: Envelope<T> = decode(response, context).await?;
        if !envelope.success {
            return Err(Error::protocol(
                "cloudflare",
                envelope
                    .errors
                    .first()
                    .map(|e| e.code.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                format!("{context}: {}", describe(&envelope.errors)),
            ));
        }

        let result = envelope.result.ok_or_else(|| {
            Error::protocol("cloudflare", "invalid-response", format!("{context}: no result"))
        })?;
        Ok((result, envelope.result_info))
    }
}

impl fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

#[async_trait]
impl CloudflareApi for CloudflareClient {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let url = format!("{}/zones", self.base_url);
        let request = self.client.get(&url).query(&[("name", zone_name)]);
        let (zones, _): (Vec<ZoneRef>, _) = self.call(request, "Zone lookup").await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::backend_lookup("cloudflare", zone_name))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let per_page = PAGE_SIZE.to_string();
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_param = page.to_string();
            let request = self.client.get(&url).query(&[
                ("name", name),
                ("type", record_type),
                ("page", page_param.as_str()),
                ("per_page", per_page.as_str()),
            ]);
            let (batch, info): (Vec<DnsRecord>, _) = self.call(request, "Record lookup").await?;
            records.extend(batch);

            let total_pages = info.map(|i| i.total_pages).unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Found {} existing {} record(s) for {}",
            records.len(),
            record_type,
            name
        );
        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let request = self.client.post(&url).json(record);
        let (created, _): (DnsRecord, _) = self.call(request, "Record creation").await?;
        Ok(created)
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        let request = self.client.delete(&url);
        let _: (serde_json::Value, _) = self.call(request, "Record deletion").await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<Envelope<T>> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(status_error(status, context, &error_text));
    }

    response.json().await.map_err(|e| {
        Error::protocol(
            "cloudflare",
            "invalid-response",
            format!("{context}: failed to parse response: {e}"),
        )
    })
}

/// Map an HTTP failure status
fn status_error(status: StatusCode, context: &str, body: &str) -> Error {
    let code = status.as_u16().to_string();
    let message = match status.as_u16() {
        401 | 403 => {
            "Authentication failed: invalid credentials or insufficient permissions".to_string()
        }
        404 => format!("{context}: not found"),
        409 => format!("{context}: conflict with an existing record - {body}"),
        429 => "Rate limit exceeded. Please retry later".to_string(),
        500..=599 => format!("Cloudflare server error (transient): {body}"),
        _ => format!("{context} failed: {body}"),
    };
    Error::protocol("cloudflare", code, message)
}

fn describe(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "request was not successful".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
