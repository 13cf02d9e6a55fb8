//! Cloudflare API v4 wire types and status mapping

use ipwatch_core::Error;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub(crate) const PROVIDER: &str = "cloudflare";

/// Every v4 response is wrapped in this envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl<T> Envelope<T> {
    /// Unwrap the result, turning `success: false` into a provider error
    pub fn into_result(self, context: &str) -> Result<T, Error> {
        if !self.success {
            let reasons: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", context, reasons.join("; ")),
            ));
        }
        self.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{}: response carries no result", context))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ZoneResult {
    pub id: String,
    pub name: String,
}

/// One DNS record as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of a create (POST) or overwrite (PUT) request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub ttl: u32,
    pub proxied: bool,
    pub comment: &'a str,
}

/// Reference to an existing record in a batch
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RecordRef<'a> {
    pub id: &'a str,
}

/// Overwrite entry of a batch: the record ID plus its full new body
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BatchPut<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub body: RecordBody<'a>,
}

/// Body of `POST /zones/:zone_id/dns_records/batch`
///
/// Cloudflare applies the whole batch in one transaction: deletes, then
/// puts, then posts. If any entry fails, none of them is applied.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct BatchBody<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<RecordRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub puts: Vec<BatchPut<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<RecordBody<'a>>,
}

/// Map a non-success HTTP status to an error
///
/// 404 is reported as a generic provider error here; callers that give it
/// a more specific meaning check for it first.
pub(crate) fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    let message = match status.as_u16() {
        401 | 403 => format!(
            "{}: authentication failed, invalid API token or insufficient permissions. Status: {}",
            context, status
        ),
        404 => format!("{}: not found. Status: {}", context, status),
        409 => format!(
            "{}: conflict, record is being updated by another process. Status: {}",
            context, status
        ),
        429 => format!("{}: rate limit exceeded. Status: {}", context, status),
        500..=599 => format!(
            "{}: Cloudflare server error (transient): {} - {}",
            context, status, body
        ),
        _ => format!("{} failed: {} - {}", context, status, body),
    };
    Error::provider(PROVIDER, message)
}
