// Backend HTTP client
//
// Wraps `reqwest::Client` with spoolfleet-specific URL construction and
// error-body decoding. Endpoint methods are thin: build URL, send, decode.
// The event stream lives in `events.rs`; this module is request/response only.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::types::{
    ControlResponse, ErrorBody, PrinterStatusDto, QueueItemDto, SpoolDto, SpoolWeightUpdate,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the spoolfleet backend REST API.
///
/// Authenticates with a static API key sent as `X-API-Key` on every
/// request. All methods decode the backend's `{detail}` error body on
/// non-success statuses before surfacing a typed [`Error`].
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl BackendClient {
    /// Create a client for the given backend root URL (e.g. `http://fleet:8000`).
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a client with a non-default request timeout.
    pub fn with_timeout(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spoolfleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Create a client from a pre-built `reqwest::Client` (tests, custom TLS).
    pub fn from_reqwest(http: reqwest::Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Spool inventory ──────────────────────────────────────────────

    /// List all filament spools.
    ///
    /// `GET /api/spools?include_archived={bool}`
    pub async fn list_spools(&self, include_archived: bool) -> Result<Vec<SpoolDto>, Error> {
        let mut url = self.api_url("spools")?;
        url.query_pairs_mut()
            .append_pair("include_archived", if include_archived { "true" } else { "false" });
        self.get(url).await
    }

    /// Record a fresh gross scale weight for a spool.
    ///
    /// `POST /api/spools/{id}/weight` — the backend recomputes
    /// `weight_used_g` from the gross reading and returns the updated spool.
    pub async fn update_spool_weight(&self, spool_id: i64, grams: u32) -> Result<SpoolDto, Error> {
        let url = self.api_url(&format!("spools/{spool_id}/weight"))?;
        debug!(spool_id, grams, "updating spool weight");
        self.post(url, &SpoolWeightUpdate {
            gross_weight_g: grams,
        })
        .await
    }

    // ── Printers ─────────────────────────────────────────────────────

    /// Fetch live status for one printer.
    ///
    /// `GET /api/printers/{id}/status`
    pub async fn get_printer_status(&self, printer_id: i64) -> Result<PrinterStatusDto, Error> {
        let url = self.api_url(&format!("printers/{printer_id}/status"))?;
        self.get(url).await
    }

    /// Fetch live status for every registered printer.
    ///
    /// `GET /api/printers/status`
    pub async fn list_printer_statuses(&self) -> Result<Vec<PrinterStatusDto>, Error> {
        let url = self.api_url("printers/status")?;
        self.get(url).await
    }

    /// Acknowledge that a finished/failed print has been removed from the
    /// plate, unblocking the next queued job.
    ///
    /// `POST /api/printers/{id}/clear-plate`
    pub async fn clear_plate(&self, printer_id: i64) -> Result<ControlResponse, Error> {
        let url = self.api_url(&format!("printers/{printer_id}/clear-plate"))?;
        debug!(printer_id, "sending clear-plate");
        self.post(url, &serde_json::json!({})).await
    }

    // ── Print queue ──────────────────────────────────────────────────

    /// List queue items for a printer, filtered by status.
    ///
    /// `GET /api/printers/{id}/queue?status={status}`
    pub async fn get_queue(
        &self,
        printer_id: i64,
        status: &str,
    ) -> Result<Vec<QueueItemDto>, Error> {
        let mut url = self.api_url(&format!("printers/{printer_id}/queue"))?;
        url.query_pairs_mut().append_pair("status", status);
        self.get(url).await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/api/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        );
        Ok(Url::parse(&full)?)
    }

    /// Send a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    /// Map status codes to typed errors, otherwise deserialize the body.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let path = resp.url().path().to_owned();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            });
        }

        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or_else(|_| body.clone());

        Err(match status.as_u16() {
            401 | 403 => Error::Authentication { message: detail },
            404 => Error::NotFound { resource: path },
            400 | 422 => Error::Validation { message: detail },
            code => Error::Api {
                message: detail,
                status: code,
            },
        })
    }
}
