use std::{
    fmt,
    io::{Cursor, Read},
};

use tracing::debug;
use url::Url;

use crate::{
    auth::Credentials,
    error::{DownloadError, Result},
    http_client::SHARED_AGENT,
    raw,
};

/// Status and body of a completed HTTP exchange.
pub struct TransportResponse {
    pub status: u16,
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, Cursor::new(body.into()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Reads the whole body, replacing invalid UTF-8.
    pub fn into_text(mut self) -> Result<String> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Turns 401/403 into [`DownloadError::Unauthorized`] and any other non-2xx status into
/// [`DownloadError::HttpError`].
pub fn ensure_success(url: &str, response: TransportResponse) -> Result<TransportResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    if response.is_unauthorized() {
        let body = response.into_text().unwrap_or_default();
        return Err(DownloadError::Unauthorized {
            url: url.to_string(),
            status,
            body,
        });
    }

    Err(DownloadError::HttpError {
        status,
        url: url.to_string(),
    })
}

/// The network seam used by repositories, downloads and uploads.
///
/// Non-2xx statuses are not errors at this level; callers decide what a 404 or 410 means.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, credentials: Option<&Credentials>) -> Result<TransportResponse>;

    /// Sends `body` unchanged. `headers` must include any `Authorization` header the
    /// server expects on the first request.
    fn post(&self, url: &str, headers: &[(String, String)], body: &[u8])
        -> Result<TransportResponse>;
}

/// [`Transport`] backed by the shared `ureq` agent.
///
/// POSTs to `http://` endpoints are written by hand over a plain TCP stream so the
/// server sees exactly the bytes given. `https://` endpoints go through `ureq`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn get(&self, url: &str, credentials: Option<&Credentials>) -> Result<TransportResponse> {
        debug!("GET {url}");
        let mut req = SHARED_AGENT.get(url);
        if let Some(credentials) = credentials {
            req = req.header("Authorization", &credentials.header_value());
        }

        let resp = req.call()?;
        let status = resp.status().as_u16();
        debug!("GET {url} -> {status}");
        Ok(TransportResponse::new(status, resp.into_body().into_reader()))
    }

    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<TransportResponse> {
        let parsed = Url::parse(url).map_err(|source| {
            DownloadError::InvalidUrl {
                url: url.to_string(),
                source,
            }
        })?;

        debug!("POST {url} ({} bytes)", body.len());
        match parsed.scheme() {
            "http" => {
                let response = raw::post(
                    &parsed,
                    headers,
                    body,
                    SHARED_AGENT.timeout(),
                    SHARED_AGENT.user_agent().as_deref(),
                )?;
                debug!("POST {url} -> {} {}", response.status, response.reason);
                Ok(TransportResponse::from_bytes(response.status, response.body))
            }
            "https" => {
                let mut req = SHARED_AGENT.post(url);
                for (key, value) in headers {
                    if key.eq_ignore_ascii_case("content-length") {
                        continue;
                    }
                    req = req.header(key.as_str(), value.as_str());
                }
                let resp = req.send(body)?;
                let status = resp.status().as_u16();
                debug!("POST {url} -> {status}");
                Ok(TransportResponse::new(status, resp.into_body().into_reader()))
            }
            scheme => {
                Err(DownloadError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                    url: url.to_string(),
                })
            }
        }
    }
}
