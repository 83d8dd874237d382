//! Casewire HTTP client utilities.
//!
//! This crate provides a lightweight client for issuing test-step requests
//! against a target service. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the caller-supplied base URL before any request is built
//! - Building requests with a consistent User-Agent and Accept header
//!
//! The primary entry point is [`CasewireClient`]. Create an instance via
//! [`CasewireClient::new`], then build requests with
//! [`CasewireClient::request`]. One client owns one connection pool; it holds
//! no per-run state and may be shared across steps and runs.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, header};
use tracing::debug;
use url::Url;

/// Hard upper bound on any single request, regardless of per-step timeouts.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin wrapper around a configured `reqwest::Client` bound to one base URL.
#[derive(Debug, Clone)]
pub struct CasewireClient {
    /// Validated base URL all step paths are appended to.
    pub base_url: String,
    /// The underlying pooled HTTP client.
    pub http: Client,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl CasewireClient {
    /// Constructs a client for the given target base URL.
    ///
    /// The URL must parse, name a host, and use an http or https scheme.
    /// The client carries a JSON Accept header and a fixed 60-second overall
    /// timeout that bounds worst-case hangs regardless of step configuration.
    pub fn new(base_url: &str) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(CLIENT_TIMEOUT)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("casewire/0.1; {}", std::env::consts::OS),
        })
    }

    /// Builds a `reqwest::RequestBuilder` for a method and base-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        debug!(%url, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }
}

/// Validates that a base URL is usable as a request target.
///
/// Test targets are arbitrary services (staging environments, local stubs),
/// so no host allowlist applies; the URL only has to be well-formed.
fn validate_base_url(base: &str) -> Result<()> {
    if base.trim().is_empty() {
        return Err(anyhow!("base URL must not be empty"));
    }

    let parsed = Url::parse(base).map_err(|e| anyhow!("invalid base URL '{}': {}", base, e))?;

    if parsed.host_str().is_none() {
        return Err(anyhow!("base URL '{}' must include a host", base));
    }

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("base URL '{}' must use http or https; got '{}://'", base, other)),
    }
}
