//! Client for the remote country list.
//!
//! The endpoint answers with a nested envelope whose `result.result` member
//! maps country codes to names. Only the names are kept.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_COUNTRY_URL: &str = "https://happyapi.fr/api/getLands";

/// Response envelope of the country endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandsResponse {
    pub error_code: Option<i64>,
    pub exec_time: Option<i64>,
    pub happy_api_status: Option<String>,
    pub happy_api_version: Option<String>,
    #[serde(rename = "nbRequestPerAPI")]
    pub nb_request_per_api: Option<i64>,
    pub result: LandsResult,
}

/// Inner `result` object holding the code -> name map.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandsResult {
    pub error_code: Option<i64>,
    pub result: HashMap<String, String>,
}

/// Decode a response body into country names, sorted alphabetically.
pub fn decode_country_names(body: &[u8]) -> Result<Vec<String>, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::EmptyBody);
    }
    let response: LandsResponse = serde_json::from_slice(body)?;
    let mut names: Vec<String> = response.result.result.into_values().collect();
    names.sort();
    Ok(names)
}

/// One-shot fetcher for the country list.
#[derive(Debug, Clone)]
pub struct CountryClient {
    client: Client,
    url: Url,
}

impl CountryClient {
    /// Create a client for `url`. A `timeout` of `None` keeps the HTTP stack default.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, url: parsed })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue a single GET and decode the country names. Never retried.
    pub async fn fetch_country_names(&self) -> Result<Vec<String>, FetchError> {
        debug!(url = %self.url, "fetching country list");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let names = decode_country_names(&body)?;
        debug!(count = names.len(), "country list decoded");
        Ok(names)
    }
}
