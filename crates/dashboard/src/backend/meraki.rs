//! Meraki Dashboard API backend.
//!
//! This module provides [`MerakiBackend`], a blocking HTTP implementation of
//! [`Backend`] against the Dashboard API v1.
//!
//! # Pagination
//!
//! List endpoints return pages and advertise the next one in the `Link`
//! response header. Every list call here follows `rel=next` until it is
//! absent and returns the concatenated result.
//!
//! # Rate Limiting
//!
//! The Dashboard API allows roughly ten requests per second per
//! organization and answers `429 Too Many Requests` with a `Retry-After`
//! header when exceeded. Throttled requests are resent unchanged after the
//! advertised wait, up to `max_retries` times.

use crate::backend::{Backend, validate_tag_batch};
use crate::error::{Error, ErrorCategory, Result};
use crate::types::{DeviceSnapshot, Network, Organization, ProductType, TagAction, non_empty};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.meraki.com/api/v1";

/// Default number of retries for throttled or failed requests.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Wait used when a 429 response carries no usable `Retry-After`.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Wait before resending a request that failed with a 5xx status.
const SERVER_ERROR_WAIT: Duration = Duration::from_secs(1);

/// Overall timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("sm-autotag/", env!("CARGO_PKG_VERSION"));

// Largest page size each list endpoint accepts.
const ORGANIZATIONS_PER_PAGE: &str = "9000";
const NETWORKS_PER_PAGE: &str = "100000";
const DEVICES_PER_PAGE: &str = "1000";

/// Blocking Dashboard API backend.
///
/// # Example
///
/// ```no_run
/// use dashboard::backend::Backend;
/// use dashboard::backend::meraki::MerakiBackend;
///
/// let backend = MerakiBackend::new("api-key");
/// let orgs = backend.list_organizations().unwrap();
/// println!("Found {} organizations", orgs.len());
/// ```
pub struct MerakiBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Dashboard API base URL.
    api_base: String,
    /// API key sent as a bearer token.
    api_key: String,
    /// Retries allowed per request for 429 and 5xx responses.
    max_retries: u32,
}

impl MerakiBackend {
    /// Create a backend for the public Dashboard API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Use a different API base URL (regional clouds, proxies, tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry budget for throttled and server-error responses.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn organizations_url(&self) -> String {
        format!("{}/organizations", self.api_base)
    }

    fn networks_url(&self, org_id: &str) -> String {
        format!("{}/organizations/{}/networks", self.api_base, org_id)
    }

    fn devices_url(&self, network_id: &str) -> String {
        format!("{}/networks/{}/sm/devices", self.api_base, network_id)
    }

    fn modify_tags_url(&self, network_id: &str) -> String {
        format!(
            "{}/networks/{}/sm/devices/modifyTags",
            self.api_base, network_id
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Send a request, resending it while the API throttles or fails
    /// server-side and retries remain.
    ///
    /// Any status of 400 or above that is not retried becomes an error.
    fn send<F>(&self, url: &str, request: F) -> Result<Response<Body>>
    where
        F: Fn() -> std::result::Result<Response<Body>, ureq::Error>,
    {
        let mut attempt = 0;

        loop {
            let mut response = request()?;
            let status = response.status().as_u16();

            if status < 400 {
                return Ok(response);
            }

            let category = ErrorCategory::from_status(status);
            if attempt < self.max_retries && category.is_retryable() {
                attempt += 1;
                let wait = if category == ErrorCategory::RateLimited {
                    response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after)
                        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
                } else {
                    SERVER_ERROR_WAIT
                };
                log::warn!(
                    "HTTP {} from {}, retrying in {}s (attempt {}/{})",
                    status,
                    url,
                    wait.as_secs(),
                    attempt,
                    self.max_retries
                );
                thread::sleep(wait);
                continue;
            }

            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::http(error_message(status, &body), Some(status)));
        }
    }

    /// GET every page of a list endpoint.
    fn get_all<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut first = true;

        while let Some(page_url) = next.take() {
            log::debug!("GET {}", page_url);

            let mut response = self.send(&page_url, || {
                let mut request = self
                    .agent
                    .get(&page_url)
                    .header("Authorization", self.bearer())
                    .header("Accept", "application/json")
                    .header("User-Agent", USER_AGENT);
                // Next-page links already carry the original query.
                if first {
                    for (key, value) in query {
                        request = request.query(*key, *value);
                    }
                }
                request.call()
            })?;

            next = response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let page: Vec<T> = response.body_mut().read_json()?;
            items.extend(page);
            first = false;
        }

        Ok(items)
    }
}

impl Backend for MerakiBackend {
    fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.get_all(
            &self.organizations_url(),
            &[("perPage", ORGANIZATIONS_PER_PAGE)],
        )
    }

    fn list_networks(&self, org_id: &str, product: ProductType) -> Result<Vec<Network>> {
        let networks: Vec<Network> = self.get_all(
            &self.networks_url(org_id),
            &[
                ("perPage", NETWORKS_PER_PAGE),
                ("productTypes[]", product.as_str()),
            ],
        )?;

        Ok(networks
            .into_iter()
            .filter(|n| n.has_product(product))
            .collect())
    }

    fn list_managed_devices(
        &self,
        network_id: &str,
        fields: &[&str],
    ) -> Result<Vec<DeviceSnapshot>> {
        let mut query = vec![("perPage", DEVICES_PER_PAGE)];
        query.extend(fields.iter().map(|f| ("fields[]", *f)));

        let devices: Vec<ApiDevice> = self.get_all(&self.devices_url(network_id), &query)?;
        Ok(devices.into_iter().map(Into::into).collect())
    }

    fn modify_device_tags(
        &self,
        network_id: &str,
        ids: &[String],
        tags: &[String],
        action: TagAction,
    ) -> Result<()> {
        validate_tag_batch(ids, tags)?;

        let url = self.modify_tags_url(network_id);
        let body = ModifyTagsRequest {
            ids,
            tags,
            update_action: action,
        };
        log::debug!("POST {} ({} devices)", url, ids.len());

        self.send(&url, || {
            self.agent
                .post(&url)
                .header("Authorization", self.bearer())
                .header("Accept", "application/json")
                .header("User-Agent", USER_AGENT)
                .send_json(&body)
        })?;

        Ok(())
    }
}

/// Extract the `rel=next` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim().replace(' ', "");
            param == "rel=next" || param == "rel=\"next\""
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Parse a `Retry-After` value given in seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Build an error message from a failed response body.
///
/// The API reports failures as `{"errors": ["..."]}`.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ApiErrors>(body)
        .ok()
        .filter(|e| !e.errors.is_empty())
        .map(|e| format!("HTTP {}: {}", status, e.errors.join("; ")))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

// =============================================================================
// Dashboard API wire types
// =============================================================================

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyTagsRequest<'a> {
    ids: &'a [String],
    tags: &'a [String],
    update_action: TagAction,
}

#[derive(Debug, Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDevice {
    id: Option<String>,
    imei: Option<String>,
    iccid: Option<String>,
    sim_carrier_network: Option<String>,
    phone_number: Option<String>,
    tags: Option<ApiTags>,
}

/// Tags arrive as an array, but some responses use a space-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTags {
    List(Vec<String>),
    Text(String),
}

impl From<ApiDevice> for DeviceSnapshot {
    fn from(d: ApiDevice) -> Self {
        let tags: BTreeSet<String> = match d.tags {
            Some(ApiTags::List(list)) => list.into_iter().filter(|t| !t.is_empty()).collect(),
            Some(ApiTags::Text(text)) => text.split_whitespace().map(str::to_string).collect(),
            None => BTreeSet::new(),
        };

        Self {
            id: non_empty(d.id),
            imei: non_empty(d.imei),
            iccid: non_empty(d.iccid),
            sim_carrier_network: non_empty(d.sim_carrier_network),
            phone_number: non_empty(d.phone_number),
            tags,
        }
    }
}
