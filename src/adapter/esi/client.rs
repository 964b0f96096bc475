//! HTTP client for the upstream market API.
//!
//! Pagination metadata comes from the `x-pages` response header; when a proxy
//! strips it, the `link` header's `rel="last"` relation is parsed instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::dto::coerce_orders;
use crate::config::UpstreamConfig;
use crate::error::{Result, UpstreamError};
use crate::port::{OrderPage, OrderPages, PageError, RegionDirectory};

pub struct MarketApiClient {
    http: HttpClient,
    base_url: String,
}

impl MarketApiClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    fn classify_status(status: StatusCode, url: &str) -> PageError {
        let reason = format!("status {status} for {url}");
        // 420 is the upstream's legacy error-limited status.
        if status.as_u16() == 420
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            PageError::Retryable { reason }
        } else {
            PageError::Permanent { reason }
        }
    }

    fn classify_transport(err: &reqwest::Error, url: &str) -> PageError {
        let reason = format!("{err} for {url}");
        if err.is_timeout() || err.is_connect() {
            PageError::Retryable { reason }
        } else {
            PageError::Permanent { reason }
        }
    }
}

/// Extract the page number of the `rel="last"` relation from a `link` header.
fn parse_last_page_link(header: &str) -> Option<u32> {
    for part in header.split(',') {
        let Some((url_part, params)) = part.split_once(';') else {
            continue;
        };
        if !params.contains("rel=\"last\"") && !params.contains("rel=last") {
            continue;
        }
        let url = url_part.trim().trim_start_matches('<').trim_end_matches('>');
        let parsed = url::Url::parse(url).ok()?;
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok());
    }
    None
}

#[async_trait]
impl OrderPages for MarketApiClient {
    async fn fetch_page(
        &self,
        region_id: u32,
        page: u32,
    ) -> std::result::Result<OrderPage, PageError> {
        let url = format!(
            "{}/markets/{}/orders/?order_type=all&page={}",
            self.base_url, region_id, page
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| Self::classify_transport(&err, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, &url));
        }

        let total_pages = response
            .headers()
            .get("x-pages")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .or_else(|| {
                response
                    .headers()
                    .get("link")
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_last_page_link)
            });

        let records: Vec<serde_json::Value> =
            response.json().await.map_err(|err| PageError::Permanent {
                reason: format!("malformed page body: {err}"),
            })?;

        let (orders, records_dropped) = coerce_orders(records);
        if records_dropped > 0 {
            warn!(region_id, page, records_dropped, "Dropped malformed order records");
        }
        debug!(region_id, page, orders = orders.len(), "Fetched order page");

        Ok(OrderPage {
            orders,
            total_pages,
            records_dropped,
        })
    }
}

#[async_trait]
impl RegionDirectory for MarketApiClient {
    async fn region_ids(&self) -> Result<Vec<u32>> {
        let url = format!("{}/universe/regions/", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| UpstreamError::RegionDirectory(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url,
            }
            .into());
        }

        let ids: Vec<u32> = response
            .json()
            .await
            .map_err(|err| UpstreamError::RegionDirectory(err.to_string()))?;
        debug!(regions = ids.len(), "Fetched region directory");
        Ok(ids)
    }
}
