//! # fetch: paginated order source adapter
//!
//! This module defines a single trait ([`OrderSource`]) for pulling the full
//! order set for a run, plus the concrete Shopify REST implementation.
//!
//! ## Interface & Extensibility
//! - Implement [`OrderSource`] to plug in another commerce backend or a test
//!   double; the rest of the pipeline only sees order-shaped JSON records.
//! - The method is async, returning results and using boxed error types.
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.
//!
//! ## Pagination
//! The remote collection endpoint returns one `orders` array per page and
//! carries the continuation cursor in the `Link` response header as a
//! `rel="next"` entry. The cursor is stateful per page, so pages are fetched
//! strictly one at a time, in order.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::ShopifyConfig;

/// An order-shaped JSON record as returned by the source.
pub type Order = Value;

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for accumulating all orders for one export run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Page through the remote collection and return every order, in the
    /// order the API yields them.
    async fn fetch_all(&self) -> Result<Vec<Order>, SourceError>;
}

/// Shopify Admin REST implementation of [`OrderSource`].
pub struct ShopifyOrderSource {
    client: reqwest::Client,
    config: ShopifyConfig,
}

impl ShopifyOrderSource {
    pub fn new(config: ShopifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn base_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}/orders.json?status=any&limit={}",
            self.config.store_domain, self.config.api_version, self.config.page_size
        )
    }
}

#[async_trait]
impl OrderSource for ShopifyOrderSource {
    async fn fetch_all(&self) -> Result<Vec<Order>, SourceError> {
        let base_url = self.base_url();
        let mut all_orders: Vec<Order> = Vec::new();
        let mut page_info: Option<String> = None;

        loop {
            let url = match &page_info {
                Some(cursor) => format!("{base_url}&page_info={cursor}"),
                None => base_url.clone(),
            };
            debug!(url = %url, "Fetching orders page");

            let response = self
                .client
                .get(&url)
                .header("X-Shopify-Access-Token", &self.config.access_token)
                .header("Content-Type", "application/json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                error!(status = %status, url = %url, "Order API returned error status");
                return Err(format!("order fetch returned status {status}").into());
            }

            let link_header = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let body: Value = response.json().await?;
            let orders = body
                .get("orders")
                .and_then(Value::as_array)
                .cloned()
                .ok_or("response body missing orders array")?;

            debug!(count = orders.len(), "Fetched orders page");
            all_orders.extend(orders);

            page_info = link_header.as_deref().and_then(next_page_cursor);
            if page_info.is_none() {
                break;
            }
        }

        info!(total = all_orders.len(), "Fetched all order pages");
        Ok(all_orders)
    }
}

/// Extract the `page_info` cursor from the `rel="next"` entry of a `Link`
/// header, if there is one. The header may also carry a `rel="previous"`
/// entry, so only the next-link segment is searched.
pub fn next_page_cursor(link_header: &str) -> Option<String> {
    let re = Regex::new(r"page_info=([^&>]+)").ok()?;
    link_header
        .split(',')
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| re.captures(part))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
