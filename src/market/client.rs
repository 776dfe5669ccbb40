// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client for the Torn public API.
//!
//! Two read paths feed the spreadsheet: per-item bazaar listings
//! (`/market/{id}?selections=bazaar`) and the catalog entry with the item
//! name and average market value (`/torn/{id}?selections=items`).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.torn.com";

/// Per-call timeout; expiry is treated like any other network failure.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded fan-out width for batch fetches, kept small to stay under the
/// Torn API rate limit.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Comment tag the Torn API logs against each call.
const API_COMMENT: &str = "bazaar-price-sync";

/// Opaque item identifier from the external catalog. Callers may supply
/// either JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(id) => write!(f, "{}", id),
            ItemId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// One observed bazaar offer for an item.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BazaarListing {
    pub cost: i64,
    pub quantity: i64,
}

/// Catalog data for an item: display name plus the reference average the
/// tier classifier compares listings against.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemReference {
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub market_value: f64,
}

/// Everything fetched for one item. A failed fetch leaves the snapshot
/// near-empty (no name, no reference value, no listings) but the item still
/// occupies its slot in the batch.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: Option<String>,
    pub market_value: Option<f64>,
    pub listings: Vec<BazaarListing>,
}

impl ItemSnapshot {
    /// Listing costs as floats, in listing order, for tier classification.
    pub fn costs(&self) -> Vec<f64> {
        self.listings.iter().map(|l| l.cost as f64).collect()
    }
}

/// Torn wraps failures in a 200 response with an error envelope.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    error: String,
}

#[derive(Debug, Deserialize)]
struct BazaarResponse {
    bazaar: Option<Vec<BazaarListing>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    items: Option<HashMap<String, ItemReference>>,
    error: Option<ApiError>,
}

/// The Torn API serves `market_value` as a number or a numeric string
/// depending on the selection; accept both.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct MarketClient {
    http: reqwest::Client,
    base_url: String,
}

impl MarketClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build the market API HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches the current bazaar listings for one item. An absent or null
    /// `bazaar` field means nobody is selling; that is an empty list, not an
    /// error.
    pub async fn fetch_listings(&self, api_key: &str, item: &ItemId) -> Result<Vec<BazaarListing>> {
        let url = format!(
            "{}/market/{}?key={}&selections=bazaar&comment={}",
            self.base_url, item, api_key, API_COMMENT
        );

        let response: BazaarResponse = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Bazaar request for item {} failed", item))?
            .error_for_status()
            .with_context(|| format!("Bazaar request for item {} was rejected", item))?
            .json()
            .await
            .with_context(|| format!("Bazaar response for item {} was not valid JSON", item))?;

        if let Some(api_error) = response.error {
            return Err(anyhow!(
                "Torn API error {} for item {}: {}",
                api_error.code,
                item,
                api_error.error
            ));
        }

        Ok(response.bazaar.unwrap_or_default())
    }

    /// Fetches the catalog entry (name + average market value) for one item.
    pub async fn fetch_reference(&self, api_key: &str, item: &ItemId) -> Result<ItemReference> {
        let url = format!(
            "{}/torn/{}?key={}&selections=items&comment={}",
            self.base_url, item, api_key, API_COMMENT
        );

        let response: CatalogResponse = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Catalog request for item {} failed", item))?
            .error_for_status()
            .with_context(|| format!("Catalog request for item {} was rejected", item))?
            .json()
            .await
            .with_context(|| format!("Catalog response for item {} was not valid JSON", item))?;

        if let Some(api_error) = response.error {
            return Err(anyhow!(
                "Torn API error {} for item {}: {}",
                api_error.code,
                item,
                api_error.error
            ));
        }

        response
            .items
            .and_then(|mut items| items.remove(&item.to_string()))
            .ok_or_else(|| anyhow!("Catalog response did not contain item {}", item))
    }

    /// Fetches listings and reference data for one item, absorbing failures.
    ///
    /// A single item's fetch failure must not prevent the rest of the batch
    /// from being processed, so both errors degrade to an empty snapshot and
    /// a log line.
    pub async fn fetch_item(&self, api_key: &str, item: &ItemId) -> ItemSnapshot {
        let listings = match self.fetch_listings(api_key, item).await {
            Ok(listings) => {
                debug!("📦 Item {}: {} bazaar listings", item, listings.len());
                listings
            }
            Err(err) => {
                warn!("⚠️  Listings fetch failed for item {}: {:#}", item, err);
                Vec::new()
            }
        };

        let reference = match self.fetch_reference(api_key, item).await {
            Ok(reference) => Some(reference),
            Err(err) => {
                warn!("⚠️  Reference fetch failed for item {}: {:#}", item, err);
                None
            }
        };

        ItemSnapshot {
            id: item.clone(),
            name: reference.as_ref().map(|r| r.name.clone()),
            market_value: reference.map(|r| r.market_value),
            listings,
        }
    }

    /// Fetches all items with bounded concurrency.
    ///
    /// Results come back in input order regardless of completion order, so
    /// column assignment downstream is strictly by input-list position.
    pub async fn fetch_all(&self, api_key: &str, items: &[ItemId]) -> Vec<ItemSnapshot> {
        let fetches: Vec<_> = items
            .iter()
            .map(|item| self.fetch_item(api_key, item))
            .collect();
        stream::iter(fetches)
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(id: u64) -> ItemId {
        ItemId::Number(id)
    }

    #[tokio::test]
    async fn fetches_bazaar_listings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/101"))
            .and(query_param("selections", "bazaar"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bazaar": [
                    {"cost": 10, "quantity": 1},
                    {"cost": 20, "quantity": 2}
                ]
            })))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let listings = client.fetch_listings("test-key", &item(101)).await.unwrap();

        assert_eq!(
            listings,
            vec![
                BazaarListing {
                    cost: 10,
                    quantity: 1
                },
                BazaarListing {
                    cost: 20,
                    quantity: 2
                }
            ]
        );
    }

    #[tokio::test]
    async fn null_bazaar_means_no_listings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bazaar": null})))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let listings = client.fetch_listings("test-key", &item(101)).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn surfaces_the_torn_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": 2, "error": "Incorrect key"}
            })))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let err = client
            .fetch_listings("bad-key", &item(101))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Incorrect key"));
    }

    #[tokio::test]
    async fn parses_reference_with_string_market_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torn/101"))
            .and(query_param("selections", "items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": {"101": {"name": "Xanax", "market_value": "830000"}}
            })))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let reference = client
            .fetch_reference("test-key", &item(101))
            .await
            .unwrap();

        assert_eq!(reference.name, "Xanax");
        assert_eq!(reference.market_value, 830000.0);
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_an_empty_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let snapshot = client.fetch_item("test-key", &item(102)).await;

        assert_eq!(snapshot.id, item(102));
        assert!(snapshot.name.is_none());
        assert!(snapshot.market_value.is_none());
        assert!(snapshot.listings.is_empty());
    }

    #[tokio::test]
    async fn fetch_all_preserves_input_order() {
        let server = MockServer::start().await;

        // The first item answers slowly; order must still follow the input
        // list, not completion order.
        Mock::given(method("GET"))
            .and(path("/market/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"bazaar": [{"cost": 1, "quantity": 1}]}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torn/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": {"1": {"name": "Slow", "market_value": 1}}}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/market/2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"bazaar": [{"cost": 2, "quantity": 2}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torn/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"items": {"2": {"name": "Fast", "market_value": 2}}}),
            ))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(server.uri()).unwrap();
        let snapshots = client.fetch_all("test-key", &[item(1), item(2)]).await;

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name.as_deref(), Some("Slow"));
        assert_eq!(snapshots[1].name.as_deref(), Some("Fast"));
    }
}
