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

//! HTTP surface: a single endpoint that accepts an item list and runs the
//! sync pipeline against the caller's spreadsheet.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::SheetsHub;
use crate::config::{DEFAULT_SHEET_NAME, RunConfig};
use crate::market::{ItemId, MarketClient};
use crate::pipeline;

/// Shared across requests: the credential-backed Sheets hub and the market
/// API client. Everything request-specific arrives in the body.
pub struct AppState {
    pub hub: SheetsHub,
    pub market: MarketClient,
}

#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    pub spreadsheet_id: String,
    /// Tab gid within the spreadsheet; the first tab when omitted.
    #[serde(default)]
    pub sheet_id: i32,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    pub items: Vec<ItemId>,
    pub market_api_key: String,
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/items", post(place_items))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

/// Fetches prices for the requested items and repopulates the spreadsheet.
async fn place_items(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ItemsRequest>,
) -> Result<String, (StatusCode, String)> {
    info!("📨 POST /items received ({} items)", body.items.len());

    let config = RunConfig::new(
        body.spreadsheet_id,
        body.sheet_id,
        body.sheet_name,
        body.items,
        body.market_api_key,
        false,
    );

    match pipeline::run(state.hub.clone(), &state.market, &config).await {
        Ok(summary) => Ok(format!(
            "Updated {} cells for {} items ({} format requests applied)\n",
            summary.updated_cells, summary.items, summary.format_requests
        )),
        Err(err) => {
            error!("❌ /items request failed at {} stage: {}", err.stage_name(), err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} stage failed: {}\n", err.stage_name(), err),
            ))
        }
    }
}
