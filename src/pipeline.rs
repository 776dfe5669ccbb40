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

//! One full price-sync run: fetch, plan, clear, write, format.

use tracing::{debug, info};

use crate::auth::SheetsHub;
use crate::config::RunConfig;
use crate::layout::{classify_prices, planner};
use crate::market::{ItemSnapshot, MarketClient};
use crate::sheets::{SheetWriter, build_value_ranges};
use crate::utils::SyncError;

/// What one completed run did, for the caller's confirmation message.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub items: usize,
    pub updated_cells: i32,
    pub format_requests: usize,
}

/// Runs the whole pipeline against one spreadsheet.
///
/// Per-item fetch failures are absorbed upstream; only validation and the
/// spreadsheet batches can fail the run. The spreadsheet passes always go
/// clear -> values -> formatting.
pub async fn run(
    hub: SheetsHub,
    market: &MarketClient,
    config: &RunConfig,
) -> Result<RunSummary, SyncError> {
    config.validate()?;

    info!(
        "📊 Syncing {} items into spreadsheet {} (tab '{}')",
        config.items.len(),
        config.spreadsheet_id,
        config.sheet_name
    );

    let snapshots = market
        .fetch_all(&config.market_api_key, &config.items)
        .await;

    let value_ranges = build_value_ranges(&config.sheet_name, &snapshots);
    let format_requests = plan_format_requests(config.sheet_id, &snapshots);

    if config.dry_run {
        info!(
            "🔍 [DRY RUN] Would clear '{}', write {} value ranges and apply {} format requests",
            config.sheet_name,
            value_ranges.len(),
            format_requests.len()
        );
        for range in value_ranges.iter().take(3) {
            debug!("  📝 {}", range.range.as_deref().unwrap_or("?"));
        }
        return Ok(RunSummary {
            items: snapshots.len(),
            updated_cells: 0,
            format_requests: format_requests.len(),
        });
    }

    let writer = SheetWriter::new(hub, config.spreadsheet_id.clone());

    writer.clear(&config.sheet_name, config.sheet_id).await?;
    let updated_cells = writer.write_values(value_ranges).await?;
    let request_count = format_requests.len();
    writer.apply_formatting(format_requests).await?;

    info!(
        "🎉 Run completed: {} items, {} cells, {} format requests",
        snapshots.len(),
        updated_cells,
        request_count
    );

    Ok(RunSummary {
        items: snapshots.len(),
        updated_cells,
        format_requests: request_count,
    })
}

/// Assembles the full ordered format batch for one run: per-item header
/// merges, header style + frozen row, then per-price tier colors.
fn plan_format_requests(
    sheet_id: i32,
    snapshots: &[ItemSnapshot],
) -> Vec<google_sheets4::api::Request> {
    let tiers_by_item: Vec<_> = snapshots
        .iter()
        .map(|snapshot| classify_prices(&snapshot.costs(), snapshot.market_value.unwrap_or(0.0)))
        .collect();

    let mut requests = planner::header_merge_requests(sheet_id, snapshots.len());
    requests.extend(planner::header_style_requests(
        sheet_id,
        snapshots.len(),
        planner::header_background(),
        planner::header_foreground(),
    ));
    requests.extend(planner::tier_color_requests(sheet_id, &tiers_by_item));
    requests
}
