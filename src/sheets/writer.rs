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

//! Batched value and format writes against one spreadsheet.
//!
//! Ordering contract: clear, then values, then formatting. Formatting before
//! the clear (or a clear between items) leaves merges pointing at unwritten
//! cells or wipes freshly applied styles, so the three passes never
//! interleave.

use std::future::Future;

use google_sheets4::api::{
    BatchUpdateSpreadsheetRequest, BatchUpdateValuesRequest, ClearValuesRequest, Request,
    ValueRange,
};
use serde_json::Value;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::auth::SheetsHub;
use crate::layout::ColumnLabels;
use crate::layout::planner::clear_format_request;
use crate::market::ItemSnapshot;
use crate::utils::{SyncError, WriteStage};

/// Bounding range erased before every run; wide enough to cover any previous
/// layout within the formatting reset region.
const CLEAR_VALUE_RANGE: &str = "A1:ZZ1000";

const RATE_LIMIT_MAX_RETRIES: usize = 3;

/// Builds the per-item value ranges for one batch write.
///
/// Each item gets a COLUMNS-major block at its allocated column pair: the
/// left column holds the name followed by listing costs, the right column the
/// name followed by quantities. An item whose fetch failed still emits its
/// (near-empty) range so the items after it keep their columns.
pub fn build_value_ranges(sheet_name: &str, snapshots: &[ItemSnapshot]) -> Vec<ValueRange> {
    let mut columns = ColumnLabels::new();
    let mut ranges = Vec::with_capacity(snapshots.len());

    for (index, snapshot) in snapshots.iter().enumerate() {
        let start = if index == 0 {
            columns.current()
        } else {
            columns.advance(1)
        };
        let end = columns.advance(1);

        ranges.push(ValueRange {
            range: Some(format!("{}!{}:{}", sheet_name, start, end)),
            major_dimension: Some("COLUMNS".to_string()),
            values: Some(price_matrix(snapshot)),
        });
    }

    ranges
}

/// Two equal-length columns for one item; the first cell of each is the item
/// name, or null when the fetch failed.
fn price_matrix(snapshot: &ItemSnapshot) -> Vec<Vec<Value>> {
    let name_cell = snapshot
        .name
        .clone()
        .map(Value::String)
        .unwrap_or(Value::Null);

    let mut costs = Vec::with_capacity(snapshot.listings.len() + 1);
    let mut quantities = Vec::with_capacity(snapshot.listings.len() + 1);
    costs.push(name_cell.clone());
    quantities.push(name_cell);

    for listing in &snapshot.listings {
        costs.push(Value::from(listing.cost));
        quantities.push(Value::from(listing.quantity));
    }

    vec![costs, quantities]
}

pub struct SheetWriter {
    hub: SheetsHub,
    spreadsheet_id: String,
}

impl SheetWriter {
    pub fn new(hub: SheetsHub, spreadsheet_id: String) -> Self {
        Self {
            hub,
            spreadsheet_id,
        }
    }

    fn is_rate_limit_error(error: &google_sheets4::Error) -> bool {
        Self::is_rate_limit_message(&error.to_string())
    }

    fn is_rate_limit_message(message: &str) -> bool {
        let message = message.to_lowercase();
        message.contains("rate")
            || message.contains("quota")
            || message.contains("too many requests")
            || message.contains("429")
    }

    fn rate_limit_delay(attempt: usize) -> Duration {
        let base_ms: u64 = 500;
        let exponent = attempt.saturating_sub(1) as u32;
        let multiplier = 2_u64.saturating_pow(exponent).min(16);
        Duration::from_millis(base_ms * multiplier)
    }

    /// Retries a Sheets call on rate-limit errors with exponential backoff.
    /// Partial spreadsheet state is the most visible failure mode, so the
    /// write-side calls all go through this wrapper.
    async fn call_with_rate_limit_retry<T, F, Fut>(
        description: &str,
        mut operation: F,
    ) -> Result<T, google_sheets4::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, google_sheets4::Error>>,
    {
        let mut attempt = 0usize;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err)
                    if attempt < RATE_LIMIT_MAX_RETRIES && Self::is_rate_limit_error(&err) =>
                {
                    attempt += 1;
                    let delay = Self::rate_limit_delay(attempt);
                    warn!(
                        "🔁 {} hit Google rate limit (attempt {}/{}), retrying in {:?}",
                        description, attempt, RATE_LIMIT_MAX_RETRIES, delay
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Erases existing cell values and resets cell-level formatting over the
    /// bounding range, so no stale data from a previous run leaks into the
    /// new layout.
    pub async fn clear(&self, sheet_name: &str, sheet_id: i32) -> Result<(), SyncError> {
        let range = format!("{}!{}", sheet_name, CLEAR_VALUE_RANGE);
        info!("🧹 Clearing spreadsheet values and formatting ({})", range);

        let hub = &self.hub;
        let spreadsheet_id = &self.spreadsheet_id;

        Self::call_with_rate_limit_retry("clear spreadsheet values", || {
            let range = range.clone();
            async move {
                hub.spreadsheets()
                    .values_clear(ClearValuesRequest::default(), spreadsheet_id, &range)
                    .doit()
                    .await
            }
        })
        .await
        .map_err(|err| SyncError::Spreadsheet {
            stage: WriteStage::Clear,
            detail: range.clone(),
            message: err.to_string(),
        })?;

        let format_reset = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![clear_format_request(sheet_id)]),
            ..Default::default()
        };

        Self::call_with_rate_limit_retry("clear spreadsheet formatting", || {
            let request = format_reset.clone();
            async move {
                hub.spreadsheets()
                    .batch_update(request, spreadsheet_id)
                    .doit()
                    .await
            }
        })
        .await
        .map_err(|err| SyncError::Spreadsheet {
            stage: WriteStage::Clear,
            detail: format!("format reset on sheet {}", sheet_id),
            message: err.to_string(),
        })?;

        debug!("✅ Spreadsheet cleared");
        Ok(())
    }

    /// Submits one batch with every item's value range. Returns the number of
    /// updated cells reported by the API.
    pub async fn write_values(&self, value_ranges: Vec<ValueRange>) -> Result<i32, SyncError> {
        let range_count = value_ranges.len();
        info!("🚀 Writing {} value ranges...", range_count);

        let batch_request = BatchUpdateValuesRequest {
            value_input_option: Some("RAW".to_string()),
            data: Some(value_ranges),
            ..Default::default()
        };

        let hub = &self.hub;
        let spreadsheet_id = &self.spreadsheet_id;

        let (_, response) = Self::call_with_rate_limit_retry("batch update values", || {
            let request = batch_request.clone();
            async move {
                hub.spreadsheets()
                    .values_batch_update(request, spreadsheet_id)
                    .doit()
                    .await
            }
        })
        .await
        .map_err(|err| SyncError::Spreadsheet {
            stage: WriteStage::Write,
            detail: format!("{} value ranges", range_count),
            message: err.to_string(),
        })?;

        let updated_columns = response.total_updated_columns.unwrap_or(0);
        let updated_cells = response.total_updated_cells.unwrap_or(0);
        info!(
            "✅ Updated {} columns ({} cells)",
            updated_columns, updated_cells
        );

        Ok(updated_cells)
    }

    /// Submits one batch with all formatting requests from the planner.
    pub async fn apply_formatting(&self, requests: Vec<Request>) -> Result<(), SyncError> {
        let request_count = requests.len();
        info!("🎨 Applying {} formatting requests...", request_count);

        let batch_request = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        let hub = &self.hub;
        let spreadsheet_id = &self.spreadsheet_id;

        Self::call_with_rate_limit_retry("batch update formatting", || {
            let request = batch_request.clone();
            async move {
                hub.spreadsheets()
                    .batch_update(request, spreadsheet_id)
                    .doit()
                    .await
            }
        })
        .await
        .map_err(|err| SyncError::Spreadsheet {
            stage: WriteStage::Format,
            detail: format!("{} format requests", request_count),
            message: err.to_string(),
        })?;

        debug!("✅ Formatting applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{BazaarListing, ItemId};

    fn snapshot(id: u64, name: Option<&str>, listings: Vec<(i64, i64)>) -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId::Number(id),
            name: name.map(str::to_string),
            market_value: None,
            listings: listings
                .into_iter()
                .map(|(cost, quantity)| BazaarListing { cost, quantity })
                .collect(),
        }
    }

    #[test]
    fn allocates_one_column_pair_per_item() {
        let snapshots = vec![
            snapshot(101, Some("Xanax"), vec![(10, 1), (20, 2)]),
            snapshot(102, Some("Feathery Hotel Coupon"), vec![(5, 3)]),
            snapshot(103, Some("Erotic DVD"), vec![]),
        ];

        let ranges = build_value_ranges("Cache Prices", &snapshots);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].range.as_deref(), Some("Cache Prices!A:B"));
        assert_eq!(ranges[1].range.as_deref(), Some("Cache Prices!C:D"));
        assert_eq!(ranges[2].range.as_deref(), Some("Cache Prices!E:F"));

        for range in &ranges {
            assert_eq!(range.major_dimension.as_deref(), Some("COLUMNS"));
        }
    }

    #[test]
    fn writes_costs_left_and_quantities_right() {
        let snapshots = vec![snapshot(101, Some("Xanax"), vec![(10, 1), (20, 2)])];

        let ranges = build_value_ranges("Cache Prices", &snapshots);
        let values = ranges[0].values.as_ref().unwrap();

        assert_eq!(values[0], vec![Value::from("Xanax"), 10.into(), 20.into()]);
        assert_eq!(values[1], vec![Value::from("Xanax"), 1.into(), 2.into()]);
    }

    #[test]
    fn failed_item_still_occupies_its_column_pair() {
        let snapshots = vec![
            snapshot(101, Some("Xanax"), vec![(10, 1)]),
            // Fetch failed: no name, no listings.
            snapshot(102, None, vec![]),
            snapshot(103, Some("Erotic DVD"), vec![(7, 4)]),
        ];

        let ranges = build_value_ranges("Cache Prices", &snapshots);
        assert_eq!(ranges[1].range.as_deref(), Some("Cache Prices!C:D"));
        assert_eq!(
            ranges[1].values,
            Some(vec![vec![Value::Null], vec![Value::Null]])
        );

        // Alignment for the item after the failure is preserved.
        assert_eq!(ranges[2].range.as_deref(), Some("Cache Prices!E:F"));
    }

    #[test]
    fn matrix_rows_always_have_equal_length() {
        for listings in [vec![], vec![(1, 1)], vec![(1, 1), (2, 2), (3, 3)]] {
            let matrix = price_matrix(&snapshot(1, Some("Item"), listings));
            assert_eq!(matrix.len(), 2);
            assert_eq!(matrix[0].len(), matrix[1].len());
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(SheetWriter::rate_limit_delay(1), Duration::from_millis(500));
        assert_eq!(
            SheetWriter::rate_limit_delay(2),
            Duration::from_millis(1000)
        );
        assert_eq!(
            SheetWriter::rate_limit_delay(3),
            Duration::from_millis(2000)
        );
        assert_eq!(
            SheetWriter::rate_limit_delay(20),
            Duration::from_millis(8000)
        );
    }

    #[test]
    fn recognizes_rate_limit_responses() {
        assert!(SheetWriter::is_rate_limit_message(
            "Quota exceeded for quota metric 'Write requests'"
        ));
        assert!(SheetWriter::is_rate_limit_message("HTTP 429 Too Many Requests"));
        assert!(!SheetWriter::is_rate_limit_message(
            "The caller does not have permission"
        ));
    }
}
