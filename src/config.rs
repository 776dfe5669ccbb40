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

//! Request-scoped configuration for one price-sync run.
//!
//! The spreadsheet ID, sheet tab and market API key travel with each run
//! rather than living in process-wide state, so a server handling concurrent
//! requests for different spreadsheets shares nothing between them.

use crate::market::ItemId;
use crate::utils::SyncError;

/// Default worksheet tab name the values are addressed against.
pub const DEFAULT_SHEET_NAME: &str = "Cache Prices";

/// Everything one pipeline run needs besides credentials.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Google spreadsheet ID to write into
    pub spreadsheet_id: String,
    /// Numeric ID of the tab within the spreadsheet (the gid)
    pub sheet_id: i32,
    /// Tab name used for A1-notation value ranges
    pub sheet_name: String,
    /// Ordered item list; column assignment follows this order
    pub items: Vec<ItemId>,
    /// Torn API key
    pub market_api_key: String,
    /// Whether to preview the run without touching the spreadsheet
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(
        spreadsheet_id: String,
        sheet_id: i32,
        sheet_name: String,
        items: Vec<ItemId>,
        market_api_key: String,
        dry_run: bool,
    ) -> Self {
        Self {
            spreadsheet_id,
            sheet_id,
            sheet_name,
            items,
            market_api_key,
            dry_run,
        }
    }

    /// Rejects malformed requests before any upstream call is made.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.spreadsheet_id.is_empty() {
            return Err(SyncError::Validation(
                "Spreadsheet ID cannot be empty".to_string(),
            ));
        }

        if self.sheet_name.is_empty() {
            return Err(SyncError::Validation(
                "Sheet name cannot be empty".to_string(),
            ));
        }

        if self.items.is_empty() {
            return Err(SyncError::Validation(
                "Item list cannot be empty".to_string(),
            ));
        }

        if self.market_api_key.is_empty() {
            return Err(SyncError::Validation(
                "Market API key cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
