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

//! Service-account credentials for the Google Sheets API.
//!
//! The writer runs headless (one-shot script or server), so authentication
//! uses a service-account JSON key rather than an interactive flow. The
//! resulting hub is cheap to clone and shared across requests.

use std::path::Path;

use anyhow::{Context, Result};
use google_sheets4::{Sheets, hyper_rustls, yup_oauth2};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::info;

pub type SheetsHub = Sheets<hyper_rustls::HttpsConnector<HttpConnector>>;

/// Builds an authenticated Sheets hub from a service-account key file.
pub async fn sheets_hub(key_path: &Path) -> Result<SheetsHub> {
    info!("🔑 Initializing Google Sheets API connection...");

    let key = yup_oauth2::read_service_account_key(key_path)
        .await
        .with_context(|| {
            format!(
                "Failed to read service account key from {}",
                key_path.display()
            )
        })?;

    let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .context("Failed to build service account authenticator")?;

    let client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build(),
    );

    info!("✅ Google Sheets API connection established");
    Ok(Sheets::new(client, auth))
}
