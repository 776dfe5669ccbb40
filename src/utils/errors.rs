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

use std::fmt;
use thiserror::Error;

/// Which spreadsheet batch operation failed.
///
/// Per-item market fetch failures are absorbed locally and never reach this
/// taxonomy; a failed clear/write/format batch aborts the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Clear,
    Write,
    Format,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Clear => write!(f, "clear"),
            WriteStage::Write => write!(f, "write"),
            WriteStage::Format => write!(f, "format"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("spreadsheet {stage} stage failed ({detail}): {message}")]
    Spreadsheet {
        stage: WriteStage,
        /// Attempted range or request count, for the caller's error report.
        detail: String,
        message: String,
    },
}

impl SyncError {
    /// Names the failed pipeline stage for HTTP error reporting.
    pub fn stage_name(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation",
            SyncError::Spreadsheet {
                stage: WriteStage::Clear,
                ..
            } => "clear",
            SyncError::Spreadsheet {
                stage: WriteStage::Write,
                ..
            } => "write",
            SyncError::Spreadsheet {
                stage: WriteStage::Format,
                ..
            } => "format",
        }
    }
}
