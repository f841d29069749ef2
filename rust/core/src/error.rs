// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the capture data model.

use uuid::Uuid;

/// Result type alias for data model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the boundaries of the data model.
///
/// Degenerate geometry is not an error here; classifiers skip it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fragment buffers are inconsistent (lengths or index bounds).
    #[error("invalid fragment {id}: {reason}")]
    InvalidFragment { id: Uuid, reason: String },

    /// A persisted session could not be turned back into a scan.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// JSON encoding/decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a session failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
