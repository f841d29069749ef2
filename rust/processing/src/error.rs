// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for capture processing.

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the processing session.
///
/// Classification and shape analysis never fail: degenerate input is
/// skipped and reported in their results instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Data model error (invalid fragment buffers).
    #[error(transparent)]
    Core(#[from] roomscan_core::Error),

    /// The processor task has stopped and accepts no more work.
    #[error("session processor is closed")]
    ProcessorClosed,

    /// A blocking processing pass panicked or was cancelled.
    #[error("processing task failed: {0}")]
    TaskFailed(String),
}
