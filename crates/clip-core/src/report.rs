// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Default error surface.

use clip_port::ErrorSink;
use tracing::error;

/// Forwards user-facing errors to `tracing` at `ERROR` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report_error(&mut self, message: &str) {
        error!(target: "clip::user", "{message}");
    }
}
