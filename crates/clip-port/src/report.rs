// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity generation and user-facing error reporting ports.

/// Source of fresh opaque identifiers for records and dictionary items.
pub trait IdSource {
    /// Returns an identifier never handed out before by this source.
    fn fresh_id(&mut self) -> String;
}

/// User-facing error surface.
///
/// Operational failures (unresolvable template, structural mismatch) are
/// always reported here before being returned to the caller.
pub trait ErrorSink {
    /// Shows `message` to the user.
    fn report_error(&mut self, message: &str);
}

/// Collects reported messages; handy for hosts that batch errors.
impl ErrorSink for Vec<String> {
    fn report_error(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}
