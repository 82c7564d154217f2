// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The diagnostic channel of the backend.
//!
//! Several internal failures are non-fatal by contract: a heap allocation that
//! the driver rejects, an administrative object that could not be created, a
//! caller-supplied output buffer of the wrong size. Those are reported here,
//! while the affected operation returns `None`/`false` to its caller. The
//! return value is the authoritative failure signal; messages exist for
//! humans, not for programmatic recovery.

use std::sync::Arc;

/// Severity of a diagnostic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

/// Callback receiving every diagnostic message emitted by a device.
///
/// The callback may be invoked from any thread that calls into the device, so
/// it must be `Send + Sync`. It must not call back into the device.
pub type MessageCallback = Arc<dyn Fn(MessageSeverity, &str) + Send + Sync>;

/// Routes messages to the installed callback, or to the `log` crate when the
/// descriptor did not carry one.
#[derive(Clone)]
pub(crate) struct DiagnosticSink {
    callback: Option<MessageCallback>,
}

impl DiagnosticSink {
    pub(crate) fn new(callback: Option<MessageCallback>) -> Self {
        DiagnosticSink { callback }
    }

    pub(crate) fn message(&self, severity: MessageSeverity, message: &str) {
        match &self.callback {
            Some(callback) => callback(severity, message),
            None => match severity {
                MessageSeverity::Info => log::info!("{}", message),
                MessageSeverity::Warning => log::warn!("{}", message),
                MessageSeverity::Error => log::error!("{}", message),
            },
        }
    }

    #[inline]
    pub(crate) fn info(&self, message: &str) {
        self.message(MessageSeverity::Info, message);
    }

    #[inline]
    pub(crate) fn warning(&self, message: &str) {
        self.message(MessageSeverity::Warning, message);
    }

    #[inline]
    pub(crate) fn error(&self, message: &str) {
        self.message(MessageSeverity::Error, message);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Captures every message, for asserting on diagnostics in tests.
    pub(crate) struct CapturedMessages {
        messages: Arc<Mutex<Vec<(MessageSeverity, String)>>>,
    }

    impl CapturedMessages {
        pub(crate) fn sink() -> (DiagnosticSink, Self) {
            let messages = Arc::new(Mutex::new(Vec::new()));
            let captured = messages.clone();
            let sink = DiagnosticSink::new(Some(Arc::new(move |severity, message: &str| {
                captured.lock().push((severity, message.to_owned()));
            })));
            (sink, CapturedMessages { messages })
        }

        pub(crate) fn take(&self) -> Vec<(MessageSeverity, String)> {
            std::mem::take(&mut *self.messages.lock())
        }
    }

    #[test]
    fn callback_receives_severity_and_text() {
        let (sink, captured) = CapturedMessages::sink();
        sink.warning("tile size unknown");
        sink.error("allocation failed");
        let messages = captured.take();
        assert_eq!(
            messages,
            vec![
                (MessageSeverity::Warning, "tile size unknown".to_owned()),
                (MessageSeverity::Error, "allocation failed".to_owned()),
            ]
        );
    }
}
