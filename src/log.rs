//! Component H: the manager's pluggable log channel.
//!
//! Distinct from the process-wide `tracing` subscriber installed by
//! [`crate::cfg::logger`]: this is the narrow `(module, level, context,
//! message)` callback the core itself calls on every notable event, so a
//! caller can wire it into `tracing`, a metrics counter, or nothing at all
//! without the core depending on any particular logging framework.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt::Arguments;

use crate::cfg::enums::{LogLevel, LogModule};

/// Message formatting is best-effort: a sink may truncate, and logging is
/// never allowed to affect correctness (§4.H).
const MAX_MESSAGE_BYTES: usize = 1024;

pub trait LogSink: Send + Sync {
    fn log(&self, module: LogModule, level: LogLevel, context: &str, message: &str);
}

/// The default sink: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _module: LogModule, _level: LogLevel, _context: &str, _message: &str) {}
}

/// A built-in printf-style sink that writes `[module][LEVEL] context: message`
/// to stderr, truncating the formatted message to `MAX_MESSAGE_BYTES`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintfSink;

impl LogSink for PrintfSink {
    fn log(&self, module: LogModule, level: LogLevel, context: &str, message: &str) {
        let truncated = truncate(message);
        eprintln!("[{module}][{level}] {context}: {truncated}");
    }
}

/// Forwards to the process-wide `tracing` subscriber, so installations that
/// already run `tracing-subscriber` (§4.I) see manager events in the same
/// stream as everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, module: LogModule, level: LogLevel, context: &str, message: &str) {
        let truncated = truncate(message);
        match level {
            LogLevel::Trace => tracing::trace!(%module, %context, "{truncated}"),
            LogLevel::Debug => tracing::debug!(%module, %context, "{truncated}"),
            LogLevel::Info => tracing::info!(%module, %context, "{truncated}"),
            LogLevel::Warn => tracing::warn!(%module, %context, "{truncated}"),
            LogLevel::Error => tracing::error!(%module, %context, "{truncated}"),
        }
    }
}

fn truncate(message: &str) -> &str {
    if message.len() <= MAX_MESSAGE_BYTES {
        return message;
    }
    let mut end = MAX_MESSAGE_BYTES;
    while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Convenience used throughout the core: formats `args` and forwards to the
/// sink, swallowing any formatting failure (logging must never fail an
/// acquisition).
pub fn emit(
    sink: &dyn LogSink,
    module: LogModule,
    level: LogLevel,
    context: &str,
    args: Arguments<'_>,
) {
    sink.log(module, level, context, &args.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_messages_untouched() {
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn truncate_caps_long_messages() {
        let long = "a".repeat(MAX_MESSAGE_BYTES + 500);
        assert_eq!(truncate(&long).len(), MAX_MESSAGE_BYTES);
    }

    #[test]
    fn noop_sink_does_not_panic() {
        NoopSink.log(LogModule::Manager, LogLevel::Info, "ctx", "message");
    }
}
