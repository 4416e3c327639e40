//! Explicitly passed search tracing.
//!
//! Searches receive a [`Tracer`] instead of writing to a global logger. The
//! default tracer is silent, and messages are built lazily so a disabled level
//! costs nothing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceConfig {
    /// Decision summaries, node counts and fallback notices.
    #[serde(default)]
    pub debug: bool,
    /// Per-decision breakdown of free squares, chains and loops. Needs `debug`.
    #[serde(default)]
    pub verbose: bool,
    /// Thinking time.
    #[serde(default)]
    pub perf: bool,
}

impl TraceConfig {
    pub const fn silent() -> Self {
        Self {
            debug: false,
            verbose: false,
            perf: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            debug: true,
            verbose: true,
            perf: true,
        }
    }

    pub fn allows(&self, level: TraceLevel) -> bool {
        match level {
            TraceLevel::Debug => self.debug,
            TraceLevel::Verbose => self.debug && self.verbose,
            TraceLevel::Perf => self.perf,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Debug,
    Verbose,
    Perf,
}

pub trait TraceSink {
    fn emit(&self, level: TraceLevel, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn emit(&self, level: TraceLevel, message: &str) {
        match level {
            TraceLevel::Debug => log::debug!("{message}"),
            TraceLevel::Verbose => log::trace!("{message}"),
            TraceLevel::Perf => log::info!(target: "dots_boxes_bot::perf", "{message}"),
        }
    }
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<(TraceLevel, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(TraceLevel, String)> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|(_, line)| line.contains(needle))
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, level: TraceLevel, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}

/// Browser console output.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

#[cfg(target_arch = "wasm32")]
impl TraceSink for ConsoleSink {
    fn emit(&self, level: TraceLevel, message: &str) {
        let value = wasm_bindgen::JsValue::from_str(message);
        match level {
            TraceLevel::Perf => web_sys::console::info_1(&value),
            TraceLevel::Debug | TraceLevel::Verbose => web_sys::console::debug_1(&value),
        }
    }
}

#[derive(Default)]
pub struct Tracer {
    config: TraceConfig,
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Tracer {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn new(config: TraceConfig, sink: impl TraceSink + 'static) -> Self {
        Self {
            config,
            sink: Some(Box::new(sink)),
        }
    }

    /// Tracer writing to the `log` facade.
    pub fn to_log(config: TraceConfig) -> Self {
        Self::new(config, LogSink)
    }

    pub fn config(&self) -> TraceConfig {
        self.config
    }

    pub fn enabled(&self, level: TraceLevel) -> bool {
        self.sink.is_some() && self.config.allows(level)
    }

    fn emit_with(&self, level: TraceLevel, message: impl FnOnce() -> String) {
        if !self.config.allows(level) {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.emit(level, &message());
        }
    }

    pub fn debug(&self, message: impl FnOnce() -> String) {
        self.emit_with(TraceLevel::Debug, message);
    }

    pub fn verbose(&self, message: impl FnOnce() -> String) {
        self.emit_with(TraceLevel::Verbose, message);
    }

    pub fn perf(&self, message: impl FnOnce() -> String) {
        self.emit_with(TraceLevel::Perf, message);
    }
}
