//! Injected trace sinks
//!
//! Components never name themselves from caller context and never read
//! global configuration; the comparison engine receives a sink at
//! construction and forwards stage output through it. The default sink
//! discards everything.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Pipeline stages that can emit trace output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Tokenizer,
    Parser,
    Simplifier,
    Solver,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Tokenizer => "tokenizer",
            Component::Parser => "parser",
            Component::Simplifier => "simplifier",
            Component::Solver => "solver",
        };
        write!(f, "{}", name)
    }
}

/// Receiver for per-stage trace lines
pub trait TraceSink {
    fn emit(&self, component: Component, message: &str);
}

/// Discards all trace output
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl TraceSink for Silent {
    fn emit(&self, _component: Component, _message: &str) {}
}

/// Per-component trace enablement, deserializable from a JSON object of
/// booleans. Missing keys default to off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub tokenizer: bool,
    pub parser: bool,
    pub simplifier: bool,
    pub solver: bool,
}

impl TraceConfig {
    /// Everything on
    pub fn verbose() -> Self {
        TraceConfig { tokenizer: true, parser: true, simplifier: true, solver: true }
    }

    pub fn enabled(&self, component: Component) -> bool {
        match component {
            Component::Tokenizer => self.tokenizer,
            Component::Parser => self.parser,
            Component::Simplifier => self.simplifier,
            Component::Solver => self.solver,
        }
    }
}

/// Forwards enabled components to `tracing` at debug level
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    config: TraceConfig,
}

impl LogSink {
    pub fn new(config: TraceConfig) -> Self {
        LogSink { config }
    }
}

impl TraceSink for LogSink {
    fn emit(&self, component: Component, message: &str) {
        if self.config.enabled(component) {
            tracing::debug!(component = %component, "{}", message);
        }
    }
}

/// Buffers trace lines for inspection in tests
#[derive(Debug, Default)]
pub struct Capture {
    lines: RefCell<Vec<(Component, String)>>,
}

impl Capture {
    pub fn new() -> Self {
        Capture::default()
    }

    pub fn lines(&self) -> Vec<(Component, String)> {
        self.lines.borrow().clone()
    }
}

impl TraceSink for Capture {
    fn emit(&self, component: Component, message: &str) {
        self.lines.borrow_mut().push((component, message.to_string()));
    }
}
