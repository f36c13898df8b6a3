//! Trace configuration loading
//!
//! The core never reads configuration; this is the only place trace
//! settings come from, and the result is passed in explicitly.

use anyhow::{Context, Result};
use entail_core::TraceConfig;
use std::fs;
use std::path::Path;

pub fn load_trace_config(path: &Path) -> Result<TraceConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading trace config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing trace config {}", path.display()))?;
    Ok(config)
}
