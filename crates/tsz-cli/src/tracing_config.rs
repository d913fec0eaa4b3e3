//! Tracing configuration for debugging file loading.
//!
//! Supports three output formats controlled by `TSZ_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`
//! - `json`: One JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Why was a file loaded (or elided)?
//! TSZ_LOG=tsz_loader=debug TSZ_LOG_FORMAT=tree tsz --listFiles
//!
//! # Every re-propagation and host call
//! TSZ_LOG="tsz_loader=trace,tsz_cli=debug" tsz -p packages/app
//!
//! # JSON (for tooling or sharing full traces)
//! TSZ_LOG=debug TSZ_LOG_FORMAT=json tsz src/index.ts
//! ```
//!
//! The subscriber is only installed when `TSZ_LOG` (or `RUST_LOG`) is set,
//! so normal runs pay nothing.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// What to install, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directives in `RUST_LOG` syntax.
    pub directives: String,
    pub format: LogFormat,
}

impl TracingConfig {
    /// `TSZ_LOG` wins over `RUST_LOG`; neither set means no tracing.
    #[must_use]
    pub fn from_vars(
        tsz_log: Option<String>,
        rust_log: Option<String>,
        format: Option<String>,
    ) -> Option<Self> {
        let directives = tsz_log.or(rust_log)?;
        Some(Self {
            directives,
            format: LogFormat::parse(format.as_deref().unwrap_or_default()),
        })
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            std::env::var("TSZ_LOG").ok(),
            std::env::var("RUST_LOG").ok(),
            std::env::var("TSZ_LOG_FORMAT").ok(),
        )
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder().parse_lossy(&self.directives)
    }

    /// Install the global subscriber. Output goes to stderr so it never
    /// mixes with file listings on stdout.
    pub fn install(&self) {
        let filter = self.filter();
        match self.format {
            LogFormat::Tree => {
                let tree_layer = tracing_tree::HierarchicalLayer::default()
                    .with_indent_amount(2)
                    .with_indent_lines(true)
                    .with_deferred_spans(true)
                    .with_targets(true);
                Registry::default().with(filter).with(tree_layer).init();
            }
            LogFormat::Json => {
                let json_layer = fmt::layer().json().with_writer(std::io::stderr);
                Registry::default().with(filter).with(json_layer).init();
            }
            LogFormat::Text => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

/// Install tracing when the environment asks for it.
pub fn init_tracing() {
    if let Some(config) = TracingConfig::from_env() {
        config.install();
    }
}

#[cfg(test)]
#[path = "../tests/tracing_config.rs"]
mod tests;
