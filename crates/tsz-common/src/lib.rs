//! Common types and utilities shared by the tsz loader crates.
//!
//! This crate provides:
//! - Path identity and path algebra (`ResolvedPath`, `to_path`, `normalize_path`)
//! - Diagnostics (`Diagnostic`, message catalog, `format_message`)
//! - Resolved compiler options (`CompilerOptions`, `ScriptTarget`, `JsxEmit`)
//! - Loader limits and thresholds

// Path identity service
pub mod path;
pub use path::ResolvedPath;

// Diagnostics reported while loading files
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Resolved compiler options
pub mod options;
pub use options::{CompilerOptions, JsxEmit, ScriptTarget};

// Centralized limits and thresholds
pub mod limits;
