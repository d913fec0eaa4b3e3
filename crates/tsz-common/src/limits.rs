//! Centralized limits and thresholds for program file loading.
//!
//! # Categories
//!
//! - **Depth Limits**: How far the loader follows dependencies into packages
//! - **Binary Detection**: Thresholds used when sniffing source files on disk

// =============================================================================
// Depth Limits
// =============================================================================

/// Default value of `maxNodeModuleJsDepth`.
///
/// JavaScript files reached through a `node_modules` lookup sit one level
/// deeper than the file that imported them. With the default of `0`, such
/// files are discovered but not loaded unless something closer to a root
/// reaches them at a shallower depth.
///
/// # TypeScript example
///
/// ```typescript
/// // src/index.ts
/// import lodash from "lodash"; // node_modules/lodash/index.js is depth 1
///                              // and elided while the limit is 0.
/// ```
pub const DEFAULT_MAX_NODE_MODULE_JS_DEPTH: usize = 0;

// =============================================================================
// Binary Detection
// =============================================================================

/// Number of leading bytes inspected when deciding whether a file is binary.
pub const BINARY_SNIFF_WINDOW: usize = 1_024;

/// More NUL bytes than this inside [`BINARY_SNIFF_WINDOW`] marks a file as binary.
pub const BINARY_MAX_NUL_BYTES: usize = 10;

/// A run of this many NUL bytes marks a file as binary.
pub const BINARY_CONSECUTIVE_NUL_RUN: usize = 4;

/// This many non-whitespace control bytes marks a file as binary.
pub const BINARY_MAX_CONTROL_BYTES: usize = 4;
