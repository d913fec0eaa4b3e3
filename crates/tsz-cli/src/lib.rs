//! Native CLI support for the tsz binary.
//!
//! The loader in `tsz-loader` only sees traits; this crate supplies the real
//! implementations: a disk-backed host, a text-scanning parser, a
//! node-style module resolver and tsconfig loading.

pub mod args;
pub mod config;
pub mod discovery;
pub mod disk_host;
pub mod driver;
pub mod reporter;
pub mod resolver;
pub mod scanner;
pub mod tracing_config;
