//! Program file loader.
//!
//! Given root files, libs and project references, finds every source file a
//! program needs:
//! - Parallel load of each discovered file, at most once per file name
//!   (`worker`, `parse_task`)
//! - Depth limits for JavaScript found in `node_modules`, with re-inclusion
//!   when a shallower path shows up later
//! - Project reference graph loading and source/output redirection
//!   (`project_reference_parser`, `project_reference_mapper`,
//!   `dts_faking_host`)
//! - Deterministic, dependencies-first flattening (`file_loader`)
//!
//! Reading files, parsing and module resolution are supplied by the caller
//! through the traits in `host`, `source_file` and `resolution`.

// Environment contracts
pub mod host;
pub use host::{CompilerHost, ResolutionHost};

pub mod resolution;
pub use resolution::{
    ModeAwareCache, ModeAwareCacheKey, ModuleResolver, ResolutionContext, ResolvedModule,
    ResolvedTypeReferenceDirective,
};

pub mod source_file;
pub use source_file::{SourceFile, SourceFileParser};

// Lib table
pub mod libs;

// Referenced project configs
pub mod parsed_config;
pub use parsed_config::ParsedCommandLine;

// Generic task runner
pub mod worker;
pub use worker::{FileLoaderWorker, LoaderTask, TaskEdge, TaskRef, WorkGroup};

// Project references
pub mod dts_faking_host;
pub mod project_reference_mapper;
pub mod project_reference_parser;
pub use project_reference_mapper::ProjectReferenceFileMapper;

// Per-file tasks and the program loader
pub mod include_reason;
pub mod parse_task;
pub use include_reason::{FileIncludeKind, FileIncludeReason};
pub use parse_task::{ParseTask, ParseTaskState};

pub mod file_loader;
pub use file_loader::{FileLoader, ProcessedFiles, ProgramOptions, process_all_program_files};

#[cfg(test)]
#[path = "../tests/support/mod.rs"]
pub(crate) mod test_support;
