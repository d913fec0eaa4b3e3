//! A referenced project's resolved configuration and its source/output
//! name mapping.

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use tsz_common::path::{
    EXTENSION_JSON, change_extension, combine_paths, file_extension_is,
    get_canonical_file_name, get_directory_path, get_declaration_emit_extension,
    get_relative_path_from_directory, is_declaration_file_name, resolve_path, to_path,
};
use tsz_common::{CompilerOptions, ResolvedPath};

/// Output declaration file of a referenced project's source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDtsAndProjectReference {
    pub output_dts: String,
    /// Config that produces `output_dts`.
    pub config_path: ResolvedPath,
}

/// Source file a referenced project's output declaration was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceAndProjectReference {
    pub source: String,
    pub config_path: ResolvedPath,
}

/// Both directions of a project's source/output mapping, keyed by path.
#[derive(Debug, Default)]
pub struct InputOutputNames {
    pub source_to_output: FxHashMap<ResolvedPath, OutputDtsAndProjectReference>,
    pub output_dts_to_source: FxHashMap<ResolvedPath, SourceAndProjectReference>,
}

/// A parsed `tsconfig.json` of a referenced project.
#[derive(Debug)]
pub struct ParsedCommandLine {
    pub config_file_name: String,
    pub config_path: ResolvedPath,
    pub options: Arc<CompilerOptions>,
    /// Absolute, normalized input file names.
    pub file_names: Vec<String>,
    /// Absolute config file names from `references`, in declaration order.
    pub project_reference_paths: Vec<String>,
    pub current_directory: String,
    pub use_case_sensitive_file_names: bool,
    io_names: OnceLock<InputOutputNames>,
}

impl ParsedCommandLine {
    #[must_use]
    pub fn new(
        config_file_name: impl Into<String>,
        options: CompilerOptions,
        file_names: Vec<String>,
        project_reference_paths: Vec<String>,
        current_directory: impl Into<String>,
        use_case_sensitive_file_names: bool,
    ) -> Self {
        let config_file_name = config_file_name.into();
        let current_directory = current_directory.into();
        let config_path = to_path(
            &config_file_name,
            &current_directory,
            get_canonical_file_name(use_case_sensitive_file_names),
        );
        Self {
            config_file_name,
            config_path,
            options: Arc::new(options),
            file_names,
            project_reference_paths,
            current_directory,
            use_case_sensitive_file_names,
            io_names: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn config_directory(&self) -> String {
        get_directory_path(&self.config_file_name)
    }

    #[must_use]
    pub fn to_path(&self, file_name: &str) -> ResolvedPath {
        to_path(
            file_name,
            &self.current_directory,
            get_canonical_file_name(self.use_case_sensitive_file_names),
        )
    }

    /// Has [`Self::parse_input_output_names`] run?
    #[must_use]
    pub fn has_input_output_names(&self) -> bool {
        self.io_names.get().is_some()
    }

    /// Build the source/output maps on first call; later calls return the
    /// same maps.
    pub fn parse_input_output_names(&self) -> &InputOutputNames {
        self.io_names.get_or_init(|| self.compute_input_output_names())
    }

    #[must_use]
    pub fn source_to_output(&self) -> &FxHashMap<ResolvedPath, OutputDtsAndProjectReference> {
        &self.parse_input_output_names().source_to_output
    }

    #[must_use]
    pub fn output_dts_to_source(&self) -> &FxHashMap<ResolvedPath, SourceAndProjectReference> {
        &self.parse_input_output_names().output_dts_to_source
    }

    /// Declaration file emitted for `source`.
    #[must_use]
    pub fn get_output_declaration_file_name(&self, source: &str) -> String {
        let config_dir = self.config_directory();
        let dts_ext = get_declaration_emit_extension(source);
        match self.options.declaration_output_dir() {
            Some(out_dir) => {
                let root_dir = self
                    .options
                    .root_dir
                    .as_deref()
                    .map_or_else(|| config_dir.clone(), |dir| resolve_path(&config_dir, &[dir]));
                let out_dir = resolve_path(&config_dir, &[out_dir]);
                let relative = get_relative_path_from_directory(
                    &root_dir,
                    source,
                    !self.use_case_sensitive_file_names,
                );
                change_extension(&combine_paths(&out_dir, &[&relative]), dts_ext)
            }
            None => change_extension(source, dts_ext),
        }
    }

    fn compute_input_output_names(&self) -> InputOutputNames {
        let mut names = InputOutputNames::default();
        for source in &self.file_names {
            if is_declaration_file_name(source) || file_extension_is(source, EXTENSION_JSON) {
                continue;
            }
            let output_dts = self.get_output_declaration_file_name(source);
            names.output_dts_to_source.insert(
                self.to_path(&output_dts),
                SourceAndProjectReference {
                    source: source.clone(),
                    config_path: self.config_path.clone(),
                },
            );
            names.source_to_output.insert(
                self.to_path(source),
                OutputDtsAndProjectReference {
                    output_dts,
                    config_path: self.config_path.clone(),
                },
            );
        }
        tracing::debug!(
            config = %self.config_file_name,
            outputs = names.source_to_output.len(),
            "parsed project reference input/output names"
        );
        names
    }
}

#[cfg(test)]
#[path = "../tests/parsed_config.rs"]
mod tests;
