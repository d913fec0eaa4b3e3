//! Host traits: the loader's only view of the file system and of referenced
//! project configurations.

use std::sync::Arc;

use tsz_common::ResolvedPath;

use crate::parsed_config::ParsedCommandLine;

/// File system access used by module resolution and file reading.
///
/// Paths are `/`-separated strings. Implementations must be safe to call from
/// many loader threads at once.
pub trait ResolutionHost: Send + Sync {
    fn use_case_sensitive_file_names(&self) -> bool;

    fn current_directory(&self) -> &str;

    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    /// Full text of a file, or `None` when it cannot be read.
    fn read_file(&self, path: &str) -> Option<String>;

    /// Resolve symlinks. Hosts without symlink support return the input.
    fn realpath(&self, path: &str) -> String {
        path.to_string()
    }

    /// Names of the immediate subdirectories of `path`.
    fn get_directories(&self, _path: &str) -> Vec<String> {
        Vec::new()
    }

    fn trace(&self, message: &str) {
        tracing::trace!(target: "tsz_loader::host", "{message}");
    }
}

/// Everything the program loader needs from its environment.
pub trait CompilerHost: ResolutionHost {
    /// Directory holding the bundled `lib.*.d.ts` files.
    fn default_library_path(&self) -> String;

    /// Load and parse a referenced project's tsconfig. `None` when the config
    /// does not exist or cannot be parsed.
    fn get_resolved_project_reference(
        &self,
        config_name: &str,
        path: &ResolvedPath,
    ) -> Option<Arc<ParsedCommandLine>>;

    fn as_resolution_host(&self) -> &dyn ResolutionHost;
}
