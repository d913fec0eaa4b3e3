//! Resolution host that answers for referenced projects' declaration outputs
//! from their sources.
//!
//! When a program uses the sources of its project references, the `.d.ts`
//! outputs those references would produce may not exist on disk yet. Module
//! resolution still has to find them, so this host reports an output as
//! present whenever its source exists, and reports the declaration output
//! directories (and their parents) as present. Symlinked `node_modules`
//! directories are tracked so the same applies through package links.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tsz_common::ResolvedPath;
use tsz_common::path::{
    contains_ignored_path, contains_node_modules, ensure_trailing_directory_separator,
    get_canonical_file_name, is_declaration_file_name, resolve_path, to_path,
};

use crate::host::{CompilerHost, ResolutionHost};
use crate::parsed_config::SourceAndProjectReference;

#[derive(Clone, Debug, PartialEq, Eq)]
struct KnownDirectoryLink {
    /// Real directory with a trailing separator.
    real: String,
    real_path: ResolvedPath,
}

pub struct ProjectReferenceDtsFakingHost {
    host: Arc<dyn CompilerHost>,
    output_dts_to_source: Arc<FxHashMap<ResolvedPath, SourceAndProjectReference>>,
    dts_directories: Arc<FxHashSet<ResolvedPath>>,
    /// Directory path (trailing separator) to its link target, `None` when the
    /// directory turned out not to be a symlink.
    known_directories: DashMap<ResolvedPath, Option<KnownDirectoryLink>>,
    /// Symlinked declaration path to the real file name.
    known_files: DashMap<ResolvedPath, String>,
}

impl ProjectReferenceDtsFakingHost {
    pub(crate) fn new(
        host: Arc<dyn CompilerHost>,
        output_dts_to_source: Arc<FxHashMap<ResolvedPath, SourceAndProjectReference>>,
        dts_directories: Arc<FxHashSet<ResolvedPath>>,
    ) -> Self {
        Self {
            host,
            output_dts_to_source,
            dts_directories,
            known_directories: DashMap::new(),
            known_files: DashMap::new(),
        }
    }

    fn to_path(&self, file_name: &str) -> ResolvedPath {
        to_path(
            file_name,
            self.host.current_directory(),
            get_canonical_file_name(self.host.use_case_sensitive_file_names()),
        )
    }

    fn handle_directory_could_be_symlink(&self, directory: &str) {
        if contains_ignored_path(directory) || !contains_node_modules(directory) {
            return;
        }
        let directory_path = ResolvedPath::new_unchecked(ensure_trailing_directory_separator(
            &self.to_path(directory),
        ));
        if self.known_directories.contains_key(&directory_path) {
            return;
        }

        let real_directory = self.realpath(directory);
        if real_directory == directory {
            self.known_directories.insert(directory_path, None);
            return;
        }
        let real_path = ResolvedPath::new_unchecked(ensure_trailing_directory_separator(
            &self.to_path(&real_directory),
        ));
        if real_path == directory_path {
            self.known_directories.insert(directory_path, None);
            return;
        }
        tracing::trace!(directory, real = %real_directory, "known symlinked directory");
        self.known_directories.insert(
            directory_path,
            Some(KnownDirectoryLink {
                real: ensure_trailing_directory_separator(&real_directory),
                real_path,
            }),
        );
    }

    /// `Some(exists)` when the path is a project reference output; `None`
    /// when this host has no opinion.
    fn file_exists_if_project_reference_dts(&self, file: &str) -> Option<bool> {
        self.output_dts_to_source
            .get(&self.to_path(file))
            .map(|source| self.host.file_exists(&source.source))
    }

    fn directory_exists_if_project_reference_decl_dir(&self, directory: &str) -> Option<bool> {
        let dir_path = self.to_path(directory);
        let dir_with_separator = format!("{dir_path}/");
        let is_decl_dir_related = self.dts_directories.iter().any(|decl_dir| {
            *decl_dir == dir_path
                || decl_dir.starts_with(dir_with_separator.as_str())
                || dir_path.starts_with(&format!("{decl_dir}/"))
        });
        is_decl_dir_related.then_some(true)
    }

    fn exists_using_source(&self, path: &str, is_file: bool) -> Option<bool> {
        if is_file {
            self.file_exists_if_project_reference_dts(path)
        } else {
            self.directory_exists_if_project_reference_decl_dir(path)
        }
    }

    fn file_or_directory_exists_using_source(&self, file_or_directory: &str, is_file: bool) -> bool {
        if let Some(exists) = self.exists_using_source(file_or_directory, is_file) {
            return exists;
        }
        if self.known_directories.is_empty() {
            return false;
        }
        let path = self.to_path(file_or_directory);
        if !contains_node_modules(&path) {
            return false;
        }
        if is_file && self.known_files.contains_key(&path) {
            return true;
        }

        // Retry through every known symlinked directory that contains the path.
        let links: Vec<(ResolvedPath, KnownDirectoryLink)> = self
            .known_directories
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .as_ref()
                    .map(|link| (entry.key().clone(), link.clone()))
            })
            .collect();
        for (directory_path, link) in links {
            let Some(relative) = path.strip_prefix(directory_path.as_str()) else {
                continue;
            };
            let through_link = format!("{}{relative}", link.real_path);
            if self.exists_using_source(&through_link, is_file) == Some(true) {
                if is_file {
                    self.known_files
                        .insert(path.clone(), resolve_path(&link.real, &[relative]));
                }
                return true;
            }
        }
        false
    }
}

impl ResolutionHost for ProjectReferenceDtsFakingHost {
    fn use_case_sensitive_file_names(&self) -> bool {
        self.host.use_case_sensitive_file_names()
    }

    fn current_directory(&self) -> &str {
        self.host.current_directory()
    }

    fn file_exists(&self, path: &str) -> bool {
        if self.host.file_exists(path) {
            return true;
        }
        if !is_declaration_file_name(path) {
            return false;
        }
        self.file_or_directory_exists_using_source(path, true)
    }

    fn directory_exists(&self, path: &str) -> bool {
        if self.host.directory_exists(path) {
            self.handle_directory_could_be_symlink(path);
            return true;
        }
        self.file_or_directory_exists_using_source(path, false)
    }

    fn read_file(&self, path: &str) -> Option<String> {
        self.host.read_file(path)
    }

    fn realpath(&self, path: &str) -> String {
        if let Some(real) = self.known_files.get(&self.to_path(path)) {
            return real.value().clone();
        }
        self.host.realpath(path)
    }

    fn get_directories(&self, path: &str) -> Vec<String> {
        self.host.get_directories(path)
    }

    fn trace(&self, message: &str) {
        self.host.trace(message);
    }
}

#[cfg(test)]
#[path = "../tests/dts_faking_host.rs"]
mod tests;
