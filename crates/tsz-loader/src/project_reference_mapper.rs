//! Lookups across the referenced projects of a program.
//!
//! Built once by the project reference parser after its graph is quiescent,
//! then only read (the symlink cache aside) while source files load.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tsz_common::path::{contains_node_modules, get_canonical_file_name, to_path};
use tsz_common::{CompilerOptions, ResolvedPath};

use crate::dts_faking_host::ProjectReferenceDtsFakingHost;
use crate::host::{CompilerHost, ResolutionHost};
use crate::parsed_config::{
    OutputDtsAndProjectReference, ParsedCommandLine, SourceAndProjectReference,
};

pub struct ProjectReferenceFileMapper {
    pub(crate) host: Arc<dyn CompilerHost>,
    pub(crate) options: Arc<CompilerOptions>,
    pub(crate) root_config: Option<Arc<ParsedCommandLine>>,
    pub(crate) can_use_project_reference_source: bool,
    /// Every reference reached, resolved or not.
    pub(crate) config_to_project_reference: FxHashMap<ResolvedPath, Option<Arc<ParsedCommandLine>>>,
    /// Direct references of each config, in declaration order.
    pub(crate) references_in_config_file: FxHashMap<ResolvedPath, Vec<ResolvedPath>>,
    pub(crate) source_to_output: FxHashMap<ResolvedPath, OutputDtsAndProjectReference>,
    pub(crate) output_dts_to_source: Arc<FxHashMap<ResolvedPath, SourceAndProjectReference>>,
    pub(crate) dts_directories: Arc<FxHashSet<ResolvedPath>>,
    pub(crate) dts_faking_host: Option<ProjectReferenceDtsFakingHost>,
    realpath_dts_to_source: DashMap<ResolvedPath, Option<SourceAndProjectReference>>,
}

impl ProjectReferenceFileMapper {
    pub(crate) fn new(
        host: Arc<dyn CompilerHost>,
        options: Arc<CompilerOptions>,
        root_config: Option<Arc<ParsedCommandLine>>,
        can_use_project_reference_source: bool,
    ) -> Self {
        Self {
            host,
            options,
            root_config,
            can_use_project_reference_source,
            config_to_project_reference: FxHashMap::default(),
            references_in_config_file: FxHashMap::default(),
            source_to_output: FxHashMap::default(),
            output_dts_to_source: Arc::default(),
            dts_directories: Arc::default(),
            dts_faking_host: None,
            realpath_dts_to_source: DashMap::new(),
        }
    }

    fn to_path(&self, file_name: &str) -> ResolvedPath {
        to_path(
            file_name,
            self.host.current_directory(),
            get_canonical_file_name(self.host.use_case_sensitive_file_names()),
        )
    }

    #[must_use]
    pub const fn can_use_project_reference_source(&self) -> bool {
        self.can_use_project_reference_source
    }

    /// Host module resolution should run against: the DTS-faking host when
    /// reference sources stand in for their outputs.
    #[must_use]
    pub fn resolution_host(&self) -> &dyn ResolutionHost {
        match &self.dts_faking_host {
            Some(host) => host,
            None => self.host.as_resolution_host(),
        }
    }

    #[must_use]
    pub fn has_dts_faking_host(&self) -> bool {
        self.dts_faking_host.is_some()
    }

    #[must_use]
    pub fn dts_directories(&self) -> &FxHashSet<ResolvedPath> {
        &self.dts_directories
    }

    /// File that should be loaded in place of `file_name`, if any.
    ///
    /// With reference sources in use an output declaration maps to its
    /// source; otherwise a reference's source maps to its output declaration.
    #[must_use]
    pub fn get_parse_file_redirect(&self, file_name: &str, path: &ResolvedPath) -> Option<String> {
        if self.can_use_project_reference_source {
            self.get_source_and_project_reference(path)
                .cloned()
                .or_else(|| self.get_source_to_dts_if_symlink(file_name, path))
                .map(|source| source.source)
        } else {
            self.get_output_and_project_reference(path)
                .filter(|output| !output.output_dts.is_empty())
                .map(|output| output.output_dts.clone())
        }
    }

    /// The root config's direct references, resolved or not, in order.
    #[must_use]
    pub fn get_resolved_project_references(&self) -> Vec<Option<Arc<ParsedCommandLine>>> {
        let Some(root) = &self.root_config else {
            return Vec::new();
        };
        self.references_in_config_file
            .get(&root.config_path)
            .map(|refs| {
                refs.iter()
                    .map(|path| self.config_to_project_reference.get(path).cloned().flatten())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get_output_and_project_reference(
        &self,
        path: &ResolvedPath,
    ) -> Option<&OutputDtsAndProjectReference> {
        self.source_to_output.get(path)
    }

    #[must_use]
    pub fn get_source_and_project_reference(
        &self,
        path: &ResolvedPath,
    ) -> Option<&SourceAndProjectReference> {
        self.output_dts_to_source.get(path)
    }

    #[must_use]
    pub fn is_source_from_project_reference(&self, path: &ResolvedPath) -> bool {
        self.can_use_project_reference_source && self.get_output_and_project_reference(path).is_some()
    }

    /// Options of the referenced project owning the file, else the program's.
    #[must_use]
    pub fn get_compiler_options_for_file(
        &self,
        file_name: &str,
        path: &ResolvedPath,
    ) -> Arc<CompilerOptions> {
        self.get_redirect_for_resolution(file_name, path)
            .map_or_else(|| Arc::clone(&self.options), |config| Arc::clone(&config.options))
    }

    /// Config of the referenced project a file belongs to, as source or as
    /// output.
    #[must_use]
    pub fn get_redirect_for_resolution(
        &self,
        file_name: &str,
        path: &ResolvedPath,
    ) -> Option<Arc<ParsedCommandLine>> {
        let config_path = if let Some(output) = self.get_output_and_project_reference(path) {
            output.config_path.clone()
        } else if let Some(source) = self.get_source_and_project_reference(path) {
            source.config_path.clone()
        } else {
            self.get_source_to_dts_if_symlink(file_name, path)?.config_path
        };
        self.config_to_project_reference.get(&config_path).cloned().flatten()
    }

    /// `(config, true)` when the path was reached as a project reference;
    /// the config is `None` when it failed to load.
    #[must_use]
    pub fn get_resolved_reference_for(
        &self,
        path: &ResolvedPath,
    ) -> (Option<Arc<ParsedCommandLine>>, bool) {
        match self.config_to_project_reference.get(path) {
            Some(config) => (config.clone(), true),
            None => (None, false),
        }
    }

    /// Depth-first over the reference tree from the root config, each config
    /// once. The callback gets the reference's path, its config, the parent
    /// config and the reference's index in the parent's list.
    pub fn for_each_resolved_project_reference(
        &self,
        mut callback: impl FnMut(
            &ResolvedPath,
            Option<&Arc<ParsedCommandLine>>,
            Option<&Arc<ParsedCommandLine>>,
            usize,
        ),
    ) {
        let Some(root) = &self.root_config else {
            return;
        };
        let mut seen = FxHashSet::default();
        seen.insert(root.config_path.clone());
        let refs = self
            .references_in_config_file
            .get(&root.config_path)
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.for_each_resolved_reference_worker(refs, &mut callback, Some(root), &mut seen);
    }

    fn for_each_resolved_reference_worker(
        &self,
        references: &[ResolvedPath],
        callback: &mut impl FnMut(
            &ResolvedPath,
            Option<&Arc<ParsedCommandLine>>,
            Option<&Arc<ParsedCommandLine>>,
            usize,
        ),
        parent: Option<&Arc<ParsedCommandLine>>,
        seen: &mut FxHashSet<ResolvedPath>,
    ) {
        for (index, path) in references.iter().enumerate() {
            if !seen.insert(path.clone()) {
                continue;
            }
            let config = self.config_to_project_reference.get(path).and_then(Option::as_ref);
            callback(path, config, parent, index);
            let children = self
                .references_in_config_file
                .get(path)
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.for_each_resolved_reference_worker(children, callback, config, seen);
        }
    }

    /// With `preserveSymlinks`, resolution does not follow a `node_modules`
    /// link, yet the link's target may be a reference's output declaration.
    /// Only `node_modules` paths are checked; results are memoized.
    #[must_use]
    pub fn get_source_to_dts_if_symlink(
        &self,
        file_name: &str,
        path: &ResolvedPath,
    ) -> Option<SourceAndProjectReference> {
        if let Some(cached) = self.realpath_dts_to_source.get(path) {
            return cached.value().clone();
        }
        if !self.options.preserve_symlinks {
            return None;
        }
        if !contains_node_modules(file_name) {
            self.realpath_dts_to_source.insert(path.clone(), None);
            return None;
        }
        let real_path = self.to_path(&self.host.realpath(file_name));
        let result = if real_path == *path {
            None
        } else {
            self.get_source_and_project_reference(&real_path).cloned()
        };
        self.realpath_dts_to_source
            .insert(path.clone(), result.clone());
        result
    }
}

#[cfg(test)]
#[path = "../tests/project_reference_mapper.rs"]
mod tests;
