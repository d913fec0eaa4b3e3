//! Loads the graph of referenced projects and builds the
//! [`ProjectReferenceFileMapper`] from it.

use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};
use tsz_common::ResolvedPath;
use tsz_common::path::resolve_path;

use crate::dts_faking_host::ProjectReferenceDtsFakingHost;
use crate::file_loader::FileLoader;
use crate::parsed_config::{ParsedCommandLine, SourceAndProjectReference};
use crate::project_reference_mapper::ProjectReferenceFileMapper;
use crate::worker::{FileLoaderWorker, LoaderTask, SubTasks, TaskRef, WorkGroup};

/// One referenced `tsconfig.json`. Deduplicated by its canonical path.
#[derive(Debug)]
pub struct ProjectReferenceParseTask {
    config_name: String,
    path: ResolvedPath,
    resolved: OnceLock<Option<Arc<ParsedCommandLine>>>,
    sub_tasks: SubTasks<ProjectReferenceParseTask>,
}

impl ProjectReferenceParseTask {
    #[must_use]
    pub fn new(config_name: &str, loader: &FileLoader) -> Self {
        Self {
            config_name: config_name.to_string(),
            path: loader.to_path(config_name),
            resolved: OnceLock::new(),
            sub_tasks: SubTasks::default(),
        }
    }

    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// The loaded config; `None` before loading or when it failed to load.
    #[must_use]
    pub fn resolved(&self) -> Option<&Arc<ParsedCommandLine>> {
        self.resolved.get().and_then(Option::as_ref)
    }
}

impl LoaderTask for ProjectReferenceParseTask {
    type Loader = FileLoader;

    fn file_name(&self) -> &str {
        self.path.as_str()
    }

    fn path(&self) -> Option<&ResolvedPath> {
        Some(&self.path)
    }

    fn is_loaded(&self) -> bool {
        self.resolved.get().is_some()
    }

    fn load<'scope>(&self, loader: &'scope FileLoader, scope: &rayon::Scope<'scope>) {
        let resolved = loader
            .host()
            .get_resolved_project_reference(&self.config_name, &self.path);
        match &resolved {
            Some(config) => {
                if !config.has_input_output_names() {
                    let config = Arc::clone(config);
                    scope.spawn(move |_| {
                        config.parse_input_output_names();
                    });
                }
                self.sub_tasks.set(
                    config
                        .project_reference_paths
                        .iter()
                        .map(|name| TaskRef::new(Self::new(name, loader)))
                        .collect(),
                );
            }
            None => tracing::debug!(config = %self.config_name, "project reference not found"),
        }
        assert!(
            self.resolved.set(resolved).is_ok(),
            "project reference {} loaded twice",
            self.config_name
        );
    }

    fn sub_tasks(&self) -> &SubTasks<Self> {
        &self.sub_tasks
    }
}

/// Runs the reference graph and aggregates it.
pub struct ProjectReferenceParser<'a> {
    loader: &'a FileLoader,
    worker: FileLoaderWorker<ProjectReferenceParseTask>,
}

impl<'a> ProjectReferenceParser<'a> {
    #[must_use]
    pub fn new(loader: &'a FileLoader) -> Self {
        Self {
            loader,
            worker: FileLoaderWorker::new(usize::MAX),
        }
    }

    /// Load every config reachable from the root config's references, then
    /// build the mapper.
    pub fn parse(
        &self,
        group: &WorkGroup,
        root_config: Option<&Arc<ParsedCommandLine>>,
    ) -> ProjectReferenceFileMapper {
        let mut tasks: Vec<TaskRef<ProjectReferenceParseTask>> = root_config
            .map(|config| {
                config
                    .project_reference_paths
                    .iter()
                    .map(|name| TaskRef::new(ProjectReferenceParseTask::new(name, self.loader)))
                    .collect()
            })
            .unwrap_or_default();
        if !tasks.is_empty() {
            self.worker.run_and_wait(self.loader, group, &mut tasks);
        }
        self.init_mapper(&tasks, root_config)
    }

    fn init_mapper(
        &self,
        tasks: &[TaskRef<ProjectReferenceParseTask>],
        root_config: Option<&Arc<ParsedCommandLine>>,
    ) -> ProjectReferenceFileMapper {
        let loader = self.loader;
        let mut mapper = ProjectReferenceFileMapper::new(
            Arc::clone(loader.host()),
            Arc::clone(loader.options()),
            root_config.cloned(),
            loader.can_use_project_reference_source(),
        );
        let mut output_dts_to_source = FxHashMap::default();
        let mut dts_directories = FxHashSet::default();
        let mut seen = FxHashSet::default();

        let root_refs = Self::init_mapper_worker(
            tasks,
            &mut seen,
            &mut Aggregate {
                mapper: &mut mapper,
                output_dts_to_source: &mut output_dts_to_source,
                dts_directories: &mut dts_directories,
                root_config_path: root_config.map(|config| &config.config_path),
                loader,
            },
        );
        if let Some(root) = root_config {
            mapper
                .references_in_config_file
                .insert(root.config_path.clone(), root_refs);
        }

        mapper.output_dts_to_source = Arc::new(output_dts_to_source);
        mapper.dts_directories = Arc::new(dts_directories);
        if mapper.can_use_project_reference_source() && !mapper.output_dts_to_source.is_empty() {
            mapper.dts_faking_host = Some(ProjectReferenceDtsFakingHost::new(
                Arc::clone(loader.host()),
                Arc::clone(&mapper.output_dts_to_source),
                Arc::clone(&mapper.dts_directories),
            ));
        }
        tracing::debug!(
            references = mapper.config_to_project_reference.len(),
            outputs = mapper.source_to_output.len(),
            faking_host = mapper.has_dts_faking_host(),
            "project reference mapper ready"
        );
        mapper
    }

    /// Children first, each task once. Returns the paths of `tasks` in order,
    /// including ones already walked.
    fn init_mapper_worker(
        tasks: &[TaskRef<ProjectReferenceParseTask>],
        seen: &mut FxHashSet<*const ProjectReferenceParseTask>,
        aggregate: &mut Aggregate<'_>,
    ) -> Vec<ResolvedPath> {
        let mut results = Vec::with_capacity(tasks.len());
        for slot in tasks {
            let task = &slot.task;
            results.push(task.path.clone());
            if !task.is_loaded() || !seen.insert(Arc::as_ptr(task)) {
                continue;
            }
            let children = task.sub_tasks.snapshot();
            let references_in_config = Self::init_mapper_worker(&children, seen, aggregate);
            aggregate.add(task, references_in_config);
        }
        results
    }
}

/// Maps filled by the single-threaded aggregation walk.
struct Aggregate<'m> {
    mapper: &'m mut ProjectReferenceFileMapper,
    output_dts_to_source: &'m mut FxHashMap<ResolvedPath, SourceAndProjectReference>,
    dts_directories: &'m mut FxHashSet<ResolvedPath>,
    root_config_path: Option<&'m ResolvedPath>,
    loader: &'m FileLoader,
}

impl Aggregate<'_> {
    fn add(&mut self, task: &ProjectReferenceParseTask, references_in_config: Vec<ResolvedPath>) {
        let resolved = task.resolved().cloned();
        self.mapper
            .config_to_project_reference
            .insert(task.path.clone(), resolved.clone());
        self.mapper
            .references_in_config_file
            .insert(task.path.clone(), references_in_config);

        let Some(config) = resolved else {
            return;
        };
        if self.root_config_path == Some(&config.config_path) {
            return;
        }
        let names = config.parse_input_output_names();
        for (key, value) in &names.source_to_output {
            self.mapper.source_to_output.insert(key.clone(), value.clone());
        }
        for (key, value) in &names.output_dts_to_source {
            self.output_dts_to_source.insert(key.clone(), value.clone());
        }
        if self.mapper.can_use_project_reference_source() {
            if let Some(decl_dir) = config.options.declaration_output_dir() {
                let decl_dir = resolve_path(&config.config_directory(), &[decl_dir]);
                self.dts_directories.insert(self.loader.to_path(&decl_dir));
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/project_reference_parser.rs"]
mod tests;
