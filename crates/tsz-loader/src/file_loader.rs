//! Program file processing.
//!
//! [`process_all_program_files`] takes a program's roots, libs and project
//! references and loads every file they reach, in parallel, deduplicated by
//! normalized file name. The result is a flat [`ProcessedFiles`] with every
//! file listed after the files it depends on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tsz_common::diagnostics::diagnostic_codes;
use tsz_common::path::{
    EXTENSION_JSON, SUPPORTED_JS_EXTENSIONS, SUPPORTED_TS_EXTENSIONS, combine_paths,
    file_extension_is, file_extension_is_one_of, get_canonical_file_name, get_directory_path,
    get_normalized_absolute_path, is_rooted_disk_path, normalize_path, to_path,
};
use tsz_common::{CompilerOptions, Diagnostic, ResolvedPath};

use crate::host::{CompilerHost, ResolutionHost};
use crate::include_reason::{FileIncludeKind, FileIncludeReason};
use crate::libs::{get_default_lib_file_name, get_lib_file_name, lib_file_priority, path_for_lib_file};
use crate::parse_task::{JsxRuntimeImportSpecifier, ParseTask, ParseTaskState, ResolvedRef};
use crate::parsed_config::ParsedCommandLine;
use crate::project_reference_mapper::ProjectReferenceFileMapper;
use crate::project_reference_parser::ProjectReferenceParser;
use crate::resolution::{
    ModeAwareCache, ModeAwareCacheKey, ModuleResolver, ResolutionContext, ResolvedModule,
    ResolvedTypeReferenceDirective,
};
use crate::source_file::{
    ImportKind, ModuleAugmentation, ModuleSpecifier, ResolutionMode, SourceFile,
    SourceFileMetaData, SourceFileParseOptions, SourceFileParser,
    get_implied_node_format_for_file,
};
use crate::worker::{FileLoaderWorker, LoaderTask, TaskRef, WorkGroup};

/// Containing file name used when resolving automatic type directives.
pub const INFERRED_TYPES_CONTAINING_FILE: &str = "__inferred type names__.ts";

const EXTERNAL_HELPERS_MODULE_NAME: &str = "tslib";

/// Inputs of [`process_all_program_files`].
pub struct ProgramOptions {
    pub host: Arc<dyn CompilerHost>,
    pub parser: Arc<dyn SourceFileParser>,
    pub resolver: Arc<dyn ModuleResolver>,
    pub options: Arc<CompilerOptions>,
    /// Root file names, relative to the host's current directory or absolute.
    pub root_files: Vec<String>,
    /// The program's own config. Its references form the project reference
    /// graph.
    pub config: Option<Arc<ParsedCommandLine>>,
    pub single_threaded: bool,
    /// Load referenced projects' sources instead of their declaration
    /// outputs, unless `disableSourceOfProjectReferenceRedirect` is set.
    pub use_source_of_project_reference_redirect: bool,
}

/// Module resolution results of one file.
#[derive(Debug, Default)]
pub struct ImportResolutions {
    pub to_parse: Vec<ResolvedRef>,
    pub resolutions: ModeAwareCache<ResolvedModule>,
    pub import_helpers_import_specifier: Option<ModuleSpecifier>,
    pub jsx_runtime_import_specifier: Option<JsxRuntimeImportSpecifier>,
}

/// Shared context of every parse task in a program.
pub struct FileLoader {
    host: Arc<dyn CompilerHost>,
    parser: Arc<dyn SourceFileParser>,
    resolver: Arc<dyn ModuleResolver>,
    options: Arc<CompilerOptions>,
    current_directory: String,
    use_case_sensitive_file_names: bool,
    default_library_path: String,
    can_use_project_reference_source: bool,
    total_file_count: AtomicUsize,
    lib_file_count: AtomicUsize,
    mapper: OnceLock<ProjectReferenceFileMapper>,
}

impl FileLoader {
    #[must_use]
    pub fn new(
        host: Arc<dyn CompilerHost>,
        parser: Arc<dyn SourceFileParser>,
        resolver: Arc<dyn ModuleResolver>,
        options: Arc<CompilerOptions>,
        use_source_of_project_reference_redirect: bool,
    ) -> Self {
        let current_directory = host.current_directory().to_string();
        let use_case_sensitive_file_names = host.use_case_sensitive_file_names();
        let default_library_path = normalize_path(&host.default_library_path());
        let can_use_project_reference_source = use_source_of_project_reference_redirect
            && !options.disable_source_of_project_reference_redirect;
        Self {
            host,
            parser,
            resolver,
            options,
            current_directory,
            use_case_sensitive_file_names,
            default_library_path,
            can_use_project_reference_source,
            total_file_count: AtomicUsize::new(0),
            lib_file_count: AtomicUsize::new(0),
            mapper: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn host(&self) -> &Arc<dyn CompilerHost> {
        &self.host
    }

    #[must_use]
    pub fn options(&self) -> &Arc<CompilerOptions> {
        &self.options
    }

    #[must_use]
    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    #[must_use]
    pub fn default_library_path(&self) -> &str {
        &self.default_library_path
    }

    #[must_use]
    pub const fn can_use_project_reference_source(&self) -> bool {
        self.can_use_project_reference_source
    }

    #[must_use]
    pub fn to_path(&self, file_name: &str) -> ResolvedPath {
        to_path(
            file_name,
            &self.current_directory,
            get_canonical_file_name(self.use_case_sensitive_file_names),
        )
    }

    /// The project reference mapper, once project references are parsed.
    #[must_use]
    pub fn mapper(&self) -> Option<&ProjectReferenceFileMapper> {
        self.mapper.get()
    }

    pub(crate) fn install_mapper(&self, mapper: ProjectReferenceFileMapper) {
        assert!(
            self.mapper.set(mapper).is_ok(),
            "project reference mapper installed twice"
        );
    }

    fn take_mapper(self) -> Option<ProjectReferenceFileMapper> {
        self.mapper.into_inner()
    }

    #[must_use]
    pub fn total_file_count(&self) -> usize {
        self.total_file_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn lib_file_count(&self) -> usize {
        self.lib_file_count.load(Ordering::Relaxed)
    }

    pub(crate) fn count_file(&self, is_lib: bool) {
        self.total_file_count.fetch_add(1, Ordering::Relaxed);
        if is_lib {
            self.lib_file_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn resolution_host(&self) -> &dyn ResolutionHost {
        self.mapper().map_or_else(
            || self.host.as_resolution_host(),
            ProjectReferenceFileMapper::resolution_host,
        )
    }

    fn redirect_for(&self, file_name: &str, path: &ResolvedPath) -> Option<Arc<ParsedCommandLine>> {
        self.mapper()
            .and_then(|mapper| mapper.get_redirect_for_resolution(file_name, path))
    }

    fn resolution_context<'a>(
        &'a self,
        options: &'a CompilerOptions,
        redirect: Option<&'a ParsedCommandLine>,
    ) -> ResolutionContext<'a> {
        ResolutionContext {
            host: self.resolution_host(),
            options,
            redirect,
        }
    }

    /// Options of the referenced project owning the file, else the program's.
    #[must_use]
    pub fn options_for_file(&self, file_name: &str, path: &ResolvedPath) -> Arc<CompilerOptions> {
        self.mapper().map_or_else(
            || Arc::clone(&self.options),
            |mapper| mapper.get_compiler_options_for_file(file_name, path),
        )
    }

    #[must_use]
    pub fn load_source_file_meta_data(
        &self,
        file_name: &str,
        path: &ResolvedPath,
    ) -> SourceFileMetaData {
        let redirect = self.redirect_for(file_name, path);
        let options = redirect
            .as_ref()
            .map_or(self.options.as_ref(), |config| config.options.as_ref());
        let ctx = self.resolution_context(options, redirect.as_deref());
        let package_json_type = self.resolver.get_package_json_type(file_name, ctx);
        let implied_node_format =
            get_implied_node_format_for_file(file_name, package_json_type.as_deref());
        SourceFileMetaData {
            package_json_type,
            implied_node_format,
        }
    }

    /// Read and parse a file. `None` when the host cannot read it.
    #[must_use]
    pub fn parse_source_file(
        &self,
        file_name: &str,
        path: &ResolvedPath,
        metadata: &SourceFileMetaData,
    ) -> Option<SourceFile> {
        let text = self.host.read_file(file_name)?;
        let options = SourceFileParseOptions {
            file_name: file_name.to_string(),
            path: path.clone(),
            target: self.options_for_file(file_name, path).target,
            metadata: metadata.clone(),
        };
        Some(self.parser.parse_source_file(&options, &text))
    }

    /// `/// <reference path="..." />` target: rooted names as written,
    /// others relative to the containing file.
    #[must_use]
    pub fn resolve_tripleslash_path_reference(&self, module_name: &str, containing_file: &str) -> String {
        if is_rooted_disk_path(module_name) {
            normalize_path(module_name)
        } else {
            normalize_path(&combine_paths(&get_directory_path(containing_file), &[module_name]))
        }
    }

    #[must_use]
    pub fn path_for_lib_file(&self, lib_file_name: &str) -> String {
        path_for_lib_file(&self.default_library_path, lib_file_name)
    }

    pub fn resolve_type_reference_directives(
        &self,
        file: &SourceFile,
        metadata: &SourceFileMetaData,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<ResolvedRef>, ModeAwareCache<ResolvedTypeReferenceDirective>) {
        let mut to_parse = Vec::new();
        let mut resolutions = ModeAwareCache::default();
        if file.type_reference_directives.is_empty() {
            return (to_parse, resolutions);
        }

        let redirect = self.redirect_for(&file.file_name, &file.path);
        let options = redirect
            .as_ref()
            .map_or(self.options.as_ref(), |config| config.options.as_ref());
        let ctx = self.resolution_context(options, redirect.as_deref());

        for reference in &file.type_reference_directives {
            let mode = reference
                .resolution_mode
                .unwrap_or(metadata.implied_node_format);
            let resolved = self.resolver.resolve_type_reference_directive(
                &reference.file_name,
                &file.file_name,
                mode,
                ctx,
            );
            match &resolved.resolved_file_name {
                Some(resolved_file_name) => to_parse.push(ResolvedRef {
                    increase_depth: resolved.is_external_library_import,
                    is_from_external_library: resolved.is_external_library_import,
                    ..ResolvedRef::new(
                        resolved_file_name.clone(),
                        FileIncludeReason::new(
                            FileIncludeKind::TypeReferenceDirective,
                            &reference.file_name,
                        )
                        .from_file(file.file_name.clone()),
                    )
                }),
                None => diagnostics.push(Diagnostic::from_code(
                    &file.file_name,
                    reference.pos,
                    reference.end.saturating_sub(reference.pos),
                    diagnostic_codes::CANNOT_FIND_TYPE_DEFINITION_FILE_FOR,
                    &[&reference.file_name],
                )),
            }
            resolutions.insert(ModeAwareCacheKey::new(&reference.file_name, mode), resolved);
        }
        (to_parse, resolutions)
    }

    /// Resolve the type packages included without an explicit reference,
    /// from `containing_file` (the inferred type names file).
    pub fn resolve_automatic_type_directives(
        &self,
        containing_file: &str,
    ) -> (
        Vec<ResolvedRef>,
        ModeAwareCache<ResolvedTypeReferenceDirective>,
        Vec<Diagnostic>,
    ) {
        let ctx = self.resolution_context(&self.options, None);
        let names = self.resolver.get_automatic_type_directive_names(ctx);
        tracing::debug!(count = names.len(), "automatic type directives");

        let mut to_parse = Vec::new();
        let mut resolutions = ModeAwareCache::default();
        let mut diagnostics = Vec::new();
        for name in names {
            let resolved = self.resolver.resolve_type_reference_directive(
                &name,
                containing_file,
                ResolutionMode::None,
                ctx,
            );
            match &resolved.resolved_file_name {
                Some(resolved_file_name) => to_parse.push(ResolvedRef {
                    increase_depth: resolved.is_external_library_import,
                    is_from_external_library: resolved.is_external_library_import,
                    ..ResolvedRef::new(
                        resolved_file_name.clone(),
                        FileIncludeReason::new(FileIncludeKind::AutomaticTypeDirectiveFile, &name),
                    )
                }),
                None => diagnostics.push(Diagnostic::global(
                    diagnostic_codes::CANNOT_FIND_TYPE_DEFINITION_FILE_FOR,
                    &[&name],
                )),
            }
            resolutions.insert(ModeAwareCacheKey::new(name, ResolutionMode::None), resolved);
        }
        (to_parse, resolutions, diagnostics)
    }

    pub fn resolve_imports_and_module_augmentations(
        &self,
        file: &SourceFile,
        metadata: &SourceFileMetaData,
        options: &CompilerOptions,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ImportResolutions {
        let mut import_helpers_import_specifier = None;
        let mut jsx_runtime_import_specifier = None;
        let is_js = file.is_js();
        if is_js || (!file.is_declaration_file && file.is_external_module) {
            if options.import_helpers {
                import_helpers_import_specifier =
                    Some(ModuleSpecifier::synthetic(EXTERNAL_HELPERS_MODULE_NAME));
            }
            if let Some(module_reference) =
                options.jsx_runtime_module(file.jsx_import_source_pragma.as_deref())
            {
                jsx_runtime_import_specifier = Some(JsxRuntimeImportSpecifier {
                    specifier: ModuleSpecifier::synthetic(&module_reference),
                    module_reference,
                });
            }
        }

        let mut module_names: Vec<&ModuleSpecifier> = file.imports.iter().collect();
        module_names.extend(file.module_augmentations.iter().filter_map(|augmentation| {
            match augmentation {
                ModuleAugmentation::StringLiteral(specifier) => Some(specifier),
                ModuleAugmentation::Global => None,
            }
        }));
        module_names.extend(import_helpers_import_specifier.iter());
        module_names.extend(jsx_runtime_import_specifier.iter().map(|jsx| &jsx.specifier));

        let mut to_parse = Vec::new();
        let mut resolutions = ModeAwareCache::default();
        let redirect = self.redirect_for(&file.file_name, &file.path);
        let ctx = self.resolution_context(options, redirect.as_deref());

        for specifier in module_names {
            if specifier.text.is_empty() {
                continue;
            }
            let mode = get_mode_for_usage_location(specifier, metadata);
            let resolution =
                self.resolver
                    .resolve_module_name(&specifier.text, &file.file_name, mode, ctx);

            match &resolution.resolved_file_name {
                Some(resolved_file_name) => {
                    let is_js_file = !file_extension_is_one_of(resolved_file_name, SUPPORTED_TS_EXTENSIONS)
                        && !file_extension_is(resolved_file_name, EXTENSION_JSON);
                    let is_json_file = file_extension_is(resolved_file_name, EXTENSION_JSON);
                    let is_js_file_from_node_modules = resolution.is_external_library_import
                        && is_js_file
                        && resolved_file_name.contains("/node_modules/");

                    let should_add_file = !options.no_resolve
                        && !(is_js_file && !options.allow_js)
                        && !(is_json_file && !options.resolve_json_module);
                    if should_add_file {
                        to_parse.push(ResolvedRef {
                            increase_depth: is_js_file_from_node_modules,
                            elide_on_depth: is_js_file_from_node_modules,
                            is_from_external_library: resolution.is_external_library_import,
                            ..ResolvedRef::new(
                                resolved_file_name.clone(),
                                FileIncludeReason::new(FileIncludeKind::Import, &specifier.text)
                                    .from_file(file.file_name.clone()),
                            )
                        });
                    }
                }
                None => {
                    let reported = !is_js
                        && !matches!(specifier.kind, ImportKind::Synthetic | ImportKind::Augmentation);
                    if reported {
                        diagnostics.push(Diagnostic::from_code(
                            &file.file_name,
                            specifier.pos,
                            specifier.end.saturating_sub(specifier.pos),
                            diagnostic_codes::CANNOT_FIND_MODULE_OR_ITS_CORRESPONDING_TYPE_DECLARATIONS,
                            &[&specifier.text],
                        ));
                    }
                }
            }
            resolutions.insert(ModeAwareCacheKey::new(&specifier.text, mode), resolution);
        }

        ImportResolutions {
            to_parse,
            resolutions,
            import_helpers_import_specifier,
            jsx_runtime_import_specifier,
        }
    }
}

/// Resolution mode of an import: an explicit `resolution-mode`, the syntax
/// for `require` and `import()`, else the file's implied format.
fn get_mode_for_usage_location(
    specifier: &ModuleSpecifier,
    metadata: &SourceFileMetaData,
) -> ResolutionMode {
    if let Some(mode) = specifier.resolution_mode {
        return mode;
    }
    match specifier.kind {
        ImportKind::Require | ImportKind::ImportEquals => ResolutionMode::CommonJs,
        ImportKind::DynamicImport => ResolutionMode::EsModule,
        _ => metadata.implied_node_format,
    }
}

// =============================================================================
// Program files
// =============================================================================

/// Every file of a program and what was learned loading it.
#[derive(Default)]
pub struct ProcessedFiles {
    /// Lib files by lib priority, then the rest with dependencies first.
    pub files: Vec<Arc<SourceFile>>,
    /// Paths of `files`, dependencies first, as flattened from the graph.
    pub file_paths: Vec<ResolvedPath>,
    pub files_by_path: FxHashMap<ResolvedPath, Arc<SourceFile>>,
    pub lib_files: FxHashSet<ResolvedPath>,
    /// Files referenced but not readable.
    pub missing_files: Vec<String>,
    pub resolved_modules: FxHashMap<ResolvedPath, ModeAwareCache<ResolvedModule>>,
    pub type_resolutions: FxHashMap<ResolvedPath, ModeAwareCache<ResolvedTypeReferenceDirective>>,
    pub source_file_meta_datas: FxHashMap<ResolvedPath, SourceFileMetaData>,
    pub jsx_runtime_import_specifiers: FxHashMap<ResolvedPath, JsxRuntimeImportSpecifier>,
    pub import_helpers_import_specifiers: FxHashMap<ResolvedPath, ModuleSpecifier>,
    pub source_files_found_searching_node_modules: FxHashSet<ResolvedPath>,
    /// Redirected path to the path loaded in its place.
    pub redirect_targets: FxHashMap<ResolvedPath, ResolvedPath>,
    /// Every reason each file was included, roots first.
    pub include_reasons: FxHashMap<ResolvedPath, Vec<FileIncludeReason>>,
    pub file_diagnostics: Vec<Diagnostic>,
    pub total_file_count: usize,
    pub lib_file_count: usize,
    pub mapper: Option<ProjectReferenceFileMapper>,
}

impl ProcessedFiles {
    #[must_use]
    pub fn is_lib_file(&self, path: &ResolvedPath) -> bool {
        self.lib_files.contains(path)
    }

    #[must_use]
    pub fn get_source_file(&self, path: &ResolvedPath) -> Option<&Arc<SourceFile>> {
        self.files_by_path.get(path)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.file_diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A root task and why it is a root.
struct RootTask {
    slot: TaskRef<ParseTask>,
    reason: Option<FileIncludeReason>,
}

/// Load every file of a program.
pub fn process_all_program_files(opts: ProgramOptions) -> Result<ProcessedFiles> {
    let ProgramOptions {
        host,
        parser,
        resolver,
        options,
        root_files,
        config,
        single_threaded,
        use_source_of_project_reference_redirect,
    } = opts;

    let group = WorkGroup::new(single_threaded)?;
    let loader = FileLoader::new(
        host,
        parser,
        resolver,
        Arc::clone(&options),
        use_source_of_project_reference_redirect,
    );

    if let Some(config) = &config {
        let mapper = ProjectReferenceParser::new(&loader).parse(&group, Some(config));
        loader.install_mapper(mapper);
    }

    let mut diagnostics = Vec::new();
    let mut roots = root_tasks(&loader, &root_files, config.as_deref(), &mut diagnostics);
    let mut tasks: Vec<TaskRef<ParseTask>> = roots.iter().map(|root| root.slot.clone()).collect();

    let worker = FileLoaderWorker::new(options.max_node_module_js_depth());
    worker.run_and_wait(&loader, &group, &mut tasks);
    for (root, slot) in roots.iter_mut().zip(&tasks) {
        root.slot = slot.clone();
    }

    let mut processed = ProcessedFiles::default();
    for root in &roots {
        if let Some(reason) = &root.reason {
            processed
                .include_reasons
                .entry(loader.to_path(root.slot.task.file_name()))
                .or_default()
                .push(reason.clone());
        }
    }

    let mut lib_files = Vec::new();
    let mut other_files = Vec::new();
    let collected = worker.collect(&tasks, |task| {
        collect_task(&loader, task, &mut processed, &mut lib_files, &mut other_files);
    });

    for root in &roots {
        let task = &root.slot.task;
        let is_missing_root = task.is_root()
            && !task.is_lib()
            && !task.is_for_automatic_type_directive()
            && task.state() == ParseTaskState::Loaded
            && task.file().is_none();
        if is_missing_root {
            diagnostics.push(Diagnostic::global(
                diagnostic_codes::FILE_NOT_FOUND,
                &[task.file_name()],
            ));
        }
    }

    let default_library_path = loader.default_library_path().to_string();
    lib_files.sort_by_key(|file: &Arc<SourceFile>| {
        lib_file_priority(&file.file_name, &default_library_path)
    });
    processed.file_paths = collected
        .into_iter()
        .filter(|path| processed.files_by_path.contains_key(path))
        .collect();
    processed.files = lib_files;
    processed.files.append(&mut other_files);

    diagnostics.append(&mut processed.file_diagnostics);
    processed.file_diagnostics = diagnostics;
    processed.total_file_count = loader.total_file_count();
    processed.lib_file_count = loader.lib_file_count();
    processed.mapper = loader.take_mapper();

    tracing::debug!(
        files = processed.files.len(),
        libs = processed.lib_file_count,
        missing = processed.missing_files.len(),
        diagnostics = processed.file_diagnostics.len(),
        "program files processed"
    );
    Ok(processed)
}

fn root_tasks(
    loader: &FileLoader,
    root_files: &[String],
    config: Option<&ParsedCommandLine>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<RootTask> {
    let options = loader.options();
    let mut roots = Vec::new();

    for root_file in root_files {
        let file_name = get_normalized_absolute_path(root_file, loader.current_directory());
        if !options.allow_non_ts_extensions && !has_supported_root_extension(&file_name, options) {
            let diagnostic = if file_extension_is_one_of(&file_name, SUPPORTED_JS_EXTENSIONS) {
                Diagnostic::global(
                    diagnostic_codes::FILE_IS_A_JAVASCRIPT_FILE_DID_YOU_MEAN_TO_ENABLE_THE_ALLOWJS_OPTION,
                    &[&file_name],
                )
            } else {
                Diagnostic::global(
                    diagnostic_codes::FILE_HAS_AN_UNSUPPORTED_EXTENSION,
                    &[&file_name, &supported_extensions_text(options)],
                )
            };
            diagnostics.push(diagnostic);
            continue;
        }
        roots.push(RootTask {
            slot: TaskRef::new(ParseTask::root(file_name)),
            reason: Some(FileIncludeReason::new(FileIncludeKind::RootFile, "")),
        });
    }

    if roots.is_empty() {
        return roots;
    }

    if !options.no_lib {
        match &options.lib {
            Some(libs) => {
                for lib in libs {
                    match get_lib_file_name(lib) {
                        Some(lib_file_name) => roots.push(RootTask {
                            slot: TaskRef::new(ParseTask::root_lib(
                                loader.path_for_lib_file(&lib_file_name),
                            )),
                            reason: Some(FileIncludeReason::new(FileIncludeKind::LibFile, lib)),
                        }),
                        None => diagnostics.push(Diagnostic::global(
                            diagnostic_codes::CANNOT_FIND_LIB_DEFINITION_FOR,
                            &[lib],
                        )),
                    }
                }
            }
            None => roots.push(RootTask {
                slot: TaskRef::new(ParseTask::root_lib(
                    loader.path_for_lib_file(get_default_lib_file_name(options.target)),
                )),
                reason: Some(FileIncludeReason::new(FileIncludeKind::LibFile, "")),
            }),
        }
    }

    let containing_directory = config
        .map(ParsedCommandLine::config_directory)
        .or_else(|| options.config_file_path.as_deref().map(get_directory_path))
        .unwrap_or_else(|| loader.current_directory().to_string());
    roots.push(RootTask {
        slot: TaskRef::new(ParseTask::automatic_type_directives(combine_paths(
            &containing_directory,
            &[INFERRED_TYPES_CONTAINING_FILE],
        ))),
        reason: None,
    });
    roots
}

fn has_supported_root_extension(file_name: &str, options: &CompilerOptions) -> bool {
    file_extension_is_one_of(file_name, SUPPORTED_TS_EXTENSIONS)
        || (options.allow_js && file_extension_is_one_of(file_name, SUPPORTED_JS_EXTENSIONS))
        || (options.resolve_json_module && file_extension_is(file_name, EXTENSION_JSON))
}

fn supported_extensions_text(options: &CompilerOptions) -> String {
    let mut extensions: Vec<&str> = SUPPORTED_TS_EXTENSIONS.to_vec();
    if options.allow_js {
        extensions.extend_from_slice(SUPPORTED_JS_EXTENSIONS);
    }
    if options.resolve_json_module {
        extensions.push(EXTENSION_JSON);
    }
    extensions
        .iter()
        .map(|ext| format!("'{ext}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect_task(
    loader: &FileLoader,
    task: &Arc<ParseTask>,
    processed: &mut ProcessedFiles,
    lib_files: &mut Vec<Arc<SourceFile>>,
    other_files: &mut Vec<Arc<SourceFile>>,
) {
    let Some(outcome) = task.outcome() else {
        return;
    };
    let Some(path) = task.path().cloned() else {
        return;
    };

    let children = task.sub_tasks().snapshot();
    for (child, reason) in children.iter().zip(&outcome.include_reasons) {
        processed
            .include_reasons
            .entry(loader.to_path(child.task.file_name()))
            .or_default()
            .push(reason.clone());
    }
    processed
        .file_diagnostics
        .extend(outcome.diagnostics.iter().cloned());

    match outcome.state {
        ParseTaskState::Redirected => {
            if let Some(target) = &outcome.redirect_target {
                processed.redirect_targets.insert(path, loader.to_path(target));
            }
            return;
        }
        ParseTaskState::AutomaticTypeDirectiveExpanded => {
            processed
                .type_resolutions
                .insert(path, outcome.type_resolutions.clone());
            return;
        }
        ParseTaskState::Loaded | ParseTaskState::Unstarted => {}
    }

    let Some(file) = &outcome.file else {
        processed.missing_files.push(task.file_name().to_string());
        return;
    };

    if task.is_lib() {
        lib_files.push(Arc::clone(file));
        processed.lib_files.insert(path.clone());
    } else {
        other_files.push(Arc::clone(file));
    }
    processed.files_by_path.insert(path.clone(), Arc::clone(file));
    processed
        .resolved_modules
        .insert(path.clone(), outcome.resolved_modules.clone());
    processed
        .type_resolutions
        .insert(path.clone(), outcome.type_resolutions.clone());
    processed
        .source_file_meta_datas
        .insert(path.clone(), outcome.metadata.clone());
    if let Some(specifier) = &outcome.jsx_runtime_import_specifier {
        processed
            .jsx_runtime_import_specifiers
            .insert(path.clone(), specifier.clone());
    }
    if let Some(specifier) = &outcome.import_helpers_import_specifier {
        processed
            .import_helpers_import_specifiers
            .insert(path.clone(), specifier.clone());
    }
    if task.is_from_external_library() {
        processed.source_files_found_searching_node_modules.insert(path);
    }
}

#[cfg(test)]
#[path = "../tests/file_loader.rs"]
mod tests;
