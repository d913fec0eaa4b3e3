//! Per-file unit of work.
//!
//! Loading a [`ParseTask`] ends in one of three states:
//! - `AutomaticTypeDirectiveExpanded`: the synthetic root whose children are
//!   the automatically included type packages. Nothing is parsed.
//! - `Redirected`: the file is stood in for by another one (a referenced
//!   project's source or output). One child, nothing parsed.
//! - `Loaded`: the file was read and parsed (or found missing) and its
//!   references became children.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tsz_common::diagnostics::diagnostic_codes;
use tsz_common::path::normalize_path;
use tsz_common::{Diagnostic, ResolvedPath};

use crate::file_loader::FileLoader;
use crate::include_reason::{FileIncludeKind, FileIncludeReason};
use crate::libs::get_lib_file_name;
use crate::resolution::{ModeAwareCache, ResolvedModule, ResolvedTypeReferenceDirective};
use crate::source_file::{ModuleSpecifier, SourceFile, SourceFileMetaData};
use crate::worker::{LoaderTask, SubTasks, TaskEdge, TaskRef};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseTaskState {
    #[default]
    Unstarted,
    Loaded,
    Redirected,
    AutomaticTypeDirectiveExpanded,
}

/// A reference that produced a child task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRef {
    pub file_name: String,
    pub increase_depth: bool,
    pub elide_on_depth: bool,
    pub is_from_external_library: bool,
    pub reason: FileIncludeReason,
}

impl ResolvedRef {
    #[must_use]
    pub fn new(file_name: impl Into<String>, reason: FileIncludeReason) -> Self {
        Self {
            file_name: file_name.into(),
            increase_depth: false,
            elide_on_depth: false,
            is_from_external_library: false,
            reason,
        }
    }
}

/// Sub-tasks and the reasons they were added, index for index.
#[derive(Default)]
struct Children {
    tasks: Vec<TaskRef<ParseTask>>,
    reasons: Vec<FileIncludeReason>,
}

impl Children {
    fn push(&mut self, reference: &ResolvedRef, is_lib: bool) {
        self.tasks
            .push(TaskRef::new(ParseTask::from_reference(reference, is_lib)));
        self.reasons.push(reference.reason.clone());
    }

    fn extend(&mut self, references: &[ResolvedRef]) {
        for reference in references {
            self.push(reference, false);
        }
    }
}

/// The implicitly imported JSX runtime module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsxRuntimeImportSpecifier {
    pub module_reference: String,
    pub specifier: ModuleSpecifier,
}

/// What loading produced.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub state: ParseTaskState,
    /// `None` when the file could not be read, or when nothing was parsed.
    pub file: Option<Arc<SourceFile>>,
    pub metadata: SourceFileMetaData,
    /// Target of a redirect.
    pub redirect_target: Option<String>,
    pub resolved_modules: ModeAwareCache<ResolvedModule>,
    pub type_resolutions: ModeAwareCache<ResolvedTypeReferenceDirective>,
    pub import_helpers_import_specifier: Option<ModuleSpecifier>,
    pub jsx_runtime_import_specifier: Option<JsxRuntimeImportSpecifier>,
    /// Unresolved references found in this file.
    pub diagnostics: Vec<Diagnostic>,
    /// Why each sub-task was added, in sub-task order.
    pub include_reasons: Vec<FileIncludeReason>,
}

#[derive(Debug)]
pub struct ParseTask {
    file_name: String,
    path: OnceLock<ResolvedPath>,
    is_lib: bool,
    root: bool,
    is_for_automatic_type_directive: bool,
    increase_depth: bool,
    elide_on_depth: bool,
    from_external_library: AtomicBool,
    outcome: OnceLock<ParseOutcome>,
    sub_tasks: SubTasks<ParseTask>,
}

impl ParseTask {
    fn with_name(file_name: String) -> Self {
        Self {
            file_name,
            path: OnceLock::new(),
            is_lib: false,
            root: false,
            is_for_automatic_type_directive: false,
            increase_depth: false,
            elide_on_depth: false,
            from_external_library: AtomicBool::new(false),
            outcome: OnceLock::new(),
            sub_tasks: SubTasks::default(),
        }
    }

    /// Entry point supplied by the caller.
    #[must_use]
    pub fn root(file_name: impl Into<String>) -> Self {
        Self {
            root: true,
            ..Self::with_name(file_name.into())
        }
    }

    /// Entry point for a default or configured lib file.
    #[must_use]
    pub fn root_lib(file_name: impl Into<String>) -> Self {
        Self {
            is_lib: true,
            ..Self::root(file_name)
        }
    }

    /// Synthetic entry point whose children are the automatic type packages.
    #[must_use]
    pub fn automatic_type_directives(file_name: impl Into<String>) -> Self {
        Self {
            is_for_automatic_type_directive: true,
            ..Self::root(file_name)
        }
    }

    /// Child discovered through `reference`.
    #[must_use]
    pub fn from_reference(reference: &ResolvedRef, is_lib: bool) -> Self {
        Self {
            is_lib,
            increase_depth: reference.increase_depth,
            elide_on_depth: reference.elide_on_depth,
            from_external_library: AtomicBool::new(reference.is_from_external_library),
            ..Self::with_name(normalize_path(&reference.file_name))
        }
    }

    #[must_use]
    pub fn is_lib(&self) -> bool {
        self.is_lib
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root
    }

    #[must_use]
    pub fn is_for_automatic_type_directive(&self) -> bool {
        self.is_for_automatic_type_directive
    }

    #[must_use]
    pub fn state(&self) -> ParseTaskState {
        self.outcome.get().map_or(ParseTaskState::Unstarted, |o| o.state)
    }

    #[must_use]
    pub fn is_redirected(&self) -> bool {
        self.state() == ParseTaskState::Redirected
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&ParseOutcome> {
        self.outcome.get()
    }

    #[must_use]
    pub fn file(&self) -> Option<&Arc<SourceFile>> {
        self.outcome.get().and_then(|o| o.file.as_ref())
    }

    fn load_automatic_type_directives(&self, loader: &FileLoader) -> (ParseOutcome, Children) {
        let (to_parse, type_resolutions, diagnostics) =
            loader.resolve_automatic_type_directives(&self.file_name);
        let mut children = Children::default();
        children.extend(&to_parse);
        let outcome = ParseOutcome {
            state: ParseTaskState::AutomaticTypeDirectiveExpanded,
            type_resolutions,
            diagnostics,
            ..Default::default()
        };
        (outcome, children)
    }

    fn redirect(&self, target: String) -> (ParseOutcome, Children) {
        // The redirect hop carries no depth of its own.
        let reference = ResolvedRef {
            is_from_external_library: self.from_external_library.load(Ordering::Relaxed),
            ..ResolvedRef::new(
                target.clone(),
                FileIncludeReason::new(FileIncludeKind::ProjectReferenceRedirect, "")
                    .from_file(self.file_name.clone()),
            )
        };
        let mut children = Children::default();
        children.push(&reference, self.is_lib);
        let outcome = ParseOutcome {
            state: ParseTaskState::Redirected,
            redirect_target: Some(normalize_path(&target)),
            ..Default::default()
        };
        (outcome, children)
    }

    fn load_file(&self, loader: &FileLoader, path: &ResolvedPath) -> (ParseOutcome, Children) {
        loader.count_file(self.is_lib);
        let metadata = loader.load_source_file_meta_data(&self.file_name, path);
        let Some(file) = loader.parse_source_file(&self.file_name, path, &metadata) else {
            tracing::debug!(file = %self.file_name, "file not found");
            let outcome = ParseOutcome {
                state: ParseTaskState::Loaded,
                metadata,
                ..Default::default()
            };
            return (outcome, Children::default());
        };

        let mut children = Children::default();
        let mut diagnostics = Vec::new();
        let options = loader.options_for_file(&self.file_name, path);

        if !options.no_resolve {
            for reference in &file.referenced_files {
                let file_name =
                    loader.resolve_tripleslash_path_reference(&reference.file_name, &file.file_name);
                let reason = FileIncludeReason::new(FileIncludeKind::ReferenceFile, &reference.file_name)
                    .from_file(file.file_name.clone());
                children.push(&ResolvedRef::new(file_name, reason), false);
            }
        }

        let (type_refs, type_resolutions) =
            loader.resolve_type_reference_directives(&file, &metadata, &mut diagnostics);
        children.extend(&type_refs);

        if !options.no_lib {
            for lib in &file.lib_reference_directives {
                match get_lib_file_name(&lib.file_name) {
                    Some(lib_file_name) => {
                        let reason =
                            FileIncludeReason::new(FileIncludeKind::LibReferenceDirective, &lib.file_name)
                                .from_file(file.file_name.clone());
                        children.push(
                            &ResolvedRef::new(loader.path_for_lib_file(&lib_file_name), reason),
                            true,
                        );
                    }
                    None => diagnostics.push(Diagnostic::from_code(
                        &file.file_name,
                        lib.pos,
                        lib.end.saturating_sub(lib.pos),
                        diagnostic_codes::CANNOT_FIND_LIB_DEFINITION_FOR,
                        &[&lib.file_name],
                    )),
                }
            }
        }

        let imports = loader.resolve_imports_and_module_augmentations(
            &file,
            &metadata,
            &options,
            &mut diagnostics,
        );
        children.extend(&imports.to_parse);

        let outcome = ParseOutcome {
            state: ParseTaskState::Loaded,
            file: Some(Arc::new(file)),
            metadata,
            redirect_target: None,
            resolved_modules: imports.resolutions,
            type_resolutions,
            import_helpers_import_specifier: imports.import_helpers_import_specifier,
            jsx_runtime_import_specifier: imports.jsx_runtime_import_specifier,
            diagnostics,
            include_reasons: Vec::new(),
        };
        (outcome, children)
    }
}

impl LoaderTask for ParseTask {
    type Loader = FileLoader;

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn path(&self) -> Option<&ResolvedPath> {
        self.path.get()
    }

    fn is_loaded(&self) -> bool {
        self.outcome.get().is_some()
    }

    fn load<'scope>(&self, loader: &'scope FileLoader, _scope: &rayon::Scope<'scope>) {
        let path = self.path.get_or_init(|| loader.to_path(&self.file_name));

        let (mut outcome, children) = if self.is_for_automatic_type_directive {
            self.load_automatic_type_directives(loader)
        } else if let Some(target) = loader
            .mapper()
            .and_then(|mapper| mapper.get_parse_file_redirect(&self.file_name, path))
        {
            tracing::debug!(file = %self.file_name, %target, "redirected");
            self.redirect(target)
        } else {
            self.load_file(loader, path)
        };

        outcome.include_reasons = children.reasons;
        self.sub_tasks.set(children.tasks);
        assert!(
            self.outcome.set(outcome).is_ok(),
            "parse task for {} loaded twice",
            self.file_name
        );
    }

    fn sub_tasks(&self) -> &SubTasks<Self> {
        &self.sub_tasks
    }

    fn edge(&self) -> TaskEdge {
        TaskEdge {
            increase_depth: self.increase_depth,
            elide_on_depth: self.elide_on_depth,
            from_external_library: self.from_external_library.load(Ordering::Relaxed),
            root: self.root,
        }
    }

    fn is_from_external_library(&self) -> bool {
        self.from_external_library.load(Ordering::Relaxed)
    }

    fn mark_from_external_library(&self) {
        self.from_external_library.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "../tests/parse_task.rs"]
mod tests;
