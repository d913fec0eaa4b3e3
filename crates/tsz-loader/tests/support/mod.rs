//! In-memory host, parser and resolver shared by the loader tests.
#![allow(dead_code)]

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use tsz_common::path::{combine_paths, get_directory_path, is_rooted_disk_path, normalize_path};
use tsz_common::{CompilerOptions, ResolvedPath};

use crate::file_loader::{ProcessedFiles, ProgramOptions, process_all_program_files};
use crate::host::{CompilerHost, ResolutionHost};
use crate::parsed_config::ParsedCommandLine;
use crate::resolution::{
    ModuleResolver, ResolutionContext, ResolvedModule, ResolvedTypeReferenceDirective,
};
use crate::source_file::{
    FileReference, ImportKind, ModuleAugmentation, ModuleSpecifier, ResolutionMode, SourceFile,
    SourceFileParseOptions, SourceFileParser,
};

pub const LIB_DIR: &str = "/lib";

const PROBES: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", "/index.ts", "/index.d.ts"];

// =============================================================================
// Host
// =============================================================================

/// Files and symlinked directories held in memory. Case sensitive, rooted
/// at `/`.
#[derive(Default)]
pub struct MemoryHost {
    files: FxHashMap<String, String>,
    /// Link directory to real directory, both without trailing separator.
    symlinks: Vec<(String, String)>,
    configs: FxHashMap<ResolvedPath, Arc<ParsedCommandLine>>,
    pub reads: DashMap<String, usize>,
    pub config_loads: DashMap<String, usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, text: &str) -> Self {
        self.files.insert(normalize_path(name), text.to_string());
        self
    }

    pub fn symlink(mut self, link: &str, real: &str) -> Self {
        self.symlinks
            .push((normalize_path(link), normalize_path(real)));
        self
    }

    pub fn config(mut self, config: ParsedCommandLine) -> Self {
        self.configs
            .insert(config.config_path.clone(), Arc::new(config));
        self
    }

    pub fn read_count(&self, name: &str) -> usize {
        self.reads.get(name).map_or(0, |count| *count)
    }

    pub fn config_load_count(&self, name: &str) -> usize {
        self.config_loads.get(name).map_or(0, |count| *count)
    }

    fn real(&self, path: &str) -> String {
        let path = normalize_path(path);
        for (link, real) in &self.symlinks {
            if path == *link {
                return real.clone();
            }
            if let Some(rest) = path.strip_prefix(&format!("{link}/")) {
                return format!("{real}/{rest}");
            }
        }
        path
    }
}

impl ResolutionHost for MemoryHost {
    fn use_case_sensitive_file_names(&self) -> bool {
        true
    }

    fn current_directory(&self) -> &str {
        "/"
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.contains_key(&self.real(path))
    }

    fn directory_exists(&self, path: &str) -> bool {
        let dir = format!("{}/", self.real(path).trim_end_matches('/'));
        self.files.keys().any(|name| name.starts_with(&dir))
    }

    fn read_file(&self, path: &str) -> Option<String> {
        *self.reads.entry(normalize_path(path)).or_insert(0) += 1;
        self.files.get(&self.real(path)).cloned()
    }

    fn realpath(&self, path: &str) -> String {
        self.real(path)
    }
}

impl CompilerHost for MemoryHost {
    fn default_library_path(&self) -> String {
        LIB_DIR.to_string()
    }

    fn get_resolved_project_reference(
        &self,
        config_name: &str,
        path: &ResolvedPath,
    ) -> Option<Arc<ParsedCommandLine>> {
        *self
            .config_loads
            .entry(config_name.to_string())
            .or_insert(0) += 1;
        self.configs.get(path).cloned()
    }

    fn as_resolution_host(&self) -> &dyn ResolutionHost {
        self
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Line-oriented parser for test sources.
///
/// Understands `/// <reference path|types|lib="x" />`, `import "x"`,
/// `import("x")`, `require("x")`, `declare module "x"` and
/// `// @jsxImportSource x`.
#[derive(Default)]
pub struct LineParser {
    pub parses: DashMap<String, usize>,
}

impl LineParser {
    pub fn parse_count(&self, name: &str) -> usize {
        self.parses.get(name).map_or(0, |count| *count)
    }
}

fn quoted(line: &str) -> Option<(&str, usize)> {
    let start = line.find(['"', '\''])?;
    let quote = line[start..].chars().next()?;
    let rest = &line[start + 1..];
    let end = rest.find(quote)?;
    Some((&rest[..end], start + 1))
}

impl SourceFileParser for LineParser {
    fn parse_source_file(&self, options: &SourceFileParseOptions, text: &str) -> SourceFile {
        *self.parses.entry(options.file_name.clone()).or_insert(0) += 1;
        let mut file = SourceFile::new(options);
        let mut offset = 0u32;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("export") || trimmed.starts_with("import") {
                file.is_external_module = true;
            }
            let line_start = offset;
            offset += u32::try_from(line.len() + 1).unwrap_or(u32::MAX);
            let Some((name, at)) = quoted(trimmed).map(|(name, at)| (name.to_string(), at)) else {
                if let Some(source) = trimmed.strip_prefix("// @jsxImportSource ") {
                    file.jsx_import_source_pragma = Some(source.trim().to_string());
                }
                continue;
            };
            let pos = line_start + u32::try_from(at).unwrap_or(0);
            let end = pos + u32::try_from(name.len()).unwrap_or(0);
            if trimmed.starts_with("/// <reference path=") {
                file.referenced_files.push(FileReference::new(name, pos, end));
            } else if trimmed.starts_with("/// <reference types=") {
                let mut reference = FileReference::new(name, pos, end);
                if trimmed.contains("resolution-mode=\"import\"") {
                    reference.resolution_mode = Some(ResolutionMode::EsModule);
                }
                file.type_reference_directives.push(reference);
            } else if trimmed.starts_with("/// <reference lib=") {
                file.lib_reference_directives.push(FileReference::new(name, pos, end));
            } else if trimmed.starts_with("declare module") {
                file.module_augmentations.push(ModuleAugmentation::StringLiteral(
                    ModuleSpecifier::new(name, pos, end, ImportKind::Augmentation),
                ));
            } else {
                let kind = if trimmed.contains("require(") {
                    ImportKind::Require
                } else if trimmed.contains("import(") {
                    ImportKind::DynamicImport
                } else if trimmed.starts_with("export") {
                    ImportKind::ExportFrom
                } else {
                    ImportKind::Import
                };
                file.imports.push(ModuleSpecifier::new(name, pos, end, kind));
                file.is_external_module = true;
            }
            file.statement_count += 1;
        }
        file
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Relative specifiers probe the host; bare names come from a package table.
#[derive(Default)]
pub struct TableResolver {
    packages: FxHashMap<String, ResolvedModule>,
    types: FxHashMap<String, ResolvedTypeReferenceDirective>,
    automatic: Vec<String>,
    package_json_types: FxHashMap<String, String>,
    pub module_calls: DashMap<(String, ResolutionMode), usize>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bare `name` resolves to `file`, found by a `node_modules` search.
    pub fn package(mut self, name: &str, file: &str) -> Self {
        self.packages
            .insert(name.to_string(), ResolvedModule::resolved(file, true));
        self
    }

    /// Bare `name` resolves to `file` outside `node_modules` (path mapping).
    pub fn alias(mut self, name: &str, file: &str) -> Self {
        self.packages
            .insert(name.to_string(), ResolvedModule::resolved(file, false));
        self
    }

    pub fn types(mut self, name: &str, file: &str, is_external: bool) -> Self {
        self.types.insert(
            name.to_string(),
            ResolvedTypeReferenceDirective::resolved(file, true, is_external),
        );
        self
    }

    pub fn automatic(mut self, names: &[&str]) -> Self {
        self.automatic = names.iter().map(|name| (*name).to_string()).collect();
        self
    }

    /// Files under `dir` see `type` in their nearest `package.json`.
    pub fn package_json_type(mut self, dir: &str, package_type: &str) -> Self {
        self.package_json_types
            .insert(dir.to_string(), package_type.to_string());
        self
    }

    pub fn calls_for(&self, name: &str, mode: ResolutionMode) -> usize {
        self.module_calls
            .get(&(name.to_string(), mode))
            .map_or(0, |count| *count)
    }
}

impl ModuleResolver for TableResolver {
    fn resolve_module_name(
        &self,
        module_name: &str,
        containing_file: &str,
        mode: ResolutionMode,
        ctx: ResolutionContext<'_>,
    ) -> ResolvedModule {
        *self
            .module_calls
            .entry((module_name.to_string(), mode))
            .or_insert(0) += 1;
        if let Some(resolved) = self.packages.get(module_name) {
            return resolved.clone();
        }
        if !module_name.starts_with('.') && !is_rooted_disk_path(module_name) {
            return ResolvedModule::unresolved();
        }
        let base = combine_paths(&get_directory_path(containing_file), &[module_name]);
        let base = normalize_path(&base);
        if ctx.host.file_exists(&base) {
            return ResolvedModule::resolved(base, false);
        }
        PROBES
            .iter()
            .map(|ext| format!("{base}{ext}"))
            .find(|candidate| ctx.host.file_exists(candidate))
            .map_or_else(ResolvedModule::unresolved, |found| {
                ResolvedModule::resolved(found, false)
            })
    }

    fn resolve_type_reference_directive(
        &self,
        name: &str,
        _containing_file: &str,
        _mode: ResolutionMode,
        _ctx: ResolutionContext<'_>,
    ) -> ResolvedTypeReferenceDirective {
        self.types
            .get(name)
            .cloned()
            .unwrap_or_else(ResolvedTypeReferenceDirective::unresolved)
    }

    fn get_automatic_type_directive_names(&self, ctx: ResolutionContext<'_>) -> Vec<String> {
        ctx.options
            .types
            .clone()
            .unwrap_or_else(|| self.automatic.clone())
    }

    fn get_package_json_type(&self, file_name: &str, _ctx: ResolutionContext<'_>) -> Option<String> {
        self.package_json_types
            .iter()
            .filter(|(dir, _)| file_name.starts_with(dir.as_str()))
            .max_by_key(|(dir, _)| dir.len())
            .map(|(_, package_type)| package_type.clone())
    }
}

// =============================================================================
// Program
// =============================================================================

pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub parser: Arc<LineParser>,
    pub resolver: Arc<TableResolver>,
}

impl Fixture {
    pub fn new(host: MemoryHost, resolver: TableResolver) -> Self {
        Self {
            host: Arc::new(host),
            parser: Arc::new(LineParser::default()),
            resolver: Arc::new(resolver),
        }
    }

    pub fn program_options(&self, options: CompilerOptions, roots: &[&str]) -> ProgramOptions {
        ProgramOptions {
            host: Arc::clone(&self.host) as Arc<dyn CompilerHost>,
            parser: Arc::clone(&self.parser) as Arc<dyn SourceFileParser>,
            resolver: Arc::clone(&self.resolver) as Arc<dyn ModuleResolver>,
            options: Arc::new(options),
            root_files: roots.iter().map(|root| (*root).to_string()).collect(),
            config: None,
            single_threaded: false,
            use_source_of_project_reference_redirect: false,
        }
    }

    /// Load `roots` with libs and automatic types switched off.
    pub fn run(&self, roots: &[&str]) -> ProcessedFiles {
        self.run_with(no_lib(), roots)
    }

    pub fn run_with(&self, options: CompilerOptions, roots: &[&str]) -> ProcessedFiles {
        process_all_program_files(self.program_options(options, roots))
            .expect("program files load")
    }
}

pub fn no_lib() -> CompilerOptions {
    CompilerOptions {
        no_lib: true,
        types: Some(Vec::new()),
        ..Default::default()
    }
}

/// File names of `processed.files`, in order.
pub fn file_names(processed: &ProcessedFiles) -> Vec<&str> {
    processed
        .files
        .iter()
        .map(|file| file.file_name.as_str())
        .collect()
}

pub fn diagnostic_codes(processed: &ProcessedFiles) -> Vec<u32> {
    processed
        .file_diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect()
}
