//! Command-line driver: config, options, program loading and output.

use anyhow::{Result, bail};
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use tsz_common::path::{convert_to_relative_path, resolve_path};
use tsz_common::{CompilerOptions, Diagnostic};
use tsz_loader::{
    CompilerHost, ModuleResolver, ParsedCommandLine, ProcessedFiles, ProgramOptions,
    ResolutionHost, SourceFileParser, process_all_program_files,
};

use crate::args::CliArgs;
use crate::config::{find_config_file, parse_config_file, resolve_project_argument};
use crate::disk_host::{DiskHost, default_library_path, path_to_string};
use crate::reporter::Reporter;
use crate::resolver::NodeModuleResolver;
use crate::scanner::TextScanParser;

/// tsc exit status codes (matching TypeScript's ExitStatus enum)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIAGNOSTICS_OUTPUTS_SKIPPED: i32 = 1;

/// A loaded program and everything reported on the way.
pub struct LoadResult {
    pub processed: ProcessedFiles,
    /// Problems with the config file itself, reported before file diagnostics.
    pub config_diagnostics: Vec<Diagnostic>,
    pub current_directory: String,
}

impl LoadResult {
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.config_diagnostics
            .iter()
            .chain(&self.processed.file_diagnostics)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.config_diagnostics
            .iter()
            .chain(&self.processed.file_diagnostics)
            .filter(|diagnostic| diagnostic.is_error())
            .count()
    }
}

/// Command-line flags win over the config file.
pub fn apply_cli_overrides(options: &mut CompilerOptions, args: &CliArgs, cwd: &str) {
    if let Some(target) = args.target {
        options.target = target;
    }
    if let Some(libs) = args.lib.as_ref() {
        options.lib = Some(libs.iter().map(|lib| lib.trim().to_ascii_lowercase()).collect());
    }
    if args.no_lib {
        options.no_lib = true;
    }
    if let Some(jsx) = args.jsx {
        options.jsx = jsx;
    }
    if let Some(source) = args.jsx_import_source.as_ref() {
        options.jsx_import_source = Some(source.clone());
    }
    if args.no_resolve {
        options.no_resolve = true;
    }
    if let Some(type_roots) = args.type_roots.as_ref() {
        options.type_roots = Some(
            type_roots
                .iter()
                .map(|root| resolve_path(cwd, &[root.as_str()]))
                .collect(),
        );
    }
    if let Some(types) = args.types.as_ref() {
        options.types = Some(
            types
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        );
    }
    if args.resolve_json_module {
        options.resolve_json_module = true;
    }
    if args.preserve_symlinks {
        options.preserve_symlinks = true;
    }
    if args.allow_js {
        options.allow_js = true;
    }
    if let Some(depth) = args.max_node_module_js_depth {
        options.max_node_module_js_depth = Some(depth);
    }
    if args.import_helpers {
        options.import_helpers = true;
    }
    if args.disable_source_of_project_reference_redirect {
        options.disable_source_of_project_reference_redirect = true;
    }
}

/// `-p`, else the nearest `tsconfig.json` when no files are named.
fn locate_config(args: &CliArgs, cwd: &Path) -> Result<Option<std::path::PathBuf>> {
    if let Some(project) = args.project.as_ref() {
        let path = resolve_project_argument(cwd, project);
        if !path.is_file() {
            bail!(
                "Cannot find a tsconfig.json file at the specified directory: '{}'.",
                project.display()
            );
        }
        return Ok(Some(path));
    }
    if args.files.is_empty() {
        return Ok(find_config_file(cwd));
    }
    Ok(None)
}

/// Resolve the config, build the options and load every program file.
pub fn load_program(args: &CliArgs, cwd: &Path) -> Result<LoadResult> {
    let current_directory = path_to_string(cwd);
    let host = DiskHost::new(cwd, &default_library_path(args.lib_dir.as_deref(), cwd));
    let case_sensitive = host.use_case_sensitive_file_names();

    let (options, root_files, config, config_diagnostics) = match locate_config(args, cwd)? {
        Some(config_path) => {
            let parsed = parse_config_file(&config_path)?;
            let mut options = parsed.options.clone();
            apply_cli_overrides(&mut options, args, &current_directory);
            let root_files = parsed.file_names.clone();
            let config_diagnostics = parsed.diagnostics.clone();
            let config = ParsedCommandLine::new(
                parsed.config_file_name,
                options.clone(),
                parsed.file_names,
                parsed.project_references,
                current_directory.as_str(),
                case_sensitive,
            );
            (options, root_files, Some(Arc::new(config)), config_diagnostics)
        }
        None => {
            if args.files.is_empty() {
                bail!("No input files and no tsconfig.json found in '{current_directory}'.");
            }
            let mut options = CompilerOptions::default();
            apply_cli_overrides(&mut options, args, &current_directory);
            let root_files = args
                .files
                .iter()
                .map(|file| resolve_path(&current_directory, &[path_to_string(file).as_str()]))
                .collect();
            (options, root_files, None, Vec::new())
        }
    };

    tracing::info!(
        roots = root_files.len(),
        config = config.as_ref().map(|c| c.config_file_name.as_str()),
        "loading program"
    );
    let processed = process_all_program_files(ProgramOptions {
        host: Arc::new(host) as Arc<dyn CompilerHost>,
        parser: Arc::new(TextScanParser::new()) as Arc<dyn SourceFileParser>,
        resolver: Arc::new(NodeModuleResolver::new()) as Arc<dyn ModuleResolver>,
        options: Arc::new(options),
        root_files,
        config,
        single_threaded: args.single_threaded,
        use_source_of_project_reference_redirect: false,
    })?;
    tracing::info!(
        files = processed.files.len(),
        total = processed.total_file_count,
        libs = processed.lib_file_count,
        "program loaded"
    );

    Ok(LoadResult {
        processed,
        config_diagnostics,
        current_directory,
    })
}

fn write_file_list(out: &mut dyn Write, processed: &ProcessedFiles) -> Result<()> {
    for file in &processed.files {
        writeln!(out, "{}", file.file_name)?;
    }
    Ok(())
}

fn write_explained_files(out: &mut dyn Write, result: &LoadResult) -> Result<()> {
    let processed = &result.processed;
    for file in &processed.files {
        writeln!(
            out,
            "{}",
            convert_to_relative_path(&file.file_name, &result.current_directory, false)
        )?;
        for reason in processed.include_reasons.get(&file.path).into_iter().flatten() {
            writeln!(out, "  {reason}")?;
        }
    }
    Ok(())
}

fn error_summary(count: usize) -> String {
    if count == 1 {
        "Found 1 error.".to_string()
    } else {
        format!("Found {count} errors.")
    }
}

/// Run one invocation, writing everything to `out`. Returns the exit code.
pub fn run(args: &CliArgs, cwd: &Path, out: &mut dyn Write) -> Result<i32> {
    let result = load_program(args, cwd)?;

    if args.list_files_only {
        write_file_list(out, &result.processed)?;
        return Ok(EXIT_SUCCESS);
    }

    let diagnostics = result.diagnostics();
    if !diagnostics.is_empty() {
        let pretty = args.pretty.unwrap_or_else(|| std::io::stdout().is_terminal());
        let mut reporter = Reporter::new(pretty);
        writeln!(out, "{}", reporter.render(&diagnostics))?;
    }
    if args.list_files {
        write_file_list(out, &result.processed)?;
    }
    if args.explain_files {
        write_explained_files(out, &result)?;
    }

    let error_count = result.error_count();
    if error_count > 0 {
        writeln!(out, "\n{}", error_summary(error_count))?;
        return Ok(EXIT_DIAGNOSTICS_OUTPUTS_SKIPPED);
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
#[path = "../tests/driver.rs"]
mod tests;
