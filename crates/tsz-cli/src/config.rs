//! `tsconfig.json` loading.
//!
//! Configs are JSON with comments and trailing commas. `extends` chains are
//! followed and merged child-over-base; every path-valued setting is made
//! absolute against the config that declared it before merging, so a base
//! config's `outDir` or `include` keeps pointing where its author meant.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use tsz_common::diagnostics::diagnostic_codes;
use tsz_common::path::{
    EXTENSION_JSON, combine_paths, file_extension_is, get_directory_path, is_rooted_disk_path,
    resolve_path,
};
use tsz_common::{CompilerOptions, Diagnostic, JsxEmit, ScriptTarget};
use tsz_loader::ParsedCommandLine;

use crate::discovery::{FileDiscoveryOptions, discover_ts_files};
use crate::disk_host::path_to_string;

pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Custom deserializer for boolean options that accepts both bool and string values.
/// This handles cases where tsconfig.json contains `"allowJs": "true"` instead of `"allowJs": true`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub compiler_options: Option<TsConfigCompilerOptions>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub references: Option<Vec<ProjectReference>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectReference {
    pub path: String,
}

/// The `compilerOptions` that decide which files a program loads.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TsConfigCompilerOptions {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub lib: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub no_lib: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub no_resolve: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub allow_js: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub resolve_json_module: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub allow_arbitrary_extensions: Option<bool>,
    #[serde(default)]
    pub max_node_module_js_depth: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub import_helpers: Option<bool>,
    #[serde(default)]
    pub jsx: Option<String>,
    #[serde(default)]
    pub jsx_import_source: Option<String>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub type_roots: Option<Vec<String>>,
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub declaration_dir: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub declaration: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub composite: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub preserve_symlinks: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub disable_source_of_project_reference_redirect: Option<bool>,
}

impl TsConfigCompilerOptions {
    fn rebase(&mut self, dir: &str) {
        for value in [&mut self.root_dir, &mut self.out_dir, &mut self.declaration_dir]
            .into_iter()
            .flatten()
        {
            *value = resolve_path(dir, &[value.as_str()]);
        }
        if let Some(roots) = &mut self.type_roots {
            for root in roots {
                *root = resolve_path(dir, &[root.as_str()]);
            }
        }
    }
}

impl TsConfig {
    /// Make every path-valued setting absolute against `dir`.
    fn rebase(&mut self, dir: &str) {
        if let Some(options) = &mut self.compiler_options {
            options.rebase(dir);
        }
        for list in [&mut self.files, &mut self.include, &mut self.exclude]
            .into_iter()
            .flatten()
        {
            for entry in list {
                *entry = resolve_path(dir, &[entry.as_str()]);
            }
        }
        if let Some(references) = &mut self.references {
            for reference in references {
                reference.path = resolve_project_reference_path(dir, &reference.path);
            }
        }
    }
}

/// A `references` entry names a config file or a directory holding one.
#[must_use]
pub fn resolve_project_reference_path(config_dir: &str, reference: &str) -> String {
    let resolved = resolve_path(config_dir, &[reference]);
    if file_extension_is(&resolved, EXTENSION_JSON) {
        resolved
    } else {
        combine_paths(&resolved, &[CONFIG_FILE_NAME])
    }
}

pub fn parse_tsconfig(source: &str) -> Result<TsConfig> {
    let normalized = jsonc_to_json(source);
    let config = serde_json::from_str(&normalized).context("failed to parse tsconfig JSON")?;
    Ok(config)
}

/// Load a config and everything it extends. Paths in the result are absolute.
pub fn load_tsconfig(path: &Path) -> Result<TsConfig> {
    let mut visited = FxHashSet::default();
    load_tsconfig_inner(path, &mut visited)
}

fn load_tsconfig_inner(path: &Path, visited: &mut FxHashSet<PathBuf>) -> Result<TsConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("tsconfig extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tsconfig: {}", path.display()))?;
    let mut config = parse_tsconfig(&source)
        .with_context(|| format!("failed to parse tsconfig: {}", path.display()))?;
    config.rebase(&get_directory_path(&path_to_string(path)));

    if let Some(extends) = config.extends.take() {
        let base_path = resolve_extends_path(path, &extends)?;
        let base_config = load_tsconfig_inner(&base_path, visited)?;
        config = merge_configs(base_config, config);
    }

    visited.remove(&canonical);
    Ok(config)
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| anyhow!("tsconfig has no parent directory"))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }

    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

fn merge_configs(base: TsConfig, mut child: TsConfig) -> TsConfig {
    let merged_compiler_options = match (base.compiler_options, child.compiler_options.take()) {
        (Some(base_opts), Some(child_opts)) => Some(merge_compiler_options(base_opts, child_opts)),
        (Some(base_opts), None) => Some(base_opts),
        (None, Some(child_opts)) => Some(child_opts),
        (None, None) => None,
    };

    TsConfig {
        extends: None,
        compiler_options: merged_compiler_options,
        include: child.include.or(base.include),
        exclude: child.exclude.or(base.exclude),
        files: child.files.or(base.files),
        // References are never inherited.
        references: child.references,
    }
}

fn merge_compiler_options(
    base: TsConfigCompilerOptions,
    child: TsConfigCompilerOptions,
) -> TsConfigCompilerOptions {
    TsConfigCompilerOptions {
        target: child.target.or(base.target),
        lib: child.lib.or(base.lib),
        no_lib: child.no_lib.or(base.no_lib),
        no_resolve: child.no_resolve.or(base.no_resolve),
        allow_js: child.allow_js.or(base.allow_js),
        resolve_json_module: child.resolve_json_module.or(base.resolve_json_module),
        allow_arbitrary_extensions: child
            .allow_arbitrary_extensions
            .or(base.allow_arbitrary_extensions),
        max_node_module_js_depth: child
            .max_node_module_js_depth
            .or(base.max_node_module_js_depth),
        import_helpers: child.import_helpers.or(base.import_helpers),
        jsx: child.jsx.or(base.jsx),
        jsx_import_source: child.jsx_import_source.or(base.jsx_import_source),
        types: child.types.or(base.types),
        type_roots: child.type_roots.or(base.type_roots),
        root_dir: child.root_dir.or(base.root_dir),
        out_dir: child.out_dir.or(base.out_dir),
        declaration_dir: child.declaration_dir.or(base.declaration_dir),
        declaration: child.declaration.or(base.declaration),
        composite: child.composite.or(base.composite),
        preserve_symlinks: child.preserve_symlinks.or(base.preserve_symlinks),
        disable_source_of_project_reference_redirect: child
            .disable_source_of_project_reference_redirect
            .or(base.disable_source_of_project_reference_redirect),
    }
}

/// Typed options from raw tsconfig values.
pub fn resolve_compiler_options(
    raw: Option<&TsConfigCompilerOptions>,
    config_file: Option<&str>,
) -> Result<CompilerOptions> {
    let mut options = CompilerOptions {
        config_file_path: config_file.map(str::to_string),
        ..Default::default()
    };
    let Some(raw) = raw else {
        return Ok(options);
    };

    if let Some(target) = raw.target.as_deref() {
        options.target = ScriptTarget::parse(target)
            .ok_or_else(|| anyhow!("unsupported compilerOptions.target '{target}'"))?;
    }
    if let Some(jsx) = raw.jsx.as_deref() {
        options.jsx =
            JsxEmit::parse(jsx).ok_or_else(|| anyhow!("unsupported compilerOptions.jsx '{jsx}'"))?;
    }
    options.lib = raw
        .lib
        .as_ref()
        .map(|libs| libs.iter().map(|lib| lib.trim().to_ascii_lowercase()).collect());
    options.no_lib = raw.no_lib.unwrap_or(false);
    options.no_resolve = raw.no_resolve.unwrap_or(false);
    options.allow_js = raw.allow_js.unwrap_or(false);
    options.resolve_json_module = raw.resolve_json_module.unwrap_or(false);
    options.allow_non_ts_extensions = raw.allow_arbitrary_extensions.unwrap_or(false);
    options.max_node_module_js_depth = raw.max_node_module_js_depth;
    options.import_helpers = raw.import_helpers.unwrap_or(false);
    options.jsx_import_source = raw.jsx_import_source.clone();
    options.types = raw.types.clone();
    options.type_roots = raw.type_roots.clone();
    options.root_dir = raw.root_dir.clone();
    options.out_dir = raw.out_dir.clone();
    options.declaration_dir = raw.declaration_dir.clone();
    options.composite = raw.composite.unwrap_or(false);
    options.declaration = raw.declaration.unwrap_or(options.composite);
    options.preserve_symlinks = raw.preserve_symlinks.unwrap_or(false);
    options.disable_source_of_project_reference_redirect = raw
        .disable_source_of_project_reference_redirect
        .unwrap_or(false);
    Ok(options)
}

/// A config file read, merged and expanded into its input files.
#[derive(Debug)]
pub struct ParsedConfigFile {
    /// Absolute, `/`-separated.
    pub config_file_name: String,
    pub options: CompilerOptions,
    pub file_names: Vec<String>,
    /// Absolute config file names, in declaration order.
    pub project_references: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedConfigFile {
    #[must_use]
    pub fn into_command_line(
        self,
        current_directory: &str,
        use_case_sensitive_file_names: bool,
    ) -> ParsedCommandLine {
        ParsedCommandLine::new(
            self.config_file_name,
            self.options,
            self.file_names,
            self.project_references,
            current_directory,
            use_case_sensitive_file_names,
        )
    }
}

pub fn parse_config_file(config_path: &Path) -> Result<ParsedConfigFile> {
    let config_file_name = path_to_string(config_path);
    if !is_rooted_disk_path(&config_file_name) {
        bail!("config path must be absolute: {config_file_name}");
    }
    let config = load_tsconfig(config_path)?;
    let options = resolve_compiler_options(config.compiler_options.as_ref(), Some(&config_file_name))?;

    let config_dir = get_directory_path(&config_file_name);
    let discovery = FileDiscoveryOptions::from_tsconfig(&config_dir, &config, &options);
    let file_names = discover_ts_files(&discovery)?;
    let project_references: Vec<String> = config
        .references
        .iter()
        .flatten()
        .map(|reference| reference.path.clone())
        .collect();

    let mut diagnostics = Vec::new();
    let only_references =
        config.files.as_ref().is_some_and(Vec::is_empty) && !project_references.is_empty();
    if file_names.is_empty() && !only_references {
        let include = serde_json::to_string(&discovery.include_specs()).unwrap_or_default();
        let exclude = serde_json::to_string(&discovery.exclude_specs()).unwrap_or_default();
        diagnostics.push(Diagnostic::global(
            diagnostic_codes::NO_INPUTS_WERE_FOUND_IN_CONFIG_FILE,
            &[config_file_name.as_str(), include.as_str(), exclude.as_str()],
        ));
    }

    tracing::debug!(
        config = %config_file_name,
        files = file_names.len(),
        references = project_references.len(),
        "parsed config file"
    );
    Ok(ParsedConfigFile {
        config_file_name,
        options,
        file_names,
        project_references,
        diagnostics,
    })
}

/// `tsconfig.json` in `start` or the nearest ancestor.
#[must_use]
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// `-p` accepts a config file or a directory holding `tsconfig.json`.
#[must_use]
pub fn resolve_project_argument(cwd: &Path, project: &Path) -> PathBuf {
    let path = cwd.join(project);
    if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path
    }
}

/// Turn tsconfig JSONC into plain JSON: drop `//` and `/* */` comments
/// (keeping their newlines so serde positions stay on the right line) and
/// drop a comma when the next significant character closes an object or
/// array.
fn jsonc_to_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                out.push(ch);
                let mut escaped = false;
                for ch in chars.by_ref() {
                    out.push(ch);
                    match ch {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        out.push(ch);
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                for ch in chars.by_ref() {
                    if star && ch == '/' {
                        break;
                    }
                    star = ch == '*';
                    if ch == '\n' {
                        out.push(ch);
                    }
                }
            }
            '}' | ']' => {
                let kept = out.trim_end_matches(char::is_whitespace).len();
                if out[..kept].ends_with(',') {
                    out.remove(kept - 1);
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
#[path = "../tests/config.rs"]
mod tests;
