//! Expansion of a config's `files` / `include` / `exclude` into root files.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use rustc_hash::{FxHashMap, FxHashSet};
use walkdir::WalkDir;

use tsz_common::CompilerOptions;
use tsz_common::path::{
    EXTENSION_DTS, EXTENSION_JS, EXTENSION_JSX, EXTENSION_TS, EXTENSION_TSX,
    SUPPORTED_JS_EXTENSIONS, SUPPORTED_TS_EXTENSIONS, combine_paths, convert_to_relative_path,
    file_extension_is_one_of, get_base_file_name, get_directory_path, remove_file_extension,
    resolve_path, starts_with_directory,
};

use crate::config::TsConfig;
use crate::disk_host::path_to_string;

/// Excluded when a config has no `exclude` of its own.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// When two files differ only by extension, the earlier extension wins.
const EXTENSION_PRIORITY: &[&str] = &[
    EXTENSION_TS,
    EXTENSION_TSX,
    EXTENSION_DTS,
    EXTENSION_JS,
    EXTENSION_JSX,
];

#[derive(Debug, Clone, Default)]
pub struct FileDiscoveryOptions {
    /// Directory relative specs are resolved against.
    pub base_dir: String,
    /// Explicit files, kept in order and not checked for existence.
    pub files: Vec<String>,
    /// Absolute include specs. Empty means no wildcard expansion.
    pub include: Vec<String>,
    /// Absolute exclude specs.
    pub exclude: Vec<String>,
    pub allow_js: bool,
    pub follow_links: bool,
}

impl FileDiscoveryOptions {
    /// Specs of an already rebased config.
    #[must_use]
    pub fn from_tsconfig(config_dir: &str, config: &TsConfig, options: &CompilerOptions) -> Self {
        let include = match (&config.include, &config.files) {
            (Some(include), _) => include.clone(),
            (None, Some(_)) => Vec::new(),
            (None, None) => vec![combine_paths(config_dir, &["**/*"])],
        };
        let exclude = match &config.exclude {
            Some(exclude) => exclude.clone(),
            None => DEFAULT_EXCLUDES
                .iter()
                .map(|name| combine_paths(config_dir, &[*name]))
                .chain(
                    [options.out_dir.as_deref(), options.declaration_dir.as_deref()]
                        .into_iter()
                        .flatten()
                        .map(|dir| resolve_path(config_dir, &[dir])),
                )
                .collect(),
        };
        Self {
            base_dir: config_dir.to_string(),
            files: config.files.clone().unwrap_or_default(),
            include,
            exclude,
            allow_js: options.allow_js,
            follow_links: false,
        }
    }

    /// Include specs as written relative to the base directory.
    #[must_use]
    pub fn include_specs(&self) -> Vec<String> {
        self.relative_specs(&self.include)
    }

    #[must_use]
    pub fn exclude_specs(&self) -> Vec<String> {
        self.relative_specs(&self.exclude)
    }

    fn relative_specs(&self, specs: &[String]) -> Vec<String> {
        specs
            .iter()
            .map(|spec| {
                let relative = convert_to_relative_path(spec, &self.base_dir, false);
                relative.strip_prefix("./").map_or(relative.clone(), str::to_string)
            })
            .collect()
    }
}

/// Can a file with this name be a program root?
#[must_use]
pub fn is_valid_module_file(path: &str, allow_js: bool) -> bool {
    file_extension_is_one_of(path, SUPPORTED_TS_EXTENSIONS)
        || (allow_js && file_extension_is_one_of(path, SUPPORTED_JS_EXTENSIONS))
}

fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Specs without a wildcard or extension in their last component name a
/// directory and match everything below it.
fn expand_include_spec(spec: &str) -> String {
    let spec = spec.trim_end_matches('/');
    let last = get_base_file_name(spec);
    if last == "**" {
        format!("{spec}/*")
    } else if !has_wildcard(&last) && !last.contains('.') {
        format!("{spec}/**/*")
    } else {
        spec.to_string()
    }
}

/// Longest wildcard-free directory prefix of a spec.
fn walk_root(spec: &str) -> String {
    let components: Vec<&str> = spec.split('/').collect();
    match components.iter().position(|component| has_wildcard(component)) {
        Some(index) => {
            let root = components[..index].join("/");
            if root.is_empty() { "/".to_string() } else { root }
        }
        None => get_directory_path(spec),
    }
}

fn build_glob_set(patterns: impl IntoIterator<Item = String>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid file pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build file pattern set")
}

/// Explicit files first, then wildcard matches in directory order.
pub fn discover_ts_files(options: &FileDiscoveryOptions) -> Result<Vec<String>> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    for file in &options.files {
        let file = resolve_path(&options.base_dir, &[file.as_str()]);
        if seen.insert(file.clone()) {
            result.push(file);
        }
    }
    if options.include.is_empty() {
        return Ok(result);
    }

    let include_specs: Vec<String> = options
        .include
        .iter()
        .map(|spec| resolve_path(&options.base_dir, &[spec.as_str()]))
        .map(|spec| expand_include_spec(&spec))
        .collect();
    let include_set = build_glob_set(include_specs.iter().cloned())?;
    let exclude_set = build_glob_set(options.exclude.iter().flat_map(|spec| {
        let spec = resolve_path(&options.base_dir, &[spec.as_str()]);
        [format!("{spec}/**"), spec]
    }))?;

    let mut roots: Vec<String> = Vec::new();
    for root in include_specs.iter().map(|spec| walk_root(spec)) {
        let nested = roots
            .iter()
            .any(|known| *known == root || starts_with_directory(&root, known, true));
        if !nested {
            roots.retain(|known| !starts_with_directory(known, &root, true));
            roots.push(root);
        }
    }

    let mut matched = Vec::new();
    for root in roots.iter().filter(|root| Path::new(root.as_str()).is_dir()) {
        let walker = WalkDir::new(root)
            .follow_links(options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !exclude_set.is_match(path_to_string(entry.path()))
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = path_to_string(entry.path());
            if is_valid_module_file(&path, options.allow_js) && include_set.is_match(&path) {
                matched.push(path);
            }
        }
    }

    for file in remove_lower_priority_duplicates(matched) {
        if seen.insert(file.clone()) {
            result.push(file);
        }
    }
    Ok(result)
}

fn extension_priority(path: &str) -> usize {
    EXTENSION_PRIORITY
        .iter()
        .position(|ext| {
            path.ends_with(ext) && (*ext != EXTENSION_TS || !path.ends_with(EXTENSION_DTS))
        })
        .unwrap_or(EXTENSION_PRIORITY.len())
}

/// `a.ts` hides `a.d.ts` and `a.js`; order is that of first appearance.
fn remove_lower_priority_duplicates(files: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(files.len());
    let mut by_stem: FxHashMap<String, usize> = FxHashMap::default();
    for file in files {
        let stem = remove_file_extension(&file).to_string();
        match by_stem.get(&stem) {
            Some(&index) => {
                if extension_priority(&file) < extension_priority(&kept[index]) {
                    kept[index] = file;
                }
            }
            None => {
                by_stem.insert(stem, kept.len());
                kept.push(file);
            }
        }
    }
    kept
}

#[cfg(test)]
#[path = "../tests/discovery.rs"]
mod tests;
