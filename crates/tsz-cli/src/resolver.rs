//! Node-style module and type reference resolution over a `ResolutionHost`.
//!
//! All file system access goes through the host in the resolution context,
//! so a host that fakes project reference outputs is honored.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tsz_common::path::{
    EXTENSION_CJS, EXTENSION_CTS, EXTENSION_DCTS, EXTENSION_DMTS, EXTENSION_DTS, EXTENSION_JS,
    EXTENSION_JSON, EXTENSION_JSX, EXTENSION_MJS, EXTENSION_MTS, EXTENSION_TS, EXTENSION_TSX,
    combine_paths, contains_node_modules, file_extension_is, get_base_file_name,
    get_directory_path, is_rooted_disk_path, normalize_path, remove_file_extension, resolve_path,
    try_get_extension_from_path,
};
use tsz_loader::host::ResolutionHost;
use tsz_loader::source_file::ResolutionMode;
use tsz_loader::{ModuleResolver, ResolutionContext, ResolvedModule, ResolvedTypeReferenceDirective};

const TS_EXTENSIONS: &[&str] = &[EXTENSION_TS, EXTENSION_TSX, EXTENSION_DTS];
const JS_EXTENSIONS: &[&str] = &[EXTENSION_JS, EXTENSION_JSX];
const DTS_EXTENSIONS: &[&str] = &[EXTENSION_DTS];

/// One pass of a resolution: which files count as a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Extensions {
    TypeScript,
    JavaScript,
    Declaration,
}

impl Extensions {
    const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::TypeScript => TS_EXTENSIONS,
            Self::JavaScript => JS_EXTENSIONS,
            Self::Declaration => DTS_EXTENSIONS,
        }
    }

    /// Sources a JavaScript-extension specifier may stand for.
    fn substitutions(self, extension: &str) -> &'static [&'static str] {
        match (self, extension) {
            (Self::TypeScript, ".js") => &[EXTENSION_TS, EXTENSION_TSX, EXTENSION_DTS],
            (Self::TypeScript, ".jsx") => &[EXTENSION_TSX, EXTENSION_DTS],
            (Self::TypeScript, ".mjs") => &[EXTENSION_MTS, EXTENSION_DMTS],
            (Self::TypeScript, ".cjs") => &[EXTENSION_CTS, EXTENSION_DCTS],
            (Self::Declaration, ".js" | ".jsx") => &[EXTENSION_DTS],
            (Self::Declaration, ".mjs") => &[EXTENSION_DMTS],
            (Self::Declaration, ".cjs") => &[EXTENSION_DCTS],
            _ => &[],
        }
    }

    fn accepts(self, file_name: &str) -> bool {
        match self {
            Self::TypeScript => {
                [EXTENSION_TS, EXTENSION_TSX, EXTENSION_MTS, EXTENSION_CTS]
                    .iter()
                    .any(|ext| file_extension_is(file_name, ext))
            }
            Self::JavaScript => [EXTENSION_JS, EXTENSION_JSX, EXTENSION_MJS, EXTENSION_CJS]
                .iter()
                .any(|ext| file_extension_is(file_name, ext)),
            Self::Declaration => [EXTENSION_DTS, EXTENSION_DMTS, EXTENSION_DCTS]
                .iter()
                .any(|ext| file_extension_is(file_name, ext)),
        }
    }
}

/// The fields of `package.json` that affect resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub main: Option<String>,
    pub types: Option<String>,
    pub typings: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,
}

impl PackageJson {
    fn types_entry(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }
}

/// Split a bare specifier into package name and subpath.
#[must_use]
pub fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_end = if specifier.starts_with('@') {
        specifier
            .find('/')
            .and_then(|scope_end| {
                specifier[scope_end + 1..]
                    .find('/')
                    .map(|offset| scope_end + 1 + offset)
            })
    } else {
        specifier.find('/')
    };
    match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..])),
        None => (specifier, None),
    }
}

/// `@scope/name` lives at `@types/scope__name`.
#[must_use]
pub fn mangle_scoped_package_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(scoped) if scoped.contains('/') => scoped.replacen('/', "__", 1),
        _ => name.to_string(),
    }
}

fn is_relative_or_rooted(name: &str) -> bool {
    name == "."
        || name == ".."
        || name.starts_with("./")
        || name.starts_with("../")
        || is_rooted_disk_path(name)
}

/// Directories from `start` up to the root, skipping `node_modules` itself.
fn ancestor_directories(start: &str) -> impl Iterator<Item = String> {
    std::iter::successors(Some(start.to_string()), |dir| {
        let parent = get_directory_path(dir);
        (parent != *dir && !parent.is_empty()).then_some(parent)
    })
    .filter(|dir| get_base_file_name(dir) != "node_modules")
}

#[derive(Default)]
pub struct NodeModuleResolver {
    /// Parsed manifests by `package.json` path. `None` when absent or invalid.
    package_jsons: DashMap<String, Option<Arc<PackageJson>>>,
    /// Nearest `package.json` `type` by directory.
    package_types: DashMap<String, Option<String>>,
}

impl NodeModuleResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_package_json(&self, host: &dyn ResolutionHost, path: &str) -> Option<Arc<PackageJson>> {
        if let Some(cached) = self.package_jsons.get(path) {
            return cached.value().clone();
        }
        let parsed = host.read_file(path).and_then(|text| {
            serde_json::from_str::<PackageJson>(&text)
                .map_err(|err| tracing::debug!(path, %err, "invalid package.json"))
                .ok()
                .map(Arc::new)
        });
        self.package_jsons
            .entry(path.to_string())
            .or_insert(parsed)
            .value()
            .clone()
    }

    /// `candidate` as a file: exact name, JS-to-TS substitution, then with
    /// each extension appended.
    fn try_file(
        &self,
        ctx: ResolutionContext<'_>,
        candidate: &str,
        extensions: Extensions,
    ) -> Option<String> {
        let host = ctx.host;
        if let Some(extension) = try_get_extension_from_path(candidate) {
            let substitutions = extensions.substitutions(extension);
            if !substitutions.is_empty() {
                let stem = remove_file_extension(candidate);
                if let Some(found) = substitutions
                    .iter()
                    .map(|ext| format!("{stem}{ext}"))
                    .find(|path| host.file_exists(path))
                {
                    return Some(found);
                }
            }
            if extensions.accepts(candidate) && host.file_exists(candidate) {
                return Some(candidate.to_string());
            }
        }
        if file_extension_is(candidate, EXTENSION_JSON) {
            return (extensions == Extensions::TypeScript
                && ctx.options.resolve_json_module
                && host.file_exists(candidate))
            .then(|| candidate.to_string());
        }
        extensions
            .candidates()
            .iter()
            .map(|ext| format!("{candidate}{ext}"))
            .find(|path| host.file_exists(path))
    }

    /// A package or plain directory: `types`/`typings`, `main`, then `index`.
    fn load_directory(
        &self,
        ctx: ResolutionContext<'_>,
        directory: &str,
        extensions: Extensions,
    ) -> Option<String> {
        let package_json_path = combine_paths(directory, &["package.json"]);
        if ctx.host.file_exists(&package_json_path)
            && let Some(package_json) = self.read_package_json(ctx.host, &package_json_path)
        {
            let entry = match extensions {
                Extensions::JavaScript => package_json.main.as_deref(),
                Extensions::TypeScript | Extensions::Declaration => {
                    package_json.types_entry().or(package_json.main.as_deref())
                }
            };
            if let Some(entry) = entry {
                let entry_path = resolve_path(directory, &[entry]);
                let found = self.try_file(ctx, &entry_path, extensions).or_else(|| {
                    ctx.host
                        .directory_exists(&entry_path)
                        .then(|| self.try_index(ctx, &entry_path, extensions))
                        .flatten()
                });
                if found.is_some() {
                    return found;
                }
                ctx.host
                    .trace(&format!("package.json entry '{entry}' of '{directory}' not found"));
            }
        }
        self.try_index(ctx, directory, extensions)
    }

    fn try_index(
        &self,
        ctx: ResolutionContext<'_>,
        directory: &str,
        extensions: Extensions,
    ) -> Option<String> {
        self.try_file(ctx, &combine_paths(directory, &["index"]), extensions)
    }

    fn load_file_or_directory(
        &self,
        ctx: ResolutionContext<'_>,
        candidate: &str,
        extensions: Extensions,
    ) -> Option<String> {
        self.try_file(ctx, candidate, extensions).or_else(|| {
            ctx.host
                .directory_exists(candidate)
                .then(|| self.load_directory(ctx, candidate, extensions))
                .flatten()
        })
    }

    /// `name` in one `node_modules` directory: the package itself, then its
    /// `@types` package.
    fn load_from_node_modules_directory(
        &self,
        ctx: ResolutionContext<'_>,
        node_modules: &str,
        name: &str,
        extensions: Extensions,
    ) -> Option<String> {
        let (package_name, subpath) = parse_package_specifier(name);
        let in_package = |package_dir: String| match subpath {
            Some(subpath) => {
                self.load_file_or_directory(ctx, &combine_paths(&package_dir, &[subpath]), extensions)
            }
            None => self.load_file_or_directory(ctx, &package_dir, extensions),
        };
        in_package(combine_paths(node_modules, &[package_name])).or_else(|| {
            (extensions != Extensions::JavaScript)
                .then(|| {
                    in_package(combine_paths(
                        node_modules,
                        &["@types", mangle_scoped_package_name(package_name).as_str()],
                    ))
                })
                .flatten()
        })
    }

    fn load_from_node_modules(
        &self,
        ctx: ResolutionContext<'_>,
        name: &str,
        start_directory: &str,
        extensions: Extensions,
    ) -> Option<String> {
        ancestor_directories(start_directory).find_map(|dir| {
            let node_modules = combine_paths(&dir, &["node_modules"]);
            ctx.host
                .directory_exists(&node_modules)
                .then(|| self.load_from_node_modules_directory(ctx, &node_modules, name, extensions))
                .flatten()
        })
    }

    fn realpath(&self, ctx: ResolutionContext<'_>, file_name: String) -> String {
        if ctx.options.preserve_symlinks {
            file_name
        } else {
            normalize_path(&ctx.host.realpath(&file_name))
        }
    }

    /// Directory that relative `typeRoots` and the default type roots hang off.
    fn type_root_base(ctx: ResolutionContext<'_>) -> String {
        ctx.options
            .config_file_path
            .as_deref()
            .map_or_else(|| ctx.host.current_directory().to_string(), get_directory_path)
    }

    /// `typeRoots`, else every `node_modules/@types` from the base directory up.
    #[must_use]
    pub fn effective_type_roots(&self, ctx: ResolutionContext<'_>) -> Vec<String> {
        let base = Self::type_root_base(ctx);
        if let Some(roots) = &ctx.options.type_roots {
            return roots
                .iter()
                .map(|root| resolve_path(&base, &[root.as_str()]))
                .collect();
        }
        ancestor_directories(&base)
            .map(|dir| combine_paths(&dir, &["node_modules", "@types"]))
            .filter(|root| ctx.host.directory_exists(root))
            .collect()
    }
}

impl ModuleResolver for NodeModuleResolver {
    fn resolve_module_name(
        &self,
        module_name: &str,
        containing_file: &str,
        _mode: ResolutionMode,
        ctx: ResolutionContext<'_>,
    ) -> ResolvedModule {
        let containing_directory = get_directory_path(containing_file);
        let passes = [Extensions::TypeScript, Extensions::JavaScript];

        if is_relative_or_rooted(module_name) {
            let candidate = resolve_path(&containing_directory, &[module_name]);
            let found = passes
                .iter()
                .find_map(|&extensions| self.load_file_or_directory(ctx, &candidate, extensions));
            return match found {
                Some(file_name) => {
                    let is_external = contains_node_modules(&file_name);
                    ResolvedModule::resolved(file_name, is_external)
                }
                None => {
                    ctx.host
                        .trace(&format!("module '{module_name}' not found from '{containing_file}'"));
                    ResolvedModule::unresolved()
                }
            };
        }

        let found = passes.iter().find_map(|&extensions| {
            self.load_from_node_modules(ctx, module_name, &containing_directory, extensions)
        });
        match found {
            Some(file_name) => ResolvedModule::resolved(self.realpath(ctx, file_name), true),
            None => {
                ctx.host
                    .trace(&format!("package '{module_name}' not found from '{containing_file}'"));
                ResolvedModule::unresolved()
            }
        }
    }

    fn resolve_type_reference_directive(
        &self,
        type_reference_directive_name: &str,
        containing_file: &str,
        _mode: ResolutionMode,
        ctx: ResolutionContext<'_>,
    ) -> ResolvedTypeReferenceDirective {
        let name = type_reference_directive_name;

        let primary = self.effective_type_roots(ctx).iter().find_map(|root| {
            let candidate = combine_paths(root, &[mangle_scoped_package_name(name).as_str()]);
            ctx.host
                .directory_exists(&candidate)
                .then(|| self.load_directory(ctx, &candidate, Extensions::Declaration))
                .flatten()
                .or_else(|| self.try_file(ctx, &candidate, Extensions::Declaration))
        });
        if let Some(file_name) = primary {
            let file_name = self.realpath(ctx, file_name);
            let is_external = contains_node_modules(&file_name);
            return ResolvedTypeReferenceDirective::resolved(file_name, true, is_external);
        }

        let containing_directory = get_directory_path(containing_file);
        let secondary = [Extensions::Declaration, Extensions::TypeScript]
            .iter()
            .find_map(|&extensions| {
                self.load_from_node_modules(ctx, name, &containing_directory, extensions)
            });
        match secondary {
            Some(file_name) => {
                let file_name = self.realpath(ctx, file_name);
                let is_external = contains_node_modules(&file_name);
                ResolvedTypeReferenceDirective::resolved(file_name, false, is_external)
            }
            None => {
                ctx.host.trace(&format!("type reference '{name}' not found"));
                ResolvedTypeReferenceDirective::unresolved()
            }
        }
    }

    fn get_automatic_type_directive_names(&self, ctx: ResolutionContext<'_>) -> Vec<String> {
        if let Some(types) = &ctx.options.types {
            return types.clone();
        }
        let mut names: Vec<String> = Vec::new();
        for root in self.effective_type_roots(ctx) {
            for directory in ctx.host.get_directories(&root) {
                if directory.starts_with('.') || names.contains(&directory) {
                    continue;
                }
                // `"typings": null` marks a stub whose types ship elsewhere.
                let package_json_path = combine_paths(&root, &[directory.as_str(), "package.json"]);
                let is_stub = ctx
                    .host
                    .read_file(&package_json_path)
                    .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
                    .is_some_and(|json| json.get("typings") == Some(&serde_json::Value::Null));
                if !is_stub {
                    names.push(directory);
                }
            }
        }
        names
    }

    fn get_package_json_type(&self, file_name: &str, ctx: ResolutionContext<'_>) -> Option<String> {
        let start = get_directory_path(file_name);
        let mut visited = Vec::new();
        let mut found = None;
        for dir in std::iter::successors(Some(start), |dir| {
            let parent = get_directory_path(dir);
            (parent != *dir && !parent.is_empty()).then_some(parent)
        }) {
            if let Some(cached) = self.package_types.get(&dir) {
                found = cached.value().clone();
                break;
            }
            let package_json_path = combine_paths(&dir, &["package.json"]);
            visited.push(dir);
            if ctx.host.file_exists(&package_json_path) {
                found = self
                    .read_package_json(ctx.host, &package_json_path)
                    .and_then(|package_json| package_json.package_type.clone());
                break;
            }
        }
        for dir in visited {
            self.package_types.insert(dir, found.clone());
        }
        found
    }
}

#[cfg(test)]
#[path = "../tests/resolver.rs"]
mod tests;
