use super::*;
use rustc_hash::FxHashMap;
use tsz_common::CompilerOptions;

/// Files and directory symlinks held in memory, rooted at `/`.
#[derive(Default)]
struct MemoryHost {
    files: FxHashMap<String, String>,
    symlinks: Vec<(String, String)>,
}

impl MemoryHost {
    fn file(mut self, name: &str, text: &str) -> Self {
        self.files.insert(name.to_string(), text.to_string());
        self
    }

    fn symlink(mut self, link: &str, real: &str) -> Self {
        self.symlinks.push((link.to_string(), real.to_string()));
        self
    }

    fn real(&self, path: &str) -> String {
        for (link, real) in &self.symlinks {
            if path == link {
                return real.clone();
            }
            if let Some(rest) = path.strip_prefix(&format!("{link}/")) {
                return format!("{real}/{rest}");
            }
        }
        path.to_string()
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
        self.files.get(&self.real(path)).cloned()
    }

    fn realpath(&self, path: &str) -> String {
        self.real(path)
    }

    fn get_directories(&self, path: &str) -> Vec<String> {
        let dir = format!("{}/", self.real(path).trim_end_matches('/'));
        let mut names: Vec<String> = self
            .files
            .keys()
            .filter_map(|name| name.strip_prefix(&dir))
            .filter_map(|rest| rest.split_once('/').map(|(first, _)| first.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn ctx<'a>(host: &'a MemoryHost, options: &'a CompilerOptions) -> ResolutionContext<'a> {
    ResolutionContext {
        host,
        options,
        redirect: None,
    }
}

fn resolve(host: &MemoryHost, options: &CompilerOptions, name: &str) -> ResolvedModule {
    NodeModuleResolver::new().resolve_module_name(
        name,
        "/src/main.ts",
        ResolutionMode::None,
        ctx(host, options),
    )
}

fn resolve_types(
    host: &MemoryHost,
    options: &CompilerOptions,
    name: &str,
) -> ResolvedTypeReferenceDirective {
    NodeModuleResolver::new().resolve_type_reference_directive(
        name,
        "/src/main.ts",
        ResolutionMode::None,
        ctx(host, options),
    )
}

fn resolved_name(resolved: &ResolvedModule) -> Option<&str> {
    resolved.resolved_file_name.as_deref()
}

#[test]
fn relative_imports_probe_extensions() {
    let host = MemoryHost::default()
        .file("/src/util.ts", "")
        .file("/src/view.tsx", "")
        .file("/src/lib/index.d.ts", "")
        .file("/src/legacy.js", "");
    let options = CompilerOptions::default();

    let util = resolve(&host, &options, "./util");
    assert_eq!(resolved_name(&util), Some("/src/util.ts"));
    assert!(!util.is_external_library_import);

    assert_eq!(resolved_name(&resolve(&host, &options, "./view")), Some("/src/view.tsx"));
    assert_eq!(resolved_name(&resolve(&host, &options, "./lib")), Some("/src/lib/index.d.ts"));
    assert_eq!(resolved_name(&resolve(&host, &options, "./legacy")), Some("/src/legacy.js"));
    assert_eq!(resolved_name(&resolve(&host, &options, "/src/util")), Some("/src/util.ts"));
    assert_eq!(resolve(&host, &options, "./missing"), ResolvedModule::unresolved());
}

#[test]
fn javascript_extension_maps_to_typescript_source() {
    let host = MemoryHost::default()
        .file("/src/util.ts", "")
        .file("/src/esm.mts", "")
        .file("/src/only.js", "");
    let options = CompilerOptions::default();

    assert_eq!(resolved_name(&resolve(&host, &options, "./util.js")), Some("/src/util.ts"));
    assert_eq!(resolved_name(&resolve(&host, &options, "./esm.mjs")), Some("/src/esm.mts"));
    assert_eq!(resolved_name(&resolve(&host, &options, "./only.js")), Some("/src/only.js"));
}

#[test]
fn json_needs_resolve_json_module() {
    let host = MemoryHost::default().file("/src/data.json", "{}");

    let options = CompilerOptions::default();
    assert_eq!(resolve(&host, &options, "./data.json"), ResolvedModule::unresolved());

    let options = CompilerOptions {
        resolve_json_module: true,
        ..Default::default()
    };
    assert_eq!(resolved_name(&resolve(&host, &options, "./data.json")), Some("/src/data.json"));
}

#[test]
fn packages_use_types_then_main_then_index() {
    let host = MemoryHost::default()
        .file(
            "/node_modules/typed/package.json",
            r#"{ "name": "typed", "types": "dist/index.d.ts", "main": "dist/index.js" }"#,
        )
        .file("/node_modules/typed/dist/index.d.ts", "")
        .file("/node_modules/typed/dist/index.js", "")
        .file("/node_modules/js-only/package.json", r#"{ "main": "lib/main.js" }"#)
        .file("/node_modules/js-only/lib/main.js", "")
        .file("/node_modules/plain/index.d.ts", "")
        .file("/node_modules/plain/sub.d.ts", "");
    let options = CompilerOptions::default();

    let typed = resolve(&host, &options, "typed");
    assert_eq!(resolved_name(&typed), Some("/node_modules/typed/dist/index.d.ts"));
    assert!(typed.is_external_library_import);

    assert_eq!(
        resolved_name(&resolve(&host, &options, "js-only")),
        Some("/node_modules/js-only/lib/main.js")
    );
    assert_eq!(
        resolved_name(&resolve(&host, &options, "plain")),
        Some("/node_modules/plain/index.d.ts")
    );
    assert_eq!(
        resolved_name(&resolve(&host, &options, "plain/sub")),
        Some("/node_modules/plain/sub.d.ts")
    );
    assert_eq!(resolve(&host, &options, "absent"), ResolvedModule::unresolved());
}

#[test]
fn nearest_node_modules_wins() {
    let host = MemoryHost::default()
        .file("/node_modules/dep/index.d.ts", "")
        .file("/src/node_modules/dep/index.d.ts", "");
    let options = CompilerOptions::default();

    assert_eq!(
        resolved_name(&resolve(&host, &options, "dep")),
        Some("/src/node_modules/dep/index.d.ts")
    );
}

#[test]
fn scoped_packages_fall_back_to_types_packages() {
    let host = MemoryHost::default()
        .file("/node_modules/@scope/pkg/package.json", r#"{ "main": "index.js" }"#)
        .file("/node_modules/@types/scope__pkg/index.d.ts", "");
    let options = CompilerOptions::default();

    assert_eq!(
        resolved_name(&resolve(&host, &options, "@scope/pkg")),
        Some("/node_modules/@types/scope__pkg/index.d.ts")
    );
}

#[test]
fn package_results_follow_symlinks_unless_preserved() {
    let host = MemoryHost::default()
        .file("/node_modules/other/index.d.ts", "")
        .file("/packages/linked/index.ts", "")
        .symlink("/node_modules/linked", "/packages/linked");

    let options = CompilerOptions::default();
    let resolved = resolve(&host, &options, "linked");
    assert_eq!(resolved_name(&resolved), Some("/packages/linked/index.ts"));
    assert!(resolved.is_external_library_import);

    let options = CompilerOptions {
        preserve_symlinks: true,
        ..Default::default()
    };
    assert_eq!(
        resolved_name(&resolve(&host, &options, "linked")),
        Some("/node_modules/linked/index.ts")
    );
}

#[test]
fn type_references_resolve_from_default_type_roots() {
    let host = MemoryHost::default().file("/node_modules/@types/node/index.d.ts", "");
    let options = CompilerOptions::default();

    let resolved = resolve_types(&host, &options, "node");
    assert_eq!(
        resolved,
        ResolvedTypeReferenceDirective::resolved("/node_modules/@types/node/index.d.ts", true, true)
    );
}

#[test]
fn type_references_use_configured_roots_then_node_modules() {
    let host = MemoryHost::default()
        .file("/types/custom/package.json", r#"{ "typings": "custom.d.ts" }"#)
        .file("/types/custom/custom.d.ts", "")
        .file("/types/globals.d.ts", "")
        .file("/src/node_modules/extra/index.d.ts", "");
    let options = CompilerOptions {
        type_roots: Some(vec!["/types".to_string()]),
        ..Default::default()
    };

    assert_eq!(
        resolve_types(&host, &options, "custom"),
        ResolvedTypeReferenceDirective::resolved("/types/custom/custom.d.ts", true, false)
    );
    assert_eq!(
        resolve_types(&host, &options, "globals"),
        ResolvedTypeReferenceDirective::resolved("/types/globals.d.ts", true, false)
    );
    assert_eq!(
        resolve_types(&host, &options, "extra"),
        ResolvedTypeReferenceDirective::resolved("/src/node_modules/extra/index.d.ts", false, true)
    );
    assert_eq!(
        resolve_types(&host, &options, "nothing"),
        ResolvedTypeReferenceDirective::unresolved()
    );
}

#[test]
fn relative_type_roots_hang_off_the_config_directory() {
    let host = MemoryHost::default().file("/proj/typings/lib/index.d.ts", "");
    let options = CompilerOptions {
        type_roots: Some(vec!["./typings".to_string()]),
        config_file_path: Some("/proj/tsconfig.json".to_string()),
        ..Default::default()
    };

    let roots = NodeModuleResolver::new().effective_type_roots(ctx(&host, &options));

    assert_eq!(roots, ["/proj/typings"]);
}

#[test]
fn automatic_type_directives_come_from_type_roots() {
    let host = MemoryHost::default()
        .file("/node_modules/@types/node/index.d.ts", "")
        .file("/node_modules/@types/jest/index.d.ts", "")
        .file("/node_modules/@types/.cache/data", "")
        .file("/node_modules/@types/stub/package.json", r#"{ "typings": null }"#);
    let resolver = NodeModuleResolver::new();

    let options = CompilerOptions::default();
    assert_eq!(
        resolver.get_automatic_type_directive_names(ctx(&host, &options)),
        ["jest", "node"]
    );

    let options = CompilerOptions {
        types: Some(vec![]),
        ..Default::default()
    };
    assert!(
        resolver
            .get_automatic_type_directive_names(ctx(&host, &options))
            .is_empty()
    );
}

#[test]
fn package_json_type_comes_from_nearest_manifest() {
    let host = MemoryHost::default()
        .file("/esm/package.json", r#"{ "type": "module" }"#)
        .file("/esm/nested/package.json", r#"{ "name": "untyped" }"#)
        .file("/esm/src/a.ts", "");
    let resolver = NodeModuleResolver::new();
    let options = CompilerOptions::default();

    assert_eq!(
        resolver.get_package_json_type("/esm/src/a.ts", ctx(&host, &options)),
        Some("module".to_string())
    );
    assert_eq!(
        resolver.get_package_json_type("/esm/src/deep/b.ts", ctx(&host, &options)),
        Some("module".to_string())
    );
    assert_eq!(resolver.get_package_json_type("/esm/nested/c.ts", ctx(&host, &options)), None);
    assert_eq!(resolver.get_package_json_type("/other/d.ts", ctx(&host, &options)), None);
}

#[test]
fn splits_package_specifiers() {
    assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
    assert_eq!(parse_package_specifier("lodash/fp/map"), ("lodash", Some("fp/map")));
    assert_eq!(parse_package_specifier("@scope/pkg"), ("@scope/pkg", None));
    assert_eq!(parse_package_specifier("@scope/pkg/sub"), ("@scope/pkg", Some("sub")));
    assert_eq!(mangle_scoped_package_name("@scope/pkg"), "scope__pkg");
    assert_eq!(mangle_scoped_package_name("plain"), "plain");
}
