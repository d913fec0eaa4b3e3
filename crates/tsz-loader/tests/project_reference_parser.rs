use super::*;
use crate::test_support::{LineParser, MemoryHost, TableResolver};
use tsz_common::CompilerOptions;

fn project(name: &str, references: &[&str], options: CompilerOptions) -> ParsedCommandLine {
    let dir = tsz_common::path::get_directory_path(name);
    ParsedCommandLine::new(
        name,
        options,
        vec![format!("{dir}/src/index.ts")],
        references.iter().map(|r| (*r).to_string()).collect(),
        "/",
        true,
    )
}

fn out_dir(dir: &str) -> CompilerOptions {
    CompilerOptions {
        out_dir: Some(dir.to_string()),
        ..Default::default()
    }
}

fn loader(host: Arc<MemoryHost>, use_source: bool) -> FileLoader {
    FileLoader::new(
        host,
        Arc::new(LineParser::default()),
        Arc::new(TableResolver::new()),
        Arc::new(CompilerOptions::default()),
        use_source,
    )
}

fn parse(loader: &FileLoader, root: &Arc<ParsedCommandLine>) -> ProjectReferenceFileMapper {
    let group = WorkGroup::new(false).expect("global pool");
    ProjectReferenceParser::new(loader).parse(&group, Some(root))
}

fn path(name: &str) -> ResolvedPath {
    ResolvedPath::new_unchecked(name)
}

fn cyclic_host() -> Arc<MemoryHost> {
    Arc::new(
        MemoryHost::new()
            .config(project("/a/tsconfig.json", &["/b/tsconfig.json"], out_dir("dist")))
            .config(project("/b/tsconfig.json", &["/a/tsconfig.json"], out_dir("out"))),
    )
}

fn app(references: &[&str]) -> Arc<ParsedCommandLine> {
    Arc::new(project("/app/tsconfig.json", references, CompilerOptions::default()))
}

#[test]
fn each_reference_is_loaded_once() {
    let host = cyclic_host();
    let loader = loader(Arc::clone(&host), false);

    let mapper = parse(&loader, &app(&["/a/tsconfig.json", "/b/tsconfig.json"]));

    assert_eq!(host.config_load_count("/a/tsconfig.json"), 1);
    assert_eq!(host.config_load_count("/b/tsconfig.json"), 1);
    assert_eq!(mapper.config_to_project_reference.len(), 2);
    assert_eq!(
        mapper.references_in_config_file[&path("/app/tsconfig.json")],
        [path("/a/tsconfig.json"), path("/b/tsconfig.json")]
    );
    assert_eq!(
        mapper.references_in_config_file[&path("/b/tsconfig.json")],
        [path("/a/tsconfig.json")]
    );
}

#[test]
fn resolved_references_follow_declaration_order() {
    let loader = loader(cyclic_host(), false);

    let mapper = parse(
        &loader,
        &app(&["/b/tsconfig.json", "/missing/tsconfig.json", "/a/tsconfig.json"]),
    );

    let names: Vec<Option<String>> = mapper
        .get_resolved_project_references()
        .iter()
        .map(|config| config.as_ref().map(|c| c.config_file_name.clone()))
        .collect();
    assert_eq!(
        names,
        [
            Some("/b/tsconfig.json".to_string()),
            None,
            Some("/a/tsconfig.json".to_string())
        ]
    );
    let (config, is_reference) = mapper.get_resolved_reference_for(&path("/missing/tsconfig.json"));
    assert!(config.is_none());
    assert!(is_reference);
    let (config, is_reference) =
        mapper.get_resolved_reference_for(&path("/elsewhere/tsconfig.json"));
    assert!(config.is_none());
    assert!(!is_reference);
}

#[test]
fn output_maps_cover_every_reference() {
    let loader = loader(cyclic_host(), false);

    let mapper = parse(&loader, &app(&["/a/tsconfig.json"]));

    let a = mapper
        .get_output_and_project_reference(&path("/a/src/index.ts"))
        .expect("a output");
    assert_eq!(a.output_dts, "/a/dist/src/index.d.ts");
    assert_eq!(a.config_path, path("/a/tsconfig.json"));
    let b = mapper
        .get_source_and_project_reference(&path("/b/out/src/index.d.ts"))
        .expect("b source");
    assert_eq!(b.source, "/b/src/index.ts");
    assert!(mapper.dts_directories().is_empty());
    assert!(!mapper.has_dts_faking_host());
}

#[test]
fn source_mode_collects_declaration_directories() {
    let loader = loader(cyclic_host(), true);

    let mapper = parse(&loader, &app(&["/a/tsconfig.json"]));

    assert!(mapper.can_use_project_reference_source());
    assert!(mapper.has_dts_faking_host());
    assert!(mapper.dts_directories().contains(&path("/a/dist")));
    assert!(mapper.dts_directories().contains(&path("/b/out")));
}

#[test]
fn root_config_is_not_mapped() {
    let host = Arc::new(
        MemoryHost::new()
            .config(project("/a/tsconfig.json", &["/app/tsconfig.json"], out_dir("dist")))
            .config(project("/app/tsconfig.json", &["/a/tsconfig.json"], out_dir("out"))),
    );
    let loader = loader(host, false);
    let root = Arc::new(project(
        "/app/tsconfig.json",
        &["/a/tsconfig.json"],
        out_dir("out"),
    ));

    let mapper = parse(&loader, &root);

    assert!(
        mapper
            .get_output_and_project_reference(&path("/app/src/index.ts"))
            .is_none()
    );
    assert!(
        mapper
            .get_output_and_project_reference(&path("/a/src/index.ts"))
            .is_some()
    );
}

#[test]
fn walk_visits_each_config_once_depth_first() {
    let loader = loader(cyclic_host(), false);
    let mapper = parse(&loader, &app(&["/a/tsconfig.json", "/b/tsconfig.json"]));

    let mut visits = Vec::new();
    mapper.for_each_resolved_project_reference(|path, config, parent, index| {
        visits.push((
            path.to_string(),
            config.is_some(),
            parent.map(|p| p.config_file_name.clone()),
            index,
        ));
    });

    assert_eq!(
        visits,
        [
            (
                "/a/tsconfig.json".to_string(),
                true,
                Some("/app/tsconfig.json".to_string()),
                0
            ),
            (
                "/b/tsconfig.json".to_string(),
                true,
                Some("/a/tsconfig.json".to_string()),
                0
            ),
        ]
    );
}

#[test]
fn no_root_config_gives_an_empty_mapper() {
    let loader = loader(cyclic_host(), false);
    let group = WorkGroup::new(true).expect("single-threaded pool");

    let mapper = ProjectReferenceParser::new(&loader).parse(&group, None);

    assert!(mapper.get_resolved_project_references().is_empty());
    assert!(mapper.config_to_project_reference.is_empty());
}

#[test]
fn task_identity_is_the_canonical_config_path() {
    let loader = loader(cyclic_host(), false);
    let task = ProjectReferenceParseTask::new("/a/./tsconfig.json", &loader);

    assert_eq!(task.file_name(), "/a/tsconfig.json");
    assert_eq!(task.config_name(), "/a/./tsconfig.json");
    assert!(!task.is_loaded());
    assert!(task.resolved().is_none());
}
