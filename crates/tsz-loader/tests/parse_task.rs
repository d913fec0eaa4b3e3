use super::*;
use crate::parsed_config::ParsedCommandLine;
use crate::project_reference_parser::ProjectReferenceParser;
use crate::test_support::{LineParser, MemoryHost, TableResolver, no_lib};
use crate::worker::WorkGroup;
use tsz_common::CompilerOptions;

fn loader(host: MemoryHost, resolver: TableResolver, options: CompilerOptions) -> FileLoader {
    FileLoader::new(
        Arc::new(host),
        Arc::new(LineParser::default()),
        Arc::new(resolver),
        Arc::new(options),
        false,
    )
}

fn load(task: &ParseTask, loader: &FileLoader) {
    rayon::scope(|scope| task.load(loader, scope));
}

fn child_names(task: &ParseTask) -> Vec<String> {
    task.sub_tasks()
        .snapshot()
        .iter()
        .map(|slot| slot.task.file_name().to_string())
        .collect()
}

#[test]
fn loaded_file_records_children_and_reasons() {
    let loader = loader(
        MemoryHost::new()
            .file(
                "/src/a.ts",
                "/// <reference path=\"ref.ts\" />\n/// <reference lib=\"es2015\" />\nimport \"./b\";",
            )
            .file("/src/b.ts", "")
            .file("/src/ref.ts", ""),
        TableResolver::new(),
        CompilerOptions::default(),
    );
    let task = ParseTask::root("/src/a.ts");
    assert_eq!(task.state(), ParseTaskState::Unstarted);

    load(&task, &loader);

    assert_eq!(task.state(), ParseTaskState::Loaded);
    assert_eq!(task.path(), Some(&ResolvedPath::new_unchecked("/src/a.ts")));
    assert_eq!(
        child_names(&task),
        ["/src/ref.ts", "/lib/lib.es2015.d.ts", "/src/b.ts"]
    );
    let children = task.sub_tasks().snapshot();
    assert!(!children[0].task.is_lib());
    assert!(children[1].task.is_lib());

    let outcome = task.outcome().expect("loaded");
    let kinds: Vec<_> = outcome.include_reasons.iter().map(|reason| reason.kind).collect();
    assert_eq!(
        kinds,
        [
            FileIncludeKind::ReferenceFile,
            FileIncludeKind::LibReferenceDirective,
            FileIncludeKind::Import
        ]
    );
    assert!(
        outcome
            .include_reasons
            .iter()
            .all(|reason| reason.referencing_file.as_deref() == Some("/src/a.ts"))
    );
    assert_eq!(loader.total_file_count(), 1);
    assert_eq!(loader.lib_file_count(), 0);
}

#[test]
fn no_lib_skips_lib_references() {
    let loader = loader(
        MemoryHost::new().file("/src/a.ts", "/// <reference lib=\"es2015\" />"),
        TableResolver::new(),
        no_lib(),
    );
    let task = ParseTask::root("/src/a.ts");

    load(&task, &loader);

    assert!(task.sub_tasks().is_empty());
    assert!(task.outcome().expect("loaded").diagnostics.is_empty());
}

#[test]
fn missing_file_loads_without_children() {
    let loader = loader(MemoryHost::new(), TableResolver::new(), no_lib());
    let task = ParseTask::root("/src/gone.ts");

    load(&task, &loader);

    assert_eq!(task.state(), ParseTaskState::Loaded);
    assert!(task.is_loaded());
    assert!(task.file().is_none());
    assert!(task.sub_tasks().is_empty());
    assert_eq!(loader.total_file_count(), 1);
}

#[test]
fn lib_tasks_are_counted_as_libs() {
    let loader = loader(
        MemoryHost::new().file("/lib/lib.d.ts", ""),
        TableResolver::new(),
        no_lib(),
    );
    let task = ParseTask::root_lib("/lib/lib.d.ts");

    load(&task, &loader);

    assert!(task.is_lib());
    assert!(task.is_root());
    assert_eq!(loader.lib_file_count(), 1);
    assert_eq!(loader.total_file_count(), 1);
}

#[test]
fn automatic_type_directive_task_expands_without_parsing() {
    let host = MemoryHost::new().file("/node_modules/@types/node/index.d.ts", "");
    let loader = loader(
        host,
        TableResolver::new()
            .types("node", "/node_modules/@types/node/index.d.ts", true)
            .automatic(&["node"]),
        CompilerOptions::default(),
    );
    let task = ParseTask::automatic_type_directives("/__inferred type names__.ts");

    load(&task, &loader);

    assert_eq!(task.state(), ParseTaskState::AutomaticTypeDirectiveExpanded);
    assert!(task.file().is_none());
    assert_eq!(child_names(&task), ["/node_modules/@types/node/index.d.ts"]);
    let child = &task.sub_tasks().snapshot()[0];
    assert!(child.edge.increase_depth);
    assert!(child.edge.from_external_library);
    assert!(!child.edge.elide_on_depth);
    assert_eq!(loader.total_file_count(), 0);
}

#[test]
fn redirected_task_has_one_child_without_depth() {
    let core = ParsedCommandLine::new(
        "/proj/core/tsconfig.json",
        CompilerOptions {
            out_dir: Some("dist".to_string()),
            ..Default::default()
        },
        vec!["/proj/core/src/index.ts".to_string()],
        Vec::new(),
        "/",
        true,
    );
    let root = Arc::new(ParsedCommandLine::new(
        "/proj/app/tsconfig.json",
        CompilerOptions::default(),
        Vec::new(),
        vec!["/proj/core/tsconfig.json".to_string()],
        "/",
        true,
    ));
    let loader = loader(
        MemoryHost::new().config(core),
        TableResolver::new(),
        CompilerOptions::default(),
    );
    let group = WorkGroup::new(false).expect("global pool");
    let mapper = ProjectReferenceParser::new(&loader).parse(&group, Some(&root));
    loader.install_mapper(mapper);

    let task = ParseTask::from_reference(
        &ResolvedRef {
            increase_depth: true,
            elide_on_depth: true,
            is_from_external_library: true,
            ..ResolvedRef::new(
                "/proj/core/src/index.ts",
                FileIncludeReason::new(FileIncludeKind::Import, "core"),
            )
        },
        false,
    );
    load(&task, &loader);

    assert!(task.is_redirected());
    assert_eq!(
        task.outcome().and_then(|o| o.redirect_target.as_deref()),
        Some("/proj/core/dist/src/index.d.ts")
    );
    let children = task.sub_tasks().snapshot();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].task.file_name(), "/proj/core/dist/src/index.d.ts");
    assert!(!children[0].edge.increase_depth);
    assert!(!children[0].edge.elide_on_depth);
    assert!(children[0].edge.from_external_library);
    assert_eq!(loader.total_file_count(), 0);
}

#[test]
fn reference_path_is_normalized() {
    let task = ParseTask::from_reference(
        &ResolvedRef::new(
            "/src/./nested/../b.ts",
            FileIncludeReason::new(FileIncludeKind::ReferenceFile, "b.ts"),
        ),
        false,
    );

    assert_eq!(task.file_name(), "/src/b.ts");
    assert!(!task.is_root());
    assert_eq!(task.edge(), TaskEdge::default());
}

#[test]
fn roots_carry_the_root_edge() {
    let task = ParseTask::root("/src/a.ts");

    assert!(task.edge().root);
    assert!(!task.is_from_external_library());
    task.mark_from_external_library();
    assert!(task.is_from_external_library());
}

#[test]
#[should_panic(expected = "loaded twice")]
fn loading_twice_panics() {
    let loader = loader(
        MemoryHost::new().file("/src/a.ts", ""),
        TableResolver::new(),
        no_lib(),
    );
    let task = ParseTask::root("/src/a.ts");

    load(&task, &loader);
    load(&task, &loader);
}
