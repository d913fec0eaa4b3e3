use super::*;
use std::fs;
use tempfile::TempDir;

fn host_for(dir: &TempDir) -> DiskHost {
    DiskHost::new(dir.path(), &dir.path().join("lib")).with_case_sensitivity(true)
}

#[test]
fn plain_text_is_not_binary() {
    assert!(!is_binary(b"export const x = 1;\n\tlet y = '\r\n';"));
    assert!(!is_binary(b""));
}

#[test]
fn nul_runs_and_control_bytes_are_binary() {
    assert!(is_binary(b"GIF89a\0\0\0\0data"));
    assert!(is_binary(b"\x01\x02\x03\x04header"));

    let mut scattered = Vec::new();
    for _ in 0..11 {
        scattered.extend_from_slice(b"ab\0");
    }
    assert!(is_binary(&scattered));
}

#[test]
fn only_the_sniff_window_is_inspected() {
    let mut bytes = vec![b'a'; BINARY_SNIFF_WINDOW];
    bytes.extend_from_slice(&[0; 16]);
    assert!(!is_binary(&bytes));
}

#[test]
fn decodes_byte_order_marks() {
    assert_eq!(
        decode_source_text(b"\xEF\xBB\xBFlet a;").as_deref(),
        Some("let a;")
    );
    assert_eq!(
        decode_source_text(&[0xFF, 0xFE, b'h', 0, b'i', 0]).as_deref(),
        Some("hi")
    );
    assert_eq!(
        decode_source_text(&[0xFE, 0xFF, 0, b'h', 0, b'i']).as_deref(),
        Some("hi")
    );
    assert_eq!(decode_source_text(b"\0\0\0\0\0"), None);
}

#[test]
fn file_queries_follow_the_disk() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("src/nested")).expect("dirs");
    fs::create_dir_all(dir.path().join("src/other")).expect("dirs");
    fs::write(dir.path().join("src/a.ts"), "const a = 1;").expect("write");
    let host = host_for(&dir);
    let src = path_to_string(&dir.path().join("src"));

    assert!(host.file_exists(&format!("{src}/a.ts")));
    assert!(!host.file_exists(&src));
    assert!(host.directory_exists(&src));
    assert!(!host.directory_exists(&format!("{src}/a.ts")));
    assert_eq!(
        host.read_file(&format!("{src}/a.ts")).as_deref(),
        Some("const a = 1;")
    );
    assert_eq!(host.read_file(&format!("{src}/missing.ts")), None);
    assert_eq!(host.get_directories(&src), ["nested", "other"]);
    assert!(host.get_directories(&format!("{src}/missing")).is_empty());
    assert_eq!(host.current_directory(), path_to_string(dir.path()));
    assert_eq!(
        host.default_library_path(),
        path_to_string(&dir.path().join("lib"))
    );
}

#[test]
fn binary_files_read_as_missing() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("image.ts");
    fs::write(&path, b"\x89PNG\0\0\0\0\x1a").expect("write");
    let host = host_for(&dir);

    assert_eq!(host.read_file(&path_to_string(&path)), None);
}

#[cfg(unix)]
#[test]
fn realpath_resolves_symlinks() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("real")).expect("dir");
    fs::write(dir.path().join("real/index.ts"), "").expect("write");
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).expect("link");
    let host = host_for(&dir);

    let through_link = path_to_string(&dir.path().join("link/index.ts"));
    let expected = path_to_string(
        &fs::canonicalize(dir.path().join("real/index.ts")).expect("canonicalize"),
    );
    assert_eq!(host.realpath(&through_link), expected);
    assert_eq!(host.realpath("/does/not/exist.ts"), "/does/not/exist.ts");
}

#[test]
fn project_references_are_loaded_once() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("core")).expect("dir");
    fs::write(dir.path().join("core/index.ts"), "").expect("write");
    let config_path = dir.path().join("core/tsconfig.json");
    fs::write(&config_path, r#"{ "compilerOptions": { "composite": true } }"#).expect("write");
    let host = host_for(&dir);
    let config_name = path_to_string(&config_path);
    let key = ResolvedPath::new_unchecked(config_name.clone());

    let first = host
        .get_resolved_project_reference(&config_name, &key)
        .expect("loaded");
    let second = host
        .get_resolved_project_reference(&config_name, &key)
        .expect("cached");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.options.composite);
    assert_eq!(first.file_names.len(), 1);
}

#[test]
fn missing_project_reference_is_none() {
    let dir = TempDir::new().expect("temp dir");
    let host = host_for(&dir);
    let config_name = path_to_string(&dir.path().join("nope/tsconfig.json"));

    let loaded = host
        .get_resolved_project_reference(&config_name, &ResolvedPath::new_unchecked(&config_name));

    assert!(loaded.is_none());
}

#[test]
fn explicit_library_path_is_relative_to_cwd() {
    assert_eq!(
        default_library_path(Some(Path::new("vendor/lib")), Path::new("/work")),
        PathBuf::from("/work/vendor/lib")
    );
    assert_eq!(
        default_library_path(Some(Path::new("/opt/tsz/lib")), Path::new("/work")),
        PathBuf::from("/opt/tsz/lib")
    );
}

#[test]
fn case_sensitivity_can_be_overridden() {
    let dir = TempDir::new().expect("temp dir");
    let host = DiskHost::new(dir.path(), dir.path()).with_case_sensitivity(false);
    assert!(!host.use_case_sensitive_file_names());
}
