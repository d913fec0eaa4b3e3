use super::*;

#[test]
fn lib_names_map_to_files() {
    assert_eq!(get_lib_file_name("es2020").as_deref(), Some("lib.es2020.d.ts"));
    assert_eq!(get_lib_file_name("DOM").as_deref(), Some("lib.dom.d.ts"));
    assert_eq!(
        get_lib_file_name("es2015.promise").as_deref(),
        Some("lib.es2015.promise.d.ts")
    );
}

#[test]
fn legacy_aliases_map_to_year_libs() {
    assert_eq!(get_lib_file_name("es6").as_deref(), Some("lib.es2015.d.ts"));
    assert_eq!(get_lib_file_name("es7").as_deref(), Some("lib.es2016.d.ts"));
}

#[test]
fn unknown_lib_name_is_none() {
    assert_eq!(get_lib_file_name("es1999"), None);
    assert_eq!(get_lib_file_name(""), None);
}

#[test]
fn default_lib_follows_target() {
    assert_eq!(get_default_lib_file_name(ScriptTarget::ES5), "lib.d.ts");
    assert_eq!(get_default_lib_file_name(ScriptTarget::ES2015), "lib.es6.d.ts");
    assert_eq!(
        get_default_lib_file_name(ScriptTarget::ES2022),
        "lib.es2022.full.d.ts"
    );
    assert_eq!(
        get_default_lib_file_name(ScriptTarget::ESNext),
        "lib.esnext.full.d.ts"
    );
}

#[test]
fn lib_priority_orders_default_libs_first() {
    let dir = "/libs";
    assert_eq!(lib_file_priority("/libs/lib.d.ts", dir), 0);
    assert_eq!(lib_file_priority("/libs/lib.es6.d.ts", dir), 0);
    assert_eq!(lib_file_priority("/libs/lib.es5.d.ts", dir), 1);
    assert!(lib_file_priority("/libs/lib.es2015.d.ts", dir) < lib_file_priority("/libs/lib.dom.d.ts", dir));
    assert_eq!(lib_file_priority("/libs/custom.d.ts", dir), LIBS.len() + 2);
}

#[test]
fn lib_d_ts_outside_default_dir_is_not_first() {
    assert_ne!(lib_file_priority("/elsewhere/lib.d.ts", "/libs"), 0);
}

#[test]
fn lib_file_path_is_under_library_dir() {
    assert_eq!(path_for_lib_file("/libs", "lib.dom.d.ts"), "/libs/lib.dom.d.ts");
}
