//! Bundled lib file names.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tsz_common::ScriptTarget;
use tsz_common::path::{combine_paths, get_base_file_name, get_directory_path};

/// Known `lib` option values, in priority order.
pub const LIBS: &[&str] = &[
    "es5",
    "es6",
    "es2015",
    "es7",
    "es2016",
    "es2017",
    "es2018",
    "es2019",
    "es2020",
    "es2021",
    "es2022",
    "es2023",
    "es2024",
    "esnext",
    "dom",
    "dom.iterable",
    "dom.asynciterable",
    "webworker",
    "webworker.importscripts",
    "webworker.iterable",
    "webworker.asynciterable",
    "scripthost",
    "es2015.core",
    "es2015.collection",
    "es2015.generator",
    "es2015.iterable",
    "es2015.promise",
    "es2015.proxy",
    "es2015.reflect",
    "es2015.symbol",
    "es2015.symbol.wellknown",
    "es2016.array.include",
    "es2016.intl",
    "es2017.arraybuffer",
    "es2017.date",
    "es2017.object",
    "es2017.sharedmemory",
    "es2017.string",
    "es2017.intl",
    "es2017.typedarrays",
    "es2018.asyncgenerator",
    "es2018.asynciterable",
    "es2018.intl",
    "es2018.promise",
    "es2018.regexp",
    "es2019.array",
    "es2019.object",
    "es2019.string",
    "es2019.symbol",
    "es2019.intl",
    "es2020.bigint",
    "es2020.date",
    "es2020.promise",
    "es2020.sharedmemory",
    "es2020.string",
    "es2020.symbol.wellknown",
    "es2020.intl",
    "es2020.number",
    "es2021.promise",
    "es2021.string",
    "es2021.weakref",
    "es2021.intl",
    "es2022.array",
    "es2022.error",
    "es2022.intl",
    "es2022.object",
    "es2022.string",
    "es2022.regexp",
    "es2023.array",
    "es2023.collection",
    "es2023.intl",
    "es2024.arraybuffer",
    "es2024.collection",
    "es2024.object",
    "es2024.promise",
    "es2024.regexp",
    "es2024.sharedmemory",
    "es2024.string",
    "esnext.array",
    "esnext.collection",
    "esnext.symbol",
    "esnext.asynciterable",
    "esnext.intl",
    "esnext.disposable",
    "esnext.bigint",
    "esnext.string",
    "esnext.promise",
    "esnext.weakref",
    "esnext.decorators",
    "esnext.object",
    "esnext.regexp",
    "esnext.iterator",
    "decorators",
    "decorators.legacy",
];

fn lib_file_name_for(name: &str) -> String {
    match name {
        "es6" => "lib.es2015.d.ts".to_string(),
        "es7" => "lib.es2016.d.ts".to_string(),
        _ => format!("lib.{name}.d.ts"),
    }
}

static LIB_MAP: Lazy<FxHashMap<&'static str, String>> = Lazy::new(|| {
    LIBS.iter()
        .map(|&name| (name, lib_file_name_for(name)))
        .collect()
});

/// Map a `lib` option value or `/// <reference lib="..." />` name to its file.
#[must_use]
pub fn get_lib_file_name(lib_name: &str) -> Option<String> {
    LIB_MAP.get(lib_name.to_ascii_lowercase().as_str()).cloned()
}

/// Lib loaded for `target` when `lib` is not set.
#[must_use]
pub const fn get_default_lib_file_name(target: ScriptTarget) -> &'static str {
    match target {
        ScriptTarget::ES3 | ScriptTarget::ES5 => "lib.d.ts",
        ScriptTarget::ES2015 => "lib.es6.d.ts",
        ScriptTarget::ES2016 => "lib.es2016.full.d.ts",
        ScriptTarget::ES2017 => "lib.es2017.full.d.ts",
        ScriptTarget::ES2018 => "lib.es2018.full.d.ts",
        ScriptTarget::ES2019 => "lib.es2019.full.d.ts",
        ScriptTarget::ES2020 => "lib.es2020.full.d.ts",
        ScriptTarget::ES2021 => "lib.es2021.full.d.ts",
        ScriptTarget::ES2022 => "lib.es2022.full.d.ts",
        ScriptTarget::ES2023 => "lib.es2023.full.d.ts",
        ScriptTarget::ES2024 => "lib.es2024.full.d.ts",
        ScriptTarget::ESNext => "lib.esnext.full.d.ts",
    }
}

/// Sort key for lib files in the program's file list.
///
/// `lib.d.ts` and `lib.es6.d.ts` from the default library directory come
/// first, then known libs in [`LIBS`] order, then everything else.
#[must_use]
pub fn lib_file_priority(file_name: &str, default_library_path: &str) -> usize {
    let base = get_base_file_name(file_name);
    if get_directory_path(file_name) == default_library_path
        && (base == "lib.d.ts" || base == "lib.es6.d.ts")
    {
        return 0;
    }
    let Some(name) = base
        .strip_prefix("lib.")
        .and_then(|rest| rest.strip_suffix(".d.ts"))
    else {
        return LIBS.len() + 2;
    };
    LIBS.iter()
        .position(|&lib| lib == name)
        .map_or(LIBS.len() + 2, |index| index + 1)
}

/// Absolute path of a bundled lib file.
#[must_use]
pub fn path_for_lib_file(default_library_path: &str, lib_file_name: &str) -> String {
    combine_paths(default_library_path, &[lib_file_name])
}

#[cfg(test)]
#[path = "../tests/libs.rs"]
mod tests;
