//! Resolved compiler options consumed by the file loader.
//!
//! These are the typed, already-merged options (tsconfig + command line). Raw
//! tsconfig parsing lives in the CLI; only the settings that change which
//! files end up in a program are modelled here.

use crate::limits::DEFAULT_MAX_NODE_MODULE_JS_DEPTH;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptTarget {
    ES3,
    #[default]
    ES5,
    ES2015,
    ES2016,
    ES2017,
    ES2018,
    ES2019,
    ES2020,
    ES2021,
    ES2022,
    ES2023,
    ES2024,
    ESNext,
}

impl ScriptTarget {
    /// Parse a `target` value as written in tsconfig (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let target = match value.to_ascii_lowercase().as_str() {
            "es3" => Self::ES3,
            "es5" => Self::ES5,
            "es6" | "es2015" => Self::ES2015,
            "es2016" => Self::ES2016,
            "es2017" => Self::ES2017,
            "es2018" => Self::ES2018,
            "es2019" => Self::ES2019,
            "es2020" => Self::ES2020,
            "es2021" => Self::ES2021,
            "es2022" => Self::ES2022,
            "es2023" => Self::ES2023,
            "es2024" => Self::ES2024,
            "esnext" => Self::ESNext,
            _ => return None,
        };
        Some(target)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JsxEmit {
    #[default]
    None,
    Preserve,
    React,
    ReactNative,
    ReactJsx,
    ReactJsxDev,
}

impl JsxEmit {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let jsx = match value.to_ascii_lowercase().as_str() {
            "preserve" => Self::Preserve,
            "react" => Self::React,
            "react-native" => Self::ReactNative,
            "react-jsx" => Self::ReactJsx,
            "react-jsxdev" => Self::ReactJsxDev,
            _ => return None,
        };
        Some(jsx)
    }

    /// Does this mode import a JSX runtime module automatically?
    #[must_use]
    pub const fn uses_runtime_import(self) -> bool {
        matches!(self, Self::ReactJsx | Self::ReactJsxDev)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
    /// Explicit `lib` entries (`"es2020"`, `"dom"`, ...). `None` means the
    /// default lib for `target`.
    pub lib: Option<Vec<String>>,
    pub no_lib: bool,
    pub no_resolve: bool,
    pub allow_js: bool,
    pub resolve_json_module: bool,
    pub allow_non_ts_extensions: bool,
    /// How deep into `node_modules` JavaScript files are followed. `None`
    /// uses [`DEFAULT_MAX_NODE_MODULE_JS_DEPTH`].
    pub max_node_module_js_depth: Option<usize>,
    pub import_helpers: bool,
    pub jsx: JsxEmit,
    pub jsx_import_source: Option<String>,
    /// Explicit automatic type inclusion list. `Some(vec![])` disables it.
    pub types: Option<Vec<String>>,
    pub type_roots: Option<Vec<String>>,
    pub root_dir: Option<String>,
    pub out_dir: Option<String>,
    pub declaration_dir: Option<String>,
    pub declaration: bool,
    pub composite: bool,
    pub preserve_symlinks: bool,
    pub disable_source_of_project_reference_redirect: bool,
    /// The tsconfig these options came from, if any.
    pub config_file_path: Option<String>,
}

impl CompilerOptions {
    #[must_use]
    pub fn max_node_module_js_depth(&self) -> usize {
        self.max_node_module_js_depth
            .unwrap_or(DEFAULT_MAX_NODE_MODULE_JS_DEPTH)
    }

    /// Declaration output directory: `declarationDir`, else `outDir`.
    #[must_use]
    pub fn declaration_output_dir(&self) -> Option<&str> {
        self.declaration_dir
            .as_deref()
            .or(self.out_dir.as_deref())
    }

    /// Module name of the implicitly imported JSX runtime.
    ///
    /// Applies to the automatic runtime modes, or whenever an import source is
    /// configured or given by an `@jsxImportSource` pragma.
    #[must_use]
    pub fn jsx_runtime_module(&self, pragma_source: Option<&str>) -> Option<String> {
        let automatic = self.jsx.uses_runtime_import()
            || self.jsx_import_source.is_some()
            || pragma_source.is_some();
        if !automatic {
            return None;
        }
        let source = pragma_source
            .or(self.jsx_import_source.as_deref())
            .unwrap_or("react");
        let runtime = if self.jsx == JsxEmit::ReactJsxDev {
            "jsx-dev-runtime"
        } else {
            "jsx-runtime"
        };
        Some(format!("{source}/{runtime}"))
    }
}

#[cfg(test)]
#[path = "../tests/options.rs"]
mod tests;
