use clap::Parser;
use std::path::PathBuf;

use tsz_common::{JsxEmit, ScriptTarget};

/// CLI arguments for the tsz binary.
#[derive(Parser, Debug)]
#[command(
    name = "tsz",
    version,
    about = "Codename Zang (Persian for rust) - TypeScript in Rust"
)]
pub struct CliArgs {
    // ==================== Command-line Only Options ====================
    /// Print names of files part of the compilation.
    #[arg(long = "listFiles", alias = "list-files")]
    pub list_files: bool,

    /// Print names of files that are part of the compilation and then stop processing.
    #[arg(long = "listFilesOnly", alias = "list-files-only")]
    pub list_files_only: bool,

    /// Print files read during the compilation including why each was included.
    #[arg(long = "explainFiles", alias = "explain-files")]
    pub explain_files: bool,

    /// Path to tsconfig.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Enable color and formatting in output.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub pretty: Option<bool>,

    /// Load files on one thread, in a deterministic schedule.
    #[arg(long = "singleThreaded", alias = "single-threaded")]
    pub single_threaded: bool,

    /// Directory holding the bundled `lib.*.d.ts` files. Falls back to
    /// `TSZ_LIB_DIR`, then to `lib/` next to the executable.
    #[arg(long = "libDir", alias = "lib-dir")]
    pub lib_dir: Option<PathBuf>,

    // ==================== Language and Environment ====================
    /// Set the JavaScript language version.
    #[arg(short = 't', long, value_parser = parse_target)]
    pub target: Option<ScriptTarget>,

    /// Specify a set of bundled library declaration files.
    #[arg(long, value_delimiter = ',')]
    pub lib: Option<Vec<String>>,

    /// Disable including any library files, including the default lib.d.ts.
    #[arg(long = "noLib", alias = "no-lib")]
    pub no_lib: bool,

    /// Specify what JSX code is generated.
    #[arg(long, value_parser = parse_jsx)]
    pub jsx: Option<JsxEmit>,

    /// Specify module specifier for JSX factory functions (e.g. 'react').
    #[arg(long = "jsxImportSource", alias = "jsx-import-source")]
    pub jsx_import_source: Option<String>,

    // ==================== Modules ====================
    /// Disallow 'import's, 'require's or '<reference>'s from expanding the number of files.
    #[arg(long = "noResolve", alias = "no-resolve")]
    pub no_resolve: bool,

    /// Specify multiple folders that act like './node_modules/@types'.
    #[arg(long = "typeRoots", alias = "type-roots", value_delimiter = ',')]
    pub type_roots: Option<Vec<String>>,

    /// Specify type package names to be included without being referenced in a source file.
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<String>>,

    /// Enable importing .json files.
    #[arg(long = "resolveJsonModule", alias = "resolve-json-module")]
    pub resolve_json_module: bool,

    /// Disable resolving symlinks to their realpath.
    #[arg(long = "preserveSymlinks", alias = "preserve-symlinks")]
    pub preserve_symlinks: bool,

    // ==================== JavaScript Support ====================
    /// Allow JavaScript files to be a part of your program.
    #[arg(long = "allowJs", alias = "allow-js")]
    pub allow_js: bool,

    /// Specify the maximum folder depth used for checking JavaScript files from 'node_modules'.
    #[arg(long = "maxNodeModuleJsDepth", alias = "max-node-module-js-depth")]
    pub max_node_module_js_depth: Option<usize>,

    // ==================== Emit ====================
    /// Allow importing helper functions from tslib once per project.
    #[arg(long = "importHelpers", alias = "import-helpers")]
    pub import_helpers: bool,

    // ==================== Projects ====================
    /// Disable preferring source files instead of declaration files when referencing composite projects.
    #[arg(
        long = "disableSourceOfProjectReferenceRedirect",
        alias = "disable-source-of-project-reference-redirect"
    )]
    pub disable_source_of_project_reference_redirect: bool,

    /// Input files. When given, tsconfig.json files are ignored.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

fn parse_target(value: &str) -> Result<ScriptTarget, String> {
    ScriptTarget::parse(value).ok_or_else(|| format!("unsupported target '{value}'"))
}

fn parse_jsx(value: &str) -> Result<JsxEmit, String> {
    JsxEmit::parse(value).ok_or_else(|| format!("unsupported jsx mode '{value}'"))
}

#[cfg(test)]
#[path = "../tests/args.rs"]
mod tests;
