//! The slice of a parsed source file the loader needs.
//!
//! The parser itself is external; it hands back a [`SourceFile`] listing
//! every reference that may pull another file into the program.

use tsz_common::ResolvedPath;
use tsz_common::options::ScriptTarget;
use tsz_common::path::{
    EXTENSION_CJS, EXTENSION_CTS, EXTENSION_DCTS, EXTENSION_DMTS, EXTENSION_JS, EXTENSION_JSON,
    EXTENSION_JSX, EXTENSION_MJS, EXTENSION_MTS, EXTENSION_TSX, file_extension_is,
    file_extension_is_one_of, is_declaration_file_name,
};

/// Module format a reference is resolved under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    #[default]
    None,
    CommonJs,
    EsModule,
}

impl ResolutionMode {
    /// Parse the value of a `resolution-mode` attribute.
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "require" => Some(Self::CommonJs),
            "import" => Some(Self::EsModule),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptKind {
    #[default]
    Ts,
    Tsx,
    Js,
    Jsx,
    Json,
}

impl ScriptKind {
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        if file_extension_is(file_name, EXTENSION_TSX) {
            Self::Tsx
        } else if file_extension_is(file_name, EXTENSION_JSX) {
            Self::Jsx
        } else if file_extension_is_one_of(file_name, &[EXTENSION_JS, EXTENSION_MJS, EXTENSION_CJS])
        {
            Self::Js
        } else if file_extension_is(file_name, EXTENSION_JSON) {
            Self::Json
        } else {
            Self::Ts
        }
    }
}

/// A `/// <reference ... />` directive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileReference {
    pub file_name: String,
    pub pos: u32,
    pub end: u32,
    pub resolution_mode: Option<ResolutionMode>,
}

impl FileReference {
    #[must_use]
    pub fn new(file_name: impl Into<String>, pos: u32, end: u32) -> Self {
        Self {
            file_name: file_name.into(),
            pos,
            end,
            resolution_mode: None,
        }
    }
}

/// How a module specifier appears in source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "x"` or `import "x"`
    #[default]
    Import,
    /// `export ... from "x"`
    ExportFrom,
    /// `import x = require("x")`
    ImportEquals,
    /// `require("x")`
    Require,
    /// `import("x")`
    DynamicImport,
    /// `declare module "x" { ... }`
    Augmentation,
    /// Added by the loader (`tslib`, JSX runtime).
    Synthetic,
}

/// A string literal naming a module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSpecifier {
    pub text: String,
    pub pos: u32,
    pub end: u32,
    pub kind: ImportKind,
    pub resolution_mode: Option<ResolutionMode>,
}

impl ModuleSpecifier {
    #[must_use]
    pub fn new(text: impl Into<String>, pos: u32, end: u32, kind: ImportKind) -> Self {
        Self {
            text: text.into(),
            pos,
            end,
            kind,
            resolution_mode: None,
        }
    }

    #[must_use]
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self::new(text, 0, 0, ImportKind::Synthetic)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleAugmentation {
    /// `declare module "x"`, resolved like an import.
    StringLiteral(ModuleSpecifier),
    /// `declare global`, never resolved.
    Global,
}

/// Per-file facts gathered before parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceFileMetaData {
    /// `type` field of the nearest `package.json`.
    pub package_json_type: Option<String>,
    pub implied_node_format: ResolutionMode,
}

/// Module format a file is interpreted with, from its extension and the
/// nearest `package.json` `type`.
#[must_use]
pub fn get_implied_node_format_for_file(
    file_name: &str,
    package_json_type: Option<&str>,
) -> ResolutionMode {
    if file_extension_is_one_of(file_name, &[EXTENSION_DMTS, EXTENSION_MTS, EXTENSION_MJS]) {
        ResolutionMode::EsModule
    } else if file_extension_is_one_of(file_name, &[EXTENSION_DCTS, EXTENSION_CTS, EXTENSION_CJS]) {
        ResolutionMode::CommonJs
    } else if package_json_type == Some("module") {
        ResolutionMode::EsModule
    } else {
        ResolutionMode::CommonJs
    }
}

/// What a parser is told about the file it parses.
#[derive(Clone, Debug)]
pub struct SourceFileParseOptions {
    pub file_name: String,
    pub path: ResolvedPath,
    pub target: ScriptTarget,
    pub metadata: SourceFileMetaData,
}

#[derive(Clone, Debug, Default)]
pub struct SourceFile {
    pub file_name: String,
    pub path: ResolvedPath,
    pub script_kind: ScriptKind,
    pub language_version: ScriptTarget,
    pub statement_count: usize,
    pub referenced_files: Vec<FileReference>,
    pub type_reference_directives: Vec<FileReference>,
    pub lib_reference_directives: Vec<FileReference>,
    pub imports: Vec<ModuleSpecifier>,
    pub module_augmentations: Vec<ModuleAugmentation>,
    pub is_declaration_file: bool,
    pub is_external_module: bool,
    pub has_no_default_lib: bool,
    /// Value of an `@jsxImportSource` pragma.
    pub jsx_import_source_pragma: Option<String>,
}

impl SourceFile {
    /// An empty file for `options`, ready for a parser to fill in.
    #[must_use]
    pub fn new(options: &SourceFileParseOptions) -> Self {
        Self {
            file_name: options.file_name.clone(),
            path: options.path.clone(),
            script_kind: ScriptKind::from_file_name(&options.file_name),
            language_version: options.target,
            is_declaration_file: is_declaration_file_name(&options.file_name),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_js(&self) -> bool {
        matches!(self.script_kind, ScriptKind::Js | ScriptKind::Jsx)
    }
}

/// The external parser.
///
/// Parsing never fails: any text yields a tree, possibly full of error nodes.
pub trait SourceFileParser: Send + Sync {
    fn parse_source_file(&self, options: &SourceFileParseOptions, text: &str) -> SourceFile;
}
