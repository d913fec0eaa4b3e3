//! Why a file is part of the program.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileIncludeKind {
    RootFile,
    /// A lib from `lib` or the default lib for the target.
    LibFile,
    /// `/// <reference path="..." />`
    ReferenceFile,
    /// `/// <reference types="..." />`
    TypeReferenceDirective,
    /// `/// <reference lib="..." />`
    LibReferenceDirective,
    Import,
    /// A package from `types` or the type roots.
    AutomaticTypeDirectiveFile,
    /// Stands in for a file of a referenced project.
    ProjectReferenceRedirect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileIncludeReason {
    pub kind: FileIncludeKind,
    /// Specifier, reference text, lib or type name. Empty for root files and
    /// default libs.
    pub text: String,
    /// File the reference appears in.
    pub referencing_file: Option<String>,
}

impl FileIncludeReason {
    #[must_use]
    pub fn new(kind: FileIncludeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            referencing_file: None,
        }
    }

    #[must_use]
    pub fn from_file(mut self, referencing_file: impl Into<String>) -> Self {
        self.referencing_file = Some(referencing_file.into());
        self
    }
}

impl fmt::Display for FileIncludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.referencing_file.as_deref().unwrap_or_default();
        match self.kind {
            FileIncludeKind::RootFile => f.write_str("Root file specified for compilation"),
            FileIncludeKind::LibFile if self.text.is_empty() => f.write_str("Default library"),
            FileIncludeKind::LibFile => {
                write!(f, "Library '{}' specified in compilerOptions", self.text)
            }
            FileIncludeKind::ReferenceFile => {
                write!(f, "Referenced via '{}' from file '{from}'", self.text)
            }
            FileIncludeKind::TypeReferenceDirective => {
                write!(f, "Type library referenced via '{}' from file '{from}'", self.text)
            }
            FileIncludeKind::LibReferenceDirective => {
                write!(f, "Library referenced via '{}' from file '{from}'", self.text)
            }
            FileIncludeKind::Import => write!(f, "Imported via '{}' from file '{from}'", self.text),
            FileIncludeKind::AutomaticTypeDirectiveFile => {
                write!(f, "Entry point for implicit type library '{}'", self.text)
            }
            FileIncludeKind::ProjectReferenceRedirect => {
                write!(f, "Redirected from '{from}' of a referenced project")
            }
        }
    }
}
