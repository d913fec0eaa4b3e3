//! Reference extraction from source text.
//!
//! `TextScanParser` does not build a syntax tree. It tokenizes just enough to
//! step over comments, strings, template literals and regular expressions,
//! then matches the statement shapes that can pull another file into the
//! program:
//! - leading `/// <reference path|types|lib|no-default-lib />` directives
//! - `import ... from "x"`, `import "x"`, `export ... from "x"`
//! - `import x = require("x")`, `import("x")`, and `require("x")` in JS
//! - `declare module "x"` / `declare global` augmentations in modules
//! - an `@jsxImportSource` pragma in a leading comment

use tsz_loader::SourceFileParser;
use tsz_loader::source_file::{
    FileReference, ImportKind, ModuleAugmentation, ModuleSpecifier, ResolutionMode, SourceFile,
    SourceFileParseOptions,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Identifier,
    String,
    Template,
    Number,
    Regex,
    Punct(u8),
}

#[derive(Clone, Copy, Debug)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

/// Keywords after which a `/` starts a regular expression.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

const fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    /// Comments before the first token, as byte ranges.
    leading_comments: Vec<(usize, usize)>,
    /// Brace depth at each open `${`.
    template_depths: Vec<usize>,
    brace_depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let pos = if text.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            text,
            bytes,
            pos,
            tokens: Vec::new(),
            leading_comments: Vec::new(),
            template_depths: Vec::new(),
            brace_depth: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn run(mut self) -> Self {
        while let Some(b) = self.peek(0) {
            let start = self.pos;
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    self.pos = memchr::memchr(b'\n', &self.bytes[start..])
                        .map_or(self.bytes.len(), |offset| start + offset);
                    self.record_comment(start);
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    self.pos = memchr::memmem::find(&self.bytes[start + 2..], b"*/")
                        .map_or(self.bytes.len(), |offset| start + 2 + offset + 2);
                    self.record_comment(start);
                }
                b'/' if self.regex_allowed() => self.scan_regex(),
                b'"' | b'\'' => {
                    self.scan_string(b);
                    self.push(TokenKind::String, start);
                }
                b'`' => {
                    self.pos += 1;
                    self.scan_template(start);
                }
                b'{' => {
                    self.pos += 1;
                    self.brace_depth += 1;
                    self.push(TokenKind::Punct(b), start);
                }
                b'}' if self.template_depths.last() == Some(&self.brace_depth) => {
                    self.template_depths.pop();
                    self.pos += 1;
                    self.scan_template(start);
                }
                b'}' => {
                    self.pos += 1;
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    self.push(TokenKind::Punct(b), start);
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    while self
                        .peek(0)
                        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
                    {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Number, start);
                }
                b'\\' => {
                    // Unicode escape in an identifier.
                    self.pos = (self.pos + 2).min(self.bytes.len());
                    self.scan_identifier_rest();
                    self.push(TokenKind::Identifier, start);
                }
                _ if is_identifier_byte(b) => {
                    self.scan_identifier_rest();
                    self.push(TokenKind::Identifier, start);
                }
                _ => {
                    self.pos += 1;
                    self.push(TokenKind::Punct(b), start);
                }
            }
        }
        self
    }

    fn record_comment(&mut self, start: usize) {
        if self.tokens.is_empty() {
            self.leading_comments.push((start, self.pos));
        }
    }

    fn scan_identifier_rest(&mut self) {
        while self.peek(0).is_some_and(is_identifier_byte) {
            self.pos += 1;
        }
    }

    fn regex_allowed(&self) -> bool {
        let Some(previous) = self.tokens.last() else {
            return true;
        };
        match previous.kind {
            TokenKind::Punct(b) => !matches!(b, b')' | b']' | b'}'),
            TokenKind::Identifier => {
                REGEX_PRECEDING_KEYWORDS.contains(&&self.text[previous.start..previous.end])
            }
            TokenKind::String | TokenKind::Template | TokenKind::Number | TokenKind::Regex => {
                false
            }
        }
    }

    /// Falls back to a `/` punctuator when the literal does not close on its line.
    fn scan_regex(&mut self) {
        let start = self.pos;
        let mut cursor = start + 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(cursor) {
                None | Some(b'\n' | b'\r') => {
                    self.pos = start + 1;
                    self.push(TokenKind::Punct(b'/'), start);
                    return;
                }
                Some(b'\\') => cursor += 2,
                Some(b'[') => {
                    in_class = true;
                    cursor += 1;
                }
                Some(b']') => {
                    in_class = false;
                    cursor += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => cursor += 1,
            }
        }
        self.pos = cursor + 1;
        self.scan_identifier_rest();
        self.push(TokenKind::Regex, start);
    }

    /// Positions after the closing quote, or at the end of an unterminated line.
    fn scan_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' | b'\r' => return,
                _ if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    /// Scans a template segment starting just past '`' or a substitution's '}'.
    fn scan_template(&mut self, start: usize) {
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    break;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.template_depths.push(self.brace_depth);
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
        self.push(TokenKind::Template, start);
    }
}

fn offset(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Parsed `name="value"` pairs of a `<reference ... />` tag, with the byte
/// range of each value.
fn reference_attributes(comment: &str, base: usize) -> Vec<(&str, &str, usize, usize)> {
    let Some(tag) = comment.trim_start().strip_prefix("<reference") else {
        return Vec::new();
    };
    let mut attributes = Vec::new();
    let mut cursor = comment.len() - tag.len();
    let bytes = comment.as_bytes();
    loop {
        while bytes.get(cursor).is_some_and(u8::is_ascii_whitespace) {
            cursor += 1;
        }
        let name_start = cursor;
        while bytes
            .get(cursor)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
        {
            cursor += 1;
        }
        if cursor == name_start || bytes.get(cursor) != Some(&b'=') {
            break;
        }
        let name = &comment[name_start..cursor];
        cursor += 1;
        let Some(&quote @ (b'"' | b'\'')) = bytes.get(cursor) else {
            break;
        };
        let value_start = cursor + 1;
        let Some(length) = comment[value_start..].find(char::from(quote)) else {
            break;
        };
        let value_end = value_start + length;
        attributes.push((
            name,
            &comment[value_start..value_end],
            base + value_start,
            base + value_end,
        ));
        cursor = value_end + 1;
    }
    attributes
}

fn jsx_import_source_pragma(comment: &str) -> Option<String> {
    let at = comment.find("@jsxImportSource")?;
    let rest = comment[at + "@jsxImportSource".len()..].trim_start();
    let value: String = rest
        .chars()
        .take_while(|ch| !ch.is_whitespace() && *ch != '*')
        .collect();
    (!value.is_empty()).then_some(value)
}

fn apply_leading_comments(text: &str, comments: &[(usize, usize)], file: &mut SourceFile) {
    for &(start, end) in comments {
        let comment = &text[start..end];
        if file.jsx_import_source_pragma.is_none() {
            file.jsx_import_source_pragma = jsx_import_source_pragma(comment);
        }
        let Some(body) = comment.strip_prefix("///") else {
            continue;
        };
        let attributes = reference_attributes(body, start + 3);
        let attribute = |name: &str| attributes.iter().find(|attr| attr.0 == name);
        if attribute("no-default-lib").is_some_and(|attr| attr.1 == "true") {
            file.has_no_default_lib = true;
        } else if let Some(&(_, value, pos, end)) = attribute("path") {
            file.referenced_files
                .push(FileReference::new(value, offset(pos), offset(end)));
        } else if let Some(&(_, value, pos, end)) = attribute("types") {
            let mut reference = FileReference::new(value, offset(pos), offset(end));
            reference.resolution_mode = attribute("resolution-mode")
                .and_then(|attr| ResolutionMode::from_attribute(attr.1));
            file.type_reference_directives.push(reference);
        } else if let Some(&(_, value, pos, end)) = attribute("lib") {
            file.lib_reference_directives
                .push(FileReference::new(value, offset(pos), offset(end)));
        }
    }
}

/// Tokens that carry on after a `}` rather than open a new statement, as in
/// `import { a } from "a"` or `const o = { a } as T;`.
fn continues_statement(text: &str, token: &Token) -> bool {
    match token.kind {
        TokenKind::Punct(b) => matches!(b, b';' | b',' | b')' | b']' | b'.' | b'=' | b':' | b'?'),
        TokenKind::Identifier => matches!(&text[token.start..token.end], "from" | "as"),
        _ => false,
    }
}

enum AugmentationCandidate {
    Module(ModuleSpecifier),
    Global,
}

/// Walks the token stream and matches reference-bearing statements.
struct Collector<'a> {
    text: &'a str,
    tokens: &'a [Token],
    /// Brace depth before each token.
    depths: Vec<usize>,
    is_js: bool,
    imports: Vec<ModuleSpecifier>,
    augmentations: Vec<AugmentationCandidate>,
    is_external_module: bool,
    statement_count: usize,
}

impl<'a> Collector<'a> {
    fn new(text: &'a str, tokens: &'a [Token], is_js: bool) -> Self {
        let mut depths = Vec::with_capacity(tokens.len());
        let mut depth = 0usize;
        let mut statement_count = 0;
        let mut at_statement_start = true;
        for token in tokens {
            depths.push(depth);
            if depth == 0 && at_statement_start && !continues_statement(text, token) {
                statement_count += 1;
            }
            at_statement_start = false;
            match token.kind {
                TokenKind::Punct(b'{') => depth += 1,
                TokenKind::Punct(b'}') => {
                    depth = depth.saturating_sub(1);
                    at_statement_start = depth == 0;
                }
                TokenKind::Punct(b';') => at_statement_start = depth == 0,
                _ => {}
            }
        }
        Self {
            text,
            tokens,
            depths,
            is_js,
            imports: Vec::new(),
            augmentations: Vec::new(),
            is_external_module: false,
            statement_count,
        }
    }

    fn identifier(&self, index: usize) -> Option<&'a str> {
        let token = self.tokens.get(index)?;
        (token.kind == TokenKind::Identifier).then(|| &self.text[token.start..token.end])
    }

    fn is_identifier(&self, index: usize, name: &str) -> bool {
        self.identifier(index) == Some(name)
    }

    fn is_punct(&self, index: usize, punct: u8) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|token| token.kind == TokenKind::Punct(punct))
    }

    /// The string literal at `index` as a specifier spanning its quotes.
    fn specifier(&self, index: usize, kind: ImportKind) -> Option<ModuleSpecifier> {
        let token = self.tokens.get(index)?;
        let bytes = self.text.as_bytes();
        if token.kind != TokenKind::String
            || token.end < token.start + 2
            || bytes[token.end - 1] != bytes[token.start]
        {
            return None;
        }
        let value = &self.text[token.start + 1..token.end - 1];
        Some(ModuleSpecifier::new(
            value,
            offset(token.start),
            offset(token.end),
            kind,
        ))
    }

    /// Index just past the brace group opening at `index`.
    fn skip_braces(&self, index: usize) -> usize {
        let depth = self.depths[index];
        self.tokens[index + 1..]
            .iter()
            .zip(&self.depths[index + 1..])
            .position(|(token, &d)| token.kind == TokenKind::Punct(b'}') && d == depth + 1)
            .map_or(self.tokens.len(), |offset| index + 1 + offset + 1)
    }

    fn run(mut self) -> Self {
        let mut index = 0;
        while index < self.tokens.len() {
            if index > 0 && self.is_punct(index - 1, b'.') {
                index += 1;
                continue;
            }
            index = match self.identifier(index) {
                Some("import") => self.import_at(index),
                Some("export") => self.export_at(index),
                Some("require") if self.is_js => self.require_at(index),
                Some("declare") => self.declare_at(index),
                _ => index + 1,
            };
        }
        self
    }

    fn import_at(&mut self, index: usize) -> usize {
        if self.is_punct(index + 1, b'(') {
            if (self.is_punct(index + 3, b')') || self.is_punct(index + 3, b','))
                && let Some(specifier) = self.specifier(index + 2, ImportKind::DynamicImport)
            {
                self.imports.push(specifier);
                return index + 4;
            }
            return index + 1;
        }
        if self.is_punct(index + 1, b'.') {
            return index + 1;
        }
        if self.depths[index] == 0 {
            self.is_external_module = true;
        }
        if let Some(specifier) = self.specifier(index + 1, ImportKind::Import) {
            self.imports.push(specifier);
            return index + 2;
        }

        let mut cursor = index + 1;
        if self.is_identifier(cursor, "type")
            && (self.is_punct(cursor + 1, b'{')
                || self.is_punct(cursor + 1, b'*')
                || (self.identifier(cursor + 1).is_some() && !self.is_identifier(cursor + 1, "from")))
        {
            cursor += 1;
        }
        if self.identifier(cursor).is_some() && self.is_punct(cursor + 1, b'=') {
            if self.is_identifier(cursor + 2, "require")
                && self.is_punct(cursor + 3, b'(')
                && let Some(specifier) = self.specifier(cursor + 4, ImportKind::ImportEquals)
            {
                self.imports.push(specifier);
                return cursor + 5;
            }
            return cursor + 2;
        }

        while cursor < self.tokens.len() {
            if self.is_identifier(cursor, "from") {
                if let Some(specifier) = self.specifier(cursor + 1, ImportKind::Import) {
                    self.imports.push(specifier);
                    return cursor + 2;
                }
                // `import from from "x"`
                cursor += 1;
            } else if self.identifier(cursor).is_some()
                || self.is_punct(cursor, b',')
                || self.is_punct(cursor, b'*')
            {
                cursor += 1;
            } else if self.is_punct(cursor, b'{') {
                cursor = self.skip_braces(cursor);
            } else {
                break;
            }
        }
        cursor
    }

    fn export_at(&mut self, index: usize) -> usize {
        if self.depths[index] == 0 {
            self.is_external_module = true;
        }
        let mut cursor = index + 1;
        if self.is_identifier(cursor, "type")
            && (self.is_punct(cursor + 1, b'{') || self.is_punct(cursor + 1, b'*'))
        {
            cursor += 1;
        }
        if self.is_punct(cursor, b'*') {
            cursor += 1;
            if self.is_identifier(cursor, "as") {
                cursor += 2;
            }
        } else if self.is_punct(cursor, b'{') {
            cursor = self.skip_braces(cursor);
        } else {
            return cursor;
        }
        if self.is_identifier(cursor, "from")
            && let Some(specifier) = self.specifier(cursor + 1, ImportKind::ExportFrom)
        {
            self.imports.push(specifier);
            return cursor + 2;
        }
        cursor
    }

    fn require_at(&mut self, index: usize) -> usize {
        if self.is_punct(index + 1, b'(')
            && self.is_punct(index + 3, b')')
            && let Some(specifier) = self.specifier(index + 2, ImportKind::Require)
        {
            self.imports.push(specifier);
            return index + 4;
        }
        index + 1
    }

    fn declare_at(&mut self, index: usize) -> usize {
        if self.depths[index] != 0 {
            return index + 1;
        }
        if self.is_identifier(index + 1, "module")
            && let Some(specifier) = self.specifier(index + 2, ImportKind::Augmentation)
        {
            self.augmentations
                .push(AugmentationCandidate::Module(specifier));
            return index + 3;
        }
        if self.is_identifier(index + 1, "global") && self.is_punct(index + 2, b'{') {
            self.augmentations.push(AugmentationCandidate::Global);
            return index + 2;
        }
        index + 1
    }
}

/// `SourceFileParser` backed by a token scan instead of a full parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextScanParser;

impl TextScanParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SourceFileParser for TextScanParser {
    fn parse_source_file(&self, options: &SourceFileParseOptions, text: &str) -> SourceFile {
        let mut file = SourceFile::new(options);
        let lexer = Lexer::new(text).run();
        apply_leading_comments(text, &lexer.leading_comments, &mut file);

        let collected = Collector::new(text, &lexer.tokens, file.is_js()).run();
        file.imports = collected.imports;
        file.is_external_module = collected.is_external_module;
        file.statement_count = collected.statement_count;
        // Ambient module declarations in a script declare modules rather
        // than augment them.
        if file.is_external_module {
            file.module_augmentations = collected
                .augmentations
                .into_iter()
                .map(|candidate| match candidate {
                    AugmentationCandidate::Module(specifier) => {
                        ModuleAugmentation::StringLiteral(specifier)
                    }
                    AugmentationCandidate::Global => ModuleAugmentation::Global,
                })
                .collect();
        }
        tracing::trace!(
            file = %options.file_name,
            imports = file.imports.len(),
            references = file.referenced_files.len(),
            "scanned"
        );
        file
    }
}

#[cfg(test)]
#[path = "../tests/scanner.rs"]
mod tests;
