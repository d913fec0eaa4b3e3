use colored::Colorize;
use rustc_hash::FxHashMap;
use std::path::Path;

use tsz_common::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

/// Byte offsets of line starts.
struct LineMap {
    starts: Vec<usize>,
}

impl LineMap {
    fn build(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|at| at + 1));
        Self { starts }
    }

    /// Zero-based line and character (in chars) of a byte offset.
    fn position(&self, offset: usize, source: &str) -> (usize, usize) {
        let offset = offset.min(source.len());
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.starts[line];
        let character = source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        (line, character)
    }
}

/// Renders diagnostics the way `tsc` prints them.
pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, String>,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self {
            color,
            sources: FxHashMap::default(),
            line_maps: FxHashMap::default(),
        }
    }

    /// Use `text` for `file` instead of reading it from disk.
    pub fn add_source(&mut self, file: impl Into<String>, text: impl Into<String>) {
        let file = file.into();
        self.line_maps.remove(&file);
        self.sources.insert(file, text.into());
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let category = self.format_category(diagnostic.category);
        let code = self.format_code(diagnostic.code);

        let mut output = String::new();
        if !diagnostic.file.is_empty() {
            let location = self
                .format_location(&diagnostic.file, diagnostic.start)
                .unwrap_or_else(|| diagnostic.file.clone());
            output.push_str(&location);
            output.push_str(" - ");
        }
        output.push_str(&category);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
            if let Some(snippet) = self.format_snippet(&related.file, related.start, related.length)
            {
                output.push_str(&snippet);
            }
        }
        output
    }

    /// The offending line with the span underlined:
    ///   2   import "./missing";
    ///              ~~~~~~~~~~~
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }
        let (line, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?;
        let line_text = source.lines().nth(line)?;

        let mut underline = String::new();
        let span_chars = source
            .get(start as usize..(start + length) as usize)
            .map_or(length as usize, |span| span.chars().count());
        for (index, ch) in line_text.chars().enumerate() {
            let cell = if ch == '\t' { 4 } else { 1 };
            if index < column {
                underline.push_str(&" ".repeat(cell));
            } else if index < column + span_chars {
                underline.push_str(&"~".repeat(cell));
            } else {
                break;
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        Some(format!("\n  {:>3}   {line_text}\n        {underline}", line + 1))
    }

    fn format_related(&mut self, related: &DiagnosticRelatedInformation) -> String {
        let location = self
            .format_location(&related.file, related.start)
            .unwrap_or_else(|| related.file.clone());
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };
        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }
        let (line, column) = self.position_for(file, offset)?;
        let file = if self.color {
            file.cyan().to_string()
        } else {
            file.to_string()
        };
        Some(format!("{file}:{}:{}", line + 1, column + 1))
    }

    fn position_for(&mut self, file: &str, offset: u32) -> Option<(usize, usize)> {
        self.ensure_source(file)?;
        let source = self.sources.get(file)?;
        let line_map = self
            .line_maps
            .entry(file.to_string())
            .or_insert_with(|| LineMap::build(source));
        Some(line_map.position(offset as usize, source))
    }

    fn ensure_source(&mut self, file: &str) -> Option<()> {
        if !self.sources.contains_key(file) {
            let contents = std::fs::read_to_string(Path::new(file)).ok()?;
            self.sources.insert(file.to_string(), contents);
        }
        Some(())
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }
        let label = format!("TS{code}");
        if self.color {
            label.bright_black().to_string()
        } else {
            label
        }
    }
}

#[cfg(test)]
#[path = "../tests/reporter.rs"]
mod tests;
