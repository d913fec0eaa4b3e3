//! `CompilerHost` over the real file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tsz_common::ResolvedPath;
use tsz_common::limits::{
    BINARY_CONSECUTIVE_NUL_RUN, BINARY_MAX_CONTROL_BYTES, BINARY_MAX_NUL_BYTES,
    BINARY_SNIFF_WINDOW,
};
use tsz_common::path::normalize_slashes;
use tsz_loader::{CompilerHost, ParsedCommandLine, ResolutionHost};

use crate::config::parse_config_file;

/// `/`-separated string form of a path.
#[must_use]
pub fn path_to_string(path: &Path) -> String {
    normalize_slashes(&path.to_string_lossy())
}

pub struct DiskHost {
    current_directory: String,
    use_case_sensitive_file_names: bool,
    default_library_path: String,
    /// Referenced project configs by config path. `None` when loading failed.
    project_references: DashMap<ResolvedPath, Option<Arc<ParsedCommandLine>>>,
}

impl DiskHost {
    #[must_use]
    pub fn new(current_directory: &Path, default_library_path: &Path) -> Self {
        Self {
            current_directory: path_to_string(current_directory),
            use_case_sensitive_file_names: probe_case_sensitivity(current_directory),
            default_library_path: path_to_string(default_library_path),
            project_references: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_case_sensitivity(mut self, use_case_sensitive_file_names: bool) -> Self {
        self.use_case_sensitive_file_names = use_case_sensitive_file_names;
        self
    }

    fn load_project_reference(&self, config_name: &str) -> Option<Arc<ParsedCommandLine>> {
        match parse_config_file(Path::new(config_name)) {
            Ok(parsed) => {
                for diagnostic in &parsed.diagnostics {
                    tracing::warn!(config = config_name, "{}", diagnostic.message_text);
                }
                Some(Arc::new(parsed.into_command_line(
                    &self.current_directory,
                    self.use_case_sensitive_file_names,
                )))
            }
            Err(err) => {
                tracing::debug!(config = config_name, "project reference not loaded: {err:#}");
                None
            }
        }
    }
}

/// A file system is case-insensitive when the case-swapped spelling of an
/// existing directory also exists.
fn probe_case_sensitivity(dir: &Path) -> bool {
    let original = dir.to_string_lossy();
    let swapped: String = original
        .chars()
        .map(|ch| {
            if ch.is_uppercase() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                ch.to_uppercase().next().unwrap_or(ch)
            }
        })
        .collect();
    if swapped == original || !dir.exists() {
        return !cfg!(any(windows, target_os = "macos"));
    }
    !Path::new(&swapped).exists()
}

/// Does this look like something other than source text?
///
/// Checks only the first [`BINARY_SNIFF_WINDOW`] bytes: too many NULs, a run
/// of NULs, or several non-whitespace control bytes.
#[must_use]
pub fn is_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(BINARY_SNIFF_WINDOW)];
    if memchr::memchr_iter(0, window).count() > BINARY_MAX_NUL_BYTES {
        return true;
    }
    if memchr::memmem::find(window, &[0u8; BINARY_CONSECUTIVE_NUL_RUN]).is_some() {
        return true;
    }
    let control_count = window
        .iter()
        .filter(|&&b| b != 0 && b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0B | 0x0C))
        .count();
    control_count >= BINARY_MAX_CONTROL_BYTES
}

fn decode_utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> String {
    let words: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| from_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&words)
}

/// Text of a source file: BOMs honored, binary content rejected.
#[must_use]
pub fn decode_source_text(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => return Some(decode_utf16(rest, u16::from_be_bytes)),
        [0xFF, 0xFE, rest @ ..] => return Some(decode_utf16(rest, u16::from_le_bytes)),
        _ => {}
    }
    if is_binary(bytes) {
        return None;
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    Some(String::from_utf8_lossy(bytes).into_owned())
}

impl ResolutionHost for DiskHost {
    fn use_case_sensitive_file_names(&self) -> bool {
        self.use_case_sensitive_file_names
    }

    fn current_directory(&self) -> &str {
        &self.current_directory
    }

    fn file_exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn directory_exists(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn read_file(&self, path: &str) -> Option<String> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::trace!(path, %err, "read failed");
                return None;
            }
        };
        let text = decode_source_text(&bytes);
        if text.is_none() {
            tracing::debug!(path, "skipping binary file");
        }
        text
    }

    fn realpath(&self, path: &str) -> String {
        std::fs::canonicalize(path)
            .map(|real| path_to_string(&strip_verbatim_prefix(real)))
            .unwrap_or_else(|_| path.to_string())
    }

    fn get_directories(&self, path: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(path) else {
            return Vec::new();
        };
        let mut directories: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        directories.sort();
        directories
    }

    fn trace(&self, message: &str) {
        tracing::trace!(target: "tsz_cli::host", "{message}");
    }
}

impl CompilerHost for DiskHost {
    fn default_library_path(&self) -> String {
        self.default_library_path.clone()
    }

    fn get_resolved_project_reference(
        &self,
        config_name: &str,
        path: &ResolvedPath,
    ) -> Option<Arc<ParsedCommandLine>> {
        if let Some(cached) = self.project_references.get(path) {
            return cached.value().clone();
        }
        let loaded = self.load_project_reference(config_name);
        self.project_references
            .entry(path.clone())
            .or_insert(loaded)
            .value()
            .clone()
    }

    fn as_resolution_host(&self) -> &dyn ResolutionHost {
        self
    }
}

/// `canonicalize` on Windows yields `\\?\C:\...`.
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|text| text.strip_prefix(r"\\?\")) {
        Some(stripped) => PathBuf::from(stripped),
        None => path,
    }
}

/// Where the bundled `lib.*.d.ts` files live: the explicit directory, else
/// `TSZ_LIB_DIR`, else `lib/` beside (or one level above) the executable.
#[must_use]
pub fn default_library_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(dir) = explicit {
        return cwd.join(dir);
    }
    if let Some(dir) = std::env::var_os("TSZ_LIB_DIR") {
        return cwd.join(dir);
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates: Vec<PathBuf> = exe_dir
        .iter()
        .flat_map(|dir| [dir.join("lib"), dir.join("..").join("lib")])
        .collect();
    match candidates.iter().find(|candidate| candidate.is_dir()) {
        Some(found) => std::fs::canonicalize(found).unwrap_or_else(|_| found.clone()),
        None => {
            let fallback = candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| cwd.join("lib"));
            tracing::warn!(dir = %fallback.display(), "lib directory not found");
            fallback
        }
    }
}

#[cfg(test)]
#[path = "../tests/disk_host.rs"]
mod tests;
