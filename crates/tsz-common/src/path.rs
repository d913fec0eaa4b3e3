//! Path identity and path algebra.
//!
//! Paths inside the loader are plain strings using `/` as the directory
//! separator. A [`ResolvedPath`] is the canonical, absolute form of a file
//! name and is what file identity compares on. Every function here is pure:
//! hosts are responsible for mapping these strings onto a real file system.
//!
//! Root handling follows the usual TypeScript rules:
//! - POSIX roots (`/`)
//! - UNC roots (`//server/`)
//! - DOS volumes (`c:`, `c:/`)
//! - URLs (`file:///c:/`, `http://server/`), reported by
//!   [`encoded_root_length`] as a bitwise-complemented length.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

pub const DIRECTORY_SEPARATOR: char = '/';
const URL_SCHEME_SEPARATOR: &str = "://";

pub const EXTENSION_TS: &str = ".ts";
pub const EXTENSION_TSX: &str = ".tsx";
pub const EXTENSION_DTS: &str = ".d.ts";
pub const EXTENSION_JS: &str = ".js";
pub const EXTENSION_JSX: &str = ".jsx";
pub const EXTENSION_JSON: &str = ".json";
pub const EXTENSION_MJS: &str = ".mjs";
pub const EXTENSION_MTS: &str = ".mts";
pub const EXTENSION_DMTS: &str = ".d.mts";
pub const EXTENSION_CJS: &str = ".cjs";
pub const EXTENSION_CTS: &str = ".cts";
pub const EXTENSION_DCTS: &str = ".d.cts";

/// Extensions recognized by [`try_get_extension_from_path`], longest first so
/// that `.d.ts` wins over `.ts`.
const ALL_EXTENSIONS: &[&str] = &[
    EXTENSION_DTS,
    EXTENSION_DMTS,
    EXTENSION_DCTS,
    EXTENSION_TSX,
    EXTENSION_TS,
    EXTENSION_MTS,
    EXTENSION_CTS,
    EXTENSION_JSX,
    EXTENSION_JS,
    EXTENSION_MJS,
    EXTENSION_CJS,
    EXTENSION_JSON,
];

pub const SUPPORTED_TS_EXTENSIONS: &[&str] = &[
    EXTENSION_TS,
    EXTENSION_TSX,
    EXTENSION_DTS,
    EXTENSION_MTS,
    EXTENSION_DMTS,
    EXTENSION_CTS,
    EXTENSION_DCTS,
];

pub const SUPPORTED_JS_EXTENSIONS: &[&str] = &[
    EXTENSION_JS,
    EXTENSION_JSX,
    EXTENSION_MJS,
    EXTENSION_CJS,
];

/// Canonical, absolute, `/`-separated file identity.
///
/// Two files are the same file iff their `ResolvedPath`s are equal. The case
/// policy is applied when the path is produced (see [`to_path`]), so equality
/// here is plain string equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    /// Wrap a string that is already canonical. Prefer [`to_path`].
    #[must_use]
    pub fn new_unchecked(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    #[must_use]
    pub fn directory(&self) -> ResolvedPath {
        ResolvedPath(get_directory_path(&self.0))
    }

    #[must_use]
    pub fn ensure_trailing_directory_separator(&self) -> ResolvedPath {
        ResolvedPath(ensure_trailing_directory_separator(&self.0))
    }
}

impl Deref for ResolvedPath {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResolvedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Roots
// =============================================================================

#[inline]
fn is_any_directory_separator(ch: u8) -> bool {
    ch == b'/' || ch == b'\\'
}

#[inline]
fn is_volume_character(ch: u8) -> bool {
    ch.is_ascii_alphabetic()
}

fn file_url_volume_separator_end(url: &[u8], start: usize) -> Option<usize> {
    let ch0 = *url.get(start)?;
    if ch0 == b':' {
        return Some(start + 1);
    }
    if ch0 == b'%' && url.len() > start + 2 && url[start + 1] == b'3' {
        let ch2 = url[start + 2];
        if ch2 == b'a' || ch2 == b'A' {
            return Some(start + 3);
        }
    }
    None
}

/// Length of the root of `path`.
///
/// Returns `0` for relative paths, a positive length for disk roots, and the
/// bitwise complement (`!len`, always negative) for URL roots.
#[must_use]
pub fn encoded_root_length(path: &str) -> isize {
    let bytes = path.as_bytes();
    let len = bytes.len();
    if len == 0 {
        return 0;
    }
    let ch0 = bytes[0];

    // POSIX or UNC
    if ch0 == b'/' || ch0 == b'\\' {
        if len == 1 || bytes[1] != ch0 {
            return 1;
        }
        return match bytes[2..].iter().position(|&c| c == ch0) {
            Some(p1) => (p1 + 3) as isize,
            None => len as isize,
        };
    }

    // DOS
    if is_volume_character(ch0) && len > 1 && bytes[1] == b':' {
        if len == 2 {
            return 2;
        }
        if is_any_directory_separator(bytes[2]) {
            return 3;
        }
    }

    // URL
    if let Some(scheme_end) = path.find(URL_SCHEME_SEPARATOR) {
        let authority_start = scheme_end + URL_SCHEME_SEPARATOR.len();
        let Some(authority_length) = path[authority_start..].find('/') else {
            return !(len as isize);
        };
        let authority_end = authority_start + authority_length;
        let scheme = &path[..scheme_end];
        let authority = &path[authority_start..authority_end];
        if scheme == "file"
            && (authority.is_empty() || authority == "localhost")
            && len > authority_end + 2
            && is_volume_character(bytes[authority_end + 1])
        {
            if let Some(volume_end) = file_url_volume_separator_end(bytes, authority_end + 2) {
                if volume_end == len {
                    return !(volume_end as isize);
                }
                if bytes[volume_end] == b'/' {
                    return !((volume_end + 1) as isize);
                }
            }
        }
        return !((authority_end + 1) as isize);
    }

    0
}

/// Length of the root of `path`, with URL roots decoded.
#[must_use]
pub fn root_length(path: &str) -> usize {
    let encoded = encoded_root_length(path);
    if encoded < 0 {
        (!encoded) as usize
    } else {
        encoded as usize
    }
}

#[must_use]
pub fn is_url(path: &str) -> bool {
    encoded_root_length(path) < 0
}

/// `/`, `c:`, `c:/` or a UNC root. URLs are not disk paths.
#[must_use]
pub fn is_rooted_disk_path(path: &str) -> bool {
    encoded_root_length(path) > 0
}

#[must_use]
pub fn is_disk_path_root(path: &str) -> bool {
    let root = encoded_root_length(path);
    root > 0 && root as usize == path.len()
}

/// True for disk roots and URLs alike.
#[must_use]
pub fn path_is_absolute(path: &str) -> bool {
    encoded_root_length(path) != 0
}

/// `./x`, `../x`, `.` and `..`.
#[must_use]
pub fn path_is_relative(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with(".\\")
        || path.starts_with("..\\")
}

// =============================================================================
// Combining and normalizing
// =============================================================================

#[must_use]
pub fn normalize_slashes(path: &str) -> String {
    if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

#[must_use]
pub fn has_trailing_directory_separator(path: &str) -> bool {
    path.as_bytes()
        .last()
        .is_some_and(|&c| is_any_directory_separator(c))
}

#[must_use]
pub fn ensure_trailing_directory_separator(path: &str) -> String {
    if has_trailing_directory_separator(path) {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

#[must_use]
pub fn remove_trailing_directory_separator(path: &str) -> &str {
    if has_trailing_directory_separator(path) {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Join path segments. An absolute segment replaces everything before it;
/// `.` and `..` are kept as-is.
#[must_use]
pub fn combine_paths(first: &str, rest: &[&str]) -> String {
    let mut result = normalize_slashes(first);
    for trailing in rest {
        if trailing.is_empty() {
            continue;
        }
        let trailing = normalize_slashes(trailing);
        if result.is_empty() || root_length(&trailing) != 0 {
            result = trailing;
        } else {
            result = ensure_trailing_directory_separator(&result);
            result.push_str(&trailing);
        }
    }
    result
}

fn path_components_with_root(path: &str, root_length: usize) -> Vec<String> {
    let mut components = Vec::with_capacity(8);
    components.push(path[..root_length].to_string());
    let rest = &path[root_length..];
    let mut parts: Vec<&str> = rest.split('/').collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }
    components.extend(parts.into_iter().map(str::to_string));
    components
}

/// Split `path` (resolved against `current_directory`) into its root followed
/// by each segment.
#[must_use]
pub fn get_path_components(path: &str, current_directory: &str) -> Vec<String> {
    let path = combine_paths(current_directory, &[path]);
    let root = root_length(&path);
    path_components_with_root(&path, root)
}

/// Drop empty and `.` segments and fold `..` into its parent.
///
/// A `..` that would climb above a non-empty root is discarded; above an
/// empty (relative) root it is kept.
#[must_use]
pub fn reduce_path_components(components: Vec<String>) -> Vec<String> {
    let mut iter = components.into_iter();
    let Some(root) = iter.next() else {
        return Vec::new();
    };
    let mut reduced = vec![root];
    for component in iter {
        if component.is_empty() || component == "." {
            continue;
        }
        if component == ".." {
            if reduced.len() > 1 {
                if reduced.last().is_some_and(|last| last != "..") {
                    reduced.pop();
                    continue;
                }
            } else if !reduced[0].is_empty() {
                continue;
            }
        }
        reduced.push(component);
    }
    reduced
}

#[must_use]
pub fn get_path_from_path_components(components: &[String]) -> String {
    let Some((root, rest)) = components.split_first() else {
        return String::new();
    };
    let mut result = if root.is_empty() {
        String::new()
    } else {
        ensure_trailing_directory_separator(root)
    };
    result.push_str(&rest.join("/"));
    result
}

/// Does the path contain `//`, or a `.` / `..` segment?
fn has_relative_path_segment(path: &str) -> bool {
    path.contains("//") || path.split('/').any(|segment| segment == "." || segment == "..")
}

/// Normalize slashes and collapse `.`, `..` and duplicate separators.
/// A trailing separator on the input is preserved.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = normalize_slashes(path);
    if !has_relative_path_segment(&path) {
        return path;
    }

    let simplified = path.replace("/./", "/");
    let simplified = simplified.strip_prefix("./").unwrap_or(&simplified);
    if simplified != path && !has_relative_path_segment(simplified) {
        return simplified.to_string();
    }

    let normalized =
        get_path_from_path_components(&reduce_path_components(get_path_components(&path, "")));
    if !normalized.is_empty() && has_trailing_directory_separator(&path) {
        ensure_trailing_directory_separator(&normalized)
    } else {
        normalized
    }
}

#[must_use]
pub fn resolve_path(path: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        normalize_path(path)
    } else {
        normalize_path(&combine_paths(path, rest))
    }
}

#[must_use]
pub fn get_normalized_path_components(path: &str, current_directory: &str) -> Vec<String> {
    reduce_path_components(get_path_components(path, current_directory))
}

#[must_use]
pub fn get_normalized_absolute_path(file_name: &str, current_directory: &str) -> String {
    get_path_from_path_components(&get_normalized_path_components(file_name, current_directory))
}

/// Produce the canonical identity of `file_name`.
///
/// Rooted names are normalized directly; relative names are resolved against
/// `base_path` first. `get_canonical_file_name` applies the host's case policy.
#[must_use]
pub fn to_path(
    file_name: &str,
    base_path: &str,
    get_canonical_file_name: impl Fn(&str) -> String,
) -> ResolvedPath {
    let non_canonical = if is_rooted_disk_path(file_name) {
        normalize_path(file_name)
    } else {
        get_normalized_absolute_path(file_name, base_path)
    };
    ResolvedPath(get_canonical_file_name(&non_canonical))
}

#[must_use]
pub fn to_file_name_lower_case(file_name: &str) -> String {
    if file_name.bytes().any(|b| b.is_ascii_uppercase()) || !file_name.is_ascii() {
        file_name.to_lowercase()
    } else {
        file_name.to_string()
    }
}

/// Canonicalization function for a host's case policy.
#[must_use]
pub fn get_canonical_file_name(use_case_sensitive_file_names: bool) -> fn(&str) -> String {
    if use_case_sensitive_file_names {
        str::to_string
    } else {
        to_file_name_lower_case
    }
}

// =============================================================================
// Directory / base name
// =============================================================================

/// Everything before the last non-trailing separator. A root is returned
/// unchanged.
#[must_use]
pub fn get_directory_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let root = root_length(&path);
    if root == path.len() {
        return path;
    }
    let trimmed = remove_trailing_directory_separator(&path);
    let cut = trimmed.rfind('/').map_or(root, |last| last.max(root));
    trimmed[..cut].to_string()
}

/// The final segment of `path`, without any trailing separator.
#[must_use]
pub fn get_base_file_name(path: &str) -> String {
    let path = normalize_slashes(path);
    let root = root_length(&path);
    if root == path.len() {
        return String::new();
    }
    let trimmed = remove_trailing_directory_separator(&path);
    let start = trimmed
        .rfind('/')
        .map_or(0, |last| last + 1)
        .max(root_length(trimmed));
    trimmed[start..].to_string()
}

// =============================================================================
// Extensions
// =============================================================================

#[must_use]
pub fn file_extension_is(path: &str, extension: &str) -> bool {
    path.len() > extension.len() && path.ends_with(extension)
}

#[must_use]
pub fn file_extension_is_one_of(path: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| file_extension_is(path, ext))
}

/// The known extension of `path`, if any.
#[must_use]
pub fn try_get_extension_from_path(path: &str) -> Option<&'static str> {
    ALL_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| file_extension_is(path, ext))
}

/// Any extension from the final `.` of the base name. With `extensions`
/// given, only one of those (compared per `ignore_case`) is returned.
#[must_use]
pub fn get_any_extension_from_path(path: &str, extensions: &[&str], ignore_case: bool) -> String {
    if !extensions.is_empty() {
        let path = remove_trailing_directory_separator(path);
        for extension in extensions {
            let extension = if extension.starts_with('.') {
                (*extension).to_string()
            } else {
                format!(".{extension}")
            };
            if path.len() >= extension.len()
                && path.as_bytes()[path.len() - extension.len()] == b'.'
            {
                let candidate = &path[path.len() - extension.len()..];
                let matches = if ignore_case {
                    candidate.eq_ignore_ascii_case(&extension)
                } else {
                    candidate == extension
                };
                if matches {
                    return candidate.to_string();
                }
            }
        }
        return String::new();
    }

    let base = get_base_file_name(path);
    base.rfind('.')
        .map(|index| base[index..].to_string())
        .unwrap_or_default()
}

/// `.d.ts`, `.d.mts`, `.d.cts`, and arbitrary-extension declarations such as
/// `styles.d.css.ts`.
#[must_use]
pub fn is_declaration_file_name(file_name: &str) -> bool {
    if file_extension_is_one_of(file_name, &[EXTENSION_DTS, EXTENSION_DMTS, EXTENSION_DCTS]) {
        return true;
    }
    let base = get_base_file_name(file_name);
    let Some(stem) = base.strip_suffix(EXTENSION_TS) else {
        return false;
    };
    match stem.rfind(".d.") {
        Some(index) => {
            let ext = &stem[index + 3..];
            !ext.is_empty() && !ext.contains('.')
        }
        None => false,
    }
}

#[must_use]
pub fn has_ts_file_extension(file_name: &str) -> bool {
    file_extension_is_one_of(file_name, SUPPORTED_TS_EXTENSIONS)
}

#[must_use]
pub fn has_js_file_extension(file_name: &str) -> bool {
    file_extension_is_one_of(file_name, SUPPORTED_JS_EXTENSIONS)
}

/// Declaration extension emitted for a source with this file name.
#[must_use]
pub fn get_declaration_emit_extension(file_name: &str) -> &'static str {
    if file_extension_is_one_of(file_name, &[EXTENSION_MJS, EXTENSION_MTS]) {
        EXTENSION_DMTS
    } else if file_extension_is_one_of(file_name, &[EXTENSION_CJS, EXTENSION_CTS]) {
        EXTENSION_DCTS
    } else if file_extension_is(file_name, EXTENSION_JSON) {
        ".d.json.ts"
    } else {
        EXTENSION_DTS
    }
}

#[must_use]
pub fn remove_file_extension(path: &str) -> &str {
    match try_get_extension_from_path(path) {
        Some(ext) => &path[..path.len() - ext.len()],
        None => path,
    }
}

#[must_use]
pub fn change_extension(path: &str, new_extension: &str) -> String {
    format!("{}{new_extension}", remove_file_extension(path))
}

// =============================================================================
// Comparison and containment
// =============================================================================

fn compare_strings(a: &str, b: &str, ignore_case: bool) -> Ordering {
    if ignore_case {
        a.to_lowercase().cmp(&b.to_lowercase())
    } else {
        a.cmp(b)
    }
}

/// Order two paths after resolving both against `current_directory`.
/// Roots always compare case-insensitively.
#[must_use]
pub fn compare_paths(a: &str, b: &str, current_directory: &str, ignore_case: bool) -> Ordering {
    let a = combine_paths(current_directory, &[a]);
    let b = combine_paths(current_directory, &[b]);
    if a == b {
        return Ordering::Equal;
    }

    let a_root = &a[..root_length(&a)];
    let b_root = &b[..root_length(&b)];
    let result = compare_strings(a_root, b_root, true);
    if result != Ordering::Equal {
        return result;
    }

    let a_rest = &a[a_root.len()..];
    let b_rest = &b[b_root.len()..];
    if !has_relative_path_segment(a_rest) && !has_relative_path_segment(b_rest) {
        return compare_strings(a_rest, b_rest, ignore_case);
    }

    let a_components = reduce_path_components(get_path_components(&a, ""));
    let b_components = reduce_path_components(get_path_components(&b, ""));
    let shared = a_components.len().min(b_components.len());
    for i in 1..shared {
        let result = compare_strings(&a_components[i], &b_components[i], ignore_case);
        if result != Ordering::Equal {
            return result;
        }
    }
    a_components.len().cmp(&b_components.len())
}

/// Is `child` equal to or nested inside `parent`?
#[must_use]
pub fn contains_path(parent: &str, child: &str, current_directory: &str, ignore_case: bool) -> bool {
    let parent = combine_paths(current_directory, &[parent]);
    let child = combine_paths(current_directory, &[child]);
    if parent.is_empty() || child.is_empty() {
        return false;
    }
    if parent == child {
        return true;
    }
    let parent_components = reduce_path_components(get_path_components(&parent, ""));
    let child_components = reduce_path_components(get_path_components(&child, ""));
    if child_components.len() < parent_components.len() {
        return false;
    }
    parent_components
        .iter()
        .zip(&child_components)
        .enumerate()
        .all(|(i, (p, c))| {
            let ignore = i == 0 || ignore_case;
            compare_strings(p, c, ignore) == Ordering::Equal
        })
}

/// Relative path from the directory `from` to `to`. Returns `to` unchanged
/// when the roots differ.
#[must_use]
pub fn get_relative_path_from_directory(from: &str, to: &str, ignore_case: bool) -> String {
    let from_components = reduce_path_components(get_path_components(from, ""));
    let to_components = reduce_path_components(get_path_components(to, ""));

    let mut start = 0;
    let max_common = from_components.len().min(to_components.len());
    while start < max_common {
        let ignore = start == 0 || ignore_case;
        if compare_strings(&from_components[start], &to_components[start], ignore) != Ordering::Equal
        {
            break;
        }
        start += 1;
    }
    if start == 0 {
        return get_path_from_path_components(&to_components);
    }

    let mut relative = vec![String::new()];
    relative.extend(std::iter::repeat_n("..".to_string(), from_components.len() - start));
    relative.extend(to_components[start..].iter().cloned());
    get_path_from_path_components(&relative)
}

/// Rooted paths become relative to `base_path`; others are returned as-is.
#[must_use]
pub fn convert_to_relative_path(path: &str, base_path: &str, ignore_case: bool) -> String {
    if !is_rooted_disk_path(path) {
        return path.to_string();
    }
    get_relative_path_from_directory(
        &resolve_path(base_path, &[]),
        &resolve_path(base_path, &[path]),
        ignore_case,
    )
}

/// Does the path run through `node_modules`?
#[must_use]
pub fn contains_node_modules(path: &str) -> bool {
    path.contains("/node_modules/")
}

/// Paths under hidden `node_modules` entries, `.git`, or editor lock files.
#[must_use]
pub fn contains_ignored_path(path: &str) -> bool {
    path.contains("/node_modules/.") || path.contains("/.git") || path.contains("/.#")
}

/// Is `file_name` strictly inside `directory_name`?
#[must_use]
pub fn starts_with_directory(
    file_name: &str,
    directory_name: &str,
    use_case_sensitive_file_names: bool,
) -> bool {
    let canonical = get_canonical_file_name(use_case_sensitive_file_names);
    let file_name = canonical(file_name);
    let directory = canonical(directory_name);
    file_name
        .strip_prefix(directory.as_str())
        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('\\'))
}

#[cfg(test)]
#[path = "../tests/path.rs"]
mod tests;
