//
// cross_file/include.rs
//
// Include edge resolution for cross-file awareness
//
// An include reference is resolved in three stages, and the first stage that
// produces a location wins:
//
// 1. Document registry: the base name of the reference is looked up among the
//    files already known to the workspace.
// 2. Optional include directories, in configured order: the (stripped)
//    reference is joined onto each directory and tested on disk.
// 3. Builtin placeholder: a synthetic location under the builtin namespace.
//
// Resolution never fails. An include that cannot be found degrades to a
// placeholder that has no symbol table and therefore ends the include walk.
//

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tower_lsp::lsp_types::Url;

use super::registry::DocumentRegistry;

/// Path prefix of the builtin pseudo-locations
pub const BUILTIN_NAMESPACE: &str = "__sourcemod_builtin";

/// A directed "this file pulls in that file" relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeEdge {
    /// Resolved file location, or a builtin pseudo-location
    pub target: Url,
    /// True for `#include <...>` (standard library) includes
    pub is_builtin: bool,
}

impl IncludeEdge {
    /// Whether the target is a placeholder rather than a file on disk
    pub fn is_unresolved(&self) -> bool {
        is_builtin_location(&self.target)
    }
}

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.(?:sp|inc)\s*$").unwrap())
}

fn builtin_root() -> &'static Url {
    static ROOT: OnceLock<Url> = OnceLock::new();
    ROOT.get_or_init(|| Url::parse(&format!("file:///{}/", BUILTIN_NAMESPACE)).unwrap())
}

/// Append `.inc` to references that carry neither a `.sp` nor an `.inc`
/// extension. Trailing whitespace is dropped either way.
pub fn infer_extension(reference: &str) -> String {
    if extension_pattern().is_match(reference) {
        reference.trim_end().to_string()
    } else {
        format!("{}.inc", reference.trim_end())
    }
}

/// Drop everything up to and including the last `include` path segment.
///
/// `"vendor/include/foo/bar.inc"` becomes `"foo/bar.inc"`. A segment that only
/// ends in `include` (e.g. `myinclude/`) is left alone.
pub fn strip_include_prefix(reference: &str) -> &str {
    let mut start = 0;
    let mut segment_start = 0;
    for (idx, ch) in reference.char_indices() {
        if ch == '/' || ch == '\\' {
            if &reference[segment_start..idx] == "include" {
                start = idx + 1;
            }
            segment_start = idx + 1;
        }
    }
    &reference[start..]
}

/// Base name of a reference, accepting either path separator
pub fn base_name(reference: &str) -> &str {
    reference
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(reference)
}

/// Synthetic location for an include that could not be found
pub fn builtin_location(reference: &str) -> Url {
    let mut url = builtin_root().clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        segments.extend(reference.split(|c| c == '/' || c == '\\').filter(|s| !s.is_empty()));
    }
    url
}

/// Whether a location lives in the builtin namespace
pub fn is_builtin_location(location: &Url) -> bool {
    location.scheme() == "file"
        && location
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map_or(false, |first| first == BUILTIN_NAMESPACE)
}

/// Resolve a raw include reference into an include edge.
///
/// `include_directories` are tried in order; the first directory holding the
/// file wins.
pub fn resolve_include(
    reference: &str,
    is_builtin: bool,
    documents: &DocumentRegistry,
    include_directories: &[PathBuf],
) -> IncludeEdge {
    let with_extension = infer_extension(reference);
    let stripped = strip_include_prefix(&with_extension);

    let target = resolve_target(stripped, documents, include_directories).unwrap_or_else(|| {
        log::trace!(
            "Include '{}' not found in registry or {} include directories, using builtin placeholder",
            reference,
            include_directories.len()
        );
        builtin_location(stripped)
    });

    IncludeEdge { target, is_builtin }
}

fn resolve_target(
    stripped: &str,
    documents: &DocumentRegistry,
    include_directories: &[PathBuf],
) -> Option<Url> {
    let name = base_name(stripped);
    if let Some(location) = documents.resolve(name) {
        log::trace!("Resolved include '{}' via document registry: {}", stripped, location);
        return Some(location.clone());
    }

    for directory in include_directories {
        let candidate = directory.join(stripped);
        if !candidate.exists() {
            continue;
        }
        match normalize_path(&candidate).as_deref().and_then(path_to_uri) {
            Some(location) => {
                log::trace!(
                    "Resolved include '{}' via include directory '{}': {}",
                    stripped,
                    directory.display(),
                    location
                );
                return Some(location);
            }
            None => {
                log::warn!(
                    "Include '{}' exists at '{}' but the path is not absolute, skipping",
                    stripped,
                    candidate.display()
                );
            }
        }
    }
    None
}

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Only pop Normal segments; RootDir and Prefix stay
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return None;
    }

    let mut result = PathBuf::new();
    for c in components {
        result.push(c);
    }
    Some(result)
}

/// Convert an absolute filesystem path to a file URI
pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}
