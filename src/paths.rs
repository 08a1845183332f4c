//! Path validation for everything that crosses the store boundary.
//!
//! Folder paths arrive as root-relative strings (`"travel/japan"`, `""` for
//! the root). Before any filesystem call they go through [`resolve`], which
//! normalizes lexically (the target may not exist yet) and rejects anything
//! that lands outside the storage root.
//!
//! Three directory names are reserved for the store's own layout and can
//! never be used as a folder name at any depth:
//!
//! ```text
//! originals/     uploaded bytes
//! webp/          primary renditions
//! 400x300/       one directory per derivative size (WIDTHxHEIGHT)
//! ```

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory holding uploaded originals.
pub const ORIGINALS_DIR: &str = "originals";

/// Directory holding primary renditions.
pub const PRIMARY_DIR: &str = "webp";

/// Per-folder metadata sidecar.
pub const METADATA_FILE: &str = "index.json";

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path escapes the storage root: {0}")]
    Escape(String),
    #[error("Cannot use internal directory names (originals, webp, or WIDTHxHEIGHT): {0}")]
    ReservedName(String),
    #[error("Not a plain file name: {0}")]
    InvalidFileName(String),
}

/// True for names matching `^\d+x\d+$`.
pub fn is_size_dir_name(name: &str) -> bool {
    match name.split_once('x') {
        Some((w, h)) => {
            !w.is_empty()
                && !h.is_empty()
                && w.bytes().all(|b| b.is_ascii_digit())
                && h.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// True for the store's internal directory names.
pub fn is_reserved_name(name: &str) -> bool {
    name == ORIGINALS_DIR || name == PRIMARY_DIR || is_size_dir_name(name)
}

/// Reject a path if any of its segments is a reserved internal name.
///
/// Both `/` and `\` separate segments so a client cannot smuggle a reserved
/// name past the check with a platform-specific separator.
pub fn reject_reserved_names(path: &str) -> Result<(), PathError> {
    if path.split(['/', '\\']).any(is_reserved_name) {
        return Err(PathError::ReservedName(path.to_string()));
    }
    Ok(())
}

/// Resolve a root-relative path to an absolute one inside `root`.
///
/// `root` must already be absolute and normalized (see [`absolute_root`]).
/// `..` segments are applied lexically; the result must still have `root`
/// as a prefix. An absolute `relative` is accepted only if it points inside
/// `root`.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    let resolved = normalize(&root.join(relative));
    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(PathError::Escape(relative.to_string()))
    }
}

/// Make a storage root absolute and lexically normalized.
pub fn absolute_root(root: &Path) -> std::io::Result<PathBuf> {
    Ok(normalize(&std::path::absolute(root)?))
}

/// Validate a file-name argument (`my-photo-1a2b3c4d.webp`).
///
/// File names address entries inside a single directory, so separators and
/// the special `.`/`..` entries are rejected outright.
pub fn validate_file_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(PathError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Root-relative display form of a folder path: `/`-joined, no leading or
/// trailing separator, empty for the root.
pub fn relative_display(root: &Path, absolute: &Path) -> String {
    absolute
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// Join a child name onto a root-relative folder path.
pub fn join_relative(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/storage")
    }

    #[test]
    fn resolves_nested_path_under_root() {
        let p = resolve(&root(), "travel/japan").unwrap();
        assert_eq!(p, PathBuf::from("/srv/storage/travel/japan"));
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(resolve(&root(), "").unwrap(), root());
    }

    #[test]
    fn inner_parent_segments_are_allowed() {
        let p = resolve(&root(), "a/b/../c").unwrap();
        assert_eq!(p, PathBuf::from("/srv/storage/a/c"));
    }

    #[test]
    fn escaping_parent_segments_fail() {
        for input in ["..", "../etc", "a/../../etc", "a/b/../../../x"] {
            assert!(
                matches!(resolve(&root(), input), Err(PathError::Escape(_))),
                "expected escape for {input}"
            );
        }
    }

    #[test]
    fn sibling_with_shared_prefix_is_an_escape() {
        assert!(matches!(
            resolve(&root(), "../storage2/x"),
            Err(PathError::Escape(_))
        ));
    }

    #[test]
    fn absolute_input_outside_root_fails() {
        assert!(matches!(
            resolve(&root(), "/etc/passwd"),
            Err(PathError::Escape(_))
        ));
    }

    #[test]
    fn absolute_input_inside_root_is_accepted() {
        let p = resolve(&root(), "/srv/storage/a").unwrap();
        assert!(p.starts_with(root()));
    }

    #[test]
    fn reserved_names_detected_at_any_depth() {
        for input in ["originals", "a/webp", "a/400x300/b", "x\\webp"] {
            assert!(
                matches!(reject_reserved_names(input), Err(PathError::ReservedName(_))),
                "expected reserved for {input}"
            );
        }
    }

    #[test]
    fn near_miss_names_are_not_reserved() {
        for input in ["", "gallery", "webps", "original", "400x", "x300", "400X300", "4x3a"] {
            assert!(reject_reserved_names(input).is_ok(), "{input} wrongly reserved");
        }
    }

    #[test]
    fn size_dir_pattern() {
        assert!(is_size_dir_name("400x300"));
        assert!(is_size_dir_name("0x0"));
        assert!(!is_size_dir_name("400x300x2"));
        assert!(!is_size_dir_name("x"));
    }

    #[test]
    fn file_names_must_be_plain() {
        assert!(validate_file_name("cat-a1b2c3d4.webp").is_ok());
        for bad in ["", ".", "..", "../x.webp", "a/b.webp", "a\\b.webp"] {
            assert!(validate_file_name(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn relative_display_joins_with_slash() {
        let abs = root().join("travel").join("japan");
        assert_eq!(relative_display(&root(), &abs), "travel/japan");
        assert_eq!(relative_display(&root(), &root()), "");
    }

    #[test]
    fn join_relative_handles_root_parent() {
        assert_eq!(join_relative("", "gallery"), "gallery");
        assert_eq!(join_relative("travel", "japan"), "travel/japan");
        assert_eq!(join_relative("travel/", "japan"), "travel/japan");
    }
}
