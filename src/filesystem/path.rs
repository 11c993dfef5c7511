// src/filesystem/path.rs

//! Path sanitization for untrusted archive entries
//!
//! Addon archives come from arbitrary sources; entry names must never be
//! able to place a file outside the extraction root. Malicious archives
//! have been seen using `../../etc/passwd`, absolute paths, and
//! `foo/../../bar` style names.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize an archive entry path.
///
/// Strips leading slashes, drops `.` components, and rejects any path that
/// contains a `..` component or is empty after normalization.
pub fn sanitize_entry_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::Validation(format!(
                    "archive entry path escapes extraction root: {}",
                    path_str
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                // Windows prefixes and root markers; leading slashes are
                // already stripped
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::Validation(format!(
            "empty archive entry path: '{}'",
            path_str
        )));
    }

    Ok(normalized)
}

/// Join an extraction root with an untrusted entry path.
///
/// Sanitizes the entry first, then verifies the canonicalized result stays
/// under the root when both sides resolve. If canonicalization fails (the
/// target does not exist yet) the sanitization above is the guarantee.
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let sanitized = sanitize_entry_path(path.as_ref())?;
    let joined = root.join(&sanitized);

    if let (Ok(canonical_root), Ok(canonical_joined)) = (root.canonicalize(), joined.canonicalize())
    {
        if !canonical_joined.starts_with(&canonical_root) {
            return Err(Error::Validation(format!(
                "path {} escapes extraction root {}",
                joined.display(),
                root.display()
            )));
        }
    }

    Ok(joined)
}
