//! Lexical path helpers.
//!
//! Nothing in here touches the filesystem: paths are cleaned and compared
//! purely by their components, the way a user typed them.

use std::path::{Component, Path, PathBuf};

/// Cleans a path lexically.
///
/// `.` segments are dropped, `..` folds against a preceding normal segment
/// (and is discarded directly under the root), and an empty result becomes
/// `.`. Symlinks are not resolved.
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }

    out.iter().collect()
}

/// Number of segments in the cleaned path. A leading root counts as one.
pub fn segment_count(path: &Path) -> usize {
    clean(path).components().count()
}

/// Rewrites `path` relative to `origin` when it lives under it, cleaning the
/// result either way.
pub fn relative_to(path: &Path, origin: &Path) -> PathBuf {
    match path.strip_prefix(origin) {
        Ok(rel) => clean(rel),
        Err(_) => clean(path),
    }
}

/// Prefixes a path string with `./`, forcing it to be read as relative.
pub fn dot_slash(path: &str) -> String {
    format!(".{}{}", std::path::MAIN_SEPARATOR, path)
}
