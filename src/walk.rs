use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::exclude::ExcludeList;
use crate::paths;

/// Collects the directories under `roots` that should be watched.
///
/// Each root is walked depth-first in name order. A directory whose cleaned
/// path has exactly `max_depth` segments, or that `excludes` matches, is
/// left out together with everything below it. Files are never returned.
/// Unreadable entries are logged and skipped.
///
/// Roots are walked independently, so overlapping roots can yield the same
/// directory twice.
pub fn walk_directories<P: AsRef<Path>>(
    roots: &[P],
    max_depth: usize,
    excludes: &ExcludeList,
) -> Vec<PathBuf> {
    let mut output = vec![];

    for root in roots {
        let root = root.as_ref();
        let mut entries = WalkDir::new(root)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    warn!("Error walking '{}': {}", path.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let path = paths::clean(entry.path());
            if is_max_depth(&path, max_depth) || excludes.is_match(&path) {
                debug!("Not descending into {}", path.display());
                entries.skip_current_dir();
                continue;
            }

            output.push(path);
        }
    }

    output
}

fn is_max_depth(path: &Path, depth: usize) -> bool {
    paths::segment_count(path) == depth
}
