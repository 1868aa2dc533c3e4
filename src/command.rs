//! Placeholder expansion for command templates.
//!
//! Each argument is expanded on its own with shell-style `$name` and
//! `${name}` references. Three names are known:
//!
//! - `filepath`: the path that triggered the run, verbatim;
//! - `dir`: that path's parent directory;
//! - `relative_dir`: the parent directory prefixed with `./`.
//!
//! Any other name expands to itself, so `${bogus}` becomes `bogus`. A `$`
//! that doesn't start a name is kept.

use std::path::Path;

use crate::paths;

/// Expands every argument of `template` against `trigger`.
pub fn expand(template: &[String], trigger: &str) -> Vec<String> {
    let lookup = |key: &str| -> Option<String> {
        Some(match key {
            "filepath" => trigger.to_string(),
            "dir" => parent_dir(trigger),
            "relative_dir" => paths::dot_slash(&parent_dir(trigger)),
            other => other.to_string(),
        })
    };

    template
        .iter()
        .map(|arg| shellexpand::env_with_context_no_errors(arg, lookup).into_owned())
        .collect()
}

/// Parent directory of a slash-separated path: everything up to the last
/// `/`, cleaned. A bare file name has `.` as its parent.
pub fn parent_dir(path: &str) -> String {
    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };

    paths::clean(Path::new(head)).to_string_lossy().into_owned()
}
