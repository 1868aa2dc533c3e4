use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;
use crate::paths;

/// Prefix marking a pattern that may match below any number of directories.
const ALL_DIRECTORIES: &str = "**/";

/// Patterns appended to every exclude list.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.?*",
    "**/*~",
    "**/*.sw[px]",
    "**/*.tmp",
    "**/#*#",
    "**/4913",
];

/// A list of glob patterns matched against paths.
///
/// Every pattern is matched against the whole path with `*` and `?`
/// confined to a single segment. Patterns of the form `**/<rest>` also
/// match when `<rest>` matches any trailing run of the path's segments, so
/// `**/*.go` matches `a/b/file.go` through its suffix `file.go`.
///
/// Globs are compiled up front: a malformed pattern fails construction and
/// matching itself can't fail.
pub struct ExcludeList {
    patterns: Vec<String>,
    whole: GlobSet,
    suffix: GlobSet,
}

impl ExcludeList {
    /// Compiles `patterns` followed by [`DEFAULT_EXCLUDES`].
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().to_string())
            .chain(DEFAULT_EXCLUDES.iter().map(|p| (*p).to_string()))
            .collect();

        let mut whole = GlobSetBuilder::new();
        let mut suffix = GlobSetBuilder::new();
        for pattern in &patterns {
            let translated = translate(pattern);
            whole.add(glob(&translated)?);
            if let Some(rest) = translated.strip_prefix(ALL_DIRECTORIES) {
                suffix.add(glob(rest)?);
            }
        }

        Ok(Self {
            patterns,
            whole: whole.build()?,
            suffix: suffix.build()?,
        })
    }

    /// Returns true when any pattern matches `path`.
    pub fn is_match(&self, path: &Path) -> bool {
        self.whole.is_match(path) || self.is_any_dir_match(path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn is_any_dir_match(&self, path: &Path) -> bool {
        if self.suffix.is_empty() {
            return false;
        }

        let cleaned = paths::clean(path);
        let segments: Vec<&Path> = cleaned
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .map(|c| Path::new(c.as_os_str()))
            .collect();

        for start in 0..segments.len() {
            let tail: PathBuf = segments[start..].iter().collect();
            if self.suffix.is_match(&tail) {
                return true;
            }
        }

        false
    }
}

impl fmt::Display for ExcludeList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.patterns.join(", "))
    }
}

impl fmt::Debug for ExcludeList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(&self.patterns).finish()
    }
}

/// Rewrites a pattern so globset reads it with single-segment semantics.
///
/// Only a leading `**/` may cross directories; any other run of `*` is a
/// plain `*`. Braces are literal characters, not alternations.
fn translate(pattern: &str) -> String {
    let (mut out, rest) = match pattern.strip_prefix(ALL_DIRECTORIES) {
        Some(rest) => (ALL_DIRECTORIES.to_string(), rest),
        None => (String::with_capacity(pattern.len()), pattern),
    };

    let mut chars = rest.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '*' if !in_class => {
                out.push(c);
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            '{' | '}' if !in_class => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }

    out
}

fn glob(pattern: &str) -> Result<Glob> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}
