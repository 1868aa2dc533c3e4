//! Configuration for filewatcher.
//!
//! The [`Config`] struct is not constructable, use [`ConfigBuilder`].
//!
//! # Examples
//!
//! ```
//! # use filewatcher::config::ConfigBuilder;
//! ConfigBuilder::default()
//!     .cmd(vec!["go".to_string(), "test".to_string(), "./${dir}".to_string()])
//!     .excludes(vec!["vendor".to_string()])
//!     .build()
//!     .expect("mission failed");
//! ```

use notify::op::{self, Op};
use std::{path::PathBuf, time::Duration};

/// Arguments to the watcher
#[derive(Builder, Clone, Debug)]
#[builder(setter(into))]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Command template, program first. `$filepath`, `$dir` and
    /// `$relative_dir` are expanded for each run.
    pub cmd: Vec<String>,
    /// Roots whose directories are watched.
    #[builder(default = "vec![PathBuf::from(\".\")]")]
    pub paths: Vec<PathBuf>,
    /// Glob patterns to exclude, matched before the built-in defaults.
    #[builder(default)]
    pub excludes: Vec<String>,
    /// A directory whose path has this many segments is not watched, nor
    /// anything below it.
    #[builder(default = "5")]
    pub depth: usize,
    /// Stop after this long without any notifier event.
    #[builder(default = "Duration::from_secs(600)")]
    pub idle_timeout: Duration,
    /// Operations that trigger a run.
    #[builder(default = "op::WRITE | op::CREATE")]
    pub events: Op,
    /// Starting `KEY=VALUE` entries for the command environment.
    #[builder(default)]
    pub env: Vec<String>,
    /// Read environment updates from standard input.
    #[builder(default = "true")]
    pub env_input: bool,
    /// Force using the polling backend.
    #[builder(default)]
    pub poll: bool,
    /// Interval for polling.
    #[builder(default = "Duration::from_secs(1)")]
    pub poll_interval: Duration,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.cmd.as_ref().map_or(true, Vec::is_empty) {
            return Err("cmd must not be empty".into());
        }

        if self.paths.as_ref().map_or(false, Vec::is_empty) {
            return Err("paths must not be empty".into());
        }

        if self.events.map_or(false, |events| events.is_empty()) {
            return Err("events must not be empty".into());
        }

        Ok(())
    }
}
