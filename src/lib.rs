//! Filewatcher: the library
//!
//! Watches a set of directory trees and runs a command once for each
//! relevant filesystem change, with the changed path substituted into the
//! command line. Events arriving while the command is still running are
//! dropped rather than queued, and the watcher exits on its own after a
//! period without filesystem activity.
//!
//! The [`filewatcher`] binary is implemented with this library; most users
//! want [`run`] with a [`config::Config`] built through
//! [`config::ConfigBuilder`].
//!
//! [`filewatcher`]: ../filewatcher/index.html

#![warn(
    clippy::pedantic,
    clippy::nursery,
    deprecated,
)]
#![deny(unsafe_code, clippy::missing_const_for_fn)]
#![allow(
    clippy::default_trait_access,
    clippy::cognitive_complexity,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod exclude;
mod input;
mod interrupt;
pub mod pathop;
pub mod paths;
pub mod process;
pub mod report;
pub mod run;
pub mod runner;
pub mod walk;
pub mod watch;
pub mod watcher;

pub use run::run;
pub use watch::Termination;
