use std::io::{self, BufReader};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::config::Config;
use crate::error::Result;
use crate::exclude::ExcludeList;
use crate::input;
use crate::interrupt;
use crate::process::Executor;
use crate::report::Palette;
use crate::runner::{self, Runner};
use crate::walk;
use crate::watch::{self, Message, Termination, WatchOptions, WatchSet};
use crate::watcher::{Notifier, Watcher};

/// Watches the configured directories and runs the command until the idle
/// timeout passes, the process is interrupted, or the notifier fails.
pub fn run(config: Config) -> Result<Termination> {
    let (tx, rx) = channel();

    let interrupt_tx = tx.clone();
    interrupt::install_handler(move || {
        let _ = interrupt_tx.send(Message::Interrupt);
    })?;

    if config.env_input {
        input::spawn(BufReader::new(io::stdin()), tx.clone());
    }

    run_with(&config, tx, &rx)
}

/// Like [`run`], with the loop's channel supplied by the caller and no
/// interrupt handler or input reader.
pub fn run_with(config: &Config, tx: Sender<Message>, rx: &Receiver<Message>) -> Result<Termination> {
    let excludes = ExcludeList::new(&config.excludes)?;
    debug!("Excluding: {}", excludes);

    let dirs = walk::walk_directories(&config.paths, config.depth, &excludes);

    let mut watcher = Watcher::new(tx, config.poll, config.poll_interval)?;
    if watcher.is_polling() {
        warn!(
            "Polling for changes every {}",
            humantime::format_duration(config.poll_interval)
        );
    }

    let mut watched = WatchSet::default();
    for dir in &dirs {
        if watched.insert(dir) {
            watcher.add(dir)?;
        }
    }
    info!("Watching directories: {}", watched);

    let runner = Runner::spawn(
        excludes,
        config.events,
        runner::command_handler(config.cmd.clone(), Executor::default(), Palette::Colored),
    );

    let options = WatchOptions {
        idle_timeout: config.idle_timeout,
        environ: config.env.clone(),
    };
    let outcome = watch::watch(&mut watcher, &mut watched, &runner, rx, &options);

    runner.shutdown();
    outcome
}
