use notify::{raw_watcher, PollWatcher, RawEvent, RecommendedWatcher, RecursiveMode};
use std::convert::TryFrom;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::pathop::PathOp;
use crate::paths;
use crate::watch::Message;

pub use notify::Error;

/// Something directories can be registered with at runtime.
pub trait Notifier {
    fn add(&mut self, path: &Path) -> Result<(), Error>;
}

/// Thin wrapper over the notify crate
///
/// `PollWatcher` and `RecommendedWatcher` are distinct types, but the watch
/// loop just wants to add directories to whichever is in use. All coupling
/// to the notify crate lives in this module: raw events are turned into
/// [`Message`]s on a forwarding thread before the loop sees them.
pub struct Watcher {
    watcher_impl: WatcherImpl,
}

enum WatcherImpl {
    Recommended(RecommendedWatcher),
    Poll(PollWatcher),
}

impl Watcher {
    /// Creates a watcher with nothing registered yet. Events are sent to
    /// `tx` with paths made relative to the current directory.
    pub fn new(tx: Sender<Message>, poll: bool, interval: Duration) -> Result<Self, Error> {
        let origin = env::current_dir().map_err(Error::Io)?;
        let (raw_tx, raw_rx) = channel();

        let imp = if poll {
            let delay = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
            WatcherImpl::Poll(PollWatcher::with_delay_ms(raw_tx, delay)?)
        } else {
            WatcherImpl::Recommended(raw_watcher(raw_tx)?)
        };

        thread::spawn(move || forward(&raw_rx, &tx, &origin));

        Ok(Self { watcher_impl: imp })
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.watcher_impl, WatcherImpl::Poll(_))
    }
}

impl Notifier for Watcher {
    fn add(&mut self, path: &Path) -> Result<(), Error> {
        use notify::Watcher;

        match self.watcher_impl {
            WatcherImpl::Recommended(ref mut w) => w.watch(path, RecursiveMode::NonRecursive),
            WatcherImpl::Poll(ref mut w) => w.watch(path, RecursiveMode::NonRecursive),
        }
    }
}

fn forward(rx: &Receiver<RawEvent>, tx: &Sender<Message>, origin: &Path) {
    for raw in rx.iter() {
        if let Some(message) = translate(raw, origin) {
            if tx.send(message).is_err() {
                return;
            }
        }
    }

    let _ = tx.send(Message::Closed);
}

fn translate(raw: RawEvent, origin: &Path) -> Option<Message> {
    match (raw.path, raw.op) {
        (_, Err(err)) => Some(Message::Error(err)),
        (Some(path), Ok(op)) => {
            let path: PathBuf = paths::relative_to(&path, origin);
            Some(Message::Event(PathOp::new(&path, op)))
        }
        (None, Ok(op)) => {
            debug!("Discarding event without a path: {:?}", op);
            None
        }
    }
}
