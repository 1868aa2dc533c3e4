use notify::op::Op;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::command;
use crate::exclude::ExcludeList;
use crate::pathop::{self, PathOp};
use crate::process::Executor;
use crate::report::{self, Palette};

/// A command run requested by the filter, with the environment overlay as
/// it stood when the event was admitted.
#[derive(Debug, Clone)]
pub struct Job {
    pub pathop: PathOp,
    pub environ: Vec<String>,
}

/// What became of an event handed to [`Runner::handle_event`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dispatch {
    /// Passed the filter and went to the worker.
    Started,
    /// Passed the filter but a command was already in flight.
    Busy,
    /// Rejected by the operation mask or the exclude list.
    Skipped,
    /// The worker is gone.
    Stopped,
}

enum Envelope {
    Run(Job),
    Shutdown,
}

/// Filters events and runs at most one command at a time.
///
/// Admitted events go through a single-slot channel to one worker thread.
/// While a command is in flight the runner is `Dispatching` and every
/// further event is dropped, not queued.
pub struct Runner {
    excludes: ExcludeList,
    ops: Op,
    tx: SyncSender<Envelope>,
    dispatching: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Runner {
    /// Starts the worker thread, which hands each admitted job to `handler`.
    pub fn spawn<H>(excludes: ExcludeList, ops: Op, handler: H) -> Self
    where
        H: FnMut(Job) + Send + 'static,
    {
        let (tx, rx) = sync_channel(1);
        let dispatching = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dispatching);
        let worker = thread::spawn(move || work(&rx, &flag, handler));

        Self {
            excludes,
            ops,
            tx,
            dispatching,
            worker: Some(worker),
        }
    }

    pub const fn excludes(&self) -> &ExcludeList {
        &self.excludes
    }

    /// True while a dispatched command hasn't finished.
    pub fn is_busy(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    /// Whether an event is of interest at all: its operation is one we
    /// watch for and its path isn't excluded.
    pub fn should_handle(&self, pathop: &PathOp) -> bool {
        if !pathop.op.intersects(self.ops) {
            debug!(
                "Skipping excluded event: {} on {}",
                pathop::op_to_names(pathop.op),
                pathop.path.display()
            );
            return false;
        }

        if self.excludes.is_match(&pathop.path) {
            debug!("Skipping excluded file: {}", pathop.path.display());
            return false;
        }

        true
    }

    /// Filters an event and, if no command is running, dispatches it along
    /// with a snapshot of `environ`.
    pub fn handle_event(&self, pathop: PathOp, environ: &[String]) -> Dispatch {
        if !self.should_handle(&pathop) {
            return Dispatch::Skipped;
        }

        if self
            .dispatching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Events queued, skipping: {}", pathop.path.display());
            return Dispatch::Busy;
        }

        let job = Job {
            pathop,
            environ: environ.to_vec(),
        };

        match self.tx.try_send(Envelope::Run(job)) {
            Ok(()) => Dispatch::Started,
            Err(TrySendError::Full(_)) => {
                // slot still occupied
                self.dispatching.store(false, Ordering::Release);
                Dispatch::Busy
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Runner has stopped, dropping event");
                self.dispatching.store(false, Ordering::Release);
                Dispatch::Stopped
            }
        }
    }

    /// Stops the worker once its current command, if any, has finished.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Envelope::Shutdown);
            if worker.join().is_err() {
                error!("Runner worker panicked");
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn work<H: FnMut(Job)>(rx: &Receiver<Envelope>, dispatching: &AtomicBool, mut handler: H) {
    loop {
        match rx.recv() {
            Ok(Envelope::Run(job)) => {
                handler(job);
                dispatching.store(false, Ordering::Release);
            }
            Ok(Envelope::Shutdown) | Err(_) => {
                debug!("Runner shutting down");
                return;
            }
        }
    }
}

/// The production handler: expand the template for the job's path, run it
/// and report the outcome on stdout.
///
/// Paths that aren't valid UTF-8 can't be substituted faithfully and are
/// skipped with a warning.
pub fn command_handler(
    template: Vec<String>,
    executor: Executor,
    palette: Palette,
) -> impl FnMut(Job) + Send + 'static {
    move |job: Job| {
        let trigger = match job.pathop.path.to_str() {
            Some(trigger) => trigger,
            None => {
                warn!(
                    "Skipping path that isn't valid UTF-8: {}",
                    job.pathop.path.display()
                );
                return;
            }
        };
        let argv = command::expand(&template, trigger);

        let stdout = io::stdout();
        if let Err(err) = report::write_start(&mut stdout.lock(), &argv, palette) {
            warn!("Unable to write report: {}", err);
        }

        let record = executor.run(&argv, &job.pathop.path, &job.environ);

        if let Err(err) = report::write_end(&mut stdout.lock(), &record, palette) {
            warn!("Unable to write report: {}", err);
        }
    }
}
