use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::error::Result;
use crate::exclude::ExcludeList;
use crate::pathop::PathOp;
use crate::runner::Runner;
use crate::watcher::{self, Notifier};

/// Everything the watch loop waits on arrives as one of these.
#[derive(Debug)]
pub enum Message {
    /// A filesystem event from the notifier.
    Event(PathOp),
    /// The notifier failed; the loop ends with this error.
    Error(watcher::Error),
    /// A `KEY=VALUE` entry to add to the environment overlay.
    Env(String),
    /// Stop watching, e.g. on Ctrl-C.
    Interrupt,
    /// The notifier's event stream ended.
    Closed,
}

/// Why the loop stopped, when it stopped cleanly.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Termination {
    Idle,
    Interrupted,
    Closed,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub idle_timeout: Duration,
    /// Starting environment overlay.
    pub environ: Vec<String>,
}

/// The directories registered with the notifier, in registration order.
#[derive(Debug, Default)]
pub struct WatchSet {
    dirs: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl WatchSet {
    /// Adds `path`, returning false if it was already present.
    pub fn insert(&mut self, path: &Path) -> bool {
        if !self.seen.insert(path.to_path_buf()) {
            return false;
        }

        self.dirs.push(path.to_path_buf());
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

impl fmt::Display for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dirs: Vec<String> = self.iter().map(|d| d.display().to_string()).collect();
        write!(f, "{}", dirs.join(", "))
    }
}

/// Runs until the idle timeout passes, an interrupt arrives, the notifier
/// closes, or the notifier fails.
///
/// Newly created directories are registered with `notifier` instead of
/// being handed to the runner. Every other event goes through
/// [`Runner::handle_event`] along with the current environment overlay,
/// which only this loop ever changes.
pub fn watch<N: Notifier>(
    notifier: &mut N,
    watched: &mut WatchSet,
    runner: &Runner,
    rx: &Receiver<Message>,
    options: &WatchOptions,
) -> Result<Termination> {
    let mut environ = options.environ.clone();

    loop {
        let message = match rx.recv_timeout(options.idle_timeout) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Idle timeout hit: {}",
                    humantime::format_duration(options.idle_timeout)
                );
                return Ok(Termination::Idle);
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(Termination::Closed),
        };

        match message {
            Message::Event(pathop) => {
                debug!("Event: {:?} {}", pathop.op, pathop.path.display());

                if is_new_dir(&pathop, runner.excludes()) {
                    // a recreated directory lost its kernel watch with the old inode
                    watched.insert(&pathop.path);
                    debug!("Watching new directory: {}", pathop.path.display());
                    if let Err(err) = notifier.add(&pathop.path) {
                        warn!("Failed to watch {}: {}", pathop.path.display(), err);
                    }
                    continue;
                }

                runner.handle_event(pathop, &environ);
            }
            Message::Env(entry) => {
                info!("Updated environment: {}", entry);
                environ.push(entry);
            }
            Message::Error(err) => return Err(err.into()),
            Message::Interrupt => {
                info!("Interrupted, stopping");
                return Ok(Termination::Interrupted);
            }
            Message::Closed => {
                debug!("Notifier closed");
                return Ok(Termination::Closed);
            }
        }
    }
}

/// A created path that is a directory and isn't excluded.
fn is_new_dir(pathop: &PathOp, excludes: &ExcludeList) -> bool {
    if !PathOp::is_create(pathop.op) {
        return false;
    }

    match fs::metadata(&pathop.path) {
        Ok(metadata) => metadata.is_dir() && !excludes.is_match(&pathop.path),
        Err(err) => {
            warn!("Failed to stat {}: {}", pathop.path.display(), err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Job;
    use notify::op;
    use std::sync::mpsc::{channel, Sender};
    use std::thread;
    use std::time::Instant;

    #[derive(Default)]
    struct FakeNotifier {
        added: Vec<PathBuf>,
    }

    impl Notifier for FakeNotifier {
        fn add(&mut self, path: &Path) -> std::result::Result<(), watcher::Error> {
            self.added.push(path.to_path_buf());
            Ok(())
        }
    }

    fn options(idle: Duration) -> WatchOptions {
        WatchOptions {
            idle_timeout: idle,
            environ: vec![],
        }
    }

    fn recording_runner(patterns: &[&str]) -> (Runner, std::sync::mpsc::Receiver<Job>) {
        let (tx, rx) = channel();
        let runner = Runner::spawn(
            ExcludeList::new(patterns).unwrap(),
            op::WRITE | op::CREATE,
            move |job| tx.send(job).unwrap(),
        );
        (runner, rx)
    }

    fn event(path: &Path, op_: op::Op) -> Message {
        Message::Event(PathOp::new(path, op_))
    }

    /// Waits for a job, then until the runner can take another one.
    fn next_job(jobs: &std::sync::mpsc::Receiver<Job>) -> Job {
        let job = jobs.recv_timeout(Duration::from_secs(5)).unwrap();
        thread::sleep(Duration::from_millis(50));
        job
    }

    #[test]
    fn test_idle_timeout_is_a_clean_exit() {
        let (_tx, rx) = channel::<Message>();
        let (runner, _jobs) = recording_runner(&[]);
        let start = Instant::now();

        let outcome = watch(
            &mut FakeNotifier::default(),
            &mut WatchSet::default(),
            &runner,
            &rx,
            &options(Duration::from_millis(100)),
        );

        assert_eq!(outcome.unwrap(), Termination::Idle);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_notifier_error_ends_the_loop() {
        let (tx, rx) = channel();
        tx.send(Message::Error(watcher::Error::Generic("gone".into())))
            .unwrap();
        let (runner, _jobs) = recording_runner(&[]);

        let outcome = watch(
            &mut FakeNotifier::default(),
            &mut WatchSet::default(),
            &runner,
            &rx,
            &options(Duration::from_secs(5)),
        );

        assert!(outcome.is_err());
    }

    #[test]
    fn test_interrupt_and_close() {
        let (runner, _jobs) = recording_runner(&[]);

        for (message, expected) in vec![
            (Message::Interrupt, Termination::Interrupted),
            (Message::Closed, Termination::Closed),
        ] {
            let (tx, rx) = channel();
            tx.send(message).unwrap();
            let outcome = watch(
                &mut FakeNotifier::default(),
                &mut WatchSet::default(),
                &runner,
                &rx,
                &options(Duration::from_secs(5)),
            );
            assert_eq!(outcome.unwrap(), expected);
        }
    }

    #[test]
    fn test_events_reach_the_runner() {
        let (tx, rx) = channel();
        tx.send(event(Path::new("foo.ign"), op::WRITE)).unwrap();
        tx.send(event(Path::new("file0.txt"), op::WRITE)).unwrap();
        tx.send(Message::Interrupt).unwrap();
        let (runner, jobs) = recording_runner(&["*.ign"]);

        watch(
            &mut FakeNotifier::default(),
            &mut WatchSet::default(),
            &runner,
            &rx,
            &options(Duration::from_secs(5)),
        )
        .unwrap();
        runner.shutdown();

        let paths: Vec<PathBuf> = jobs.try_iter().map(|job| job.pathop.path).collect();
        assert_eq!(paths, vec![PathBuf::from("file0.txt")]);
    }

    fn spawn_loop(
        runner: Runner,
        rx: std::sync::mpsc::Receiver<Message>,
        environ: Vec<String>,
    ) -> thread::JoinHandle<(Termination, FakeNotifier, WatchSet)> {
        thread::spawn(move || {
            let mut notifier = FakeNotifier::default();
            let mut watched = WatchSet::default();
            let options = WatchOptions {
                idle_timeout: Duration::from_secs(5),
                environ,
            };
            let outcome = watch(&mut notifier, &mut watched, &runner, &rx, &options).unwrap();
            (outcome, notifier, watched)
        })
    }

    fn send(tx: &Sender<Message>, message: Message) {
        tx.send(message).unwrap();
    }

    #[test]
    fn test_environment_updates_apply_to_later_runs() {
        let (tx, rx) = channel();
        let (runner, jobs) = recording_runner(&[]);
        let handle = spawn_loop(runner, rx, vec!["BASE=1".to_string()]);

        send(&tx, event(Path::new("a.txt"), op::WRITE));
        let first = next_job(&jobs);
        send(&tx, Message::Env("EXTRA=2".to_string()));
        send(&tx, event(Path::new("b.txt"), op::WRITE));
        let second = next_job(&jobs);
        send(&tx, Message::Interrupt);

        let (outcome, _, _) = handle.join().unwrap();
        assert_eq!(outcome, Termination::Interrupted);
        assert_eq!(first.environ, vec!["BASE=1".to_string()]);
        assert_eq!(
            second.environ,
            vec!["BASE=1".to_string(), "EXTRA=2".to_string()]
        );
    }

    #[test]
    fn test_new_directories_are_watched_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh");
        let skipped = dir.path().join("skipped");
        fs::create_dir(&fresh).unwrap();
        fs::create_dir(&skipped).unwrap();
        let file = dir.path().join("new.txt");
        fs::write(&file, "x").unwrap();

        let (tx, rx) = channel();
        let (runner, jobs) = recording_runner(&["**/skipped"]);
        let handle = spawn_loop(runner, rx, vec![]);

        send(&tx, event(&fresh, op::CREATE));
        send(&tx, event(&fresh, op::CREATE));
        send(&tx, event(&skipped, op::CREATE));
        send(&tx, event(&file, op::CREATE));
        let job = next_job(&jobs);

        // a path that can't be stat'ed is treated as an ordinary event
        let vanished = dir.path().join("vanished");
        send(&tx, event(&vanished, op::CREATE));
        let gone = next_job(&jobs);
        send(&tx, Message::Interrupt);

        let (_, notifier, watched) = handle.join().unwrap();
        assert_eq!(notifier.added, vec![fresh.clone(), fresh.clone()]);
        assert!(watched.contains(&fresh));
        assert_eq!(watched.len(), 1);
        assert_eq!(job.pathop.path, file);
        assert_eq!(gone.pathop.path, vanished);
        assert!(jobs.try_recv().is_err());
    }

    #[test]
    fn test_recreated_directory_is_watched_again() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir(&build).unwrap();

        let (tx, rx) = channel();
        let (runner, _jobs) = recording_runner(&[]);
        let mut notifier = FakeNotifier::default();
        let mut watched = WatchSet::default();
        let opts = options(Duration::from_secs(5));

        send(&tx, event(&build, op::CREATE));
        send(&tx, Message::Interrupt);
        watch(&mut notifier, &mut watched, &runner, &rx, &opts).unwrap();

        fs::remove_dir(&build).unwrap();
        fs::create_dir(&build).unwrap();
        send(&tx, event(&build, op::REMOVE));
        send(&tx, event(&build, op::CREATE));
        send(&tx, Message::Interrupt);
        watch(&mut notifier, &mut watched, &runner, &rx, &opts).unwrap();

        assert_eq!(notifier.added, vec![build.clone(), build.clone()]);
        assert_eq!(watched.iter().collect::<Vec<_>>(), vec![build.as_path()]);
    }

    #[test]
    fn test_watch_set_dedupes_in_order() {
        let mut set = WatchSet::default();

        assert!(set.insert(Path::new("b")));
        assert!(set.insert(Path::new("a")));
        assert!(!set.insert(Path::new("b")));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Path::new("b"), Path::new("a")]);
        assert_eq!(set.to_string(), "b, a");
        assert!(!set.is_empty());
    }
}
