//! Interactive side-channel for updating the command environment.
//!
//! Typing `e KEY=VALUE` followed by Enter adds `KEY=VALUE` to the
//! environment of every later run.

use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::watch::Message;

const ENV_COMMAND: char = 'e';

/// Reads `reader` line by line on a new thread, forwarding valid
/// environment updates to `tx`. The thread ends at EOF, on a read error, or
/// once the receiving side is gone.
pub fn spawn<R>(reader: R, tx: Sender<Message>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("Unable to read input: {}", err);
                    return;
                }
            };

            match parse_line(&line) {
                Some(Ok(entry)) => {
                    if tx.send(Message::Env(entry)).is_err() {
                        return;
                    }
                }
                Some(Err(err)) => error!("{}", err),
                None => {}
            }
        }

        debug!("Input closed");
    })
}

/// Interprets one line of input.
///
/// Returns `None` for lines that aren't environment commands.
pub fn parse_line(line: &str) -> Option<Result<String>> {
    let rest = line.trim_end().strip_prefix(ENV_COMMAND)?;
    let entry = rest.trim_start();

    // `echo` and friends aren't commands
    if entry.len() == rest.len() && !rest.is_empty() {
        return None;
    }

    Some(validate_assignment(entry).map(|()| entry.to_string()))
}

/// Checks that `entry` looks like `KEY=VALUE` with a shell-style key.
pub fn validate_assignment(entry: &str) -> Result<()> {
    let key = match entry.find('=') {
        Some(idx) => &entry[..idx],
        None => {
            return Err(Error::Config(format!(
                "invalid environment entry {:?}: expected KEY=VALUE",
                entry
            )))
        }
    };

    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid environment variable name {:?}",
            key
        )))
    }
}
