use std::{error::Error as StdError, fmt, io, process::ExitStatus};

pub type Result<T> = ::std::result::Result<T, Error>;

pub enum Error {
    Clap(clap::Error),
    Config(String),
    EmptyCommand,
    Exit(ExitStatus),
    Glob(globset::Error),
    Io(io::Error),
    Notify(notify::Error),
    Spawn(String, io::Error),
}

impl StdError for Error {}

impl From<clap::Error> for Error {
    fn from(err: clap::Error) -> Self {
        Self::Clap(err)
    }
}

impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Self::Glob(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        match err {
            notify::Error::Io(err) => Self::Io(err),
            other => Self::Notify(other),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} error: {}",
            match self {
                Self::Clap(_) => "Argument",
                Self::Config(_) => "Configuration",
                Self::EmptyCommand => "Command",
                Self::Exit(_) => "Command",
                Self::Glob(_) => "Globset",
                Self::Io(_) => "I/O",
                Self::Notify(_) => "Notify",
                Self::Spawn(_, _) => "Spawn",
            },
            match self {
                Self::Clap(err) => err.message.clone(),
                Self::Config(msg) => msg.clone(),
                Self::EmptyCommand => "no command to run".to_string(),
                Self::Exit(status) => status.to_string(),
                Self::Spawn(program, err) => format!("couldn't run '{}': {}", program, err),
                err => err.source_text(),
            }
        )
    }
}

impl Error {
    fn source_text(&self) -> String {
        match self {
            Self::Glob(err) => err.to_string(),
            Self::Io(err) => err.to_string(),
            Self::Notify(err) => err.to_string(),
            _ => String::new(),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
