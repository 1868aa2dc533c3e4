use std::ffi::OsString;
use std::path::PathBuf;

use clap::{App, AppSettings, Arg, ArgMatches};
use log::LevelFilter;
use notify::op::Op;

use crate::config::{Config, ConfigBuilder};
use crate::error::{Error, Result};
use crate::input;
use crate::pathop;

pub fn get_args() -> Result<(Config, LevelFilter)> {
    get_args_from(std::env::args_os())
}

pub fn get_args_from<I, T>(from: I) -> Result<(Config, LevelFilter)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = App::new("filewatcher")
        .version(crate_version!())
        .about("Run a command when files in the watched directories change")
        .setting(AppSettings::TrailingVarArg)
        .arg(Arg::with_name("command")
            .help("Command to execute; $filepath, $dir and $relative_dir are expanded for each run")
            .multiple(true)
            .required(true))
        .arg(Arg::with_name("verbose")
            .help("Print debugging messages to stderr")
            .short("v")
            .long("verbose"))
        .arg(Arg::with_name("quiet")
            .help("Only print warnings and errors to stderr")
            .short("q")
            .long("quiet")
            .conflicts_with("verbose"))
        .arg(Arg::with_name("exclude")
            .help("Ignore changes to paths matching the pattern (comma-separated lists accepted)")
            .short("x")
            .long("exclude")
            .number_of_values(1)
            .multiple(true)
            .takes_value(true)
            .value_name("pattern"))
        .arg(Arg::with_name("directory")
            .help("Directory to watch recursively [default: .]")
            .short("d")
            .long("directory")
            .number_of_values(1)
            .multiple(true)
            .takes_value(true)
            .value_name("dir"))
        .arg(Arg::with_name("depth")
            .help("Number of path segments at which to stop descending")
            .short("L")
            .long("depth")
            .takes_value(true)
            .default_value("5")
            .value_name("n"))
        .arg(Arg::with_name("idle-timeout")
            .help("Exit after this long without any filesystem event")
            .long("idle-timeout")
            .takes_value(true)
            .default_value("10m")
            .value_name("duration"))
        .arg(Arg::with_name("event")
            .help("Event kinds that trigger the command: create, write, remove, rename, chmod [default: write,create]")
            .short("e")
            .long("event")
            .number_of_values(1)
            .multiple(true)
            .takes_value(true)
            .value_name("kind"))
        .arg(Arg::with_name("env")
            .help("Set an environment variable for the command")
            .short("E")
            .long("env")
            .number_of_values(1)
            .multiple(true)
            .takes_value(true)
            .value_name("KEY=VALUE"))
        .arg(Arg::with_name("no-input")
            .help("Do not read environment updates (e KEY=VALUE) from stdin")
            .long("no-input"))
        .arg(Arg::with_name("poll")
            .help("Force polling mode, checking for changes at this interval")
            .long("force-poll")
            .takes_value(true)
            .value_name("interval"))
        .get_matches_from_safe(from)?;

    let mut builder = ConfigBuilder::default();
    builder
        .cmd(values_t!(args.values_of("command"), String)?)
        .excludes(split_values(&args, "exclude"))
        .depth(value_t!(args, "depth", usize)?)
        .idle_timeout(value_t!(args, "idle-timeout", humantime::Duration)?)
        .env_input(!args.is_present("no-input"));

    let dirs = split_values(&args, "directory");
    if !dirs.is_empty() {
        builder.paths(dirs.into_iter().map(PathBuf::from).collect::<Vec<_>>());
    }

    if args.is_present("event") {
        builder.events(parse_events(&split_values(&args, "event"))?);
    }

    let env = values_t!(args.values_of("env"), String).unwrap_or_default();
    for entry in &env {
        input::validate_assignment(entry)?;
    }
    builder.env(env);

    if args.is_present("poll") {
        builder
            .poll(true)
            .poll_interval(value_t!(args, "poll", humantime::Duration)?);
    }

    let loglevel = if args.is_present("verbose") {
        LevelFilter::Debug
    } else if args.is_present("quiet") {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let config = builder.build().map_err(Error::Config)?;
    Ok((config, loglevel))
}

/// All values of a repeatable option, with comma-separated lists split.
fn split_values(args: &ArgMatches, name: &str) -> Vec<String> {
    args.values_of(name)
        .map(|values| {
            values
                .flat_map(|value| value.split(','))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_events(names: &[String]) -> Result<Op> {
    names.iter().try_fold(Op::empty(), |ops, name| {
        pathop::op_from_name(name)
            .map(|op| ops | op)
            .ok_or_else(|| Error::Config(format!("unknown event kind {:?}", name)))
    })
}
