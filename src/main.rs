use std::io::Write;

use filewatcher::{cli, error::Error, error::Result, run, Termination};

fn main() -> Result<()> {
    let (config, loglevel) = match cli::get_args() {
        Ok(args) => args,
        Err(Error::Clap(err)) => err.exit(),
        Err(err) => return Err(err),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(loglevel.to_string()),
    )
    .format(|buf, r| writeln!(buf, "*** {}", r.args()))
    .init();

    match run(config)? {
        Termination::Idle => log::debug!("Stopped after idle timeout"),
        Termination::Interrupted => log::debug!("Stopped on interrupt"),
        Termination::Closed => log::warn!("Filesystem notifier closed"),
    }

    Ok(())
}
