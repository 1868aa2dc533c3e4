//! Boxed one-line reports printed around each command run.

use colored::{Color, Colorize};
use std::io::{self, Write};

use crate::process::RunRecord;

const PIPE: char = '│';
const BAR: char = '─';

struct Edge {
    left: char,
    right: char,
    tee: char,
}

const TOP: Edge = Edge {
    left: '┌',
    right: '┐',
    tee: '┬',
};

const BOTTOM: Edge = Edge {
    left: '└',
    right: '┘',
    tee: '┴',
};

/// Whether reports are painted with terminal colours.
///
/// `Colored` still defers to the `colored` crate's own checks, so output
/// that isn't a terminal, or `NO_COLOR`, stays plain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Palette {
    Plain,
    Colored,
}

impl Palette {
    fn paint(self, text: String, color: Color) -> String {
        match self {
            Self::Plain => text,
            Self::Colored => text.color(color).to_string(),
        }
    }
}

/// Announces that `command` is about to run.
pub fn write_start<W: Write>(out: &mut W, command: &[String], palette: Palette) -> io::Result<()> {
    let msg = format!("filewatcher {} {}", PIPE, command.join(" "));
    out.write_all(palette.paint(boxed(&msg), Color::Yellow).as_bytes())?;
    out.flush()
}

/// Reports how a run went: `OK` or the error, the trigger and the time taken.
pub fn write_end<W: Write>(out: &mut W, record: &RunRecord, palette: Palette) -> io::Result<()> {
    let (status, color) = match record.result {
        Ok(()) => ("OK".to_string(), Color::Green),
        Err(ref err) => (err.to_string(), Color::BrightRed),
    };
    let msg = format!(
        "{} {} {} {} {:.2?}",
        status,
        PIPE,
        record.trigger.display(),
        PIPE,
        record.elapsed
    );
    out.write_all(palette.paint(boxed(&msg), color).as_bytes())?;
    out.flush()
}

fn boxed(msg: &str) -> String {
    let msg = format!(" {} ", msg);
    let sections = section_widths(&msg);

    let mut out = String::new();
    horizontal(&mut out, &TOP, &sections);
    out.push(PIPE);
    out.push_str(&msg);
    out.push(PIPE);
    out.push('\n');
    horizontal(&mut out, &BOTTOM, &sections);
    out
}

/// Character widths of the `│`-separated sections of `msg`, ignoring empty
/// ones.
fn section_widths(msg: &str) -> Vec<usize> {
    msg.split(PIPE)
        .map(|section| section.chars().count())
        .filter(|&width| width > 0)
        .collect()
}

fn horizontal(out: &mut String, edge: &Edge, sections: &[usize]) {
    out.push(edge.left);
    let bars: Vec<String> = sections
        .iter()
        .map(|&width| BAR.to_string().repeat(width))
        .collect();
    out.push_str(&bars.join(&edge.tee.to_string()));
    out.push(edge.right);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_box() {
        let expected = "\
┌───┬────┬─────┐
│ a │ ok │ bee │
└───┴────┴─────┘
";
        assert_eq!(boxed("a │ ok │ bee"), expected);
    }

    #[test]
    fn test_section_widths() {
        assert_eq!(section_widths("│ one │ two │ three │"), vec![5, 5, 7]);
        assert_eq!(section_widths(" one │ two │ three "), vec![5, 5, 7]);
        assert_eq!(section_widths(""), Vec::<usize>::new());
    }

    #[test]
    fn test_start_report() {
        let mut out = Vec::new();
        write_start(&mut out, &["echo".to_string(), "hi".to_string()], Palette::Plain).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("│ filewatcher │ echo hi │"));
    }

    #[test]
    fn test_end_report() {
        let record = RunRecord {
            elapsed: Duration::from_millis(1500),
            trigger: PathBuf::from("src/lib.rs"),
            result: Ok(()),
        };
        let mut out = Vec::new();
        write_end(&mut out, &record, Palette::Plain).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("│ OK │ src/lib.rs │ 1.50s │"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_colored_reports() {
        colored::control::set_override(true);

        let mut start = Vec::new();
        write_start(&mut start, &["make".to_string()], Palette::Colored).unwrap();
        let start = String::from_utf8(start).unwrap();
        assert!(start.starts_with("\u{1b}[33m┌"), "{:?}", start);
        assert!(start.ends_with("┘\n\u{1b}[0m"), "{:?}", start);

        let record = |result| RunRecord {
            elapsed: Duration::from_millis(5),
            trigger: PathBuf::from("a.txt"),
            result,
        };

        let mut ok = Vec::new();
        write_end(&mut ok, &record(Ok(())), Palette::Colored).unwrap();
        assert!(String::from_utf8(ok).unwrap().starts_with("\u{1b}[32m"));

        let mut failed = Vec::new();
        write_end(&mut failed, &record(Err(Error::EmptyCommand)), Palette::Colored).unwrap();
        let failed = String::from_utf8(failed).unwrap();
        assert!(failed.starts_with("\u{1b}[91m"));
        assert!(failed.contains("Command error: no command to run"));
    }
}
