//! Interactive command parsing

use std::path::PathBuf;
use std::str::FromStr;

use crate::types::{LeadField, ViewMode};

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Industry filter; empty clears it
    Industry(String),
    /// Raw minimum-size input, coerced by the dashboard
    Size(String),
    /// Local text search; empty clears it
    Search(String),
    Sort(LeadField),
    View(Option<ViewMode>),
    Refresh,
    Reset,
    Export(Option<PathBuf>),
    Dark,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  industry [name]      filter by industry (no name clears)
  size <n>             minimum company size
  search [text]        filter by name or company (no text clears)
  sort <field>         sort by field; repeat to flip direction
  view [table|chart]   switch display mode (no argument toggles)
  refresh              refetch with current filters
  reset                clear industry and size filters
  export [path]        write the current view as CSV
  dark                 toggle dark mode
  show                 print the current view
  help                 this text
  quit                 exit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "industry" => Ok(Command::Industry(rest.to_string())),
            "size" => Ok(Command::Size(rest.to_string())),
            "search" => Ok(Command::Search(rest.to_string())),
            "sort" => rest.parse().map(Command::Sort),
            "view" if rest.is_empty() => Ok(Command::View(None)),
            "view" => rest.parse().map(|v| Command::View(Some(v))),
            "refresh" => Ok(Command::Refresh),
            "reset" => Ok(Command::Reset),
            "export" if rest.is_empty() => Ok(Command::Export(None)),
            "export" => Ok(Command::Export(Some(PathBuf::from(rest)))),
            "dark" => Ok(Command::Dark),
            "show" | "" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}' (try 'help')", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("industry Finance".parse(), Ok(Command::Industry("Finance".into())));
        assert_eq!("industry".parse(), Ok(Command::Industry(String::new())));
        assert_eq!("size  250 ".parse(), Ok(Command::Size("250".into())));
        assert_eq!("search acme corp".parse(), Ok(Command::Search("acme corp".into())));
        assert_eq!("SORT size".parse(), Ok(Command::Sort(LeadField::Size)));
        assert_eq!("view".parse(), Ok(Command::View(None)));
        assert_eq!("view chart".parse(), Ok(Command::View(Some(ViewMode::Chart))));
        assert_eq!("export out.csv".parse(), Ok(Command::Export(Some(PathBuf::from("out.csv")))));
        assert_eq!("export".parse(), Ok(Command::Export(None)));
        assert_eq!("".parse(), Ok(Command::Show));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!("sort".parse::<Command>().is_err());
        assert!("sort colour".parse::<Command>().is_err());
        assert!("view grid".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
    }
}
