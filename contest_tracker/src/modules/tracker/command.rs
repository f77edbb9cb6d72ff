use contest_tracker_libs::platform::{PlatformFilter, UnknownPlatform};
use crate::modules::tracker::state::Event;
use std::{num::ParseIntError, str::FromStr};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  filter <all|codeforces|leetcode|codechef|atcoder>  show one platform
  theme                                              toggle light/dark theme
  register <id>                                      open the contest page
  <enter>                                            back from the contest page
  refresh                                            fetch contests now
  help                                               show this message
  quit                                               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filter(PlatformFilter),
    Theme,
    Register(i64),
    /// Empty line, the terminal counterpart of the window regaining focus.
    Focus,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    InvalidPlatform(#[from] UnknownPlatform),
    #[error("invalid contest id: {0}")]
    InvalidContestId(#[from] ParseIntError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Focus);
        };

        match name.to_lowercase().as_str() {
            "filter" => {
                let platform = words.next().ok_or(CommandError::MissingArgument("filter"))?;
                Ok(Command::Filter(platform.parse()?))
            }
            "theme" => Ok(Command::Theme),
            "register" => {
                let id = words.next().ok_or(CommandError::MissingArgument("register"))?;
                Ok(Command::Register(id.trim_start_matches('#').parse()?))
            }
            "focus" => Ok(Command::Focus),
            "refresh" => Ok(Command::Refresh),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Commands that feed the state reducer.
    pub fn into_event(self) -> Option<Event> {
        match self {
            Command::Filter(filter) => Some(Event::FilterSelected(filter)),
            Command::Theme => Some(Event::ThemeToggled),
            Command::Register(id) => Some(Event::RegisterClicked(id)),
            Command::Focus => Some(Event::WindowFocused),
            Command::Refresh | Command::Help | Command::Quit => None,
        }
    }
}

/// Answer to a yes/no prompt. Anything but `y`/`yes` means no.
pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
