//! Line commands understood by the player shell

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Seek(Duration),
    Volume(f32),
    Add(String),
    Remove(i64),
    Move { from: i64, to: i64 },
    Queue,
    History,
    Status,
    Retry,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("invalid {what}: `{value}`")]
    InvalidArgument { what: &'static str, value: String },
}

pub const HELP: &str = "\
commands:
  play | pause | toggle     control playback
  next | prev               skip forward / back (prev restarts after 2s)
  seek <seconds>            jump within the current track
  vol <0.0-1.0>             set volume
  add <title>               append a track to the queue
  rm <position>             remove a queue entry
  mv <from> <to>            move a queue entry
  queue | history | status  show state
  retry                     reload the last good track after an error
  quit";

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "play" => Command::Play,
        "pause" => Command::Pause,
        "toggle" | "p" => Command::Toggle,
        "next" | "n" => Command::Next,
        "prev" | "previous" | "back" => Command::Previous,
        "seek" => {
            let secs: f64 = number(rest, "seek", "a position in seconds")?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid("position", rest));
            }
            Command::Seek(Duration::from_secs_f64(secs))
        }
        "vol" | "volume" => {
            let level: f32 = number(rest, "vol", "a level between 0.0 and 1.0")?;
            if !(0.0..=1.0).contains(&level) {
                return Err(invalid("level", rest));
            }
            Command::Volume(level)
        }
        "add" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "add",
                    what: "a track title",
                });
            }
            Command::Add(rest.to_string())
        }
        "rm" | "remove" => Command::Remove(number(rest, "rm", "a queue position")?),
        "mv" | "move" => {
            let mut args = rest.split_whitespace();
            let from = number(args.next().unwrap_or(""), "mv", "two queue positions")?;
            let to = number(args.next().unwrap_or(""), "mv", "two queue positions")?;
            Command::Move { from, to }
        }
        "queue" | "ls" => Command::Queue,
        "history" => Command::History,
        "status" | "st" => Command::Status,
        "retry" => Command::Retry,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn number<T: std::str::FromStr>(
    value: &str,
    command: &'static str,
    what: &'static str,
) -> Result<T, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingArgument { command, what });
    }
    value.parse().map_err(|_| invalid(what, value))
}

fn invalid(what: &'static str, value: &str) -> ParseError {
    ParseError::InvalidArgument {
        what,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn simple_commands_and_aliases() {
        assert_eq!(parse("next"), Ok(Some(Command::Next)));
        assert_eq!(parse("  PREV "), Ok(Some(Command::Previous)));
        assert_eq!(parse("toggle"), Ok(Some(Command::Toggle)));
        assert_eq!(parse("q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn add_keeps_the_full_title() {
        assert_eq!(
            parse("add  Blue in Green "),
            Ok(Some(Command::Add("Blue in Green".to_string())))
        );
        assert!(matches!(parse("add"), Err(ParseError::MissingArgument { .. })));
    }

    #[test]
    fn numeric_arguments() {
        assert_eq!(
            parse("seek 12.5"),
            Ok(Some(Command::Seek(Duration::from_millis(12_500))))
        );
        assert_eq!(parse("vol 0.4"), Ok(Some(Command::Volume(0.4))));
        assert_eq!(parse("rm 3"), Ok(Some(Command::Remove(3))));
        assert_eq!(parse("mv 4 1"), Ok(Some(Command::Move { from: 4, to: 1 })));
    }

    #[test]
    fn bad_arguments() {
        assert!(matches!(parse("seek -1"), Err(ParseError::InvalidArgument { .. })));
        assert!(matches!(parse("vol 2"), Err(ParseError::InvalidArgument { .. })));
        assert!(matches!(parse("rm two"), Err(ParseError::InvalidArgument { .. })));
        assert!(matches!(parse("mv 4"), Err(ParseError::MissingArgument { .. })));
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".to_string())));
    }
}
