//! Control-protocol command grammar.
//!
//! Clients send one command per line over the control socket. The grammar
//! is deliberately tiny:
//!
//! ```text
//! enable
//! disable
//! message <show-time-ms> <text...>
//! ```
//!
//! `message` text is the untrimmed remainder of the line and may contain
//! spaces. Anything else is rejected with a typed parse error whose display
//! text becomes the protocol response line.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Allow the visualizer to run (subject to playback state).
    Enable,
    /// Force the visualizer off regardless of playback state.
    Disable,
    /// Show a transient text message on the display.
    Message {
        /// How long the display should show the message.
        show_time: Duration,
        /// The message text; may contain spaces.
        text: String,
    },
}

/// Errors produced while parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    /// The line was empty or whitespace-only.
    #[error("empty command")]
    Empty,

    /// The first word was not a known command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// `message` was missing its show time or text.
    #[error("message expects <show-time-ms> <text>")]
    MessageUsage,

    /// The `message` show time was not a non-negative integer.
    #[error("invalid show time: {0}")]
    InvalidShowTime(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandParseError::Empty);
        }
        match line {
            "enable" => return Ok(Command::Enable),
            "disable" => return Ok(Command::Disable),
            _ => {}
        }

        let mut parts = line.splitn(3, ' ');
        let keyword = parts.next().unwrap_or_default();
        if keyword != "message" {
            return Err(CommandParseError::Unknown(keyword.to_string()));
        }

        let show_time = parts.next().ok_or(CommandParseError::MessageUsage)?;
        let text = parts.next().ok_or(CommandParseError::MessageUsage)?;
        let millis = show_time
            .parse::<u64>()
            .map_err(|_| CommandParseError::InvalidShowTime(show_time.to_string()))?;

        Ok(Command::Message {
            show_time: Duration::from_millis(millis),
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enable_and_disable() {
        assert_eq!("enable".parse(), Ok(Command::Enable));
        assert_eq!("disable\n".parse(), Ok(Command::Disable));
    }

    #[test]
    fn parses_message_with_spaces_in_text() {
        assert_eq!(
            "message 5000 hello world".parse(),
            Ok(Command::Message {
                show_time: Duration::from_millis(5000),
                text: "hello world".to_string(),
            })
        );
    }

    #[test]
    fn rejects_unknown_commands() {
        assert_eq!(
            "bogus".parse::<Command>(),
            Err(CommandParseError::Unknown("bogus".to_string()))
        );
        // A known keyword with stray arguments is not a command either.
        assert_eq!(
            "enable now".parse::<Command>(),
            Err(CommandParseError::Unknown("enable".to_string()))
        );
    }

    #[test]
    fn rejects_message_without_text() {
        assert_eq!(
            "message 5000".parse::<Command>(),
            Err(CommandParseError::MessageUsage)
        );
        assert_eq!(
            "message".parse::<Command>(),
            Err(CommandParseError::MessageUsage)
        );
    }

    #[test]
    fn rejects_non_numeric_show_time() {
        assert_eq!(
            "message soon hello".parse::<Command>(),
            Err(CommandParseError::InvalidShowTime("soon".to_string()))
        );
    }

    #[test]
    fn rejects_empty_lines() {
        assert_eq!("".parse::<Command>(), Err(CommandParseError::Empty));
        assert_eq!("   ".parse::<Command>(), Err(CommandParseError::Empty));
    }
}
