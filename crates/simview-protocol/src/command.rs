//! Commands sent from the client to the simulation server.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A control command for the server.
///
/// Commands are fire-and-forget: the server never answers them, it simply
/// changes what the following frames contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// `SCENARIO:<id>` - stop the current simulation and start scenario `id`
    Scenario(u32),

    /// `SPEED:<n>` - change the simulation speed
    Speed(u32),

    /// `STOP` - stop the running simulation
    Stop,

    /// Any other single-line text, sent verbatim
    Raw(String),
}

impl Command {
    /// Speed the server is set to when a scenario is launched.
    pub const DEFAULT_SPEED: u32 = 2;

    /// Creates a raw command.
    ///
    /// # Errors
    ///
    /// Returns `CommandParseError::Empty` for blank text and
    /// `CommandParseError::MultiLine` if the text contains a line break,
    /// which would be read by the server as two commands.
    pub fn raw(text: impl Into<String>) -> Result<Self, CommandParseError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CommandParseError::Empty);
        }
        if text.contains(['\n', '\r']) {
            return Err(CommandParseError::MultiLine);
        }
        Ok(Self::Raw(text))
    }

    /// Encodes the command as a newline-terminated wire line.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scenario(id) => write!(f, "SCENARIO:{id}"),
            Self::Speed(n) => write!(f, "SPEED:{n}"),
            Self::Stop => write!(f, "STOP"),
            Self::Raw(text) => write!(f, "{text}"),
        }
    }
}

/// Error parsing command text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Command must fit on a single line")]
    MultiLine,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command} requires an argument")]
    MissingArgument { command: &'static str },

    #[error("{command} takes no argument (got {value:?})")]
    UnexpectedArgument { command: &'static str, value: String },

    #[error("Invalid {command} argument: {value:?}")]
    InvalidArgument { command: &'static str, value: String },
}

impl FromStr for Command {
    type Err = CommandParseError;

    /// Parses the wire form (`SCENARIO:1`, `SPEED:3`, `STOP`) as well as the
    /// shorthand `scenario 1` / `speed 3` / `stop`. Keywords are
    /// case-insensitive. Anything else is rejected; use [`Command::raw`] to
    /// send arbitrary text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let (keyword, argument) = match text.split_once([':', ' ']) {
            Some((keyword, argument)) => (keyword, Some(argument.trim())),
            None => (text, None),
        };

        match keyword.to_ascii_uppercase().as_str() {
            "SCENARIO" => parse_argument("SCENARIO", argument).map(Self::Scenario),
            "SPEED" => parse_argument("SPEED", argument).map(Self::Speed),
            "STOP" => match argument {
                None | Some("") => Ok(Self::Stop),
                Some(value) => Err(CommandParseError::UnexpectedArgument {
                    command: "STOP",
                    value: value.to_string(),
                }),
            },
            _ => Err(CommandParseError::Unknown(keyword.to_string())),
        }
    }
}

fn parse_argument(command: &'static str, argument: Option<&str>) -> Result<u32, CommandParseError> {
    match argument {
        None | Some("") => Err(CommandParseError::MissingArgument { command }),
        Some(value) => value.parse().map_err(|_| CommandParseError::InvalidArgument {
            command,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_encoding() {
        assert_eq!(Command::Scenario(1).to_string(), "SCENARIO:1");
        assert_eq!(Command::Speed(7).to_string(), "SPEED:7");
        assert_eq!(Command::Stop.to_string(), "STOP");
        assert_eq!(Command::Stop.to_line(), "STOP\n");
    }

    #[test]
    fn test_parse_wire_form() {
        assert_eq!("SCENARIO:3".parse::<Command>(), Ok(Command::Scenario(3)));
        assert_eq!("SPEED:10".parse::<Command>(), Ok(Command::Speed(10)));
        assert_eq!("STOP".parse::<Command>(), Ok(Command::Stop));
    }

    #[test]
    fn test_parse_shorthand() {
        assert_eq!("scenario 2".parse::<Command>(), Ok(Command::Scenario(2)));
        assert_eq!("  speed 4 ".parse::<Command>(), Ok(Command::Speed(4)));
        assert_eq!("stop".parse::<Command>(), Ok(Command::Stop));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandParseError::Empty));
        assert_eq!(
            "SPEED".parse::<Command>(),
            Err(CommandParseError::MissingArgument { command: "SPEED" })
        );
        assert!(matches!(
            "SPEED:fast".parse::<Command>(),
            Err(CommandParseError::InvalidArgument { command: "SPEED", .. })
        ));
        assert!(matches!(
            "STOP:now".parse::<Command>(),
            Err(CommandParseError::UnexpectedArgument { .. })
        ));
        assert_eq!(
            "PAUSE".parse::<Command>(),
            Err(CommandParseError::Unknown("PAUSE".to_string()))
        );
    }

    #[test]
    fn test_raw_command() {
        assert_eq!(Command::raw("PING").unwrap().to_line(), "PING\n");
        assert_eq!(Command::raw("  "), Err(CommandParseError::Empty));
        assert_eq!(Command::raw("STOP\nSTOP"), Err(CommandParseError::MultiLine));
    }
}
