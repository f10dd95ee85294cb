//! Console commands
//!
//! Parsing of the interactive command language, the handlers that apply
//! commands to a session, and the console loop that ties them to stdin.

pub mod console;
pub mod recording;
pub mod system;

use crate::capture::MediaKind;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  select video|audio   choose what the next recording captures
  start                start recording
  stop                 stop recording and show the preview
  download             save the last recording to the output directory
  clear                clear the history
  status               print the session state as JSON
  history              print the history
  devices              list microphones and cameras
  info                 print system and encoding information
  help                 show this help
  quit                 exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(MediaKind),
    Start,
    Stop,
    Download,
    Clear,
    Status,
    History,
    Devices,
    Info,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(String),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(ParseError::UnexpectedArgument(name));
        }

        let command = match name.as_str() {
            "select" => {
                let kind = argument
                    .ok_or(ParseError::MissingArgument("select"))?
                    .parse::<MediaKind>()
                    .map_err(ParseError::InvalidArgument)?;
                return Ok(Command::Select(kind));
            }
            // Shortcuts for the two selection buttons
            "video" => Command::Select(MediaKind::Video),
            "audio" => Command::Select(MediaKind::Audio),
            "start" => Command::Start,
            "stop" | "end" => Command::Stop,
            "download" => Command::Download,
            "clear" => Command::Clear,
            "status" => Command::Status,
            "history" => Command::History,
            "devices" => Command::Devices,
            "info" => Command::Info,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(ParseError::Unknown(name)),
        };

        match argument {
            Some(_) => Err(ParseError::UnexpectedArgument(name)),
            None => Ok(command),
        }
    }
}
