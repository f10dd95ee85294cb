//! Recording command handlers

use super::system::{get_devices, get_system_info};
use super::{Command, HELP};
use crate::recorder::RecordingSession;
use crate::utils::AppResult;

/// What the console should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print beyond the session's own notifications
    Done,
    Text(String),
    Quit,
}

/// Apply `command` to `session`
pub async fn execute(session: &mut RecordingSession, command: Command) -> AppResult<Reply> {
    tracing::debug!("Executing {:?}", command);

    let reply = match command {
        Command::Select(kind) => {
            session.select(kind)?;
            Reply::Text(format!("Selected {kind}"))
        }
        Command::Start => {
            session.start().await?;
            Reply::Done
        }
        Command::Stop => {
            session.stop().await?;
            Reply::Done
        }
        Command::Download => {
            session.download()?;
            Reply::Done
        }
        Command::Clear => {
            session.clear();
            Reply::Done
        }
        Command::Status => Reply::Text(serde_json::to_string_pretty(&session.snapshot())?),
        Command::History => {
            let lines: Vec<String> = session
                .history()
                .entries()
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    format!("{:>3}. [{}] {}", i + 1, entry.at.format("%H:%M:%S"), entry.message)
                })
                .collect();
            Reply::Text(lines.join("\n"))
        }
        Command::Devices => Reply::Text(serde_json::to_string_pretty(&get_devices().await)?),
        Command::Info => Reply::Text(serde_json::to_string_pretty(&get_system_info(
            session.profile(),
        ))?),
        Command::Help => Reply::Text(HELP.to_string()),
        Command::Quit => Reply::Quit,
    };

    Ok(reply)
}
