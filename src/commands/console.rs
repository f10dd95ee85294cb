//! Interactive console
//!
//! Reads one command per line and prints the session's notifications while
//! encoder events are fed back into the session between commands.

use super::recording::{execute, Reply};
use super::Command;
use crate::encoder::EventReceiver;
use crate::recorder::{RecordingSession, SessionEvent};
use crate::utils::{AppError, AppResult, ErrorResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::TryRecvError};

const PROMPT: &str = "> ";

/// Run the console until `quit` or end of input
pub async fn run_console<R, W>(
    session: &mut RecordingSession,
    input: R,
    mut output: W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = session
        .take_events()
        .ok_or_else(|| AppError::Config("session events are already being consumed".to_string()))?;
    let mut notifications = session.subscribe();
    let mut lines = input.lines();

    // The initial history entry predates the subscription
    for entry in session.history().entries() {
        write_line(&mut output, &entry.message).await?;
    }
    output.write_all(PROMPT.as_bytes()).await?;
    output.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Console input closed");
                    break;
                };

                // Apply whatever the encoder produced before the command runs
                drain_events(session, &mut events);
                print_notifications(&mut notifications, &mut output).await?;

                let quit = run_line(session, &line, &mut output).await?;
                print_notifications(&mut notifications, &mut output).await?;
                if quit {
                    break;
                }

                output.write_all(PROMPT.as_bytes()).await?;
                output.flush().await?;
            }
            Some(event) = events.recv() => {
                session.handle_event(event);
                drain_events(session, &mut events);
                print_notifications(&mut notifications, &mut output).await?;
                output.flush().await?;
            }
        }
    }

    output.flush().await?;
    Ok(())
}

/// Parse and execute one line, returning whether the console should exit
async fn run_line<W>(session: &mut RecordingSession, line: &str, output: &mut W) -> AppResult<bool>
where
    W: AsyncWrite + Unpin,
{
    if line.trim().is_empty() {
        return Ok(false);
    }

    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            write_line(output, &format!("error: {e}")).await?;
            return Ok(false);
        }
    };

    match execute(session, command).await {
        Ok(Reply::Done) => Ok(false),
        Ok(Reply::Text(text)) => {
            write_line(output, &text).await?;
            Ok(false)
        }
        Ok(Reply::Quit) => Ok(true),
        Err(AppError::Io(e)) => Err(AppError::Io(e)),
        Err(e) => {
            tracing::debug!("Command {:?} failed: {}", command, e);
            let response = ErrorResponse::from(e);
            write_line(
                output,
                &format!("error: {} ({})", response.message, response.code),
            )
            .await?;
            Ok(false)
        }
    }
}

fn drain_events(session: &mut RecordingSession, events: &mut EventReceiver) {
    while let Ok(event) = events.try_recv() {
        session.handle_event(event);
    }
}

async fn print_notifications<W>(
    notifications: &mut broadcast::Receiver<SessionEvent>,
    output: &mut W,
) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match notifications.try_recv() {
            Ok(SessionEvent::Logged(message)) => write_line(output, &message).await?,
            Ok(SessionEvent::PreviewReady { location, size }) => {
                write_line(output, &format!("preview: {location} ({size} bytes)")).await?
            }
            Ok(SessionEvent::Saved { path, .. }) => {
                write_line(output, &format!("saved to {path}")).await?
            }
            Ok(SessionEvent::HistoryCleared) => write_line(output, "history cleared").await?,
            Ok(SessionEvent::StateChanged(state)) => {
                tracing::trace!("Session state is now {:?}", state);
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Console skipped {} notifications", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    Ok(())
}

async fn write_line<W>(output: &mut W, text: &str) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}
