use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::common::{FeedCommand, FeedEvent};
use crate::feed::SessionHandle;

use super::components::{chat_area, input_bar};
use super::components::input_bar::ChatInput;
use super::state::ChatPageState;

const BELL: &str = "\x07";

/// Terminal chat page: renders session events and turns typed lines into
/// commands.
pub struct ChatApp<W: Write> {
    state: ChatPageState,
    session: SessionHandle,
    event_receiver: mpsc::Receiver<FeedEvent>,
    chime: bool,
    out: W,
}

impl<W: Write> ChatApp<W> {
    pub fn new(
        session: SessionHandle,
        event_receiver: mpsc::Receiver<FeedEvent>,
        sender: impl Into<String>,
        chime: bool,
        out: W,
    ) -> Self {
        Self {
            state: ChatPageState::new(sender),
            session,
            event_receiver,
            chime,
            out,
        }
    }

    pub fn state(&self) -> &ChatPageState {
        &self.state
    }

    pub fn handle_event(&mut self, event: FeedEvent) -> io::Result<()> {
        match event {
            FeedEvent::Mounted { messages, has_more } => {
                self.state.visible = messages.len();
                self.state.has_more = has_more;
                writeln!(self.out, "💬 Chat ({} messages)", messages.len())?;
                if !messages.is_empty() {
                    writeln!(self.out, "{}", chat_area::render_feed(&messages))?;
                }
                self.print_more_hint()?;
            }
            FeedEvent::PageLoaded { messages, has_more } => {
                self.state.visible += messages.len();
                self.state.has_more = has_more;
                if !messages.is_empty() {
                    writeln!(self.out, "{}", chat_area::render_feed(&messages))?;
                }
                self.print_more_hint()?;
            }
            FeedEvent::MessageArrived(message) => {
                self.state.visible += 1;
                if self.chime {
                    write!(self.out, "{BELL}")?;
                }
                writeln!(self.out, "▲ {}", chat_area::render_message(&message))?;
            }
            FeedEvent::LoadFailed(reason) => {
                writeln!(self.out, "! could not load older messages: {reason}")?;
            }
            FeedEvent::SendFailed(reason) => {
                writeln!(self.out, "! message not sent: {reason}")?;
            }
            FeedEvent::LiveStopped => {
                log::warn!("Live chat updates stopped");
                writeln!(
                    self.out,
                    "! live updates stopped; {} messages shown",
                    self.state.visible
                )?;
            }
        }
        self.out.flush()
    }

    fn print_more_hint(&mut self) -> io::Result<()> {
        if self.state.has_more {
            writeln!(
                self.out,
                "({} messages shown; type /more for older messages)",
                self.state.visible
            )?;
        }
        Ok(())
    }

    /// Returns `false` when the page should close.
    pub async fn handle_input(&mut self, line: &str) -> bool {
        let command = match input_bar::parse(line) {
            None => return true,
            Some(ChatInput::Quit) => return false,
            Some(ChatInput::Rename(name)) => {
                log::info!("Sender renamed to {name}");
                self.state.sender = name;
                return true;
            }
            Some(ChatInput::LoadMore) => {
                if !self.state.has_more {
                    return true;
                }
                FeedCommand::LoadMore
            }
            Some(ChatInput::Send(body)) => FeedCommand::SendMessage {
                sender: self.state.sender.clone(),
                body,
            },
        };

        if let Err(err) = self.session.send(command).await {
            log::warn!("Failed to reach chat session: {err}");
            return false;
        }
        true
    }

    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_input(&line).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                event = self.event_receiver.recv() => {
                    match event {
                        Some(event) => self.handle_event(event)?,
                        None => break,
                    }
                }
            }
        }

        self.session.join().await;
        Ok(())
    }
}
