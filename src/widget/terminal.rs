//! Line-oriented terminal rendering and the interactive chat loop.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use super::chat::ChatWidget;
use super::clock::Clock;
use super::message::{Message, Sender};
use super::view::ChatView;
use crate::client::ChatTransport;

const TYPING_LINE: &str = "UniBot is typing…";
/// Carriage return plus "erase line".
const ERASE_LINE: &str = "\r\x1b[2K";

/// Input that ends the chat loop.
pub const QUIT_COMMAND: &str = "/quit";

/// Renders bot rows as prefixed lines on any writer.
///
/// User rows are skipped: the terminal has already echoed the line the
/// user typed.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn append_row(&mut self, message: &Message) {
        if message.sender() == Sender::User {
            return;
        }
        let mut line = format!("bot › {}\n", message.text());
        if let Some(meta) = message.meta() {
            line.push_str(&format!("      {meta}\n"));
        }
        self.write(&line);
    }

    fn show_typing(&mut self) {
        self.write(TYPING_LINE);
    }

    fn hide_typing(&mut self) {
        self.write(ERASE_LINE);
    }
}

/// Initialize `widget`, then submit each line read from `input` until
/// EOF or [`QUIT_COMMAND`].
pub async fn run_repl<T, V, C, R>(widget: &ChatWidget<T, V, C>, input: R) -> std::io::Result<()>
where
    T: ChatTransport,
    V: ChatView,
    C: Clock,
    R: AsyncBufRead + Unpin,
{
    widget.initialize();

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == QUIT_COMMAND {
            break;
        }
        widget.submit(&line).await;
    }
    Ok(())
}
