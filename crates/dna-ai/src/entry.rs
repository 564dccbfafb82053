//! Reading chat entries from a line-based input.
//!
//! Enter sends. A line ending with a backslash continues on the next line,
//! like Shift+Enter in a chat box.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, Lines};

/// A user command typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Text to send as a chat turn.
    Message(String),
    /// `/voice`: turns spoken replies on or off.
    ToggleVoice,
    /// `/replay`: speaks the latest reply again.
    Replay,
    /// `/help`.
    Help,
    /// `/quit`.
    Quit,
}

impl Entry {
    /// Interprets a complete entry.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "/voice" => Entry::ToggleVoice,
            "/replay" => Entry::Replay,
            "/help" => Entry::Help,
            "/quit" | "/exit" => Entry::Quit,
            _ => Entry::Message(text.to_owned()),
        }
    }
}

/// Reads entries, joining continued lines.
pub struct EntryReader<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> EntryReader<R> {
    /// Creates a reader over `input`.
    #[inline]
    pub fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
        }
    }

    /// Reads the next entry, or `None` at the end of input.
    ///
    /// `on_continue` is invoked before each continuation line is read, to
    /// print a secondary prompt.
    pub async fn next_entry(
        &mut self,
        mut on_continue: impl FnMut(),
    ) -> io::Result<Option<String>> {
        let mut entry = String::new();
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok((!entry.is_empty()).then_some(entry));
            };
            if !push_line(&mut entry, &line) {
                return Ok(Some(entry));
            }
            on_continue();
        }
    }
}

/// Appends `line` to `entry`. Returns whether the entry continues.
fn push_line(entry: &mut String, line: &str) -> bool {
    match line.strip_suffix('\\') {
        Some(head) => {
            entry.push_str(head);
            entry.push('\n');
            true
        }
        None => {
            entry.push_str(line);
            false
        }
    }
}
