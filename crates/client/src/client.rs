mod builder;
mod mailbox;
mod state;

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::Instrument;

pub use builder::ClientBuilder;
use mailbox::{Command, Mailbox, MailboxParts, run_client};
use state::ClientState;

use crate::message::{MessageId, Transcript};

/// Returned when talking to a client whose event loop has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("the conversation client has shut down")]
pub struct ClientClosed;

/// A point-in-time copy of the client state, for rendering.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// The conversation so far.
    pub transcript: Transcript,
    /// The text being composed.
    pub input: String,
    /// Whether a turn is in flight.
    pub busy: bool,
    /// Whether speech recognition is listening.
    pub listening: bool,
    /// Whether an utterance is audible.
    pub speaking: bool,
    /// Whether replies are spoken as they arrive.
    pub voice_output: bool,
    /// Whether the host can recognize speech.
    pub can_listen: bool,
    /// Whether the host can synthesize speech.
    pub can_speak: bool,
}

/// The conversation client of one chat session.
///
/// All state lives in an event loop running on the Tokio runtime. The
/// methods here only enqueue commands, which the loop handles in order;
/// observe the outcome through the builder callbacks or [`snapshot`].
///
/// At most one turn is in flight. A submit while busy, or with nothing but
/// whitespace in the input, does nothing. Dropping the last handle stops
/// the loop and abandons an in-flight turn.
///
/// [`snapshot`]: ConversationClient::snapshot
#[derive(Clone)]
pub struct ConversationClient {
    mailbox: Arc<Mailbox>,
}

impl ConversationClient {
    fn spawn_from_builder(builder: ClientBuilder) -> Self {
        let MailboxParts {
            mailbox,
            cmd_rx,
            kill_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        let state = ClientState::new(builder, Arc::downgrade(&mailbox));
        tokio::spawn(
            run_client(state, cmd_rx, kill_rx)
                .instrument(trace_span!("conversation client")),
        );
        Self { mailbox }
    }

    /// Replaces the text being composed.
    #[inline]
    pub fn set_input<S: Into<String>>(&self, text: S) -> Result<(), ClientClosed> {
        self.mailbox.send(Command::SetInput(text.into()))
    }

    /// Submits the text being composed as a user turn.
    #[inline]
    pub fn submit(&self) -> Result<(), ClientClosed> {
        self.mailbox.send(Command::Submit)
    }

    /// Replaces the input with `text` and submits it.
    pub fn send_message<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), ClientClosed> {
        self.set_input(text)?;
        self.submit()
    }

    /// Starts listening, or stops if already listening.
    ///
    /// Does nothing on hosts without speech recognition.
    #[inline]
    pub fn toggle_listening(&self) -> Result<(), ClientClosed> {
        self.mailbox.send(Command::ToggleListening)
    }

    /// Turns speaking of incoming replies on or off.
    #[inline]
    pub fn set_voice_output(&self, enabled: bool) -> Result<(), ClientClosed> {
        self.mailbox.send(Command::SetVoiceOutput(enabled))
    }

    /// Speaks the assistant message `id` again.
    #[inline]
    pub fn replay(&self, id: MessageId) -> Result<(), ClientClosed> {
        self.mailbox.send(Command::Replay(id))
    }

    /// Takes a snapshot after every command sent so far has been handled.
    pub async fn snapshot(&self) -> Result<Snapshot, ClientClosed> {
        let (tx, rx) = oneshot::channel();
        self.mailbox.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| ClientClosed)
    }

    /// Asks the event loop to stop.
    ///
    /// The loop is not guaranteed to stop immediately, but it handles no
    /// further commands.
    #[inline]
    pub fn shutdown(&self) {
        self.mailbox.try_kill();
    }
}
