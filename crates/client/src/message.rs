//! Transcript types.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The greeting every transcript starts with.
pub const DEFAULT_GREETING: &str = "\
    Namaste! Main DNA AI hoon. Kisi bhi language me baat karlo — \
    Hindi, English, Hinglish, ya koi bhi Indian language.";

/// Appended when the proxy answers without a reply.
pub const MISSING_REPLY_FALLBACK: &str =
    "Thoda issue aa gaya, phir se try karo 🙂";

/// Appended when the proxy cannot be reached or its answer cannot be read.
pub const UNREACHABLE_FALLBACK: &str =
    "Server se connect nahi ho paya. Thodi der baad try karo.";

/// Identifies a message within one transcript.
///
/// Identifiers grow monotonically in insertion order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct MessageId(u64);

impl MessageId {
    /// Returns the raw counter value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed or spoken by the user.
    User,
    /// Generated by the assistant, or a fallback standing in for it.
    Assistant,
}

/// One immutable entry of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
}

impl Message {
    /// Returns the identifier.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns who wrote the message.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the literal text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The ordered conversation of one session.
///
/// A transcript always starts with the assistant greeting. Messages are
/// only ever appended, so the order is the turn history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Creates a transcript seeded with `greeting`.
    pub fn with_greeting<S: Into<String>>(greeting: S) -> Self {
        let mut transcript = Self {
            messages: vec![],
            next_id: 1,
        };
        transcript.push(Sender::Assistant, greeting.into());
        transcript
    }

    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages, greeting included.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`, there is at least the greeting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Looks up a message by identifier.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        // Identifiers are assigned in order, so the list is sorted by them.
        self.messages
            .binary_search_by_key(&id, Message::id)
            .ok()
            .map(|idx| &self.messages[idx])
    }

    pub(crate) fn push(&mut self, sender: Sender, text: String) -> &Message {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message { id, sender, text });
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }
}
