//! Host speech capabilities.
//!
//! The client is written against [`SpeechRecognizer`] and
//! [`SpeechSynthesizer`]. Hosts without an engine use [`NoSpeechRecognition`]
//! and [`NoSpeechSynthesis`], and the client degrades to text only.

use std::fmt::{self, Debug};
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Voices associated with India are preferred.
static PREFERRED_VOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)India|Hindi|en-IN|hi-IN")
        .expect("voice pattern is valid")
});
static FALLBACK_VOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)en-|hi-").expect("voice pattern is valid")
});

/// Receives events from a speech engine, from any thread.
pub struct EventSink<E> {
    emit_fn: Arc<dyn Fn(E) + Send + Sync>,
}

impl<E> EventSink<E> {
    /// Creates a sink that forwards every event to `emit_fn`.
    #[inline]
    pub fn new(emit_fn: impl Fn(E) + Send + Sync + 'static) -> Self {
        Self {
            emit_fn: Arc::new(emit_fn),
        }
    }

    /// Delivers one event.
    #[inline]
    pub fn emit(&self, event: E) {
        (self.emit_fn)(event)
    }
}

impl<E> Clone for EventSink<E> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            emit_fn: Arc::clone(&self.emit_fn),
        }
    }
}

impl<E> Debug for EventSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// How recognition should run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// BCP 47 language tag.
    pub lang: String,
    /// Whether partial results are reported.
    pub interim_results: bool,
    /// Whether recognition keeps going after the first final result.
    pub continuous: bool,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            lang: "hi-IN".to_owned(),
            interim_results: false,
            continuous: false,
        }
    }
}

/// Events reported by a [`SpeechRecognizer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The engine started listening.
    Started,
    /// A final transcript of one utterance.
    Result(String),
    /// The engine stopped listening.
    Ended,
    /// The engine failed; listening is over.
    Failed(String),
}

/// A speech-to-text engine.
pub trait SpeechRecognizer: Send + Sync {
    /// Returns whether the engine can be used on this host.
    fn is_available(&self) -> bool {
        true
    }

    /// Starts listening. Events go to `events` until listening ends.
    fn start(
        &self,
        settings: &RecognitionSettings,
        events: EventSink<RecognitionEvent>,
    );

    /// Stops listening; the engine reports [`RecognitionEvent::Ended`].
    fn stop(&self);
}

/// A voice offered by a [`SpeechSynthesizer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    /// Display name, e.g. `"Google हिन्दी"`.
    pub name: String,
    /// BCP 47 language tag.
    pub lang: String,
}

impl Voice {
    /// Creates a voice description.
    #[inline]
    pub fn new<N: Into<String>, L: Into<String>>(name: N, lang: L) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One piece of text to speak.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    /// The text.
    pub text: String,
    /// Speaking rate, `1.0` is normal.
    pub rate: f32,
    /// Voice pitch, `1.0` is normal.
    pub pitch: f32,
    /// The voice, or `None` for the platform default.
    pub voice: Option<Voice>,
}

impl Utterance {
    /// Creates an utterance with the default rate and pitch.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            rate: 1.02,
            pitch: 1.0,
            voice: None,
        }
    }

    /// Sets the voice.
    #[inline]
    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }
}

/// Events reported by a [`SpeechSynthesizer`] for one utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// The utterance became audible.
    Started,
    /// The utterance finished or was cancelled.
    Ended,
}

/// A text-to-speech engine.
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns whether the engine can be used on this host.
    fn is_available(&self) -> bool {
        true
    }

    /// Lists the installed voices.
    fn voices(&self) -> Vec<Voice>;

    /// Silences the current utterance, if any.
    fn cancel(&self);

    /// Starts speaking `utterance`. Events go to `events`.
    fn speak(&self, utterance: Utterance, events: EventSink<SynthesisEvent>);
}

/// Picks the voice to speak with.
///
/// India-associated locales come first, then any English or Hindi locale.
/// `None` means the platform default.
pub fn select_voice(voices: &[Voice]) -> Option<&Voice> {
    voices
        .iter()
        .find(|v| PREFERRED_VOICE.is_match(&v.lang))
        .or_else(|| voices.iter().find(|v| FALLBACK_VOICE.is_match(&v.lang)))
}

/// A [`SpeechRecognizer`] for hosts without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpeechRecognition;

impl SpeechRecognizer for NoSpeechRecognition {
    #[inline]
    fn is_available(&self) -> bool {
        false
    }

    #[inline]
    fn start(
        &self,
        _settings: &RecognitionSettings,
        _events: EventSink<RecognitionEvent>,
    ) {
    }

    #[inline]
    fn stop(&self) {}
}

/// A [`SpeechSynthesizer`] for hosts without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpeechSynthesis;

impl SpeechSynthesizer for NoSpeechSynthesis {
    #[inline]
    fn is_available(&self) -> bool {
        false
    }

    #[inline]
    fn voices(&self) -> Vec<Voice> {
        vec![]
    }

    #[inline]
    fn cancel(&self) {}

    #[inline]
    fn speak(
        &self,
        _utterance: Utterance,
        _events: EventSink<SynthesisEvent>,
    ) {
    }
}
