use std::sync::Arc;

use super::ConversationClient;
use super::state::Observers;
use crate::message::{DEFAULT_GREETING, Message};
use crate::speech::{RecognitionSettings, SpeechRecognizer, SpeechSynthesizer};
use crate::transport::{ChatTransport, Dispatcher, HttpTransport};

/// [`ConversationClient`] builder.
pub struct ClientBuilder {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pub(crate) synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub(crate) recognition: RecognitionSettings,
    pub(crate) greeting: String,
    pub(crate) observers: Observers,
}

impl ClientBuilder {
    /// Creates a new builder sending turns through `transport`.
    #[inline]
    pub fn with_transport<T: ChatTransport + 'static>(transport: T) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport),
            recognizer: None,
            synthesizer: None,
            recognition: Default::default(),
            greeting: DEFAULT_GREETING.to_owned(),
            observers: Default::default(),
        }
    }

    /// Creates a new builder talking to the proxy served at `base_url`.
    #[inline]
    pub fn with_proxy_url(base_url: &str) -> Self {
        Self::with_transport(HttpTransport::new(base_url))
    }

    /// Sets the speech recognition engine.
    ///
    /// An engine reporting itself unavailable is treated as absent.
    #[inline]
    pub fn with_speech_recognizer<R: SpeechRecognizer + 'static>(
        mut self,
        recognizer: R,
    ) -> Self {
        self.recognizer = Some(Arc::new(recognizer));
        self
    }

    /// Sets the speech synthesis engine.
    ///
    /// An engine reporting itself unavailable is treated as absent.
    #[inline]
    pub fn with_speech_synthesizer<S: SpeechSynthesizer + 'static>(
        mut self,
        synthesizer: S,
    ) -> Self {
        self.synthesizer = Some(Arc::new(synthesizer));
        self
    }

    /// Overrides how recognition runs.
    #[inline]
    pub fn with_recognition_settings(
        mut self,
        settings: RecognitionSettings,
    ) -> Self {
        self.recognition = settings;
        self
    }

    /// Overrides the greeting the transcript starts with.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Attaches a callback invoked for every message appended to the
    /// transcript, greeting included.
    ///
    /// This is where a view keeps the latest message visible.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback invoked when a turn has finished.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Attaches a callback invoked when the input text changes.
    #[inline]
    pub fn on_input_changed(
        mut self,
        on_input_changed: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_input_changed = Some(Box::new(on_input_changed));
        self
    }

    /// Attaches a callback invoked when listening starts or stops.
    #[inline]
    pub fn on_listening_changed(
        mut self,
        on_listening_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_listening_changed =
            Some(Box::new(on_listening_changed));
        self
    }

    /// Attaches a callback invoked when speaking starts or stops.
    #[inline]
    pub fn on_speaking_changed(
        mut self,
        on_speaking_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_speaking_changed =
            Some(Box::new(on_speaking_changed));
        self
    }

    /// Builds the client and starts its event loop.
    ///
    /// Must be called within a Tokio runtime.
    #[inline]
    pub fn build(self) -> ConversationClient {
        ConversationClient::spawn_from_builder(self)
    }
}
