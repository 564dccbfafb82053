use std::sync::{Arc, Weak};

use super::Snapshot;
use super::builder::ClientBuilder;
use super::mailbox::{Command, Mailbox};
use crate::input::InputBuffer;
use crate::message::{
    MISSING_REPLY_FALLBACK, Message, Sender, Transcript, UNREACHABLE_FALLBACK,
};
use crate::speech::{
    EventSink, NoSpeechRecognition, NoSpeechSynthesis, RecognitionEvent,
    RecognitionSettings, SpeechRecognizer, SpeechSynthesizer, SynthesisEvent,
    Utterance, select_voice,
};
use crate::transport::{Dispatcher, ProxyReply, TransportError};

#[derive(Default)]
pub struct Observers {
    pub on_message: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    pub on_idle: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_input_changed: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub on_listening_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub on_speaking_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
}

pub struct ClientState {
    transcript: Transcript,
    input: InputBuffer,
    busy: bool,
    listening: bool,
    speaking: bool,
    voice_output: bool,
    dispatcher: Dispatcher,
    recognizer: Arc<dyn SpeechRecognizer>,
    recognition: RecognitionSettings,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    current_utterance: u64,
    observers: Observers,
    mailbox: Weak<Mailbox>,
}

impl ClientState {
    pub fn new(builder: ClientBuilder, mailbox: Weak<Mailbox>) -> Self {
        let ClientBuilder {
            dispatcher,
            recognizer,
            synthesizer,
            recognition,
            greeting,
            observers,
        } = builder;

        // Capabilities are probed once, here. Everything below talks to
        // the null objects when an engine is missing.
        let recognizer = recognizer
            .filter(|r| r.is_available())
            .unwrap_or_else(|| {
                Arc::new(NoSpeechRecognition) as Arc<dyn SpeechRecognizer>
            });
        let synthesizer = synthesizer
            .filter(|s| s.is_available())
            .unwrap_or_else(|| {
                Arc::new(NoSpeechSynthesis) as Arc<dyn SpeechSynthesizer>
            });
        debug!(
            "speech capabilities: recognition={}, synthesis={}",
            recognizer.is_available(),
            synthesizer.is_available()
        );

        Self {
            transcript: Transcript::with_greeting(greeting),
            input: Default::default(),
            busy: false,
            listening: false,
            speaking: false,
            voice_output: synthesizer.is_available(),
            dispatcher,
            recognizer,
            recognition,
            synthesizer,
            current_utterance: 0,
            observers,
            mailbox,
        }
    }

    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SetInput(text) => {
                self.input.set(text);
                self.notify_input_changed();
            }
            Command::Submit => self.submit(),
            Command::ToggleListening => self.toggle_listening(),
            Command::SetVoiceOutput(enabled) => {
                self.voice_output = enabled;
                if !enabled {
                    self.silence();
                }
            }
            Command::Replay(id) => match self.transcript.get(id) {
                Some(msg) if msg.sender() == Sender::Assistant => {
                    let text = msg.text().to_owned();
                    self.speak(text);
                }
                _ => debug!("nothing to replay for {id}"),
            },
            Command::Snapshot(tx) => {
                tx.send(self.snapshot()).ok();
            }
            Command::TurnFinished(res) => self.finish_turn(res),
            Command::Recognition(event) => self.handle_recognition(event),
            Command::Synthesis { utterance, event } => {
                self.handle_synthesis(utterance, event)
            }
        }
    }

    /// Replays the existing transcript to the message observer.
    pub fn announce_transcript(&self) {
        let Some(on_message) = &self.observers.on_message else {
            return;
        };
        for msg in self.transcript.messages() {
            on_message(msg);
        }
    }

    /// Lets go of the speech engines when the loop ends.
    pub fn release_speech(&mut self) {
        if self.listening {
            self.recognizer.stop();
        }
        self.silence();
    }

    fn submit(&mut self) {
        if self.busy {
            debug!("a turn is in flight, ignoring submit");
            return;
        }
        let Some(text) = self.input.take_trimmed() else {
            trace!("nothing to submit");
            return;
        };

        self.push_message(Sender::User, text.clone());
        self.notify_input_changed();
        self.busy = true;

        // The request runs in its own task, so the turn ends even if the
        // transport panics.
        let request = tokio::spawn(self.dispatcher.send(text));
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let res = request.await.unwrap_or_else(|err| {
                error!("chat request task failed: {err}");
                Err(TransportError::Aborted(err.to_string()))
            });
            match mailbox.upgrade() {
                Some(mailbox) => {
                    mailbox.send(Command::TurnFinished(res)).ok();
                }
                None => debug!("client is gone, dropping the reply"),
            }
        });
    }

    fn finish_turn(&mut self, res: Result<ProxyReply, TransportError>) {
        let (text, is_reply) = match res {
            Ok(reply) => match reply.reply_text() {
                Some(text) => (text.to_owned(), true),
                None => {
                    warn!("proxy answered without a reply: {:?}", reply.error);
                    (MISSING_REPLY_FALLBACK.to_owned(), false)
                }
            },
            Err(err) => {
                warn!("turn failed: {err}");
                (UNREACHABLE_FALLBACK.to_owned(), false)
            }
        };

        self.push_message(Sender::Assistant, text.clone());
        self.end_turn();
        if is_reply && self.voice_output {
            self.speak(text);
        }
    }

    fn end_turn(&mut self) {
        self.busy = false;
        if let Some(on_idle) = &self.observers.on_idle {
            on_idle();
        }
    }

    fn toggle_listening(&mut self) {
        if !self.recognizer.is_available() {
            debug!("speech recognition is not available");
            return;
        }
        if self.listening {
            self.recognizer.stop();
            return;
        }
        let events = self.event_sink(Command::Recognition);
        self.recognizer.start(&self.recognition, events);
    }

    fn handle_recognition(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => self.set_listening(true),
            RecognitionEvent::Result(transcript) => {
                let transcript = transcript.trim();
                if transcript.is_empty() {
                    return;
                }
                self.input.append_transcript(transcript);
                self.notify_input_changed();
            }
            RecognitionEvent::Ended => self.set_listening(false),
            RecognitionEvent::Failed(reason) => {
                debug!("recognition failed: {reason}");
                self.set_listening(false);
            }
        }
    }

    fn speak(&mut self, text: String) {
        if !self.synthesizer.is_available() {
            return;
        }
        self.silence();

        self.current_utterance += 1;
        let utterance_id = self.current_utterance;
        let voices = self.synthesizer.voices();
        let utterance =
            Utterance::new(text).with_voice(select_voice(&voices).cloned());
        trace!("speaking with voice {:?}", utterance.voice);
        let events = self.event_sink(move |event: SynthesisEvent| {
            Command::Synthesis {
                utterance: utterance_id,
                event,
            }
        });
        self.synthesizer.speak(utterance, events);
    }

    fn silence(&mut self) {
        self.synthesizer.cancel();
        self.set_speaking(false);
    }

    fn handle_synthesis(&mut self, utterance: u64, event: SynthesisEvent) {
        if utterance != self.current_utterance {
            trace!("ignoring {event:?} of a cancelled utterance");
            return;
        }
        match event {
            SynthesisEvent::Started => self.set_speaking(true),
            SynthesisEvent::Ended => self.set_speaking(false),
        }
    }

    fn event_sink<E: 'static>(
        &self,
        wrap: impl Fn(E) -> Command + Send + Sync + 'static,
    ) -> EventSink<E> {
        let mailbox = self.mailbox.clone();
        EventSink::new(move |event| {
            if let Some(mailbox) = mailbox.upgrade() {
                mailbox.send(wrap(event)).ok();
            }
        })
    }

    fn push_message(&mut self, sender: Sender, text: String) {
        let msg = self.transcript.push(sender, text);
        if let Some(on_message) = &self.observers.on_message {
            on_message(msg);
        }
    }

    fn set_listening(&mut self, listening: bool) {
        if self.listening == listening {
            return;
        }
        self.listening = listening;
        if let Some(on_listening_changed) = &self.observers.on_listening_changed
        {
            on_listening_changed(listening);
        }
    }

    fn set_speaking(&mut self, speaking: bool) {
        if self.speaking == speaking {
            return;
        }
        self.speaking = speaking;
        if let Some(on_speaking_changed) = &self.observers.on_speaking_changed
        {
            on_speaking_changed(speaking);
        }
    }

    fn notify_input_changed(&self) {
        if let Some(on_input_changed) = &self.observers.on_input_changed {
            on_input_changed(self.input.as_str());
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            transcript: self.transcript.clone(),
            input: self.input.as_str().to_owned(),
            busy: self.busy,
            listening: self.listening,
            speaking: self.speaking,
            voice_output: self.voice_output,
            can_listen: self.recognizer.is_available(),
            can_speak: self.synthesizer.is_available(),
        }
    }
}
