//! Speaking replies through a command-line speech engine.

use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};

use dna_ai_client::speech::{
    EventSink, SpeechSynthesizer, SynthesisEvent, Utterance, Voice,
};
use tokio::process::Command;
use tokio::select;
use tokio::sync::oneshot;

const PROGRAM: &str = "espeak-ng";
const NORMAL_WORDS_PER_MINUTE: f32 = 175.0;
const NORMAL_PITCH: f32 = 50.0;

/// A [`SpeechSynthesizer`] running `espeak-ng`, one process per utterance.
pub struct CommandSynthesizer {
    program: Option<PathBuf>,
    voices: Vec<Voice>,
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandSynthesizer {
    /// Looks for the engine on `PATH` and lists its voices.
    ///
    /// The result reports itself unavailable if the engine is missing.
    pub async fn detect() -> Self {
        let Some(program) = find_program(PROGRAM) else {
            debug!("{PROGRAM} not found, replies will not be spoken");
            return Self::unavailable();
        };

        let output = Command::new(&program)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .await;
        let voices = match output {
            Ok(output) if output.status.success() => {
                parse_voices(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!("listing voices exited with {}", output.status);
                vec![]
            }
            Err(err) => {
                warn!("failed to list voices: {err}");
                vec![]
            }
        };
        debug!("found {PROGRAM} with {} voices", voices.len());

        Self {
            program: Some(program),
            voices,
            current: Mutex::new(None),
        }
    }

    /// Creates a synthesizer that reports itself unavailable.
    #[inline]
    pub fn unavailable() -> Self {
        Self {
            program: None,
            voices: vec![],
            current: Mutex::new(None),
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.current.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    #[inline]
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    #[inline]
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn cancel(&self) {
        if let Some(cancel_tx) = self.lock_current().take() {
            cancel_tx.send(()).ok();
        }
    }

    fn speak(&self, utterance: Utterance, events: EventSink<SynthesisEvent>) {
        let Some(program) = &self.program else {
            return;
        };

        let words_per_minute = NORMAL_WORDS_PER_MINUTE * utterance.rate;
        let pitch = NORMAL_PITCH * utterance.pitch;
        let mut command = Command::new(program);
        command
            .arg("-s")
            .arg(format!("{}", words_per_minute.round() as u32))
            .arg("-p")
            .arg(format!("{}", pitch.round() as u32))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(voice) = &utterance.voice {
            command.arg("-v").arg(&voice.lang);
        }
        command.arg("--").arg(&utterance.text);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!("failed to start {PROGRAM}: {err}");
                events.emit(SynthesisEvent::Ended);
                return;
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        if let Some(previous) = self.lock_current().replace(cancel_tx) {
            previous.send(()).ok();
        }
        events.emit(SynthesisEvent::Started);

        tokio::spawn(async move {
            let cancelled = select! {
                status = child.wait() => {
                    if let Err(err) = status {
                        warn!("failed to wait for {PROGRAM}: {err}");
                    }
                    false
                }
                _ = cancel_rx => true,
            };
            if cancelled {
                child.kill().await.ok();
            }
            events.emit(SynthesisEvent::Ended);
        });
    }
}

fn find_program(name: &str) -> Option<PathBuf> {
    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Parses the table printed by `espeak-ng --voices`.
fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let lang = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(Voice::new(name, lang))
        })
        .collect()
}
