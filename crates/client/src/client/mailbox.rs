use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};

use super::state::ClientState;
use super::{ClientClosed, Snapshot};
use crate::message::MessageId;
use crate::speech::{RecognitionEvent, SynthesisEvent};
use crate::transport::{ProxyReply, TransportError};

#[derive(Debug)]
pub enum Command {
    SetInput(String),
    Submit,
    ToggleListening,
    SetVoiceOutput(bool),
    Replay(MessageId),
    Snapshot(oneshot::Sender<Snapshot>),
    TurnFinished(Result<ProxyReply, TransportError>),
    Recognition(RecognitionEvent),
    Synthesis {
        utterance: u64,
        event: SynthesisEvent,
    },
}

pub struct MailboxParts {
    pub mailbox: Mailbox,
    pub cmd_rx: mpsc::UnboundedReceiver<Command>,
    pub kill_rx: watch::Receiver<bool>,
}

pub struct Mailbox {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: watch::Sender<bool>,
}

impl Mailbox {
    #[inline]
    pub fn new() -> MailboxParts {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { cmd_tx, kill_tx },
            cmd_rx,
            kill_rx,
        }
    }

    #[inline]
    pub fn send(&self, cmd: Command) -> Result<(), ClientClosed> {
        self.cmd_tx.send(cmd).map_err(|_| ClientClosed)
    }

    #[inline]
    pub fn try_kill(&self) {
        self.kill_tx.send(true).ok();
    }
}

/// Runs the event loop until killed or until every handle is dropped.
///
/// Background work (requests, speech engines) only holds weak references
/// to the mailbox, so it never keeps the loop alive.
pub async fn run_client(
    mut state: ClientState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    state.announce_transcript();
    loop {
        let cmd = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                cmd
            }
        };
        trace!("received command: {cmd:?}");

        let proc_span = trace_span!("proc cmd");
        proc_span.in_scope(|| {
            state.handle(cmd);
            trace!("finished");
        });
    }
    state.release_speech();
    debug!("will terminate");
}
