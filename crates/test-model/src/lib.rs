//! A local fake upstream for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dna_ai_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    /// Returns the error message, which carries the scripted raw body.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Script {
    replies: Vec<PresetReply>,
    requests: Vec<ModelRequest>,
}

/// A local fake upstream for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// upstream should answer each request. The `n`-th request receives the
/// `n`-th reply. If there are no enough replies in the script, a rejection
/// is returned.
///
/// Clones share the same script and the same request log, so a test can
/// keep one clone to inspect what the code under test sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_reply(&mut self, preset: PresetReply) {
        self.lock().replies.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests the provider has received.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns a copy of every request received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A panicking test thread may poison the lock, the script is still
        // usable for the remaining assertions.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let reply = {
            let mut script = self.lock();
            let step_idx = script.requests.len();
            script.requests.push(req.clone());
            script.replies.get(step_idx).cloned()
        };
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            match reply {
                Some(PresetReply::Completion(resp)) => Ok(resp),
                Some(PresetReply::Failure { failure, body }) => {
                    let kind = match failure {
                        PresetFailure::Rejected => ErrorKind::Rejected,
                        PresetFailure::RateLimited => {
                            ErrorKind::RateLimitExceeded
                        }
                        PresetFailure::Unreachable => ErrorKind::Transport,
                        PresetFailure::Malformed => ErrorKind::InvalidResponse,
                    };
                    Err(Error {
                        message: body,
                        kind,
                    })
                }
                None => Err(Error {
                    message: "no enough steps".to_owned(),
                    kind: ErrorKind::Rejected,
                }),
            }
        }
    }
}
