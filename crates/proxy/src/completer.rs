use std::pin::Pin;
use std::sync::Arc;

use dna_ai_model::{ModelProvider, ModelProviderError, ModelRequest};
use tracing::Instrument;

type CompleteResult = Result<Option<String>, Box<dyn ModelProviderError>>;
type BoxedCompleteFuture = Pin<Box<dyn Future<Output = CompleteResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedCompleteFuture + Send + Sync>;

/// A wrapper around a model provider that gives the request handlers a
/// type-erased `complete(system_prompt, user_text)` capability.
#[derive(Clone)]
pub struct Completer {
    handler_fn: HandlerFn,
}

impl Completer {
    /// Creates a completer backed by `provider`.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since the router state doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn =
            Arc::new(move |req: ModelRequest| -> BoxedCompleteFuture {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        match fut.await {
                            Ok(resp) => {
                                trace!("got a response: {:?}", resp);
                                Ok(resp.first_text().map(ToOwned::to_owned))
                            }
                            Err(err) => {
                                error!("got an error: {err:?}");
                                Err(Box::new(err) as Box<dyn ModelProviderError>)
                            }
                        }
                    }
                    .instrument(trace_span!("completer req")),
                )
            });
        Self { handler_fn }
    }

    /// Asks the upstream for one completion of `user_text` under
    /// `system_prompt`.
    ///
    /// Returns the trimmed text of the first choice, or `None` if the
    /// upstream answered without any usable text.
    #[inline]
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Option<String>, Box<dyn ModelProviderError>> {
        let req = ModelRequest::single_turn(system_prompt, user_text);
        (self.handler_fn)(req).await
    }
}
