use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;

use dna_ai_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse,
};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let Some(ModelMessage::System(_)) = req.messages.first() else {
                break 'blk Err(FakeModelProviderError(ErrorKind::Rejected));
            };
            let Some(input) = req.last_user_input() else {
                break 'blk Err(FakeModelProviderError(ErrorKind::Other));
            };
            Ok(ModelResponse::with_content(format!(" You said {input} ")))
        };
        ready(result)
    }
}

#[tokio::test]
async fn test_completion() {
    let provider = FakeModelProvider;
    let req = ModelRequest::single_turn("Be brief.", "Good morning");
    let resp = provider.send_request(&req).await.unwrap();
    assert_eq!(resp.first_text(), Some("You said Good morning"));
}

#[tokio::test]
async fn test_error() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![ModelMessage::User("Hi".to_owned())],
    };
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);

    let req = ModelRequest {
        messages: vec![ModelMessage::System("Be brief.".to_owned())],
    };
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}
