use dna_ai_model::{ModelChoice, ModelMessage, ModelRequest, ModelResponse};
use serde::{Deserialize, Serialize};

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        temperature: config.temperature,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
    }
}

pub fn into_model_response(completion: ChatCompletion) -> ModelResponse {
    ModelResponse {
        id: completion.id,
        choices: completion
            .choices
            .into_iter()
            .map(|choice| ModelChoice {
                content: choice.message.and_then(|m| m.content),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest::single_turn(
            "You are a helpful assistant.",
            "kya haal hai bro",
        );
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_temperature(0.5)
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "You are a helpful assistant.".to_owned(),
                },
                Message::User {
                    content: "kya haal hai bro".to_owned(),
                },
            ],
            temperature: 0.5,
        };
        let created = create_request(&request, &config);
        assert_eq!(created, expected);

        let wire = serde_json::to_value(&created).unwrap();
        assert_eq!(
            wire,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "kya haal hai bro" }
                ],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_into_model_response() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": "  Hello  " },
                    "finish_reason": "stop"
                }
            ],
            "usage": { "prompt_tokens": 9, "completion_tokens": 2 }
        }))
        .unwrap();
        let resp = into_model_response(completion);
        assert_eq!(resp.id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.first_text(), Some("Hello"));
    }

    #[test]
    fn test_missing_choices() {
        let completion: ChatCompletion =
            serde_json::from_value(json!({ "id": "chatcmpl-2" })).unwrap();
        let resp = into_model_response(completion);
        assert!(resp.choices.is_empty());
        assert_eq!(resp.first_text(), None);
    }
}
