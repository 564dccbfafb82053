use serde::{Deserialize, Serialize};

/// A complete response from the model provider.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ModelResponse {
    /// The identifier the service assigned to this completion.
    pub id: Option<String>,
    /// The sampled choices, in the order the service returned them.
    pub choices: Vec<ModelChoice>,
}

impl ModelResponse {
    /// Creates a response with a single choice holding `content`.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            id: None,
            choices: vec![ModelChoice {
                content: Some(content.into()),
            }],
        }
    }

    /// Returns the trimmed text of the first choice.
    ///
    /// Returns `None` when there are no choices, the first choice has no
    /// content, or the content is blank.
    pub fn first_text(&self) -> Option<&str> {
        let text = self.choices.first()?.content.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(text)
    }
}

/// One sampled completion.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ModelChoice {
    /// The generated text.
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_is_trimmed() {
        let resp = ModelResponse::with_content("  Hello  ");
        assert_eq!(resp.first_text(), Some("Hello"));
    }

    #[test]
    fn test_first_text_unusable() {
        assert_eq!(ModelResponse::default().first_text(), None);
        assert_eq!(ModelResponse::with_content(" \n ").first_text(), None);

        let resp = ModelResponse {
            id: Some("cmpl-1".to_owned()),
            choices: vec![
                ModelChoice::default(),
                ModelChoice {
                    content: Some("second".to_owned()),
                },
            ],
        };
        assert_eq!(resp.first_text(), None);
    }
}
