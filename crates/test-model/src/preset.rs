use dna_ai_model::ModelResponse;
use serde::{Deserialize, Serialize};

/// How a scripted failure presents itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The service answered with a non-success status.
    Rejected,
    /// The service was rate limited.
    RateLimited,
    /// The service could not be reached.
    Unreachable,
    /// The service answered with a payload that cannot be understood.
    Malformed,
}

/// The preset outcome for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetReply {
    /// The request succeeds with this response.
    Completion(ModelResponse),
    /// The request fails. The body is what the service would have sent
    /// back, and is carried in the error message.
    Failure {
        /// The failure mode.
        failure: PresetFailure,
        /// The raw upstream body.
        body: String,
    },
}

impl PresetReply {
    /// Creates a successful reply with a single choice holding `content`.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        PresetReply::Completion(ModelResponse::with_content(content))
    }

    /// Creates a failing reply.
    #[inline]
    pub fn with_failure<S: Into<String>>(failure: PresetFailure, body: S) -> Self {
        PresetReply::Failure {
            failure,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let PresetReply::Completion(resp) = PresetReply::with_content("  hi ")
        else {
            unreachable!("expected a completion");
        };
        assert_eq!(resp.first_text(), Some("hi"));

        assert_eq!(
            PresetReply::with_failure(PresetFailure::Rejected, "bad key"),
            PresetReply::Failure {
                failure: PresetFailure::Rejected,
                body: "bad key".to_owned(),
            }
        );
    }
}
