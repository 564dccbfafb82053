/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, in conversation order.
    pub messages: Vec<ModelMessage>,
}

impl ModelRequest {
    /// Creates a request with the system instructions followed by a single
    /// user input.
    #[inline]
    pub fn single_turn<S1: Into<String>, S2: Into<String>>(
        system: S1,
        user: S2,
    ) -> Self {
        Self {
            messages: vec![
                ModelMessage::System(system.into()),
                ModelMessage::User(user.into()),
            ],
        }
    }

    /// Returns the last user input of this request, if any.
    pub fn last_user_input(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn() {
        let req = ModelRequest::single_turn("Be brief.", "kya haal hai");
        assert_eq!(
            req.messages,
            vec![
                ModelMessage::System("Be brief.".to_owned()),
                ModelMessage::User("kya haal hai".to_owned()),
            ]
        );
        assert_eq!(req.last_user_input(), Some("kya haal hai"));
    }

    #[test]
    fn test_last_user_input_missing() {
        let req = ModelRequest {
            messages: vec![ModelMessage::System("Be brief.".to_owned())],
        };
        assert_eq!(req.last_user_input(), None);
    }
}
