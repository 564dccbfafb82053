/// The text the user is composing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    /// Returns the current text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Replaces the current text.
    #[inline]
    pub fn set<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    /// Appends a recognized utterance, separated from existing text by a
    /// single space.
    pub fn append_transcript(&mut self, transcript: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(transcript);
    }

    /// Takes the trimmed text out of the buffer, leaving it empty.
    ///
    /// Returns `None` and leaves the buffer untouched if there is nothing
    /// but whitespace.
    pub fn take_trimmed(&mut self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let trimmed = trimmed.to_owned();
        self.text.clear();
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_transcript() {
        let mut input = InputBuffer::default();
        input.set("theek hai");
        input.append_transcript("kal milte hai");
        assert_eq!(input.as_str(), "theek hai kal milte hai");

        let mut input = InputBuffer::default();
        input.append_transcript("kal milte hai");
        assert_eq!(input.as_str(), "kal milte hai");
    }

    #[test]
    fn test_take_trimmed() {
        let mut input = InputBuffer::default();
        input.set("  \n\t ");
        assert_eq!(input.take_trimmed(), None);
        assert_eq!(input.as_str(), "  \n\t ");

        input.set("  kya haal hai  ");
        assert_eq!(input.take_trimmed().as_deref(), Some("kya haal hai"));
        assert_eq!(input.as_str(), "");
    }
}
