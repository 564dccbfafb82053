//! Character-by-character reveal of assistant text.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Delay between two revealed characters.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(18);

/// Reveals a text one character per tick.
///
/// The ticking task is tied to the text: it is aborted when the text
/// changes and when the reveal is dropped.
pub struct TypingReveal {
    interval: Duration,
    text: String,
    shown_tx: Arc<watch::Sender<String>>,
    task: Option<JoinHandle<()>>,
}

impl TypingReveal {
    /// Creates an empty reveal ticking at `interval`.
    pub fn new(interval: Duration) -> Self {
        let (shown_tx, _) = watch::channel(String::new());
        Self {
            interval,
            text: String::new(),
            shown_tx: Arc::new(shown_tx),
            task: None,
        }
    }

    /// Starts revealing `text` from the beginning.
    ///
    /// Setting the text that is already being revealed changes nothing.
    /// Must be called within a Tokio runtime.
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.stop();
        self.text = text;
        self.shown_tx.send_replace(String::new());
        if self.text.is_empty() {
            return;
        }

        let text = self.text.clone();
        let shown_tx = Arc::clone(&self.shown_tx);
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            for (idx, ch) in text.char_indices() {
                ticker.tick().await;
                shown_tx.send_replace(text[..idx + ch.len_utf8()].to_owned());
            }
        }));
    }

    /// Returns the full text being revealed.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the part revealed so far.
    #[inline]
    pub fn shown(&self) -> String {
        self.shown_tx.borrow().clone()
    }

    /// Returns whether the whole text is visible.
    #[inline]
    pub fn is_complete(&self) -> bool {
        *self.shown_tx.borrow() == self.text
    }

    /// Subscribes to the revealed prefix.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.shown_tx.subscribe()
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for TypingReveal {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL)
    }
}

impl Drop for TypingReveal {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reveals_one_char_per_tick() {
        let mut reveal = TypingReveal::default();
        reveal.set_text("नमस्ते");
        assert_eq!(reveal.shown(), "");

        sleep(Duration::from_millis(37)).await;
        assert_eq!(reveal.shown(), "नम");
        assert!(!reveal.is_complete());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(reveal.shown(), "नमस्ते");
        assert!(reveal.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarts_on_new_text() {
        let mut reveal = TypingReveal::default();
        reveal.set_text("abc");
        sleep(Duration::from_millis(20)).await;
        assert_eq!(reveal.shown(), "a");

        reveal.set_text("xyz");
        assert_eq!(reveal.shown(), "");
        sleep(Duration::from_millis(20)).await;
        assert_eq!(reveal.shown(), "x");

        // Same text again keeps the progress.
        reveal.set_text("xyz");
        assert_eq!(reveal.shown(), "x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_dies_with_reveal() {
        let mut reveal = TypingReveal::default();
        reveal.set_text("a long reply");
        let mut shown_rx = reveal.subscribe();
        sleep(Duration::from_millis(20)).await;
        shown_rx.borrow_and_update();

        drop(reveal);
        sleep(Duration::from_millis(500)).await;
        assert!(shown_rx.changed().await.is_err());
    }
}
