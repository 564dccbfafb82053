//! The fixed instructions attached to every upstream request.

const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Sent back when the upstream answers without any usable text.
pub const FALLBACK_REPLY: &str = "Kuch galat ho gaya, phir se try karo 🙂";

/// Returns the persona and language-mirroring policy.
#[inline]
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT.trim()
}
