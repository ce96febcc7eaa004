//! Wake word detection
//!
//! Matches wake words in transcribed text and extracts the command that
//! follows. The transcripts arrive already finished, so detection is plain
//! substring matching over the lowercased text.

use crate::{Error, Result};

/// Detects wake words in transcripts
pub struct WakeWordDetector {
    wake_words: Vec<String>,
}

impl WakeWordDetector {
    /// Create a new wake word detector
    ///
    /// # Arguments
    ///
    /// * `wake_words` - Wake words to detect (e.g., "grasshopper")
    ///
    /// # Errors
    ///
    /// Returns error if no non-empty wake word is given
    pub fn new(wake_words: Vec<String>) -> Result<Self> {
        let normalized: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.to_lowercase().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(Error::Config("at least one wake word required".to_string()));
        }

        tracing::debug!(wake_words = ?normalized, "wake word detector initialized");

        Ok(Self {
            wake_words: normalized,
        })
    }

    /// Check whether the transcript contains a wake word
    #[must_use]
    pub fn check(&self, transcript: &str) -> bool {
        let normalized = transcript.to_lowercase();
        self.wake_words
            .iter()
            .any(|w| normalized.contains(w.as_str()))
    }

    /// Extract the command following the first wake word occurrence.
    ///
    /// Returns `None` when no wake word is present. The command may be empty
    /// when the transcript ends at the wake word.
    #[must_use]
    pub fn extract_command(&self, transcript: &str) -> Option<String> {
        let lower = transcript.to_lowercase();
        let (pos, word) = self
            .wake_words
            .iter()
            .filter_map(|w| lower.find(w.as_str()).map(|pos| (pos, w)))
            .min_by_key(|&(pos, _)| pos)?;

        tracing::info!(wake_word = %word, transcript, "wake word detected");

        Some(
            transcript[pos + word.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                .to_string(),
        )
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}
