//! Text-to-speech (TTS) processing

use crate::voice::clip::{self, Clip};
use crate::{Error, Result};

/// Synthesizes speech from text via an OpenAI-compatible endpoint.
///
/// The endpoint is asked for WAV output, which decodes straight into the
/// samples-plus-rate form the playback engine consumes.
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    model: String,
    voice: String,
    speed: f64,
    api_key: Option<String>,
}

impl TextToSpeech {
    /// Create a new TTS client against `base_url`
    #[must_use]
    pub fn new(
        base_url: &str,
        model: String,
        voice: String,
        speed: f64,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            voice,
            speed,
            api_key,
        }
    }

    /// Synthesize text into mono samples plus their sample rate
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails or the response is not decodable WAV
    pub async fn synthesize(&self, text: &str) -> Result<Clip> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
            response_format: &'a str,
        }

        let request_body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "wav",
        };

        let mut request = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        let decoded = clip::decode_wav(&audio)?;
        tracing::debug!(
            samples = decoded.samples.len(),
            sample_rate = decoded.sample_rate,
            "speech synthesized"
        );
        Ok(decoded)
    }
}
