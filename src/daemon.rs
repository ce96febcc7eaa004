//! Daemon - the assistant's dispatch loop
//!
//! Reads utterances, applies keyword matching, and drives the wake word
//! detector, LLM, TTS, and the playback engine

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::agent::{ChatClient, ChatMessage};
use crate::config::{Config, InputMode};
use crate::voice::{AudioStream, SpeechToText, TextToSpeech, WakeWordDetector, clip};
use crate::Result;

/// Cap on retained chat turns, excluding the system prompt
const MAX_HISTORY: usize = 20;

/// Spoken when the wake word arrives with no command attached
const GREETING: &str = "Yes?";

/// What a transcript asks the assistant to do
#[derive(Debug, Clone, PartialEq, Eq)]
enum Dispatch {
    /// Abusive phrase, answered with the rebuke clip
    Rebuke,
    /// Shut the assistant down
    Shutdown,
    /// Halt playback and release the output device
    Stop,
    /// Pause playback
    Pause,
    /// Resume paused playback
    Resume,
    /// Write the remaining audio to disk
    Save,
    /// Wake word alone, no command
    Greet,
    /// Wake word plus a command for the LLM
    Query(String),
    /// No wake word, no keyword
    Ignored,
}

/// Whether the dispatch loop keeps going
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// Map a transcript onto an assistant action via substring matching
fn classify(transcript: &str, detector: &WakeWordDetector) -> Dispatch {
    let lower = transcript.to_lowercase();

    if lower.contains("kill yourself") || lower.contains("kill your self") {
        return Dispatch::Rebuke;
    }
    if lower.contains("shutdown now") || lower.contains("shut down now") {
        return Dispatch::Shutdown;
    }
    if lower.contains("pause") {
        return Dispatch::Pause;
    }
    if lower.contains("resume") {
        return Dispatch::Resume;
    }
    if lower.contains("stop") {
        return Dispatch::Stop;
    }
    if lower.contains("save") {
        return Dispatch::Save;
    }

    match detector.extract_command(transcript) {
        Some(command) if command.is_empty() => Dispatch::Greet,
        Some(command) => Dispatch::Query(command),
        None => Dispatch::Ignored,
    }
}

/// Drop the oldest turns once the history exceeds the cap
fn trim_history(history: &mut Vec<ChatMessage>) {
    while history.len() > MAX_HISTORY + 1 {
        history.remove(1);
    }
}

/// Turn one input line into a transcript, transcribing WAV files in wav mode
async fn transcript_for(line: &str, stt: Option<&SpeechToText>) -> Result<Option<String>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    match stt {
        None => Ok(Some(line.to_string())),
        Some(stt) => {
            let audio = tokio::fs::read(line).await?;
            Ok(Some(stt.transcribe(&audio).await?))
        }
    }
}

/// Decode a clip file and play it, logging failures rather than bailing
fn play_clip(stream: &mut AudioStream, path: &Path) {
    match clip::load(path) {
        Ok(decoded) => {
            if let Err(e) = stream.play(&decoded.samples, decoded.sample_rate) {
                tracing::error!(error = %e, path = %path.display(), "clip playback failed");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to load clip");
        }
    }
}

/// The assistant daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the dispatch loop until the shutdown command, Ctrl-C, or end of
    /// input.
    ///
    /// cpal output streams are not `Send`, so this runs on the thread that
    /// calls it rather than inside `tokio::spawn`.
    ///
    /// # Errors
    ///
    /// Returns error if a collaborator client cannot be constructed or stdin
    /// fails
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        let detector = WakeWordDetector::new(self.config.wake_words.clone())?;
        let chat = ChatClient::new(&self.config.llm.url, self.config.llm.model.clone());
        let tts = TextToSpeech::new(
            &self.config.tts.url,
            self.config.tts.model.clone(),
            self.config.tts.voice.clone(),
            self.config.tts.speed,
            self.config.tts.api_key.clone(),
        );
        let stt = match self.config.input_mode {
            InputMode::Wav => Some(SpeechToText::new(
                &self.config.stt.url,
                self.config.stt.model.clone(),
                self.config.stt.api_key.clone(),
            )),
            InputMode::Text => None,
        };

        let mut stream = AudioStream::new();
        let mut history = vec![ChatMessage::system(&self.config.llm.system_prompt)];

        if let Some(path) = &self.config.clips.startup {
            play_clip(&mut stream, path);
        }

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        tracing::info!(wake_words = ?detector.wake_words(), "listening, say a wake word to start");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("end of input");
                        break;
                    };
                    let transcript = match transcript_for(&line, stt.as_ref()).await {
                        Ok(Some(t)) => t,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::error!(error = %e, "transcription failed");
                            continue;
                        }
                    };
                    let flow = self
                        .handle_transcript(&transcript, &detector, &chat, &tts, &mut stream, &mut history)
                        .await;
                    if flow == Flow::Shutdown {
                        break;
                    }
                }
            }
        }

        stream.stop();
        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Dispatch one transcript
    #[allow(clippy::future_not_send)]
    async fn handle_transcript(
        &self,
        transcript: &str,
        detector: &WakeWordDetector,
        chat: &ChatClient,
        tts: &TextToSpeech,
        stream: &mut AudioStream,
        history: &mut Vec<ChatMessage>,
    ) -> Flow {
        tracing::info!(transcript, "transcript received");

        match classify(transcript, detector) {
            Dispatch::Rebuke => {
                if let Some(path) = &self.config.clips.rebuke {
                    play_clip(stream, path);
                } else {
                    tracing::warn!("no rebuke clip configured");
                }
            }
            Dispatch::Shutdown => {
                tracing::info!("shutdown command received");
                return Flow::Shutdown;
            }
            Dispatch::Pause => stream.pause(),
            Dispatch::Resume => {
                if let Err(e) = stream.resume() {
                    tracing::error!(error = %e, "resume failed");
                }
            }
            Dispatch::Stop => stream.stop(),
            Dispatch::Save => {
                if let Err(e) = stream.save(&self.config.save_path) {
                    tracing::error!(error = %e, "save failed");
                }
            }
            Dispatch::Greet => {
                self.speak(tts, stream, GREETING).await;
            }
            Dispatch::Query(command) => {
                self.answer(&command, chat, tts, stream, history).await;
            }
            Dispatch::Ignored => {
                tracing::debug!("no wake word or keyword, ignoring");
            }
        }

        Flow::Continue
    }

    /// Run a command through the LLM and speak the reply
    #[allow(clippy::future_not_send)]
    async fn answer(
        &self,
        command: &str,
        chat: &ChatClient,
        tts: &TextToSpeech,
        stream: &mut AudioStream,
        history: &mut Vec<ChatMessage>,
    ) {
        tracing::info!(command, "processing voice command");

        history.push(ChatMessage::user(command));
        trim_history(history);

        match chat.chat(history).await {
            Ok(reply) => {
                history.push(ChatMessage::assistant(&reply));
                self.speak(tts, stream, &reply).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "chat completion failed");
                // Drop the unanswered turn so the history stays consistent
                history.pop();
                self.speak(tts, stream, "Sorry, I ran into an error answering that.")
                    .await;
            }
        }
    }

    /// Synthesize text and hand it to the playback engine
    #[allow(clippy::future_not_send)]
    async fn speak(&self, tts: &TextToSpeech, stream: &mut AudioStream, text: &str) {
        match tts.synthesize(text).await {
            Ok(decoded) => {
                if let Err(e) = stream.play(&decoded.samples, decoded.sample_rate) {
                    tracing::error!(error = %e, "playback failed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "speech synthesis failed");
            }
        }
    }
}
