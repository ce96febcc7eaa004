use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hopper::config::InputMode;
use hopper::voice::{AudioStream, TextToSpeech};
use hopper::{Config, Daemon};

/// Hopper - voice assistant demo
#[derive(Parser)]
#[command(name = "hopper", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "HOPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Read WAV utterance paths from stdin instead of transcript text
    #[arg(long)]
    wav_input: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test speaker output with a sine tone
    TestSpeaker,
    /// Synthesize text and play it once
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hopper=info",
        1 => "info,hopper=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.wav_input {
        config.input_mode = InputMode::Wav;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestSpeaker => test_speaker().await,
            Command::Say { text } => say(&config, &text).await,
        };
    }

    tracing::debug!(?config, "loaded configuration");
    tracing::info!(wake_words = ?config.wake_words, "starting hopper");

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());

    let mut stream = AudioStream::new();
    stream.play(&samples, sample_rate)?;
    wait_for_playback(&stream, Duration::from_secs(3)).await;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Synthesize one utterance and play it
#[allow(clippy::future_not_send)]
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Synthesizing \"{text}\"...");

    let tts = TextToSpeech::new(
        &config.tts.url,
        config.tts.model.clone(),
        config.tts.voice.clone(),
        config.tts.speed,
        config.tts.api_key.clone(),
    );

    let decoded = tts.synthesize(text).await?;
    println!(
        "Playing {} samples at {} Hz...",
        decoded.samples.len(),
        decoded.sample_rate
    );

    let mut stream = AudioStream::new();
    stream.play(&decoded.samples, decoded.sample_rate)?;

    let duration_ms =
        (decoded.samples.len() as u64 * 1000) / u64::from(decoded.sample_rate.max(1)) + 500;
    wait_for_playback(&stream, Duration::from_millis(duration_ms)).await;

    Ok(())
}

/// Poll until the stream drains or the timeout passes
async fn wait_for_playback(stream: &AudioStream, timeout: Duration) {
    let start = std::time::Instant::now();
    while stream.is_playing() && start.elapsed() < timeout {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
