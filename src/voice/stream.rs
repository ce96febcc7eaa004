//! Streamed audio playback
//!
//! The playback engine owns a queue of not-yet-played PCM samples and a
//! play/pause/resume/stop state machine. A hardware output device pulls
//! fixed-size chunks from the queue on its own real-time thread while the
//! control thread drives the state machine and can snapshot the remaining
//! audio to disk at any point.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Playback lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No playback session started yet
    Idle,
    /// The output device is pulling samples
    Playing,
    /// Halted mid-stream, resumable
    Paused,
    /// Session over; the instance is reusable via `play`
    Stopped,
}

/// Outcome of one chunk pull, consumed by the device abstraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    /// Samples were emitted; keep pulling
    Filled,
    /// Silence was emitted; no more data, halt further pulls
    Drained,
}

/// Sample queue shared between the control thread and the device callback.
///
/// The lock is held only across the buffer-slice operation; device start and
/// stop calls never happen under it.
pub struct SharedQueue {
    inner: Mutex<QueueInner>,
}

struct QueueInner {
    samples: Vec<f32>,
    /// Front of the remaining audio; everything before it has been emitted
    cursor: usize,
    state: PlaybackState,
}

impl QueueInner {
    fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }
}

impl SharedQueue {
    /// Create an empty queue in the `Idle` state
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                samples: Vec::new(),
                cursor: 0,
                state: PlaybackState::Idle,
            }),
        }
    }

    /// Fill `out` with the next chunk of interleaved output frames.
    ///
    /// Emits `min(requested, remaining)` samples from the front of the queue,
    /// duplicating each mono sample across `channels`, and zero-pads any
    /// shortfall. When the queue is not playing or has run dry the whole
    /// buffer is silence and the caller is told to halt; exhaustion observed
    /// here ends the session.
    ///
    /// Runs on the device's real-time thread: no allocation, no I/O. A
    /// poisoned lock degrades to silence rather than unwinding across the
    /// device boundary.
    pub fn fill(&self, out: &mut [f32], channels: usize) -> PullStatus {
        let channels = channels.max(1);
        let Ok(mut inner) = self.inner.lock() else {
            out.fill(0.0);
            return PullStatus::Drained;
        };

        if inner.state != PlaybackState::Playing || inner.remaining() == 0 {
            if inner.state == PlaybackState::Playing {
                inner.state = PlaybackState::Stopped;
            }
            out.fill(0.0);
            return PullStatus::Drained;
        }

        let frames = out.len() / channels;
        let take = frames.min(inner.remaining());
        let start = inner.cursor;
        for (frame, &sample) in out
            .chunks_mut(channels)
            .zip(&inner.samples[start..start + take])
        {
            frame.fill(sample);
        }
        inner.cursor += take;
        out[take * channels..].fill(0.0);
        PullStatus::Filled
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    /// Number of samples not yet emitted
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().remaining()
    }

    /// Replace the queue contents and enter `Playing`
    fn begin(&self, samples: Vec<f32>) {
        let mut inner = self.lock();
        inner.samples = samples;
        inner.cursor = 0;
        inner.state = PlaybackState::Playing;
    }

    /// Snapshot the remaining samples and flip to `Paused`.
    ///
    /// Both happen in one critical section with the callback's read-and-trim,
    /// so no chunk can land between the state flip and the snapshot. Returns
    /// `None` unless currently playing.
    fn pause_snapshot(&self) -> Option<Vec<f32>> {
        let mut inner = self.lock();
        if inner.state != PlaybackState::Playing {
            return None;
        }
        let remainder = inner.samples[inner.cursor..].to_vec();
        inner.state = PlaybackState::Paused;
        Some(remainder)
    }

    /// Flip to `Stopped`, leaving the remaining samples in place
    fn halt(&self) {
        self.lock().state = PlaybackState::Stopped;
    }

    /// Clone of the remaining samples
    fn snapshot_remaining(&self) -> Vec<f32> {
        let inner = self.lock();
        inner.samples[inner.cursor..].to_vec()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Hardware/OS audio output abstraction.
///
/// `open` registers a shared sample queue with the device; the device then
/// pulls chunks from it on its own execution context via [`SharedQueue::fill`].
pub trait OutputDevice {
    /// Open an output handle at `sample_rate` Hz for a mono source
    ///
    /// # Errors
    ///
    /// Returns error if no device is available or the device rejects the
    /// configuration
    fn open(&self, sample_rate: u32, queue: Arc<SharedQueue>) -> Result<Box<dyn DeviceHandle>>;
}

/// An open output handle. Dropping the handle closes the device.
pub trait DeviceHandle {
    /// Start or restart data flow. Blocks until the device acknowledges.
    ///
    /// # Errors
    ///
    /// Returns error if the device refuses to start
    fn start(&mut self) -> Result<()>;

    /// Halt data flow, keeping the handle valid for a later `start`
    ///
    /// # Errors
    ///
    /// Returns error if the device refuses to pause
    fn pause(&mut self) -> Result<()>;
}

/// Output device backed by the default system audio host
pub struct SystemOutput;

impl OutputDevice for SystemOutput {
    fn open(&self, sample_rate: u32, queue: Arc<SharedQueue>) -> Result<Box<dyn DeviceHandle>> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .or_else(|| {
                // Fallback: stereo, with the mono sample duplicated per frame
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(sample_rate)
                        && c.max_sample_rate() >= SampleRate(sample_rate)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config: StreamConfig = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();
        let channels = config.channels as usize;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "output device opened"
        );

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let _ = queue.fill(data, channels);
                },
                |err| {
                    tracing::error!(error = %err, "audio output error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        Ok(Box::new(SystemHandle { stream }))
    }
}

struct SystemHandle {
    stream: cpal::Stream,
}

impl DeviceHandle for SystemHandle {
    fn start(&mut self) -> Result<()> {
        self.stream.play().map_err(|e| Error::Audio(e.to_string()))
    }

    fn pause(&mut self) -> Result<()> {
        self.stream.pause().map_err(|e| Error::Audio(e.to_string()))
    }
}

/// Streamed audio playback engine.
///
/// One instance drives at most one output device handle at a time. All
/// methods are called from the control thread; the device callback runs
/// concurrently and shares only the sample queue.
pub struct AudioStream {
    device: Box<dyn OutputDevice>,
    queue: Arc<SharedQueue>,
    handle: Option<Box<dyn DeviceHandle>>,
    sample_rate: u32,
    /// Present iff paused at least once since the last full stop
    saved_remainder: Option<Vec<f32>>,
}

impl AudioStream {
    /// Create a stream backed by the default system output
    #[must_use]
    pub fn new() -> Self {
        Self::with_device(Box::new(SystemOutput))
    }

    /// Create a stream backed by a custom output device
    #[must_use]
    pub fn with_device(device: Box<dyn OutputDevice>) -> Self {
        Self {
            device,
            queue: Arc::new(SharedQueue::new()),
            handle: None,
            sample_rate: 0,
            saved_remainder: None,
        }
    }

    /// Start playing a copy of `samples` at `sample_rate` Hz.
    ///
    /// Returns once the device has been told to start; playback itself is
    /// asynchronous, driven by the device's chunk pulls. A call while a
    /// session is in progress is a no-op. The caller's buffer is left intact.
    /// Starting a fresh session discards any stale pause snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if `sample_rate` is zero or the output device cannot be
    /// opened or started; the stream stays in its prior state.
    pub fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        self.release_drained();
        if self.handle.is_some() {
            tracing::info!("audio is already playing");
            return Ok(());
        }
        if sample_rate == 0 {
            return Err(Error::Audio("sample rate must be positive".to_string()));
        }

        let mut handle = self.device.open(sample_rate, Arc::clone(&self.queue))?;
        handle.start()?;

        // The callback emits silence until the queue flips to Playing, so the
        // device may start pulling before the samples land.
        self.queue.begin(samples.to_vec());
        self.sample_rate = sample_rate;
        self.saved_remainder = None;
        self.handle = Some(handle);
        tracing::debug!(samples = samples.len(), sample_rate, "playback started");
        Ok(())
    }

    /// Stop playback and close the output device handle.
    ///
    /// The state flips away from `Playing` before teardown so an in-flight
    /// callback sees it and emits silence. Remaining samples and any pause
    /// snapshot are kept. No-op when nothing is open.
    pub fn stop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            tracing::debug!("stop ignored, nothing playing");
            return;
        };
        self.queue.halt();
        if let Err(e) = handle.pause() {
            tracing::warn!(error = %e, "output device pause failed during stop");
        }
        drop(handle);
        tracing::info!("audio stopped");
    }

    /// Pause playback, snapshotting the remaining audio for `resume`.
    ///
    /// The snapshot and the state flip share one critical section with the
    /// device callback, so no chunk can be consumed between them. No-op
    /// unless currently playing.
    pub fn pause(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            tracing::debug!("pause ignored, nothing playing");
            return;
        };
        let Some(remainder) = self.queue.pause_snapshot() else {
            tracing::debug!("pause ignored, not playing");
            return;
        };
        tracing::info!(remaining = remainder.len(), "audio paused");
        self.saved_remainder = Some(remainder);
        if let Err(e) = handle.pause() {
            tracing::warn!(error = %e, "output device pause failed");
        }
    }

    /// Resume a paused session from the saved snapshot.
    ///
    /// The snapshot is consumed; a second resume without another pause is a
    /// no-op. Blocks until the device acknowledges the restart.
    ///
    /// # Errors
    ///
    /// Returns error if the device refuses to restart; the stream rolls back
    /// to `Paused` with the snapshot re-saved.
    pub fn resume(&mut self) -> Result<()> {
        if self.queue.state() != PlaybackState::Paused {
            tracing::debug!("resume ignored, not paused");
            return Ok(());
        }
        let Some(handle) = self.handle.as_mut() else {
            tracing::debug!("resume ignored, no open device handle");
            return Ok(());
        };
        let Some(remainder) = self.saved_remainder.take() else {
            tracing::debug!("resume ignored, no saved audio");
            return Ok(());
        };

        let restored = remainder.len();
        self.queue.begin(remainder);
        if let Err(e) = handle.start() {
            // Re-save the snapshot for another attempt
            self.saved_remainder = self.queue.pause_snapshot();
            return Err(e);
        }
        tracing::info!(remaining = restored, "audio resumed");
        Ok(())
    }

    /// Write the remaining samples to `path` as a mono 32-bit float WAV.
    ///
    /// Works in any state and mutates nothing; an existing file at `path` is
    /// overwritten. An empty buffer is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let samples = self.queue.snapshot_remaining();
        if samples.is_empty() {
            tracing::info!("no samples available to save");
            return Ok(());
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| Error::Audio(e.to_string()))?;
        for &sample in &samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }
        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;

        tracing::info!(path = %path.display(), samples = samples.len(), "audio saved");
        Ok(())
    }

    /// Current state of the playback state machine
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.queue.state()
    }

    /// True while the device is consuming samples
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.queue.state() == PlaybackState::Playing
    }

    /// Number of samples not yet played out
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.remaining()
    }

    /// Sample rate of the current session, Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drop a device handle left open after the queue ran dry
    fn release_drained(&mut self) {
        if self.handle.is_some() && self.queue.state() == PlaybackState::Stopped {
            self.handle = None;
            tracing::debug!("drained output handle released");
        }
    }
}

impl Default for AudioStream {
    fn default() -> Self {
        Self::new()
    }
}
