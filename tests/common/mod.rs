//! Shared test utilities

use std::sync::{Arc, Mutex};

use hopper::voice::{DeviceHandle, OutputDevice, PullStatus, SharedQueue};
use hopper::{Error, Result};

/// Record of device interactions, plus the queue handed to `open`
#[derive(Default)]
pub struct DeviceLog {
    pub opens: usize,
    pub starts: usize,
    pub pauses: usize,
    pub closes: usize,
    pub sample_rate: u32,
    pub queue: Option<Arc<SharedQueue>>,
    pub fail_start: bool,
}

/// Fake output device for driving the playback engine without hardware
#[derive(Clone, Default)]
pub struct FakeOutput {
    pub log: Arc<Mutex<DeviceLog>>,
}

impl FakeOutput {
    /// Queue registered by the last `open`
    pub fn queue(&self) -> Arc<SharedQueue> {
        self.log
            .lock()
            .unwrap()
            .queue
            .clone()
            .expect("device was never opened")
    }

    /// Pull `frames` mono frames the way the device callback would
    pub fn pull(&self, frames: usize) -> (Vec<f32>, PullStatus) {
        let mut out = vec![0.0; frames];
        let status = self.queue().fill(&mut out, 1);
        (out, status)
    }

    /// Make the next `start` call fail
    pub fn fail_next_start(&self) {
        self.log.lock().unwrap().fail_start = true;
    }

    pub fn opens(&self) -> usize {
        self.log.lock().unwrap().opens
    }

    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts
    }

    pub fn pauses(&self) -> usize {
        self.log.lock().unwrap().pauses
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

impl OutputDevice for FakeOutput {
    fn open(&self, sample_rate: u32, queue: Arc<SharedQueue>) -> Result<Box<dyn DeviceHandle>> {
        let mut log = self.log.lock().unwrap();
        log.opens += 1;
        log.sample_rate = sample_rate;
        log.queue = Some(queue);
        Ok(Box::new(FakeHandle {
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeHandle {
    log: Arc<Mutex<DeviceLog>>,
}

impl DeviceHandle for FakeHandle {
    fn start(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.fail_start {
            log.fail_start = false;
            return Err(Error::Audio("device refused to start".to_string()));
        }
        log.starts += 1;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.log.lock().unwrap().pauses += 1;
        Ok(())
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.log.lock().unwrap().closes += 1;
    }
}
