//! Location sources.
//!
//! A location source is the hardware-facing side of tracking: something that
//! emits raw samples at its own pace while tracking is requested active.
//! Platform integrations implement [`LocationSource`]; the crate ships a
//! replay source that drives the recorder from a recorded sample log, which
//! is also what the CLI and tests use.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::RawSample;

/// A trait for sources of raw location samples.
///
/// Implementors provide the actual sample acquisition for a specific
/// platform (GPS hardware, network location, a recorded log).
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    /// The name of this source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Start the source.
    ///
    /// This should begin acquiring samples and sending them through the
    /// provided channel until stopped or the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to start, such as when it is
    /// already running or the underlying device is unavailable.
    async fn start(&mut self, tx: mpsc::Sender<RawSample>) -> Result<()>;

    /// Stop the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to stop cleanly.
    fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently running.
    fn is_running(&self) -> bool;
}

/// A source that replays a recorded list of samples at a fixed interval.
#[derive(Debug)]
pub struct ReplaySource {
    samples: Vec<RawSample>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl ReplaySource {
    /// Create a replay source over the given samples.
    #[must_use]
    pub fn new(samples: Vec<RawSample>, interval: Duration) -> Self {
        Self {
            samples,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load a replay source from a JSON file containing an array of samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>, interval: Duration) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let samples: Vec<RawSample> = serde_json::from_str(&raw)?;
        Ok(Self::new(samples, interval))
    }

    /// Number of samples this source will emit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check whether the source has no samples to emit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[async_trait::async_trait]
impl LocationSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn start(&mut self, tx: mpsc::Sender<RawSample>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::source_start(self.name(), "already running"));
        }

        let samples = self.samples.clone();
        let interval = self.interval;
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            for sample in samples {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(sample).await.is_err() {
                    warn!("replay receiver dropped, stopping early");
                    break;
                }
                tokio::time::sleep(interval).await;
            }
            running.store(false, Ordering::SeqCst);
            debug!("replay source finished");
        });

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
