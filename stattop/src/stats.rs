//! Per-container stats tracker: a decode task feeding a lock-protected snapshot, watched by a
//! timer that blanks the volatile fields when the stream goes quiet.

use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::cpu::calculate_cpu_percent;
use crate::error::{RenderError, StreamError};
use crate::source::{StatsSource, StatsStream};
use crate::types::Sample;
use crate::ui::util::human;

pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(2);

/// Latest known state of one container. Every field comes from the same decoded frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub cpu_percentage: f64,
    pub memory: f64,
    pub memory_limit: f64,
    pub memory_percentage: f64,
    pub network_rx: f64,
    pub network_tx: f64,
    /// Set once when the stream ends; never cleared.
    pub error: Option<StreamError>,
}

pub struct ContainerStats {
    name: String,
    watchdog: Duration,
    snapshot: RwLock<Snapshot>,
}

impl ContainerStats {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_watchdog(name, DEFAULT_WATCHDOG)
    }

    /// A zero `watchdog` means [`DEFAULT_WATCHDOG`].
    pub fn with_watchdog(name: impl Into<String>, watchdog: Duration) -> Self {
        Self {
            name: name.into(),
            watchdog: if watchdog.is_zero() { DEFAULT_WATCHDOG } else { watchdog },
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    pub fn error(&self) -> Option<StreamError> {
        self.read().error.clone()
    }

    // Writers only assign precomputed locals, so a poisoned snapshot is still whole.
    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the metric fields with values derived from `sample`.
    pub(crate) fn publish(&self, sample: &Sample, cpu_percentage: f64) {
        let memory = sample.memory_usage as f64;
        let memory_limit = sample.memory_limit as f64;
        let memory_percentage = if sample.memory_limit > 0 {
            memory / memory_limit * 100.0
        } else {
            0.0
        };
        let mut s = self.write();
        s.cpu_percentage = cpu_percentage;
        s.memory = memory;
        s.memory_limit = memory_limit;
        s.memory_percentage = memory_percentage;
        s.network_rx = sample.network_rx as f64;
        s.network_tx = sample.network_tx as f64;
    }

    /// No frame within the watchdog window: the numbers are stale but the stream may recover.
    fn clear_volatile(&self) {
        let mut s = self.write();
        s.cpu_percentage = 0.0;
        s.memory = 0.0;
        s.memory_percentage = 0.0;
    }

    pub(crate) fn retire(&self, err: StreamError) {
        let mut s = self.write();
        if s.error.is_none() {
            debug!(container = %self.name, error = %err, "stats stream ended");
            s.error = Some(err);
        }
    }

    /// Open the container's stream and keep the snapshot current until the stream ends.
    ///
    /// Runs until the stream closes or a frame fails to decode, then records the terminal
    /// error and returns. There is no reconnect.
    pub async fn collect<S>(self: Arc<Self>, source: Arc<S>)
    where
        S: StatsSource + ?Sized,
    {
        let stream = match source.open(&self.name).await {
            Ok(stream) => stream,
            Err(e) => {
                self.retire(e);
                return;
            }
        };
        debug!(container = %self.name, "stats stream opened");

        let (tx, mut rx) = mpsc::channel(1);
        // dropping the guard on exit also stops the decoder and closes the stream
        let _decoder = AbortOnDrop(tokio::spawn(decode_loop(Arc::clone(&self), stream, tx)));

        loop {
            tokio::select! {
                update = rx.recv() => match update {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        self.retire(e);
                        break;
                    }
                    // decoder went away without reporting
                    None => {
                        self.retire(StreamError::Closed);
                        break;
                    }
                },
                _ = sleep(self.watchdog) => {
                    trace!(container = %self.name, "no stats within watchdog window");
                    self.clear_volatile();
                }
            }
        }
    }

    /// Write one table row, or return the terminal error without writing anything.
    pub fn render<W: Write>(&self, w: &mut W) -> Result<(), RenderError> {
        let s = self.read();
        if let Some(err) = &s.error {
            return Err(RenderError::Retired(err.clone()));
        }
        writeln!(
            w,
            "{}\t{:.2}%\t{}/{}\t{:.2}%\t{}/{}",
            self.name,
            s.cpu_percentage,
            human(s.memory),
            human(s.memory_limit),
            s.memory_percentage,
            human(s.network_rx),
            human(s.network_tx),
        )?;
        Ok(())
    }
}

/// Aborts the wrapped task when dropped.
pub(crate) struct AbortOnDrop(pub(crate) JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// Sole writer of metric fields. Reports every frame (or the terminal error) to the watchdog loop.
async fn decode_loop(
    stats: Arc<ContainerStats>,
    mut stream: StatsStream,
    updates: mpsc::Sender<Result<(), StreamError>>,
) {
    let mut previous: Option<(u64, u64)> = None;
    loop {
        let outcome = match stream.next().await {
            Some(Ok(record)) => {
                let sample = Sample::from(&record);
                let cpu = previous
                    .map(|(cpu, system)| calculate_cpu_percent(cpu, system, &sample))
                    .unwrap_or(0.0);
                stats.publish(&sample, cpu);
                previous = Some((sample.cpu_total, sample.system_total));
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Err(StreamError::Closed),
        };
        let done = outcome.is_err();
        if updates.send(outcome).await.is_err() || done {
            return;
        }
    }
}
