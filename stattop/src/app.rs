//! Display loop: one tracker per container, a short settle pause to surface bad names, then a
//! fixed-rate redraw of every live container until none remain.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info};

use crate::error::{AppError, RenderError};
use crate::source::StatsSource;
use crate::stats::{AbortOnDrop, ContainerStats, DEFAULT_WATCHDOG};
use crate::ui;
use crate::ui::header::{clear_screen, draw_header};

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Silence after which a container's volatile numbers are blanked.
    pub watchdog: Duration,
    /// Pause between spawning the trackers and checking for early failures.
    pub settle: Duration,
    pub refresh: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watchdog: DEFAULT_WATCHDOG,
            settle: Duration::from_millis(500),
            refresh: Duration::from_millis(500),
        }
    }
}

impl Settings {
    /// Defaults overridden by STATTOP_WATCHDOG_MS, STATTOP_SETTLE_MS and STATTOP_REFRESH_MS.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Zero is ignored for the watchdog and the refresh period; both drive timers.
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let ms = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        Self {
            watchdog: ms("STATTOP_WATCHDOG_MS")
                .filter(|w| !w.is_zero())
                .unwrap_or(d.watchdog),
            settle: ms("STATTOP_SETTLE_MS").unwrap_or(d.settle),
            refresh: ms("STATTOP_REFRESH_MS")
                .filter(|r| !r.is_zero())
                .unwrap_or(d.refresh),
        }
    }
}

pub struct App<S: ?Sized> {
    source: Arc<S>,
    settings: Settings,
}

impl<S> App<S>
where
    S: StatsSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self::with_settings(source, Settings::default())
    }

    pub fn with_settings(source: Arc<S>, settings: Settings) -> Self {
        Self { source, settings }
    }

    /// Stream stats for `names` to `out` until every container's stream has ended.
    ///
    /// Fails without drawing anything when `names` is empty or when any container has already
    /// failed by the end of the settle pause. Containers failing later just drop out of the table.
    pub async fn run<W: Write>(&self, names: &[String], mut out: W) -> Result<(), AppError> {
        let mut names = names.to_vec();
        names.sort();
        names.dedup();
        if names.is_empty() {
            return Err(AppError::NoEntities);
        }

        let mut active = Vec::with_capacity(names.len());
        let mut collectors = Vec::with_capacity(names.len());
        for name in names {
            let stats = Arc::new(ContainerStats::with_watchdog(name, self.settings.watchdog));
            let task = tokio::spawn(Arc::clone(&stats).collect(Arc::clone(&self.source)));
            collectors.push(AbortOnDrop(task));
            active.push(stats);
        }

        // give streams for missing containers a chance to fail before anything is drawn
        sleep(self.settings.settle).await;
        let failures: Vec<_> = active
            .iter()
            .filter_map(|s| s.error().map(|e| (s.name().to_string(), e)))
            .collect();
        if !failures.is_empty() {
            return Err(AppError::Startup(failures));
        }
        info!(containers = active.len(), "streaming container stats");

        let refresh = self.settings.refresh;
        let mut ticker = interval_at(Instant::now() + refresh, refresh);
        loop {
            ticker.tick().await;
            if draw(&mut out, &mut active)? == 0 {
                debug!("all stats streams ended");
                return Ok(());
            }
        }
    }
}

// One refresh: header plus a row per live container; retired containers are dropped afterwards.
// Once none remain the table is discarded and the screen is left cleared. Returns how many remain.
fn draw<W: Write>(out: &mut W, active: &mut Vec<Arc<ContainerStats>>) -> Result<usize, AppError> {
    clear_screen(out)?;
    let mut tw = ui::table(&mut *out);
    draw_header(&mut tw)?;
    let mut retired = Vec::new();
    for (i, stats) in active.iter().enumerate() {
        match stats.render(&mut tw) {
            Ok(()) => {}
            Err(RenderError::Retired(err)) => {
                debug!(container = stats.name(), error = %err, "removing container");
                retired.push(i);
            }
            Err(RenderError::Io(e)) => return Err(e.into()),
        }
    }
    for i in retired.into_iter().rev() {
        active.remove(i);
    }
    if !active.is_empty() {
        tw.flush()?;
    }
    drop(tw);
    out.flush()?;
    Ok(active.len())
}
