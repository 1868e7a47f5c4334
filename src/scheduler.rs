//! Fixed-interval driver for the poll loop.
//!
//! Runs a job once immediately, then once per interval until cancelled. The
//! job is awaited inline, so passes never overlap; a pass that overruns the
//! interval leaves at most one pending tick behind.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Work executed on every tick.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    /// What one pass reports back; dropped by the interval loop.
    type Output: Send;

    /// Used in logs and error context.
    fn name(&self) -> &'static str;
    async fn execute(&self) -> Result<Self::Output>;
}

/// Normal termination of [`Scheduler::run_until_cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cancelled")
    }
}

pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn run_once<J: PeriodicJob + ?Sized>(&self, job: &J) -> Result<J::Output> {
        job.execute().await.with_context(|| format!("failed to process {}", job.name()))
    }

    /// Cancellation is observed only between passes; a pass in flight runs
    /// to completion. The first failing pass ends the loop with its error.
    pub async fn run_until_cancelled<J: PeriodicJob + ?Sized>(&self, job: &J, cancel: CancellationToken) -> Result<Cancelled> {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        timer.tick().await;

        info!("⏱️ {} every {:?}", job.name(), self.interval);
        self.run_once(job).await?;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("{} loop stopped", job.name());
                    return Ok(Cancelled);
                }
                _ = timer.tick() => {
                    self.run_once(job).await?;
                }
            }
        }
    }
}
