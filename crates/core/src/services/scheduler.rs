use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::alert_service::AlertService;
use crate::models::alert::AlertRunReport;

/// Periodic alert evaluation.
///
/// Each item of the tick stream is one evaluation pass. Production uses
/// [`interval_ticks`]; tests can drive it with any stream, e.g.
/// `futures::stream::iter`, without real time passing.
#[derive(Clone)]
pub struct AlertScheduler {
    alerts: Arc<AlertService>,
}

impl AlertScheduler {
    pub fn new(alerts: Arc<AlertService>) -> Self {
        Self { alerts }
    }

    /// One pass. A failed pass is logged and reported as `None`.
    pub async fn tick(&self) -> Option<AlertRunReport> {
        match self.alerts.evaluate_pending().await {
            Ok(report) => {
                info!(
                    checked = report.checked,
                    triggered = report.triggered,
                    failed = report.failed,
                    "Alert run complete"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Alert run failed");
                None
            }
        }
    }

    /// Run one pass per tick until the stream ends. Returns the number of passes.
    pub async fn run<S>(&self, ticks: S) -> usize
    where
        S: Stream<Item = ()>,
    {
        let mut ticks = pin!(ticks);
        let mut runs = 0;
        while ticks.next().await.is_some() {
            self.tick().await;
            runs += 1;
        }
        runs
    }

    /// Run on a fixed interval in a background task.
    pub fn spawn(self, period: Duration) -> SchedulerHandle {
        let (shutdown, mut signal) = watch::channel(false);
        let task = tokio::spawn(async move {
            let stop = async move {
                while !*signal.borrow_and_update() {
                    if signal.changed().await.is_err() {
                        break;
                    }
                }
            };
            let runs = self.run(interval_ticks(period).take_until(stop)).await;
            info!(runs, "Alert scheduler stopped");
        });
        SchedulerHandle { shutdown, task }
    }
}

/// Ticks every `period`, the first one immediately. Missed ticks are
/// skipped rather than delivered in a burst.
pub fn interval_ticks(period: Duration) -> impl Stream<Item = ()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    futures::stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    })
}

/// Handle to a spawned scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop after the current pass and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Alert scheduler task failed");
        }
    }
}
