//! Status polling.
//!
//! One loop per job: it ticks at a fixed interval, waits for each status
//! reply before the next tick, and stops once the worker reports the run as
//! completed. Starting a new loop cancels the previous one.

use crate::client::{JobSession, StatusSource};
use crate::models::JobStatus;
use crate::stage::StageBoard;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Receives progress while a job is being polled.
pub trait ProgressView: Send {
    fn status_changed(&mut self, status: &str);
    fn stage_changed(&mut self, board: &StageBoard);
}

/// Final state of a polled job.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub session: JobSession,
    pub status: JobStatus,
    pub board: StageBoard,
}

/// Polls `source` until the run completes and returns the final status.
/// Failed polls are skipped; the next tick tries again.
pub async fn poll_until_complete<S, V>(
    source: &S,
    session: &JobSession,
    board: &mut StageBoard,
    view: &mut V,
    interval: Duration,
) -> JobStatus
where
    S: StatusSource,
    V: ProgressView + ?Sized,
{
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = match source.status(&session.run_id, &session.job_id).await {
            Ok(status) => status,
            Err(e) => {
                log::debug!("Status poll for run {} failed: {}", session.run_id, e);
                continue;
            }
        };

        view.status_changed(status.display_status());

        if let Some(stage) = status.stage.as_deref() {
            if board.on_stage_notification(stage).is_some() {
                view.stage_changed(board);
            }
        }

        if status.is_completed() {
            log::info!(
                "Run {} completed: {}",
                session.run_id,
                status.display_status()
            );
            return status;
        }
    }
}

/// Owns the single active polling loop.
pub struct Poller<S> {
    source: Arc<S>,
    interval: Duration,
    active: Option<JoinHandle<PollOutcome>>,
}

impl<S: StatusSource + 'static> Poller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            active: None,
        }
    }

    /// Starts tracking `session` with one row per file name. Any loop still
    /// running is cancelled first and progress starts from scratch.
    pub fn start(
        &mut self,
        session: JobSession,
        file_names: Vec<String>,
        mut view: Box<dyn ProgressView>,
    ) {
        self.cancel();

        let source = Arc::clone(&self.source);
        let interval = self.interval;
        let mut board = StageBoard::new(file_names);
        view.stage_changed(&board);

        self.active = Some(tokio::spawn(async move {
            let status =
                poll_until_complete(source.as_ref(), &session, &mut board, view.as_mut(), interval)
                    .await;
            PollOutcome {
                session,
                status,
                board,
            }
        }));
    }

    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }

    /// Waits for the active loop to finish. `None` when nothing is running
    /// or the loop was cancelled.
    pub async fn wait(&mut self) -> Option<PollOutcome> {
        let handle = self.active.take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                if !e.is_cancelled() {
                    log::warn!("Polling task failed: {}", e);
                }
                None
            }
        }
    }
}

impl<S> Drop for Poller<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }
}
