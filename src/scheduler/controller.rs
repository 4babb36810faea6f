use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::reminders::{ReminderSweep, SweepResult};

use super::state::{SchedulerSnapshot, SchedulerState};

// Set to false to silence per-tick logging from the reminder loop
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives [`ReminderSweep`] on a fixed cadence.
///
/// At most one ticker task exists per scheduler: `start` only spawns one
/// after flipping the state from stopped to running. Sweeps never overlap;
/// a tick that finds another sweep in flight is skipped, and `run_now`
/// waits its turn.
#[derive(Clone)]
pub struct ReminderScheduler {
    state: Arc<Mutex<SchedulerState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    sweep: Arc<ReminderSweep>,
    sweep_lock: Arc<Mutex<()>>,
    lookahead_minutes: i64,
}

impl ReminderScheduler {
    pub fn new(sweep: ReminderSweep, check_interval_ms: u64, lookahead_minutes: i64) -> Result<Self> {
        if check_interval_ms == 0 {
            bail!("check interval must be greater than zero");
        }
        if lookahead_minutes <= 0 {
            bail!("lookahead must be a positive number of minutes, got {lookahead_minutes}");
        }

        Ok(Self {
            state: Arc::new(Mutex::new(SchedulerState::new(check_interval_ms))),
            ticker: Arc::new(Mutex::new(None)),
            sweep: Arc::new(sweep),
            sweep_lock: Arc::new(Mutex::new(())),
            lookahead_minutes,
        })
    }

    pub fn lookahead_minutes(&self) -> i64 {
        self.lookahead_minutes
    }

    /// Sweeps once right away, then every check interval. Returns false
    /// (and changes nothing) when already running.
    pub async fn start(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.begin_running() {
            log_info!("Reminder scheduler already running");
            return false;
        }

        let interval = Duration::from_millis(state.check_interval_ms);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sweep_loop(
            self.sweep.clone(),
            self.sweep_lock.clone(),
            self.lookahead_minutes,
            interval,
            cancel_token.clone(),
        ));

        let mut ticker_guard = self.ticker.lock().await;
        debug_assert!(ticker_guard.is_none());
        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });

        log_info!(
            "Reminder scheduler started (every {} ms, {} minute lookahead)",
            state.check_interval_ms,
            self.lookahead_minutes
        );
        true
    }

    /// Cancels future ticks. A sweep already in flight runs to completion
    /// before this returns. Returns false when already stopped.
    pub async fn stop(&self) -> bool {
        let ticker = {
            let mut state = self.state.lock().await;
            if !state.stop() {
                return false;
            }
            self.ticker.lock().await.take()
        };

        if let Some(Ticker {
            handle,
            cancel_token,
        }) = ticker
        {
            cancel_token.cancel();
            if let Err(err) = handle.await {
                log_error!("Reminder loop task failed to join: {err}");
            }
        }

        log_info!("Reminder scheduler stopped");
        true
    }

    pub async fn status(&self) -> SchedulerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Runs a sweep outside the timer, waiting for any in-flight sweep first.
    pub async fn run_now(&self) -> Result<SweepResult> {
        let _guard = self.sweep_lock.lock().await;
        self.sweep.run_sweep(self.lookahead_minutes).await
    }
}

async fn sweep_loop(
    sweep: Arc<ReminderSweep>,
    sweep_lock: Arc<Mutex<()>>,
    lookahead_minutes: i64,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    // The first tick completes immediately, which gives the sweep-on-start.
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("Reminder loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                run_tick(&sweep, &sweep_lock, lookahead_minutes).await;
            }
        }
    }
}

async fn run_tick(sweep: &Arc<ReminderSweep>, sweep_lock: &Arc<Mutex<()>>, lookahead_minutes: i64) {
    let Ok(_guard) = sweep_lock.clone().try_lock_owned() else {
        log_warn!("Previous reminder sweep still running; skipping this tick");
        return;
    };

    // A separate task turns a panicking sweep into a JoinError instead of
    // taking the loop down with it.
    let sweep = Arc::clone(sweep);
    let outcome = tokio::spawn(async move { sweep.run_sweep(lookahead_minutes).await }).await;

    match outcome {
        Ok(Ok(result)) if !result.errors.is_empty() => {
            log_warn!(
                "Reminder sweep finished with {} error(s) out of {} due block(s)",
                result.errors.len(),
                result.blocks_found
            );
        }
        Ok(Ok(result)) => log_debug!(
            "Reminder sweep sent {} reminder(s) for {} due block(s)",
            result.reminders_sent,
            result.blocks_found
        ),
        Ok(Err(err)) => log_error!("Reminder sweep failed: {err:#}"),
        Err(join_err) => log_error!("Reminder sweep aborted: {join_err}"),
    }
}
