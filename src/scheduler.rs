//! Cancellable repeating refresh timer.
//!
//! At most one timer task exists per scheduler. Starting again replaces the
//! running task instead of adding a second one, and stopping aborts it so no
//! further tick fires.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("refresh interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SchedulerState {
    Stopped,
    Running {
        #[serde(rename = "intervalMs")]
        interval_ms: u64,
    },
}

type Tick = Arc<dyn Fn() + Send + Sync + 'static>;

struct ActiveTimer {
    interval: Duration,
    handle: JoinHandle<()>,
}

pub struct RefreshScheduler {
    name: &'static str,
    active: Mutex<Option<ActiveTimer>>,
}

impl RefreshScheduler {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            active: Mutex::new(None),
        }
    }

    /// Starts ticking every `interval`, first tick one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, interval: Duration, tick: F) -> Result<(), RefreshError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(RefreshError::ZeroInterval);
        }

        let tick: Tick = Arc::new(tick);
        let first = Instant::now() + interval;

        let mut active = self.lock();
        if let Some(previous) = active.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick();
            }
        });
        *active = Some(ActiveTimer { interval, handle });
        drop(active);

        info!(
            component = "refresh_scheduler",
            event = "refresh.started",
            dashboard = self.name,
            interval_ms = duration_ms(interval)
        );
        Ok(())
    }

    /// Cancels the pending timer. Returns `false` when nothing was running.
    pub fn stop(&self) -> bool {
        let Some(previous) = self.lock().take() else {
            return false;
        };
        previous.handle.abort();

        info!(
            component = "refresh_scheduler",
            event = "refresh.stopped",
            dashboard = self.name
        );
        true
    }

    pub fn state(&self) -> SchedulerState {
        match self.lock().as_ref() {
            Some(timer) => SchedulerState::Running {
                interval_ms: duration_ms(timer.interval),
            },
            None => SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveTimer>> {
        self.active
            .lock()
            .expect("refresh scheduler lock should not be poisoned")
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(timer) = active.take() {
                timer.handle.abort();
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
