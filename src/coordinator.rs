//! Fetch coordination for one dashboard instance.
//!
//! The coordinator is the only writer of the dashboard state bundle. Every
//! fetch is stamped with a sequence number when issued; a result is applied
//! only while its number is still the latest issued, so the last request
//! issued wins regardless of which response arrives first.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::filters::FilterSet;
use crate::payload::{DashboardPayload, FetchError};
use crate::source::DashboardDataSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchTrigger {
    Initial,
    FilterChange,
    Scheduled,
    Manual,
}

impl FetchTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FilterChange => "filter_change",
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// Immutable snapshot of the filters a fetch was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub sequence: u64,
    pub filters: FilterSet,
    pub trigger: FetchTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed(FetchError),
    Stale { sequence: u64, latest: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub filters: FilterSet,
    pub payload: DashboardPayload,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub sequence: u64,
}

impl DashboardState {
    pub fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            payload: DashboardPayload::new(),
            loading: false,
            error: None,
            last_updated: None,
            sequence: 0,
        }
    }
}

#[derive(Clone)]
pub struct FetchCoordinator {
    operation: &'static str,
    source: Arc<dyn DashboardDataSource>,
    state: Arc<Mutex<DashboardState>>,
}

impl FetchCoordinator {
    pub fn new(
        operation: &'static str,
        source: Arc<dyn DashboardDataSource>,
        filters: FilterSet,
    ) -> Self {
        Self {
            operation,
            source,
            state: Arc::new(Mutex::new(DashboardState::new(filters))),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn snapshot(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn filters(&self) -> FilterSet {
        self.lock().filters.clone()
    }

    /// Issues a request synchronously: stores `filters`, bumps the sequence
    /// and marks loading.
    pub fn issue(&self, filters: FilterSet, trigger: FetchTrigger) -> FetchRequest {
        let mut state = self.lock();
        state.filters = filters.clone();
        let request = Self::next_request(&mut state, filters, trigger);
        drop(state);

        self.log_issued(&request);
        request
    }

    /// Derives new filters from the current ones, stores them and issues a
    /// fetch for them under a single lock, so the stored filters always
    /// belong to the latest request.
    pub fn change_filters<E, F>(
        &self,
        trigger: FetchTrigger,
        change: F,
    ) -> Result<JoinHandle<FetchOutcome>, E>
    where
        F: FnOnce(&FilterSet) -> Result<FilterSet, E>,
    {
        let mut state = self.lock();
        let filters = change(&state.filters)?;
        state.filters = filters.clone();
        let request = Self::next_request(&mut state, filters, trigger);
        drop(state);

        self.log_issued(&request);
        Ok(self.spawn(request))
    }

    fn next_request(
        state: &mut DashboardState,
        filters: FilterSet,
        trigger: FetchTrigger,
    ) -> FetchRequest {
        state.sequence += 1;
        state.loading = true;
        FetchRequest {
            sequence: state.sequence,
            filters,
            trigger,
        }
    }

    fn log_issued(&self, request: &FetchRequest) {
        debug!(
            component = "fetch_coordinator",
            event = "fetch.issued",
            operation = self.operation,
            sequence = request.sequence,
            trigger = request.trigger.as_str()
        );
    }

    fn spawn(&self, request: FetchRequest) -> JoinHandle<FetchOutcome> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.execute(request).await })
    }

    /// Runs an issued request against the source and applies the result.
    pub async fn execute(&self, request: FetchRequest) -> FetchOutcome {
        let result = self
            .source
            .fetch_dashboard_data(self.operation, &request.filters)
            .await;
        self.apply(&request, result)
    }

    /// Issues and spawns a fetch; `loading` is already set when this returns.
    pub fn trigger_fetch(
        &self,
        filters: FilterSet,
        trigger: FetchTrigger,
    ) -> JoinHandle<FetchOutcome> {
        let request = self.issue(filters, trigger);
        self.spawn(request)
    }

    /// Fetches with the filters held in state at call time.
    pub fn refresh(&self, trigger: FetchTrigger) -> JoinHandle<FetchOutcome> {
        let request = self.issue_current(trigger);
        self.spawn(request)
    }

    fn issue_current(&self, trigger: FetchTrigger) -> FetchRequest {
        let mut state = self.lock();
        let filters = state.filters.clone();
        let request = Self::next_request(&mut state, filters, trigger);
        drop(state);

        self.log_issued(&request);
        request
    }

    pub fn apply(
        &self,
        request: &FetchRequest,
        result: Result<DashboardPayload, FetchError>,
    ) -> FetchOutcome {
        let mut state = self.lock();
        if request.sequence != state.sequence {
            let latest = state.sequence;
            drop(state);
            debug!(
                component = "fetch_coordinator",
                event = "fetch.stale",
                operation = self.operation,
                sequence = request.sequence,
                latest
            );
            return FetchOutcome::Stale {
                sequence: request.sequence,
                latest,
            };
        }

        state.loading = false;
        match result {
            Ok(payload) => {
                state.payload = payload;
                state.error = None;
                state.last_updated = Some(Utc::now());
                drop(state);
                info!(
                    component = "fetch_coordinator",
                    event = "fetch.applied",
                    operation = self.operation,
                    sequence = request.sequence,
                    trigger = request.trigger.as_str()
                );
                FetchOutcome::Applied
            }
            Err(err) => {
                state.error = Some(err.user_message().to_string());
                drop(state);
                warn!(
                    component = "fetch_coordinator",
                    event = "fetch.failed",
                    operation = self.operation,
                    sequence = request.sequence,
                    trigger = request.trigger.as_str(),
                    error = %err
                );
                FetchOutcome::Failed(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state
            .lock()
            .expect("dashboard state lock should not be poisoned")
    }
}
