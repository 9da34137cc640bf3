use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamedash::{
    DashboardDataSource, DashboardPayload, FetchCoordinator, FetchError, FetchOutcome,
    FetchTrigger, FilterSet, GAMES,
};
use serde_json::json;

const OPERATION: &str = "get-game-performance";

/// Answers after a per-tag delay; the tag is read from the request filters.
struct DelayedSource {
    script: HashMap<&'static str, (u64, Result<DashboardPayload, FetchError>)>,
}

#[async_trait]
impl DashboardDataSource for DelayedSource {
    async fn fetch_dashboard_data(
        &self,
        _operation: &str,
        filters: &FilterSet,
    ) -> Result<DashboardPayload, FetchError> {
        let tag = filters.get("tag").unwrap_or_default();
        let (delay_ms, result) = self
            .script
            .get(tag)
            .cloned()
            .unwrap_or((0, Ok(DashboardPayload::new())));
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        result
    }
}

/// Answers the n-th call after the n-th scripted delay.
struct QueuedDelaySource {
    delays_ms: Mutex<Vec<u64>>,
    calls: Mutex<usize>,
}

#[async_trait]
impl DashboardDataSource for QueuedDelaySource {
    async fn fetch_dashboard_data(
        &self,
        _operation: &str,
        _filters: &FilterSet,
    ) -> Result<DashboardPayload, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        let delay_ms = self.delays_ms.lock().unwrap().get(call - 1).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(payload(&format!("call-{call}")))
    }
}

fn payload(tag: &str) -> DashboardPayload {
    DashboardPayload::new().with_section(GAMES, json!([{ "name": tag }]))
}

fn tagged(tag: &str) -> FilterSet {
    FilterSet::default().with("tag", tag)
}

#[tokio::test(start_paused = true)]
async fn later_request_wins_even_when_it_resolves_first() {
    let source = DelayedSource {
        script: HashMap::from([
            ("A", (500, Ok(payload("A")))),
            ("B", (100, Ok(payload("B")))),
        ]),
    };
    let coordinator = FetchCoordinator::new(OPERATION, Arc::new(source), FilterSet::default());

    let first = coordinator.trigger_fetch(tagged("A"), FetchTrigger::FilterChange);
    let second = coordinator.trigger_fetch(tagged("B"), FetchTrigger::FilterChange);
    assert!(coordinator.snapshot().loading);

    assert_eq!(second.await.unwrap(), FetchOutcome::Applied);
    assert!(!coordinator.snapshot().loading);
    assert_eq!(
        first.await.unwrap(),
        FetchOutcome::Stale {
            sequence: 1,
            latest: 2
        }
    );

    let state = coordinator.snapshot();
    assert_eq!(state.payload, payload("B"));
    assert_eq!(state.filters, tagged("B"));
    assert_eq!(state.sequence, 2);
    assert!(!state.loading);
    assert_eq!(state.error, None);
}

#[tokio::test(start_paused = true)]
async fn stale_failure_is_silent() {
    let source = DelayedSource {
        script: HashMap::from([
            (
                "A",
                (500, Err(FetchError::Transport("timed out".to_string()))),
            ),
            ("B", (100, Ok(payload("B")))),
        ]),
    };
    let coordinator = FetchCoordinator::new(OPERATION, Arc::new(source), FilterSet::default());

    let first = coordinator.trigger_fetch(tagged("A"), FetchTrigger::Scheduled);
    let second = coordinator.trigger_fetch(tagged("B"), FetchTrigger::Manual);

    second.await.unwrap();
    assert!(matches!(first.await.unwrap(), FetchOutcome::Stale { .. }));

    let state = coordinator.snapshot();
    assert_eq!(state.error, None);
    assert_eq!(state.payload, payload("B"));
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_beats_slower_scheduled_refresh() {
    let source = QueuedDelaySource {
        delays_ms: Mutex::new(vec![800, 50]),
        calls: Mutex::new(0),
    };
    let coordinator = FetchCoordinator::new(OPERATION, Arc::new(source), FilterSet::default());

    let scheduled = coordinator.refresh(FetchTrigger::Scheduled);
    tokio::task::yield_now().await;
    let manual = coordinator.refresh(FetchTrigger::Manual);

    assert_eq!(manual.await.unwrap(), FetchOutcome::Applied);
    assert!(matches!(
        scheduled.await.unwrap(),
        FetchOutcome::Stale { .. }
    ));
    assert_eq!(coordinator.snapshot().payload, payload("call-2"));
}

#[tokio::test(start_paused = true)]
async fn responses_in_issue_order_all_apply() {
    let source = DelayedSource {
        script: HashMap::from([
            ("A", (100, Ok(payload("A")))),
            ("B", (100, Ok(payload("B")))),
        ]),
    };
    let coordinator = FetchCoordinator::new(OPERATION, Arc::new(source), FilterSet::default());

    let outcome = coordinator
        .trigger_fetch(tagged("A"), FetchTrigger::Initial)
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Applied);
    let first_update = coordinator.snapshot().last_updated;
    assert!(first_update.is_some());

    let outcome = coordinator
        .trigger_fetch(tagged("B"), FetchTrigger::FilterChange)
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(coordinator.snapshot().payload, payload("B"));
}
