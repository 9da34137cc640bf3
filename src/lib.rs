//! Gaming analytics dashboard core crate.
//!
//! Current implemented scope:
//! - filter state with presets and per-page filter schemas
//! - fetch coordination with stale-response discard
//! - local derivation of filtered and sorted view models
//! - cancellable auto refresh and the HTTP dashboard surface

mod config;
mod coordinator;
mod dashboard;
mod derive;
mod filters;
mod observability;
mod pages;
mod payload;
mod scheduler;
mod source;

pub use config::{
    backend_config_from_env, backend_config_from_lookup, server_config_from_env,
    server_config_from_lookup, BackendConfig, ConfigError, ServerConfig, AUTO_REFRESH_ENV,
    BACKEND_KEY_ENV, BACKEND_URL_ENV, DASHBOARD_ADDR_ENV, REQUEST_TIMEOUT_ENV,
};
pub use coordinator::{DashboardState, FetchCoordinator, FetchOutcome, FetchRequest, FetchTrigger};
pub use dashboard::{
    dashboard_router, render_dashboard_html, render_not_found_html, Dashboard, DashboardError,
    DashboardHub, DashboardView, Intent, RefreshView,
};
pub use derive::{
    derive_alert_view, derive_game_view, derive_payment_methods, derive_top_games, derive_view,
    filter_games, leaderboard, passthrough_sections, sort_by_metric, sort_games, summarize_games,
    validate_sort_key, AlertFilter, AlertView, FinancialView, GameFilters, GameSortKey,
    GameSummary, GameView, OperationsView, PerformanceTier, RtpBucket, SortOrder, SortSpec,
    LeaderboardMetric, TopGameSortKey, ViewModel, LEADERBOARD_LIMIT,
};
pub use filters::{
    find_preset, FilterError, FilterField, FilterSchema, FilterSet, Preset, ALL, CURRENCY,
    GLOBAL_FILTER_FIELDS, OPERATOR, QUICK_PRESETS, REGION, TIME_RANGE,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_config_error, log_dashboard_mounted,
    logging_config_from_env, logging_config_from_lookup, LogFormat, LoggingConfig,
    LoggingInitError,
};
pub use pages::DashboardPage;
pub use payload::{
    normalize_payload, normalize_value, AlertRecord, DashboardPayload, FetchError, GameRecord,
    PaymentMethodRecord, TopGameRecord, ALERTS, BUSINESS_HEALTH, BUSINESS_SCORECARD, DISTRIBUTION,
    ENGAGEMENT, FINANCIAL_KPIS, FRAUD_ALERTS, GAMES, JOURNEY_FUNNEL, KPI_DATA, METRICS,
    PAYMENT_METHODS, PLAYER_METRICS, PREDICTIVE_ANALYTICS, REVENUE_STREAMS, RISK_SCORE,
    STRATEGIC_PERFORMANCE, SYSTEM_STATUS, TOP_GAMES, TRANSACTION_FLOW,
};
pub use scheduler::{RefreshError, RefreshScheduler, SchedulerState};
pub use source::{
    endpoint_url, request_body, DashboardDataSource, HttpDataSource, StaticDataSource,
};
