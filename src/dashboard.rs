//! Dashboard page instances, intent dispatch and HTTP routes.
//!
//! One [`Dashboard`] per page pairs a fetch coordinator with a refresh
//! scheduler. User actions arrive as [`Intent`] values; each intent's effect
//! on filters, sort and timer is applied in one place.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{DashboardState, FetchCoordinator, FetchOutcome, FetchTrigger};
use crate::derive::{
    derive_view, validate_sort_key, LeaderboardMetric, SortOrder, SortSpec, ViewModel,
};
use crate::filters::{find_preset, FilterError, FilterSchema, QUICK_PRESETS};
use crate::observability::log_dashboard_mounted;
use crate::pages::DashboardPage;
use crate::scheduler::{RefreshError, RefreshScheduler, SchedulerState};
use crate::source::DashboardDataSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    UpdateFilter {
        key: String,
        value: String,
    },
    ResetFilters,
    ApplyPreset {
        label: String,
    },
    SetSort {
        key: String,
        #[serde(default)]
        order: SortOrder,
    },
    SetLeaderboardMetric {
        metric: LeaderboardMetric,
    },
    ManualRefresh,
    PauseRefresh,
    ResumeRefresh,
    SetRefreshInterval {
        seconds: u64,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateFilter { .. } => "updateFilter",
            Self::ResetFilters => "resetFilters",
            Self::ApplyPreset { .. } => "applyPreset",
            Self::SetSort { .. } => "setSort",
            Self::SetLeaderboardMetric { .. } => "setLeaderboardMetric",
            Self::ManualRefresh => "manualRefresh",
            Self::PauseRefresh => "pauseRefresh",
            Self::ResumeRefresh => "resumeRefresh",
            Self::SetRefreshInterval { .. } => "setRefreshInterval",
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("invalid sort: {0}")]
    InvalidSort(String),
    #[error("unknown dashboard: {0}")]
    UnknownPage(String),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::UnknownPage(_) => StatusCode::NOT_FOUND,
            Self::Filter(_) | Self::Refresh(_) | Self::InvalidSort(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RefreshSettings {
    enabled: bool,
    interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshView {
    pub enabled: bool,
    pub interval_secs: u64,
    pub options_secs: &'static [u64],
    pub timer: SchedulerState,
}

/// Everything a page renders: raw state plus the derived view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub page: &'static str,
    pub title: &'static str,
    pub state: DashboardState,
    pub view: ViewModel,
    pub active_preset: Option<&'static str>,
    pub active_filter_count: usize,
    pub sort: Option<SortSpec>,
    pub leaderboard_metric: LeaderboardMetric,
    pub refresh: RefreshView,
}

pub struct Dashboard {
    page: DashboardPage,
    schema: FilterSchema,
    coordinator: FetchCoordinator,
    scheduler: RefreshScheduler,
    settings: Mutex<RefreshSettings>,
    sort: Mutex<Option<SortSpec>>,
    leaderboard_metric: Mutex<LeaderboardMetric>,
}

impl Dashboard {
    pub fn new(
        page: DashboardPage,
        source: Arc<dyn DashboardDataSource>,
        auto_refresh: bool,
    ) -> Self {
        let schema = page.filter_schema();
        let coordinator = FetchCoordinator::new(page.operation(), source, schema.defaults());

        Self {
            page,
            coordinator,
            scheduler: RefreshScheduler::new(page.route()),
            settings: Mutex::new(RefreshSettings {
                enabled: auto_refresh,
                interval: page.default_refresh_interval(),
            }),
            sort: Mutex::new(
                page.default_sort().map(|(key, order)| SortSpec::new(key, order)),
            ),
            leaderboard_metric: Mutex::new(LeaderboardMetric::default()),
            schema,
        }
    }

    pub fn page(&self) -> DashboardPage {
        self.page
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    /// Issues the initial fetch and starts the timer when auto refresh is on.
    pub fn mount(&self) -> Result<JoinHandle<FetchOutcome>, DashboardError> {
        let initial = self.coordinator.refresh(FetchTrigger::Initial);

        let settings = self.settings_lock();
        let interval = if settings.enabled {
            self.start_timer(settings.interval)?;
            Some(settings.interval)
        } else {
            None
        };
        drop(settings);

        log_dashboard_mounted(self.page.route(), self.page.operation(), interval);
        Ok(initial)
    }

    pub fn unmount(&self) {
        self.scheduler.stop();
    }

    /// Applies one user action. Returns the fetch it issued, if any.
    pub fn dispatch(
        &self,
        intent: Intent,
    ) -> Result<Option<JoinHandle<FetchOutcome>>, DashboardError> {
        debug!(
            component = "dashboard",
            event = "dashboard.intent",
            route = self.page.route(),
            intent = intent.name()
        );

        match intent {
            Intent::UpdateFilter { key, value } => {
                let fetch = self
                    .coordinator
                    .change_filters(FetchTrigger::FilterChange, |current| {
                        self.schema.update_filter(current, &key, &value)
                    })?;
                Ok(Some(fetch))
            }
            Intent::ResetFilters => {
                let fetch = self
                    .coordinator
                    .change_filters(FetchTrigger::FilterChange, |_| {
                        Ok::<_, FilterError>(self.schema.reset_filters())
                    })?;
                Ok(Some(fetch))
            }
            Intent::ApplyPreset { label } => {
                let preset =
                    find_preset(&label).ok_or_else(|| FilterError::UnknownPreset(label.clone()))?;
                let fetch = self
                    .coordinator
                    .change_filters(FetchTrigger::FilterChange, |current| {
                        self.schema.apply_preset(current, preset)
                    })?;
                Ok(Some(fetch))
            }
            Intent::SetSort { key, order } => {
                validate_sort_key(self.page, &key).map_err(DashboardError::InvalidSort)?;
                *self.sort_lock() = Some(SortSpec::new(key, order));
                Ok(None)
            }
            Intent::SetLeaderboardMetric { metric } => {
                if self.page != DashboardPage::GamePerformance {
                    return Err(DashboardError::InvalidSort(format!(
                        "{} has no leaderboard",
                        self.page.route()
                    )));
                }
                *self.leaderboard_lock() = metric;
                Ok(None)
            }
            Intent::ManualRefresh => Ok(Some(self.coordinator.refresh(FetchTrigger::Manual))),
            Intent::PauseRefresh => {
                let mut settings = self.settings_lock();
                settings.enabled = false;
                self.scheduler.stop();
                Ok(None)
            }
            Intent::ResumeRefresh => {
                let mut settings = self.settings_lock();
                self.start_timer(settings.interval)?;
                settings.enabled = true;
                Ok(None)
            }
            Intent::SetRefreshInterval { seconds } => {
                let interval = Duration::from_secs(seconds);
                if interval.is_zero() {
                    return Err(RefreshError::ZeroInterval.into());
                }
                let mut settings = self.settings_lock();
                if settings.enabled {
                    self.start_timer(interval)?;
                }
                settings.interval = interval;
                Ok(None)
            }
        }
    }

    pub fn view(&self) -> DashboardView {
        let state = self.coordinator.snapshot();
        let sort = self.sort_lock().clone();
        let leaderboard_metric = *self.leaderboard_lock();
        let settings = *self.settings_lock();

        DashboardView {
            page: self.page.route(),
            title: self.page.title(),
            view: derive_view(
                self.page,
                &state.payload,
                &state.filters,
                sort.as_ref(),
                leaderboard_metric,
            ),
            active_preset: self
                .schema
                .active_preset(&state.filters, &QUICK_PRESETS)
                .map(|preset| preset.label),
            active_filter_count: self.schema.active_filter_count(&state.filters),
            sort,
            leaderboard_metric,
            refresh: RefreshView {
                enabled: settings.enabled,
                interval_secs: settings.interval.as_secs(),
                options_secs: self.page.refresh_interval_options(),
                timer: self.scheduler.state(),
            },
            state,
        }
    }

    fn start_timer(&self, interval: Duration) -> Result<(), RefreshError> {
        let coordinator = self.coordinator.clone();
        self.scheduler.start(interval, move || {
            drop(coordinator.refresh(FetchTrigger::Scheduled));
        })
    }

    fn settings_lock(&self) -> MutexGuard<'_, RefreshSettings> {
        self.settings
            .lock()
            .expect("refresh settings lock should not be poisoned")
    }

    fn sort_lock(&self) -> MutexGuard<'_, Option<SortSpec>> {
        self.sort
            .lock()
            .expect("sort lock should not be poisoned")
    }

    fn leaderboard_lock(&self) -> MutexGuard<'_, LeaderboardMetric> {
        self.leaderboard_metric
            .lock()
            .expect("leaderboard lock should not be poisoned")
    }
}

/// One mounted dashboard per page, sharing a single data source.
pub struct DashboardHub {
    dashboards: Vec<Dashboard>,
}

impl DashboardHub {
    pub fn new(source: Arc<dyn DashboardDataSource>, auto_refresh: bool) -> Self {
        Self {
            dashboards: DashboardPage::ALL
                .into_iter()
                .map(|page| Dashboard::new(page, Arc::clone(&source), auto_refresh))
                .collect(),
        }
    }

    pub fn dashboard(&self, page: DashboardPage) -> Option<&Dashboard> {
        self.dashboards
            .iter()
            .find(|dashboard| dashboard.page == page)
    }

    pub fn by_route(&self, route: &str) -> Result<&Dashboard, DashboardError> {
        DashboardPage::from_route(route)
            .and_then(|page| self.dashboard(page))
            .ok_or_else(|| DashboardError::UnknownPage(route.to_string()))
    }

    pub fn mount_all(&self) -> Result<Vec<JoinHandle<FetchOutcome>>, DashboardError> {
        self.dashboards.iter().map(Dashboard::mount).collect()
    }

    pub fn unmount_all(&self) {
        for dashboard in &self.dashboards {
            dashboard.unmount();
        }
    }
}

pub fn dashboard_router(hub: Arc<DashboardHub>) -> Router {
    Router::new()
        .route("/", get(get_index_html))
        .route("/{page}", get(get_page_html))
        .route("/{page}/state", get(get_page_state))
        .route("/{page}/intents", post(post_page_intent))
        .fallback(not_found)
        .with_state(hub)
}

pub fn render_dashboard_html(view: &DashboardView) -> String {
    let updated = view.state.last_updated.map_or_else(
        || "never".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(view.title)));
    out.push_str(STYLE);
    out.push_str("</head><body><main class=\"shell\">\n");
    push_nav(&mut out, view.page);

    out.push_str("<section class=\"hero\">");
    out.push_str(&format!("<h1>{}</h1>", escape_html(view.title)));
    out.push_str("<div class=\"hero-meta\">");
    out.push_str(&format!(
        "<span>Last updated: {}</span>",
        escape_html(&updated)
    ));
    if view.state.loading {
        out.push_str("<span class=\"loading\">Loading…</span>");
    }
    out.push_str(&format!(
        "<span>Auto refresh: {}</span>",
        if view.refresh.enabled {
            format!("every {}s", view.refresh.interval_secs)
        } else {
            "paused".to_string()
        }
    ));
    if let Some(preset) = view.active_preset {
        out.push_str(&format!("<span>Preset: {}</span>", escape_html(preset)));
    }
    out.push_str(&format!(
        "<span>Active filters: {}</span>",
        view.active_filter_count
    ));
    out.push_str("</div></section>\n");

    if let Some(message) = &view.state.error {
        out.push_str(&format!(
            "<section class=\"notice\" role=\"alert\">{}</section>\n",
            escape_html(message)
        ));
    }

    out.push_str("<section class=\"card\"><table class=\"filters\"><tbody>");
    for (key, value) in view.state.filters.iter() {
        out.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(key),
            escape_html(value)
        ));
    }
    out.push_str("</tbody></table></section>\n");

    if let ViewModel::Games(games) = &view.view {
        push_games_table(&mut out, games);
    }

    let body = serde_json::to_string_pretty(&view.view).unwrap_or_else(|_| "{}".to_string());
    out.push_str("<section class=\"card\"><pre id=\"view-model\">");
    out.push_str(&escape_html(&body));
    out.push_str("</pre></section>\n");

    out.push_str("</main></body></html>\n");
    out
}

pub fn render_not_found_html() -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<title>Page not found</title>\n");
    out.push_str(STYLE);
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<section class=\"hero\"><h1>404</h1>");
    out.push_str("<div class=\"hero-meta\"><span>Oops! Page not found</span></div></section>\n");
    out.push_str("<section class=\"card\"><a href=\"/\">Return to Home</a></section>\n");
    out.push_str("</main></body></html>\n");
    out
}

const STYLE: &str = "<style>:root{--bg:#0f141a;--card:#182029;--ink:#e6edf3;--muted:#8b98a5;--line:#2a3541;--accent:#3fb68b;--warn:#f0b429}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Inter\",\"Segoe UI\",sans-serif;background:var(--bg);min-height:100vh}.shell{max-width:1400px;margin:0 auto;padding:20px 16px}nav{display:flex;gap:12px;flex-wrap:wrap;margin-bottom:14px}nav a{color:var(--muted);text-decoration:none;font-size:.85rem}nav a.current{color:var(--accent);font-weight:700}.hero{background:linear-gradient(135deg,#14303a,#1d4656);border-radius:14px;padding:16px 18px}.hero h1{margin:0 0 8px;font-size:1.5rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.9rem;color:#c7d6df}.notice{margin-top:14px;padding:10px 14px;border-radius:10px;background:#3a2a10;color:var(--warn)}.card{margin-top:14px;background:var(--card);border:1px solid var(--line);border-radius:14px;overflow:auto}table{width:100%;border-collapse:collapse}th,td{padding:8px 10px;border-bottom:1px solid var(--line);font-size:.85rem;text-align:left;white-space:nowrap}pre{margin:0;padding:14px;font-size:.78rem;color:var(--muted)}</style>\n";

fn push_nav(out: &mut String, current: &str) {
    out.push_str("<nav>");
    for page in DashboardPage::ALL {
        let class = if page.route() == current { "current" } else { "" };
        out.push_str(&format!(
            "<a class=\"{}\" href=\"/{}\">{}</a>",
            class,
            escape_html(page.route()),
            escape_html(page.title())
        ));
    }
    out.push_str("</nav>\n");
}

fn push_games_table(out: &mut String, games: &crate::derive::GameView) {
    out.push_str("<section class=\"card\"><table id=\"games-table\"><thead><tr>");
    for header in ["Game", "Provider", "Category", "RTP", "Revenue", "Sessions", "Trend"] {
        out.push_str(&format!("<th>{header}</th>"));
    }
    out.push_str("</tr></thead><tbody>\n");
    for game in &games.games {
        out.push_str("<tr>");
        for cell in [
            text_or_dash(game.name.as_deref()),
            text_or_dash(game.provider.as_deref()),
            text_or_dash(game.category.as_deref()),
            number_or_dash(game.rtp),
            number_or_dash(game.revenue),
            number_or_dash(game.sessions),
            number_or_dash(game.trend),
        ] {
            out.push_str("<td>");
            out.push_str(&escape_html(&cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str(&format!(
        "</tbody></table><p>Showing {} of {} games</p></section>\n",
        games.games.len(),
        games.total_available
    ));
}

fn text_or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn number_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |number| number.to_string())
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

async fn get_index_html(State(hub): State<Arc<DashboardHub>>) -> Response {
    page_html(&hub, DashboardPage::ExecutiveSummary.route())
}

async fn get_page_html(
    State(hub): State<Arc<DashboardHub>>,
    Path(route): Path<String>,
) -> Response {
    page_html(&hub, &route)
}

fn page_html(hub: &DashboardHub, route: &str) -> Response {
    match hub.by_route(route) {
        Ok(dashboard) => {
            info!(
                component = "dashboard_http",
                event = "http.view.request",
                route = dashboard.page().route(),
                format = "html"
            );
            Html(render_dashboard_html(&dashboard.view())).into_response()
        }
        Err(_) => not_found_response(),
    }
}

async fn get_page_state(
    State(hub): State<Arc<DashboardHub>>,
    Path(route): Path<String>,
) -> Result<Json<DashboardView>, DashboardError> {
    let dashboard = hub.by_route(&route)?;
    info!(
        component = "dashboard_http",
        event = "http.view.request",
        route = dashboard.page().route(),
        format = "json"
    );
    Ok(Json(dashboard.view()))
}

/// Waits for any fetch the intent issued so the response reflects it.
async fn post_page_intent(
    State(hub): State<Arc<DashboardHub>>,
    Path(route): Path<String>,
    Json(intent): Json<Intent>,
) -> Result<Json<DashboardView>, DashboardError> {
    let dashboard = hub.by_route(&route)?;
    if let Some(fetch) = dashboard.dispatch(intent)? {
        if let Err(err) = fetch.await {
            warn!(
                component = "dashboard_http",
                event = "http.intent.fetch_join_failed",
                route = dashboard.page().route(),
                error = %err
            );
        }
    }
    Ok(Json(dashboard.view()))
}

async fn not_found() -> Response {
    not_found_response()
}

fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, Html(render_not_found_html())).into_response()
}
