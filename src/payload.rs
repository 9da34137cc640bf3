//! Dashboard payloads and the mapping from raw backend responses into them.
//!
//! Every section is optional. Accessors hand back empty collections for
//! missing or mistyped sections so views never deal with absent data.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub const KPI_DATA: &str = "kpiData";
pub const TRANSACTION_FLOW: &str = "transactionFlowData";
pub const TOP_GAMES: &str = "topGames";
pub const ALERTS: &str = "alerts";
pub const SYSTEM_STATUS: &str = "systemStatus";
pub const GAMES: &str = "games";
pub const METRICS: &str = "metrics";
pub const FINANCIAL_KPIS: &str = "financialKPIs";
pub const REVENUE_STREAMS: &str = "revenueStreamData";
pub const FRAUD_ALERTS: &str = "fraudAlerts";
pub const RISK_SCORE: &str = "riskScore";
pub const PAYMENT_METHODS: &str = "paymentMethodData";
pub const PLAYER_METRICS: &str = "playerMetrics";
pub const JOURNEY_FUNNEL: &str = "journeyFunnel";
pub const DISTRIBUTION: &str = "distribution";
pub const ENGAGEMENT: &str = "engagement";
pub const BUSINESS_HEALTH: &str = "businessHealth";
pub const STRATEGIC_PERFORMANCE: &str = "strategicPerformance";
pub const BUSINESS_SCORECARD: &str = "businessScorecard";
pub const PREDICTIVE_ANALYTICS: &str = "predictiveAnalytics";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend reported an error: {0}")]
    Remote(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Message safe to show to a viewer; never includes the underlying error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => {
                "Unable to reach the analytics service. Showing the last loaded data."
            }
            Self::Status { .. } | Self::Remote(_) => {
                "The analytics service could not load this dashboard. Showing the last loaded data."
            }
            Self::Malformed(_) => {
                "The analytics service sent data that could not be read. Showing the last loaded data."
            }
        }
    }
}

/// Normalized response document for one dashboard, keyed by section name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardPayload {
    sections: Map<String, Value>,
}

impl DashboardPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, name: &str, value: Value) -> Self {
        if !value.is_null() {
            self.sections.insert(name.to_string(), value);
        }
        self
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Array section, or an empty slice when missing or not an array.
    pub fn records(&self, name: &str) -> &[Value] {
        match self.sections.get(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Object section, or an empty map when missing or not an object.
    pub fn object(&self, name: &str) -> &Map<String, Value> {
        match self.sections.get(name) {
            Some(Value::Object(map)) => map,
            _ => empty_map(),
        }
    }

    /// Decodes each array entry, skipping entries that do not fit `T`.
    pub fn typed_records<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        self.records(name)
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match T::deserialize(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(
                        component = "payload",
                        event = "payload.record.skipped",
                        section = name,
                        index = idx,
                        error = %err
                    );
                    None
                }
            })
            .collect()
    }
}

fn empty_map() -> &'static Map<String, Value> {
    static EMPTY: OnceLock<Map<String, Value>> = OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

/// Maps a raw response body into a payload.
///
/// A top-level object carrying only an `error` string is a remote failure.
/// Null sections are dropped so they read the same as missing ones.
pub fn normalize_payload(raw: &[u8]) -> Result<DashboardPayload, FetchError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|err| FetchError::Malformed(err.to_string()))?;
    normalize_value(value)
}

pub fn normalize_value(value: Value) -> Result<DashboardPayload, FetchError> {
    let Value::Object(map) = value else {
        return Err(FetchError::Malformed(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    if let Some(message) = remote_error_message(&map) {
        return Err(FetchError::Remote(message));
    }

    let sections = map
        .into_iter()
        .filter(|(_, section)| !section.is_null())
        .collect();

    Ok(DashboardPayload { sections })
}

fn remote_error_message(map: &Map<String, Value>) -> Option<String> {
    if map.len() != 1 {
        return None;
    }
    match map.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        _ => None,
    }
}

/// Row of the `games` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameRecord {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub provider: Option<String>,
    pub category: Option<String>,
    pub volatility: Option<String>,
    pub revenue: Option<f64>,
    pub rtp: Option<f64>,
    pub sessions: Option<f64>,
    pub avg_session: Option<f64>,
    pub bet_freq: Option<f64>,
    pub bonus_rate: Option<f64>,
    pub retention: Option<f64>,
    pub trend: Option<f64>,
}

/// Row of the `topGames` section on the operations page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopGameRecord {
    #[serde(alias = "game_id")]
    pub id: Option<Value>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub provider: Option<String>,
    #[serde(alias = "gross_gaming_revenue")]
    pub revenue: Option<f64>,
    #[serde(alias = "unique_players_count")]
    pub active_players: Option<f64>,
    #[serde(alias = "total_sessions")]
    pub sessions: Option<f64>,
    pub rtp: Option<f64>,
    pub status: Option<String>,
}

/// Row of the `alerts` and `fraudAlerts` sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertRecord {
    #[serde(alias = "alert_id")]
    pub id: Option<Value>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    #[serde(alias = "account_id")]
    pub account_id: Option<String>,
    #[serde(alias = "created_at")]
    pub timestamp: Option<String>,
    #[serde(alias = "is_acknowledged")]
    pub acknowledged: Option<bool>,
}

/// Row of the `paymentMethodData` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentMethodRecord {
    pub method: Option<String>,
    pub volume: Option<f64>,
    pub count: Option<f64>,
    pub percentage: Option<f64>,
    pub success_rate: Option<f64>,
    pub avg_amount: Option<f64>,
    pub risk_level: Option<String>,
}
