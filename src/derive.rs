//! Local derivation: filtered and sorted view models computed from a payload.
//!
//! Everything here is a pure function of (payload, filters, sort). Filters
//! are conjunctive, a record lacking a filtered field never matches, and all
//! sorting is stable.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filters::{FilterSet, ALL};
use crate::pages::DashboardPage;
use crate::payload::{
    AlertRecord, DashboardPayload, GameRecord, PaymentMethodRecord, TopGameRecord, ALERTS,
    BUSINESS_HEALTH, BUSINESS_SCORECARD, DISTRIBUTION, ENGAGEMENT, FINANCIAL_KPIS, FRAUD_ALERTS,
    GAMES, JOURNEY_FUNNEL, KPI_DATA, METRICS, PAYMENT_METHODS, PLAYER_METRICS, PREDICTIVE_ANALYTICS,
    REVENUE_STREAMS, RISK_SCORE, STRATEGIC_PERFORMANCE, SYSTEM_STATUS, TOP_GAMES, TRANSACTION_FLOW,
};

pub const LEADERBOARD_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Stable sort on an optional numeric metric. Records without the metric go
/// after every record that has it, whichever direction is requested.
pub fn sort_by_metric<T, F>(records: &mut [T], order: SortOrder, metric: F)
where
    F: Fn(&T) -> Option<f64>,
{
    records.sort_by(|a, b| compare_optional(metric(a), metric(b), order));
}

fn compare_optional(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.total_cmp(&b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_text(a: Option<&str>, b: Option<&str>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.to_lowercase().cmp(&b.to_lowercase());
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameSortKey {
    #[default]
    Revenue,
    Sessions,
    Rtp,
    Retention,
    Trend,
    AvgSession,
    BetFreq,
    BonusRate,
    Name,
}

impl FromStr for GameSortKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "revenue" => Ok(Self::Revenue),
            "sessions" | "popularity" => Ok(Self::Sessions),
            "rtp" => Ok(Self::Rtp),
            "retention" => Ok(Self::Retention),
            "trend" => Ok(Self::Trend),
            "avgSession" => Ok(Self::AvgSession),
            "betFreq" => Ok(Self::BetFreq),
            "bonusRate" => Ok(Self::BonusRate),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown game sort key: {other}")),
        }
    }
}

impl GameSortKey {
    fn metric(self, game: &GameRecord) -> Option<f64> {
        match self {
            Self::Revenue => game.revenue,
            Self::Sessions => game.sessions,
            Self::Rtp => game.rtp,
            Self::Retention => game.retention,
            Self::Trend => game.trend,
            Self::AvgSession => game.avg_session,
            Self::BetFreq => game.bet_freq,
            Self::BonusRate => game.bonus_rate,
            Self::Name => None,
        }
    }
}

pub fn sort_games(games: &mut [GameRecord], key: GameSortKey, order: SortOrder) {
    match key {
        GameSortKey::Name => {
            games.sort_by(|a, b| compare_text(a.name.as_deref(), b.name.as_deref(), order))
        }
        metric_key => sort_by_metric(games, order, |game| metric_key.metric(game)),
    }
}

/// RTP bucket bounds: high is `[96, inf)`, medium `[94, 96)`, low `(-inf, 94)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtpBucket {
    High,
    Medium,
    Low,
}

impl RtpBucket {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn contains(self, rtp: f64) -> bool {
        match self {
            Self::High => rtp >= 96.0,
            Self::Medium => (94.0..96.0).contains(&rtp),
            Self::Low => rtp < 94.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Top,
    Rising,
    Declining,
    Underperforming,
}

impl PerformanceTier {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "top" => Some(Self::Top),
            "rising" => Some(Self::Rising),
            "declining" => Some(Self::Declining),
            "underperforming" => Some(Self::Underperforming),
            _ => None,
        }
    }

    pub fn matches(self, game: &GameRecord) -> bool {
        match self {
            Self::Top => game.revenue.is_some_and(|revenue| revenue >= 100_000.0),
            Self::Rising => game.trend.is_some_and(|trend| trend > 5.0),
            Self::Declining => game.trend.is_some_and(|trend| trend < -5.0),
            Self::Underperforming => game.revenue.is_some_and(|revenue| revenue < 50_000.0),
        }
    }
}

const CATEGORY_LABELS: [(&str, &str); 5] = [
    ("slots", "Slots"),
    ("table", "Table Games"),
    ("live", "Live Casino"),
    ("jackpot", "Jackpot"),
    ("poker", "Video Poker"),
];

const PROVIDER_LABELS: [(&str, &str); 8] = [
    ("netent", "NetEnt"),
    ("microgaming", "Microgaming"),
    ("pragmatic", "Pragmatic Play"),
    ("evolution", "Evolution Gaming"),
    ("playgo", "Play'n GO"),
    ("redtiger", "Red Tiger"),
    ("blueprint", "Blueprint Gaming"),
    ("btg", "Big Time Gaming"),
];

const VOLATILITY_LABELS: [(&str, &str); 3] =
    [("low", "Low"), ("medium", "Medium"), ("high", "High")];

fn label_for(table: &[(&str, &str)], value: &str) -> String {
    table
        .iter()
        .find(|(key, _)| *key == value)
        .map_or_else(|| value.to_string(), |(_, label)| (*label).to_string())
}

/// Game-page filters decoded from a [`FilterSet`]. `None` means unrestricted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFilters {
    pub category: Option<String>,
    pub provider: Option<String>,
    pub volatility: Option<String>,
    pub rtp: Option<String>,
    pub performance: Option<String>,
}

impl GameFilters {
    pub fn from_filter_set(filters: &FilterSet) -> Self {
        Self {
            category: filters
                .active("category")
                .map(|value| label_for(&CATEGORY_LABELS, value)),
            provider: filters
                .active("provider")
                .map(|value| label_for(&PROVIDER_LABELS, value)),
            volatility: filters
                .active("volatility")
                .map(|value| label_for(&VOLATILITY_LABELS, value)),
            rtp: filters.active("rtp").map(str::to_string),
            performance: filters.active("performance").map(str::to_string),
        }
    }

    pub fn matches(&self, game: &GameRecord) -> bool {
        text_matches(&self.category, game.category.as_deref())
            && text_matches(&self.provider, game.provider.as_deref())
            && text_matches(&self.volatility, game.volatility.as_deref())
            && self.rtp_matches(game)
            && self.performance_matches(game)
    }

    fn rtp_matches(&self, game: &GameRecord) -> bool {
        let Some(raw) = self.rtp.as_deref() else {
            return true;
        };
        match (RtpBucket::parse(raw), game.rtp) {
            (Some(bucket), Some(rtp)) => bucket.contains(rtp),
            _ => false,
        }
    }

    fn performance_matches(&self, game: &GameRecord) -> bool {
        let Some(raw) = self.performance.as_deref() else {
            return true;
        };
        PerformanceTier::parse(raw).is_some_and(|tier| tier.matches(game))
    }
}

fn text_matches(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual == Some(expected.as_str()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub total_games: usize,
    pub avg_rtp: Option<f64>,
    pub peak_sessions: Option<f64>,
    pub revenue_per_game: Option<f64>,
}

pub fn summarize_games(games: &[GameRecord]) -> GameSummary {
    let rtps: Vec<f64> = games.iter().filter_map(|game| game.rtp).collect();
    let revenues: Vec<f64> = games.iter().filter_map(|game| game.revenue).collect();

    GameSummary {
        total_games: games.len(),
        avg_rtp: mean(&rtps),
        peak_sessions: games
            .iter()
            .filter_map(|game| game.sessions)
            .max_by(f64::total_cmp),
        revenue_per_game: mean(&revenues),
    }
}

/// Ranking used by the leaderboard, independent of the table sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardMetric {
    #[default]
    Revenue,
    Popularity,
    Rtp,
}

impl LeaderboardMetric {
    fn sort_key(self) -> GameSortKey {
        match self {
            Self::Revenue => GameSortKey::Revenue,
            Self::Popularity => GameSortKey::Sessions,
            Self::Rtp => GameSortKey::Rtp,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub games: Vec<GameRecord>,
    pub leaderboard: Vec<GameRecord>,
    pub total_available: usize,
    pub summary: GameSummary,
    pub metrics: Map<String, Value>,
}

pub fn filter_games(games: &[GameRecord], filters: &GameFilters) -> Vec<GameRecord> {
    games
        .iter()
        .filter(|game| filters.matches(game))
        .cloned()
        .collect()
}

pub fn leaderboard(games: &[GameRecord], metric: LeaderboardMetric) -> Vec<GameRecord> {
    let mut ranked = games.to_vec();
    sort_games(&mut ranked, metric.sort_key(), SortOrder::Desc);
    ranked.truncate(LEADERBOARD_LIMIT);
    ranked
}

pub fn derive_game_view(
    payload: &DashboardPayload,
    filters: &FilterSet,
    key: GameSortKey,
    order: SortOrder,
    ranking: LeaderboardMetric,
) -> GameView {
    let all: Vec<GameRecord> = payload.typed_records(GAMES);
    let mut games = filter_games(&all, &GameFilters::from_filter_set(filters));
    sort_games(&mut games, key, order);

    GameView {
        leaderboard: leaderboard(&games, ranking),
        summary: summarize_games(&games),
        total_available: all.len(),
        metrics: payload.object(METRICS).clone(),
        games,
    }
}

/// Which alerts a feed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertFilter {
    All,
    Unacknowledged,
    Type(String),
    Severity(String),
}

impl AlertFilter {
    pub fn by_type(raw: Option<&str>) -> Self {
        match raw {
            None | Some(ALL) => Self::All,
            Some("unacknowledged") => Self::Unacknowledged,
            Some(other) => Self::Type(other.to_string()),
        }
    }

    pub fn by_severity(raw: Option<&str>) -> Self {
        match raw {
            None | Some(ALL) => Self::All,
            Some("unacknowledged") => Self::Unacknowledged,
            Some(other) => Self::Severity(other.to_string()),
        }
    }

    pub fn matches(&self, alert: &AlertRecord) -> bool {
        match self {
            Self::All => true,
            Self::Unacknowledged => alert.acknowledged != Some(true),
            Self::Type(expected) => alert.alert_type.as_deref() == Some(expected.as_str()),
            Self::Severity(expected) => alert.severity.as_deref() == Some(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub alerts: Vec<AlertRecord>,
    pub unacknowledged: usize,
    pub severity_counts: BTreeMap<String, usize>,
}

/// Counts are taken over the whole section, the list over the filtered part.
pub fn derive_alert_view(
    payload: &DashboardPayload,
    section: &str,
    filter: &AlertFilter,
) -> AlertView {
    let all: Vec<AlertRecord> = payload.typed_records(section);

    let mut severity_counts = BTreeMap::new();
    for alert in &all {
        if let Some(severity) = alert.severity.as_deref() {
            *severity_counts.entry(severity.to_string()).or_insert(0) += 1;
        }
    }

    AlertView {
        unacknowledged: all
            .iter()
            .filter(|alert| AlertFilter::Unacknowledged.matches(alert))
            .count(),
        alerts: all.into_iter().filter(|alert| filter.matches(alert)).collect(),
        severity_counts,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TopGameSortKey {
    #[default]
    Revenue,
    Players,
    Rtp,
    Sessions,
}

impl FromStr for TopGameSortKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "revenue" => Ok(Self::Revenue),
            "players" => Ok(Self::Players),
            "rtp" => Ok(Self::Rtp),
            "sessions" => Ok(Self::Sessions),
            other => Err(format!("unknown top games sort key: {other}")),
        }
    }
}

pub fn derive_top_games(
    payload: &DashboardPayload,
    key: TopGameSortKey,
    order: SortOrder,
) -> Vec<TopGameRecord> {
    let mut games: Vec<TopGameRecord> = payload.typed_records(TOP_GAMES);
    sort_by_metric(&mut games, order, |game| match key {
        TopGameSortKey::Revenue => game.revenue,
        TopGameSortKey::Players => game.active_players,
        TopGameSortKey::Rtp => game.rtp,
        TopGameSortKey::Sessions => game.sessions,
    });
    games
}

pub fn derive_payment_methods(payload: &DashboardPayload) -> Vec<PaymentMethodRecord> {
    let mut methods: Vec<PaymentMethodRecord> = payload.typed_records(PAYMENT_METHODS);
    sort_by_metric(&mut methods, SortOrder::Desc, |method| method.volume);
    methods
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsView {
    pub kpis: Map<String, Value>,
    pub transaction_flow: Vec<Value>,
    pub top_games: Vec<TopGameRecord>,
    pub alerts: AlertView,
    pub system_status: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialView {
    pub kpis: Vec<Value>,
    pub revenue_streams: Vec<Value>,
    pub fraud_alerts: AlertView,
    pub risk_score: Map<String, Value>,
    pub payment_methods: Vec<PaymentMethodRecord>,
}

/// Sections copied through as-is; missing ones become empty objects.
pub fn passthrough_sections(
    payload: &DashboardPayload,
    names: &[&str],
) -> BTreeMap<String, Value> {
    names
        .iter()
        .map(|name| {
            let value = payload
                .section(name)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            ((*name).to_string(), value)
        })
        .collect()
}

/// Active sort selection, validated against the page when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, order: SortOrder) -> Self {
        Self {
            key: key.into(),
            order,
        }
    }
}

/// Checks that `key` names a sortable metric on the page's list.
pub fn validate_sort_key(page: DashboardPage, key: &str) -> Result<(), String> {
    match page {
        DashboardPage::GamePerformance => GameSortKey::from_str(key).map(|_| ()),
        DashboardPage::RealTimeOperations => TopGameSortKey::from_str(key).map(|_| ()),
        other => Err(format!("{} has no sortable list", other.route())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewModel {
    Games(GameView),
    Operations(OperationsView),
    Financial(FinancialView),
    Sections(BTreeMap<String, Value>),
}

const PLAYER_SECTIONS: [&str; 4] = [PLAYER_METRICS, JOURNEY_FUNNEL, DISTRIBUTION, ENGAGEMENT];

const EXECUTIVE_SECTIONS: [&str; 4] = [
    BUSINESS_HEALTH,
    STRATEGIC_PERFORMANCE,
    BUSINESS_SCORECARD,
    PREDICTIVE_ANALYTICS,
];

/// Builds the page's view model. Pure: equal inputs give equal output.
pub fn derive_view(
    page: DashboardPage,
    payload: &DashboardPayload,
    filters: &FilterSet,
    sort: Option<&SortSpec>,
    ranking: LeaderboardMetric,
) -> ViewModel {
    let order = sort.map_or(SortOrder::Desc, |spec| spec.order);
    match page {
        DashboardPage::GamePerformance => {
            let key = sort
                .and_then(|spec| spec.key.parse().ok())
                .unwrap_or_default();
            ViewModel::Games(derive_game_view(payload, filters, key, order, ranking))
        }
        DashboardPage::RealTimeOperations => {
            let key = sort
                .and_then(|spec| spec.key.parse().ok())
                .unwrap_or_default();
            ViewModel::Operations(OperationsView {
                kpis: payload.object(KPI_DATA).clone(),
                transaction_flow: payload.records(TRANSACTION_FLOW).to_vec(),
                top_games: derive_top_games(payload, key, order),
                alerts: derive_alert_view(
                    payload,
                    ALERTS,
                    &AlertFilter::by_type(filters.get("alertType")),
                ),
                system_status: payload.object(SYSTEM_STATUS).clone(),
            })
        }
        DashboardPage::FinancialPerformance => ViewModel::Financial(FinancialView {
            kpis: payload.records(FINANCIAL_KPIS).to_vec(),
            revenue_streams: payload.records(REVENUE_STREAMS).to_vec(),
            fraud_alerts: derive_alert_view(
                payload,
                FRAUD_ALERTS,
                &AlertFilter::by_severity(filters.get("severity")),
            ),
            risk_score: payload.object(RISK_SCORE).clone(),
            payment_methods: derive_payment_methods(payload),
        }),
        DashboardPage::PlayerAnalytics => {
            ViewModel::Sections(passthrough_sections(payload, &PLAYER_SECTIONS))
        }
        DashboardPage::ExecutiveSummary => {
            ViewModel::Sections(passthrough_sections(payload, &EXECUTIVE_SECTIONS))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::normalize_value;
    use serde_json::json;

    fn game(name: &str, category: &str, provider: &str, rtp: f64, revenue: f64) -> GameRecord {
        GameRecord {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            provider: Some(provider.to_string()),
            rtp: Some(rtp),
            revenue: Some(revenue),
            ..GameRecord::default()
        }
    }

    fn names(games: &[GameRecord]) -> Vec<&str> {
        games.iter().filter_map(|game| game.name.as_deref()).collect()
    }

    #[test]
    fn filters_are_conjunctive() {
        let games = vec![
            game("Starburst", "Slots", "NetEnt", 96.1, 125_000.0),
            game("Mega Moolah", "Slots", "Microgaming", 88.1, 98_000.0),
        ];
        let filters = FilterSet::default()
            .with("category", "Slots")
            .with("provider", "NetEnt");

        let matched = filter_games(&games, &GameFilters::from_filter_set(&filters));
        assert_eq!(names(&matched), vec!["Starburst"]);
    }

    #[test]
    fn filter_keys_map_to_display_labels() {
        let games = vec![
            game("Lightning Roulette", "Live Casino", "Evolution Gaming", 97.3, 156_000.0),
            game("Book of Dead", "Slots", "Play'n GO", 94.2, 87_500.0),
        ];
        let filters = FilterSet::default()
            .with("category", "live")
            .with("provider", "evolution");

        let matched = filter_games(&games, &GameFilters::from_filter_set(&filters));
        assert_eq!(names(&matched), vec!["Lightning Roulette"]);
    }

    #[test]
    fn high_rtp_bucket_includes_exactly_96() {
        let games = vec![
            game("edge", "Slots", "NetEnt", 96.0, 1.0),
            game("below", "Slots", "NetEnt", 95.99, 1.0),
        ];
        let filters = FilterSet::default().with("rtp", "high");

        let matched = filter_games(&games, &GameFilters::from_filter_set(&filters));
        assert_eq!(names(&matched), vec!["edge"]);
    }

    #[test]
    fn rtp_buckets_partition_the_range() {
        for rtp in [88.1, 93.99, 94.0, 95.99, 96.0, 99.5] {
            let hits = [RtpBucket::High, RtpBucket::Medium, RtpBucket::Low]
                .iter()
                .filter(|bucket| bucket.contains(rtp))
                .count();
            assert_eq!(hits, 1, "rtp {rtp} should fall into exactly one bucket");
        }
        assert!(RtpBucket::Medium.contains(94.0));
        assert!(RtpBucket::Low.contains(93.99));
    }

    #[test]
    fn missing_field_never_matches_an_active_filter() {
        let games = vec![GameRecord {
            name: Some("mystery".to_string()),
            ..GameRecord::default()
        }];

        for (key, value) in [
            ("category", "slots"),
            ("provider", "netent"),
            ("volatility", "high"),
            ("rtp", "low"),
            ("performance", "declining"),
        ] {
            let filters = FilterSet::default().with(key, value);
            assert!(
                filter_games(&games, &GameFilters::from_filter_set(&filters)).is_empty(),
                "{key}={value} should not match a record without the field"
            );
        }

        let unrestricted = FilterSet::default().with("category", ALL);
        assert_eq!(
            filter_games(&games, &GameFilters::from_filter_set(&unrestricted)).len(),
            1
        );
    }

    #[test]
    fn performance_tiers_use_documented_thresholds() {
        let mut rising = game("rising", "Slots", "NetEnt", 96.0, 40_000.0);
        rising.trend = Some(5.1);
        let mut flat = game("flat", "Slots", "NetEnt", 96.0, 100_000.0);
        flat.trend = Some(5.0);

        assert!(PerformanceTier::Rising.matches(&rising));
        assert!(!PerformanceTier::Rising.matches(&flat));
        assert!(PerformanceTier::Top.matches(&flat));
        assert!(PerformanceTier::Underperforming.matches(&rising));
        assert!(!PerformanceTier::Declining.matches(&flat));
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut games = vec![
            game("a", "Slots", "NetEnt", 96.5, 10.0),
            game("b", "Slots", "NetEnt", 96.5, 30.0),
            game("c", "Slots", "NetEnt", 96.5, 20.0),
            game("d", "Slots", "NetEnt", 94.0, 40.0),
        ];

        sort_games(&mut games, GameSortKey::Rtp, SortOrder::Desc);
        assert_eq!(names(&games), vec!["a", "b", "c", "d"]);

        sort_games(&mut games, GameSortKey::Rtp, SortOrder::Asc);
        assert_eq!(names(&games), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn records_missing_the_sort_field_go_last_both_ways() {
        let mut games = vec![
            GameRecord {
                name: Some("unknown".to_string()),
                ..GameRecord::default()
            },
            game("low", "Slots", "NetEnt", 90.0, 1.0),
            game("high", "Slots", "NetEnt", 99.0, 2.0),
        ];

        sort_games(&mut games, GameSortKey::Revenue, SortOrder::Asc);
        assert_eq!(names(&games), vec!["low", "high", "unknown"]);
        sort_games(&mut games, GameSortKey::Revenue, SortOrder::Desc);
        assert_eq!(names(&games), vec!["high", "low", "unknown"]);
    }

    #[test]
    fn derive_game_view_is_deterministic() {
        let payload = normalize_value(json!({
            "games": [
                {"name": "Starburst", "category": "Slots", "provider": "NetEnt", "rtp": 96.1, "revenue": 125000, "sessions": 15420},
                {"name": "Gonzo's Quest", "category": "Slots", "provider": "NetEnt", "rtp": 95.9, "revenue": 95000, "sessions": 11200},
                {"name": "Blackjack Classic", "category": "Table Games", "provider": "NetEnt", "rtp": 99.4, "revenue": 78000, "sessions": 4560}
            ]
        }))
        .unwrap();
        let filters = FilterSet::default().with("provider", "netent").with("category", "slots");

        let first = derive_game_view(
            &payload,
            &filters,
            GameSortKey::Revenue,
            SortOrder::Desc,
            LeaderboardMetric::Revenue,
        );
        let second = derive_game_view(
            &payload,
            &filters,
            GameSortKey::Revenue,
            SortOrder::Desc,
            LeaderboardMetric::Revenue,
        );

        assert_eq!(first, second);
        assert_eq!(first.total_available, 3);
        assert_eq!(names(&first.games), vec!["Starburst", "Gonzo's Quest"]);
        assert_eq!(first.summary.total_games, 2);
        assert_eq!(first.summary.peak_sessions, Some(15420.0));
        assert_eq!(first.summary.revenue_per_game, Some(110_000.0));
    }

    #[test]
    fn leaderboard_keeps_top_fifteen_descending() {
        let games: Vec<GameRecord> = (0..20)
            .map(|idx| game(&format!("g{idx}"), "Slots", "NetEnt", 95.0, idx as f64))
            .collect();

        let top = leaderboard(&games, LeaderboardMetric::Revenue);
        assert_eq!(top.len(), LEADERBOARD_LIMIT);
        assert_eq!(top[0].name.as_deref(), Some("g19"));
        assert_eq!(top[14].name.as_deref(), Some("g5"));
    }

    #[test]
    fn leaderboard_ignores_the_table_sort() {
        let payload = normalize_value(json!({
            "games": [
                {"name": "Zeta", "revenue": 10, "sessions": 900, "rtp": 94.0},
                {"name": "Alpha", "revenue": 900000, "sessions": 50, "rtp": 96.5},
                {"name": "Mid", "revenue": 5000, "sessions": 300, "rtp": 97.2}
            ],
            "metrics": {"totalRevenue": 905010}
        }))
        .unwrap();
        let filters = FilterSet::default();
        let by_name = SortSpec::new("name", SortOrder::Asc);

        let view = |ranking| match derive_view(
            DashboardPage::GamePerformance,
            &payload,
            &filters,
            Some(&by_name),
            ranking,
        ) {
            ViewModel::Games(view) => view,
            other => panic!("expected games view, got {other:?}"),
        };

        let revenue = view(LeaderboardMetric::Revenue);
        assert_eq!(names(&revenue.games), vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(names(&revenue.leaderboard), vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(revenue.metrics["totalRevenue"], json!(905010));

        let popularity = view(LeaderboardMetric::Popularity);
        assert_eq!(names(&popularity.leaderboard), vec!["Zeta", "Mid", "Alpha"]);
        let rtp = view(LeaderboardMetric::Rtp);
        assert_eq!(names(&rtp.leaderboard), vec!["Mid", "Alpha", "Zeta"]);
        assert_eq!(names(&rtp.games), vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn missing_metrics_section_reads_as_empty_object() {
        let payload = normalize_value(json!({"games": []})).unwrap();
        let view = derive_game_view(
            &payload,
            &FilterSet::default(),
            GameSortKey::Revenue,
            SortOrder::Desc,
            LeaderboardMetric::Revenue,
        );
        assert!(view.metrics.is_empty());
    }

    #[test]
    fn summary_of_nothing_has_no_averages() {
        let summary = summarize_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.avg_rtp, None);
        assert_eq!(summary.peak_sessions, None);
    }

    #[test]
    fn alert_view_filters_and_counts() {
        let payload = normalize_value(json!({
            "alerts": [
                {"id": 1, "type": "critical", "severity": "critical", "acknowledged": false},
                {"id": 2, "type": "warning", "severity": "high", "acknowledged": true},
                {"id": 3, "type": "critical", "severity": "critical", "acknowledged": true}
            ]
        }))
        .unwrap();

        let critical = derive_alert_view(&payload, ALERTS, &AlertFilter::by_type(Some("critical")));
        assert_eq!(critical.alerts.len(), 2);
        assert_eq!(critical.unacknowledged, 1);
        assert_eq!(critical.severity_counts.get("critical"), Some(&2));

        let fresh = derive_alert_view(&payload, ALERTS, &AlertFilter::by_type(Some("unacknowledged")));
        assert_eq!(fresh.alerts.len(), 1);

        let high = derive_alert_view(&payload, ALERTS, &AlertFilter::by_severity(Some("high")));
        assert_eq!(high.alerts.len(), 1);

        let empty = derive_alert_view(&payload, FRAUD_ALERTS, &AlertFilter::All);
        assert!(empty.alerts.is_empty());
    }

    #[test]
    fn top_games_sort_by_selected_metric() {
        let payload = normalize_value(json!({
            "topGames": [
                {"name": "a", "revenue": 10, "activePlayers": 300},
                {"name": "b", "revenue": 30, "activePlayers": 100},
                {"name": "c", "revenue": 20, "activePlayers": 200}
            ]
        }))
        .unwrap();

        let by_revenue = derive_top_games(&payload, TopGameSortKey::Revenue, SortOrder::Desc);
        let by_players = derive_top_games(&payload, TopGameSortKey::Players, SortOrder::Desc);

        let revenue_names: Vec<_> = by_revenue.iter().filter_map(|g| g.name.as_deref()).collect();
        let player_names: Vec<_> = by_players.iter().filter_map(|g| g.name.as_deref()).collect();
        assert_eq!(revenue_names, vec!["b", "c", "a"]);
        assert_eq!(player_names, vec!["a", "c", "b"]);
    }

    #[test]
    fn passthrough_fills_missing_sections() {
        let payload = normalize_value(json!({"playerMetrics": {"dau": 10}})).unwrap();
        let sections = passthrough_sections(&payload, &["playerMetrics", "engagement"]);
        assert_eq!(sections["playerMetrics"], json!({"dau": 10}));
        assert_eq!(sections["engagement"], json!({}));
    }

    #[test]
    fn derive_view_dispatches_per_page() {
        let payload = normalize_value(json!({
            "kpiData": {"activePlayers": {"value": 1200}},
            "fraudAlerts": [{"severity": "high", "acknowledged": false}],
            "paymentMethodData": [{"method": "card", "volume": 10}, {"method": "wallet", "volume": 90}],
            "businessHealth": {"score": 87}
        }))
        .unwrap();
        let filters = FilterSet::default();
        let ranking = LeaderboardMetric::default();

        match derive_view(DashboardPage::RealTimeOperations, &payload, &filters, None, ranking) {
            ViewModel::Operations(view) => {
                assert!(view.kpis.contains_key("activePlayers"));
                assert!(view.top_games.is_empty());
                assert!(view.system_status.is_empty());
            }
            other => panic!("expected operations view, got {other:?}"),
        }

        match derive_view(DashboardPage::FinancialPerformance, &payload, &filters, None, ranking) {
            ViewModel::Financial(view) => {
                assert_eq!(view.fraud_alerts.unacknowledged, 1);
                assert_eq!(view.payment_methods[0].method.as_deref(), Some("wallet"));
            }
            other => panic!("expected financial view, got {other:?}"),
        }

        match derive_view(DashboardPage::ExecutiveSummary, &payload, &filters, None, ranking) {
            ViewModel::Sections(sections) => {
                assert_eq!(sections["businessHealth"], json!({"score": 87}));
                assert_eq!(sections["predictiveAnalytics"], json!({}));
            }
            other => panic!("expected sections, got {other:?}"),
        }
    }

    #[test]
    fn sort_keys_are_validated_per_page() {
        assert!(validate_sort_key(DashboardPage::GamePerformance, "bonusRate").is_ok());
        assert!(validate_sort_key(DashboardPage::RealTimeOperations, "players").is_ok());
        assert!(validate_sort_key(DashboardPage::GamePerformance, "players").is_err());
        assert!(validate_sort_key(DashboardPage::PlayerAnalytics, "revenue").is_err());
    }
}
