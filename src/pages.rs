//! The five dashboard pages and what each one is parameterized by.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::derive::SortOrder;
use crate::filters::{FilterField, FilterSchema, ALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardPage {
    RealTimeOperations,
    PlayerAnalytics,
    FinancialPerformance,
    GamePerformance,
    ExecutiveSummary,
}

const GAME_FIELDS: [FilterField; 5] = [
    FilterField::new(
        "category",
        ALL,
        &[ALL, "slots", "table", "live", "jackpot", "poker"],
    ),
    FilterField::new(
        "provider",
        ALL,
        &[
            ALL,
            "netent",
            "microgaming",
            "pragmatic",
            "evolution",
            "playgo",
            "redtiger",
            "blueprint",
            "btg",
        ],
    ),
    FilterField::new("volatility", ALL, &[ALL, "low", "medium", "high"]),
    FilterField::new("rtp", ALL, &[ALL, "high", "medium", "low"]),
    FilterField::new(
        "performance",
        ALL,
        &[ALL, "top", "rising", "declining", "underperforming"],
    ),
];

const REAL_TIME_FIELDS: [FilterField; 1] = [FilterField::new(
    "alertType",
    ALL,
    &[ALL, "unacknowledged", "critical", "warning"],
)];

const FINANCIAL_FIELDS: [FilterField; 1] = [FilterField::new(
    "severity",
    ALL,
    &[ALL, "critical", "high", "medium", "low"],
)];

const PLAYER_FIELDS: [FilterField; 6] = [
    FilterField::new(
        "playerSegment",
        ALL,
        &[ALL, "new", "casual", "regular", "vip", "churned"],
    ),
    FilterField::new(
        "gameCategory",
        ALL,
        &[ALL, "slots", "table", "live", "sports", "poker"],
    ),
    FilterField::new(
        "registrationPeriod",
        "30d",
        &["7d", "30d", "90d", "180d", "1y", "all"],
    ),
    FilterField::new("activityLevel", ALL, &[ALL, "high", "medium", "low", "inactive"]),
    FilterField::new(
        "spendingTier",
        ALL,
        &[ALL, "whale", "high", "medium", "low", "free"],
    ),
    FilterField::new("deviceType", ALL, &[ALL, "desktop", "mobile", "tablet"]),
];

const EXECUTIVE_FIELDS: [FilterField; 1] = [FilterField::new(
    "department",
    ALL,
    &[ALL, "financial", "operations", "player", "compliance"],
)];

const REFRESH_OPTIONS_SECS: [u64; 7] = [5, 10, 30, 60, 300, 1800, 3600];

impl DashboardPage {
    pub const ALL: [DashboardPage; 5] = [
        DashboardPage::ExecutiveSummary,
        DashboardPage::RealTimeOperations,
        DashboardPage::FinancialPerformance,
        DashboardPage::GamePerformance,
        DashboardPage::PlayerAnalytics,
    ];

    pub fn route(self) -> &'static str {
        match self {
            Self::RealTimeOperations => "real-time-operations-command-center",
            Self::PlayerAnalytics => "player-analytics-behavior-dashboard",
            Self::FinancialPerformance => "financial-performance-risk-management-dashboard",
            Self::GamePerformance => "game-performance-revenue-analytics",
            Self::ExecutiveSummary => "executive-summary-strategic-insights-dashboard",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        let route = route.trim_matches('/');
        Self::ALL.into_iter().find(|page| page.route() == route)
    }

    /// Remote operation name the page fetches through.
    pub fn operation(self) -> &'static str {
        match self {
            Self::RealTimeOperations => "get-real-time-data",
            Self::PlayerAnalytics => "get-player-analytics",
            Self::FinancialPerformance => "get-financial-performance",
            Self::GamePerformance => "get-game-performance",
            Self::ExecutiveSummary => "get-executive-summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::RealTimeOperations => "Real-Time Operations Command Center",
            Self::PlayerAnalytics => "Player Analytics & Behavior",
            Self::FinancialPerformance => "Financial Performance & Risk Management",
            Self::GamePerformance => "Game Performance & Revenue Analytics",
            Self::ExecutiveSummary => "Executive Summary & Strategic Insights",
        }
    }

    pub fn default_refresh_interval(self) -> Duration {
        Duration::from_secs(match self {
            Self::RealTimeOperations => 5,
            Self::FinancialPerformance => 60,
            Self::GamePerformance => 300,
            Self::PlayerAnalytics => 30 * 60,
            Self::ExecutiveSummary => 60 * 60,
        })
    }

    pub fn refresh_interval_options(self) -> &'static [u64] {
        &REFRESH_OPTIONS_SECS
    }

    pub fn page_filter_fields(self) -> &'static [FilterField] {
        match self {
            Self::RealTimeOperations => &REAL_TIME_FIELDS,
            Self::PlayerAnalytics => &PLAYER_FIELDS,
            Self::FinancialPerformance => &FINANCIAL_FIELDS,
            Self::GamePerformance => &GAME_FIELDS,
            Self::ExecutiveSummary => &EXECUTIVE_FIELDS,
        }
    }

    pub fn filter_schema(self) -> FilterSchema {
        FilterSchema::with_page_fields(self.page_filter_fields())
    }

    /// Initial sort key and order for the page's sortable list, if any.
    pub fn default_sort(self) -> Option<(&'static str, SortOrder)> {
        match self {
            Self::GamePerformance | Self::RealTimeOperations => Some(("revenue", SortOrder::Desc)),
            Self::PlayerAnalytics | Self::FinancialPerformance | Self::ExecutiveSummary => None,
        }
    }
}
