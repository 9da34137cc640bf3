//! Filter state: schema-backed filter sets, merge/reset, and quick presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel meaning "no restriction" for a filter key.
pub const ALL: &str = "all";

/// A single filter key with its default and allowed values.
///
/// An empty `options` slice accepts any non-empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub key: &'static str,
    pub default: &'static str,
    pub options: &'static [&'static str],
}

impl FilterField {
    pub const fn new(
        key: &'static str,
        default: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            default,
            options,
        }
    }

    fn accepts(&self, value: &str) -> bool {
        if self.options.is_empty() {
            !value.trim().is_empty()
        } else {
            self.options.contains(&value)
        }
    }
}

pub const TIME_RANGE: &str = "timeRange";
pub const CURRENCY: &str = "currency";
pub const OPERATOR: &str = "operator";
pub const REGION: &str = "region";

pub const GLOBAL_FILTER_FIELDS: [FilterField; 4] = [
    FilterField::new(
        TIME_RANGE,
        "24h",
        &["1h", "6h", "24h", "7d", "30d", "custom"],
    ),
    FilterField::new(CURRENCY, "USD", &["USD", "EUR", "GBP", "JPY", "CAD"]),
    FilterField::new(OPERATOR, ALL, &[ALL, "op1", "op2", "op3", "op4"]),
    FilterField::new(REGION, ALL, &[ALL, "na", "eu", "asia", "latam"]),
];

/// A named combination of global filter values selectable as one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub label: &'static str,
    pub values: &'static [(&'static str, &'static str)],
}

pub static QUICK_PRESETS: [Preset; 3] = [
    Preset {
        label: "Live",
        values: &[
            (TIME_RANGE, "1h"),
            (CURRENCY, "USD"),
            (OPERATOR, ALL),
            (REGION, ALL),
        ],
    },
    Preset {
        label: "Today",
        values: &[
            (TIME_RANGE, "24h"),
            (CURRENCY, "USD"),
            (OPERATOR, ALL),
            (REGION, ALL),
        ],
    },
    Preset {
        label: "Week",
        values: &[
            (TIME_RANGE, "7d"),
            (CURRENCY, "USD"),
            (OPERATOR, ALL),
            (REGION, ALL),
        ],
    },
];

pub fn find_preset(label: &str) -> Option<&'static Preset> {
    QUICK_PRESETS
        .iter()
        .find(|preset| preset.label.eq_ignore_ascii_case(label))
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter key: {0}")]
    UnknownKey(String),
    #[error("invalid value {value:?} for filter {key}")]
    InvalidValue { key: String, value: String },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Current filter selection keyed by filter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    values: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Missing keys count as unrestricted.
    pub fn is_all(&self, key: &str) -> bool {
        self.get(key).map_or(true, |value| value == ALL)
    }

    /// The selected value, or `None` when the key is unrestricted.
    pub fn active(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| *value != ALL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// The set of filter keys a page exposes: the global bar plus page fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSchema {
    fields: Vec<FilterField>,
}

impl FilterSchema {
    pub fn new(fields: impl IntoIterator<Item = FilterField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn global() -> Self {
        Self::new(GLOBAL_FILTER_FIELDS)
    }

    pub fn with_page_fields(page_fields: &[FilterField]) -> Self {
        Self::new(
            GLOBAL_FILTER_FIELDS
                .iter()
                .chain(page_fields.iter())
                .copied(),
        )
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn defaults(&self) -> FilterSet {
        self.fields
            .iter()
            .map(|field| (field.key, field.default))
            .collect()
    }

    /// Merges one key; every other key keeps its current value.
    pub fn update_filter(
        &self,
        current: &FilterSet,
        key: &str,
        value: &str,
    ) -> Result<FilterSet, FilterError> {
        let field = self
            .field(key)
            .ok_or_else(|| FilterError::UnknownKey(key.to_string()))?;
        if !field.accepts(value) {
            return Err(FilterError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }

        Ok(current.clone().with(key, value))
    }

    pub fn reset_filters(&self) -> FilterSet {
        self.defaults()
    }

    /// Replaces every global key at once. Global keys the preset does not
    /// name fall back to their defaults; page keys are left alone.
    pub fn apply_preset(
        &self,
        current: &FilterSet,
        preset: &Preset,
    ) -> Result<FilterSet, FilterError> {
        let mut next = current.clone();
        for (key, value) in self.preset_scope(preset)? {
            next = next.with(key, value);
        }
        Ok(next)
    }

    /// Exact match over the preset's full scope, not just the keys it names.
    pub fn matches_preset(&self, current: &FilterSet, preset: &Preset) -> bool {
        match self.preset_scope(preset) {
            Ok(scope) => scope
                .into_iter()
                .all(|(key, value)| current.get(key) == Some(value)),
            Err(_) => false,
        }
    }

    pub fn active_preset(
        &self,
        current: &FilterSet,
        presets: &'static [Preset],
    ) -> Option<&'static Preset> {
        presets
            .iter()
            .find(|preset| self.matches_preset(current, preset))
    }

    pub fn active_filter_count(&self, current: &FilterSet) -> usize {
        self.fields
            .iter()
            .filter(|field| current.get(field.key).unwrap_or(field.default) != field.default)
            .count()
    }

    pub fn has_active_filters(&self, current: &FilterSet) -> bool {
        self.active_filter_count(current) > 0
    }

    fn preset_scope(
        &self,
        preset: &Preset,
    ) -> Result<Vec<(&'static str, &'static str)>, FilterError> {
        for (key, value) in preset.values {
            let field = GLOBAL_FILTER_FIELDS
                .iter()
                .find(|field| field.key == *key)
                .ok_or_else(|| FilterError::UnknownKey((*key).to_string()))?;
            if !field.accepts(value) {
                return Err(FilterError::InvalidValue {
                    key: (*key).to_string(),
                    value: (*value).to_string(),
                });
            }
        }

        Ok(GLOBAL_FILTER_FIELDS
            .iter()
            .filter(|field| self.field(field.key).is_some())
            .map(|field| {
                let value = preset
                    .values
                    .iter()
                    .find(|(key, _)| *key == field.key)
                    .map_or(field.default, |(_, value)| *value);
                (field.key, value)
            })
            .collect())
    }
}
