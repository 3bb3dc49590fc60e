use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextMatchType {
    /// substring match
    #[default]
    Include,
    /// rows not containing the substring
    Exclude,
    Exact,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextFilter {
    pub r#match: TextMatchType,
    pub value: String,
}

impl TextFilter {
    pub fn include(value: impl Into<String>) -> Self {
        Self {
            r#match: TextMatchType::Include,
            value: value.into(),
        }
    }
}

/// Member of a list filter, a string or a number as given in the location
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Text(String),
    Number(serde_json::Number),
}

impl From<&str> for ListItem {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ListItem {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ListItem {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// Constraint on a single column
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Text(TextFilter),
    NumberRange { min: Option<f64>, max: Option<f64> },
    DateRange { from: Option<Date>, to: Option<Date> },
    OneOf(Vec<ListItem>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(TextFilter::include(value))
    }

    /// Filters that constrain nothing are dropped instead of stored.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(filter) => filter.value.trim().is_empty(),
            Self::NumberRange { min, max } => min.is_none() && max.is_none(),
            Self::DateRange { from, to } => from.is_none() && to.is_none(),
            Self::OneOf(values) => values.is_empty(),
        }
    }
}
