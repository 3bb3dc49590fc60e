use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    #[strum(serialize = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    #[strum(serialize = "desc")]
    Descending,
}

impl SortDirection {
    /// Direction following `current` when a column header is clicked:
    /// unsorted -> ascending -> descending -> unsorted
    pub fn next(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Ascending),
            Some(Self::Ascending) => Some(Self::Descending),
            Some(Self::Descending) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ViewMode {
    #[serde(rename = "table")]
    #[strum(serialize = "table")]
    Table,
    #[serde(rename = "card")]
    #[strum(serialize = "card")]
    Card,
}
