//! Bidirectional mapping between [`QueryState`] and the URL query string.
//!
//! Structured fields (`sort`, `filters`) are carried as JSON. Decoding never
//! fails: every parameter is validated on its own and replaced by its default
//! when it is malformed, so one corrupt field never invalidates the others.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use url::form_urlencoded;

use crate::model::common::{SortDirection, ViewMode};
use crate::model::list_filter::FilterValue;
use crate::model::query_state::{PageSizes, QueryState, SortEntry};

mod dto;
mod mapper;


use dto::FilterValueDTO;

pub const PARAM_SORT: &str = "sort";
pub const PARAM_FILTERS: &str = "filters";
pub const PARAM_SEARCH: &str = "search";
pub const PARAM_RESTRICT: &str = "restrict";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_RESULTS: &str = "results";
pub const PARAM_VIEW: &str = "view";

#[derive(Clone, Debug, Default)]
pub struct QueryStringCodec {
    page_sizes: PageSizes,
}

impl QueryStringCodec {
    pub fn new(page_sizes: PageSizes) -> Self {
        Self { page_sizes }
    }

    pub fn page_sizes(&self) -> &PageSizes {
        &self.page_sizes
    }

    /// Encodes `state`, omitting every field that holds its default value
    pub fn encode(&self, state: &QueryState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if let Some(view) = state.view {
            serializer.append_pair(PARAM_VIEW, &view.to_string());
        }
        if let Some(search) = &state.search {
            serializer.append_pair(PARAM_SEARCH, search);
        }
        if state.restrict {
            serializer.append_pair(PARAM_RESTRICT, "true");
        }
        if state.page > 1 {
            serializer.append_pair(PARAM_PAGE, &state.page.to_string());
        }
        if state.results != self.page_sizes.smallest() {
            serializer.append_pair(PARAM_RESULTS, &state.results.to_string());
        }

        if !state.filters.is_empty() {
            let filters: BTreeMap<&str, FilterValueDTO> = state
                .filters
                .iter()
                .map(|(column, value)| (column.as_str(), value.into()))
                .collect();
            match serde_json::to_string(&filters) {
                Ok(json) => {
                    serializer.append_pair(PARAM_FILTERS, &json);
                }
                Err(error) => tracing::warn!(%error, "Failed to serialize filters"),
            }
        }

        if !state.sort.is_empty() {
            let sort: IndexMap<&str, SortDirection> = state
                .sort
                .iter()
                .map(|entry| (entry.column.as_str(), entry.direction))
                .collect();
            match serde_json::to_string(&sort) {
                Ok(json) => {
                    serializer.append_pair(PARAM_SORT, &json);
                }
                Err(error) => tracing::warn!(%error, "Failed to serialize sort"),
            }
        }

        serializer.finish()
    }

    /// Decodes a query string (with or without the leading `?`).
    ///
    /// Only the first occurrence of a parameter is considered; unknown
    /// parameters are ignored.
    pub fn decode(&self, query: &str) -> QueryState {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut params: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        let mut state = QueryState::new(&self.page_sizes);

        if let Some(value) = params.get(PARAM_SORT) {
            state.sort = decode_sort(value).unwrap_or_default();
        }
        if let Some(value) = params.get(PARAM_FILTERS) {
            state.filters = decode_filters(value).unwrap_or_default();
        }
        if let Some(value) = params.get(PARAM_SEARCH) {
            let search = value.trim();
            if !search.is_empty() {
                state.search = Some(search.to_owned());
            }
        }
        if let Some(value) = params.get(PARAM_RESTRICT) {
            state.restrict = match value.as_str() {
                "true" => true,
                "false" => false,
                other => {
                    tracing::warn!(value = other, "Ignoring invalid restrict parameter");
                    false
                }
            };
        }
        if let Some(value) = params.get(PARAM_PAGE) {
            match value.parse::<u32>() {
                Ok(page) if page >= 1 => state.page = page,
                _ => tracing::warn!(%value, "Ignoring invalid page parameter"),
            }
        }
        if let Some(value) = params.get(PARAM_RESULTS) {
            match value.parse::<u32>() {
                Ok(results) if self.page_sizes.contains(results) => state.results = results,
                _ => tracing::warn!(%value, "Ignoring invalid results parameter"),
            }
        }
        if let Some(value) = params.get(PARAM_VIEW) {
            match value.parse::<ViewMode>() {
                Ok(view) => state.view = Some(view),
                Err(_) => tracing::warn!(%value, "Ignoring invalid view parameter"),
            }
        }

        state
    }
}

fn decode_sort(value: &str) -> Option<Vec<SortEntry>> {
    match serde_json::from_str::<IndexMap<String, SortDirection>>(value) {
        Ok(sort) => Some(
            sort.into_iter()
                .map(|(column, direction)| SortEntry { column, direction })
                .collect(),
        ),
        Err(error) => {
            tracing::warn!(%error, "Sort query provided in an incorrect format");
            None
        }
    }
}

fn decode_filters(value: &str) -> Option<BTreeMap<String, FilterValue>> {
    match serde_json::from_str::<BTreeMap<String, FilterValueDTO>>(value) {
        Ok(filters) => Some(
            filters
                .into_iter()
                .map(|(column, value)| (column, FilterValue::from(value)))
                .filter(|(_, value)| !value.is_empty())
                .collect(),
        ),
        Err(error) => {
            tracing::warn!(%error, "Filter query provided in an incorrect format");
            None
        }
    }
}
