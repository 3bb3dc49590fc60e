//! Translation of a [`QueryState`] into the backend filter clauses of a
//! catalog entity endpoint.
//!
//! Output is deterministic and emitted in the canonical order
//! `where, order, include, skip, limit`; request fingerprints rely on it.
//! Filters the entity does not support are left out instead of failing
//! the whole query.

use itertools::Itertools;
use serde::Serialize;
use serde_json::{Value, json};
use strum::Display;
use time::Date;
use time::macros::format_description;

use crate::model::entity::EntityType;
use crate::model::list_filter::{FilterValue, TextFilter, TextMatchType};
use crate::model::query_state::QueryState;

pub mod capabilities;


use capabilities::{ColumnKind, EntityCapabilities, RangeBounds};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterKind {
    Where,
    Order,
    Include,
    Skip,
    Limit,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdditionalFilter {
    pub kind: FilterKind,
    pub value: Value,
}

impl AdditionalFilter {
    pub fn new(kind: FilterKind, value: Value) -> Self {
        Self { kind, value }
    }

    /// Query-string form: `order` is sent verbatim, everything else as JSON
    pub fn to_query_pair(&self) -> (String, String) {
        let value = match (&self.kind, &self.value) {
            (FilterKind::Order, Value::String(order)) => order.clone(),
            (_, value) => value.to_string(),
        };
        (self.kind.to_string(), value)
    }
}

/// Session-wide part of a compiled query; pagination is applied per page.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub entity_type: EntityType,
    pub where_clauses: Vec<Value>,
    pub order: Option<String>,
    pub include: Vec<Value>,
    pub page_size: u32,
}

impl CompiledQuery {
    /// `where`, `order` and `include` clauses
    pub fn base_filters(&self) -> Vec<AdditionalFilter> {
        let mut filters = self.where_filters();
        if let Some(order) = &self.order {
            filters.push(AdditionalFilter::new(
                FilterKind::Order,
                Value::String(order.clone()),
            ));
        }
        filters.extend(self.include_filters());
        filters
    }

    /// Clauses accepted by the `/count` endpoint
    pub fn count_filters(&self) -> Vec<AdditionalFilter> {
        let mut filters = self.where_filters();
        filters.extend(self.include_filters());
        filters
    }

    pub fn page_filters(&self, page: u32) -> Vec<AdditionalFilter> {
        let skip = u64::from(page.max(1) - 1) * u64::from(self.page_size);

        let mut filters = self.base_filters();
        filters.push(AdditionalFilter::new(FilterKind::Skip, json!(skip)));
        filters.push(AdditionalFilter::new(FilterKind::Limit, json!(self.page_size)));
        filters
    }

    fn where_filters(&self) -> Vec<AdditionalFilter> {
        self.where_clauses
            .iter()
            .map(|clause| AdditionalFilter::new(FilterKind::Where, clause.clone()))
            .collect()
    }

    fn include_filters(&self) -> impl Iterator<Item = AdditionalFilter> + '_ {
        self.include
            .iter()
            .map(|include| AdditionalFilter::new(FilterKind::Include, include.clone()))
    }
}

#[derive(Clone, Debug)]
pub struct FilterCompiler {
    capabilities: EntityCapabilities,
    principal: Option<String>,
    extra_include: Vec<Value>,
}

impl FilterCompiler {
    /// `principal` is the user name matched by restricted queries
    pub fn new(capabilities: EntityCapabilities, principal: Option<String>) -> Self {
        Self {
            capabilities,
            principal,
            extra_include: vec![],
        }
    }

    /// Appends view-specific include clauses after the entity defaults
    pub fn with_include(mut self, include: impl IntoIterator<Item = Value>) -> Self {
        self.extra_include.extend(include);
        self
    }

    pub fn capabilities(&self) -> &EntityCapabilities {
        &self.capabilities
    }

    pub fn entity_type(&self) -> EntityType {
        self.capabilities.entity_type
    }

    /// Full clause list for the page held by `state`
    pub fn compile_filters(&self, state: &QueryState) -> Vec<AdditionalFilter> {
        self.compile(state).page_filters(state.page)
    }

    pub fn compile(&self, state: &QueryState) -> CompiledQuery {
        let mut where_clauses: Vec<Value> = vec![];

        for (column, filter) in &state.filters {
            where_clauses.extend(self.column_conditions(column, filter));
        }

        if let Some(search) = &state.search {
            where_clauses.extend(self.search_condition(search));
        }

        if state.restrict {
            where_clauses.extend(self.restrict_condition());
        }

        let order = state
            .sort
            .iter()
            .filter(|entry| {
                let sortable = self.capabilities.is_sortable(&entry.column);
                if !sortable {
                    tracing::debug!(
                        column = %entry.column,
                        entity = %self.capabilities.entity_type,
                        "Ignoring sort on unsupported column"
                    );
                }
                sortable
            })
            .map(|entry| format!("{} {}", entry.column, entry.direction))
            .join(", ");

        CompiledQuery {
            entity_type: self.capabilities.entity_type,
            where_clauses,
            order: (!order.is_empty()).then_some(order),
            include: self
                .capabilities
                .include
                .iter()
                .chain(&self.extra_include)
                .cloned()
                .collect(),
            page_size: state.results,
        }
    }

    fn column_conditions(&self, column: &str, filter: &FilterValue) -> Vec<Value> {
        if filter.is_empty() {
            return vec![];
        }

        let Some(kind) = self.capabilities.column(column).map(|spec| spec.kind) else {
            tracing::debug!(
                column,
                entity = %self.capabilities.entity_type,
                "Ignoring filter on unsupported column"
            );
            return vec![];
        };

        match (kind, filter) {
            (ColumnKind::Text, FilterValue::Text(text)) => vec![text_condition(column, text)],
            (ColumnKind::Text | ColumnKind::List, FilterValue::OneOf(values)) => {
                vec![json!({ column: { "in": values } })]
            }
            (ColumnKind::Number(bounds), FilterValue::NumberRange { min, max }) => {
                let (lower, upper) = match bounds {
                    RangeBounds::Inclusive => ("gte", "lte"),
                    RangeBounds::Exclusive => ("gt", "lt"),
                };
                let mut conditions = vec![];
                if let Some(min) = min {
                    conditions.push(json!({ column: { lower: min } }));
                }
                if let Some(max) = max {
                    conditions.push(json!({ column: { upper: max } }));
                }
                conditions
            }
            (ColumnKind::Date, FilterValue::DateRange { from, to }) => {
                date_conditions(column, *from, *to)
            }
            _ => {
                tracing::debug!(
                    column,
                    entity = %self.capabilities.entity_type,
                    "Ignoring filter not matching column kind"
                );
                vec![]
            }
        }
    }

    fn search_condition(&self, search: &str) -> Option<Value> {
        let search = search.trim();
        if search.is_empty() || self.capabilities.searchable.is_empty() {
            return None;
        }

        let fields: Vec<Value> = self
            .capabilities
            .searchable
            .iter()
            .map(|field| json!({ *field: { "like": search } }))
            .collect();

        Some(json!({ "or": fields }))
    }

    fn restrict_condition(&self) -> Option<Value> {
        let Some(path) = self.capabilities.restrict_path else {
            tracing::debug!(
                entity = %self.capabilities.entity_type,
                "Entity cannot be restricted to own data"
            );
            return None;
        };

        match &self.principal {
            Some(principal) => Some(json!({ path: { "eq": principal } })),
            None => {
                tracing::warn!("Restricted query without a principal, ignoring restriction");
                None
            }
        }
    }
}

fn text_condition(column: &str, filter: &TextFilter) -> Value {
    let operator = match filter.r#match {
        TextMatchType::Include => "like",
        TextMatchType::Exclude => "nlike",
        TextMatchType::Exact => "eq",
    };
    json!({ column: { operator: filter.value } })
}

/// `from` is inclusive from the start of that day; `to` includes the whole
/// day by comparing against the start of the following one.
fn date_conditions(column: &str, from: Option<Date>, to: Option<Date>) -> Vec<Value> {
    let mut conditions = vec![];

    if let Some(from) = from.and_then(start_of_day) {
        conditions.push(json!({ column: { "gte": from } }));
    }

    if let Some(to) = to {
        match to.next_day().and_then(start_of_day) {
            Some(until) => conditions.push(json!({ column: { "lt": until } })),
            None => tracing::debug!(%to, "Upper date bound out of range, ignoring"),
        }
    }

    conditions
}

fn start_of_day(date: Date) -> Option<String> {
    let format = format_description!("[year]-[month]-[day] 00:00:00");
    date.format(&format).ok()
}
