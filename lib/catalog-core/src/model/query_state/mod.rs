use std::collections::BTreeMap;

use super::common::{SortDirection, ViewMode};
use super::list_filter::FilterValue;

#[cfg(test)]
mod test;

pub const DEFAULT_PAGE_SIZES: [u32; 3] = [10, 20, 30];

/// Allowed page sizes, ascending and never empty
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageSizes(Vec<u32>);

impl PageSizes {
    /// Returns `None` if no positive size is given
    pub fn new(sizes: impl IntoIterator<Item = u32>) -> Option<Self> {
        let mut sizes: Vec<u32> = sizes.into_iter().filter(|size| *size > 0).collect();
        sizes.sort_unstable();
        sizes.dedup();

        if sizes.is_empty() {
            None
        } else {
            Some(Self(sizes))
        }
    }

    pub fn smallest(&self) -> u32 {
        self.0[0]
    }

    pub fn contains(&self, size: u32) -> bool {
        self.0.contains(&size)
    }

    /// Sizes outside the allowed set fall back to the smallest one
    pub fn coerce(&self, size: u32) -> u32 {
        if self.contains(size) {
            size
        } else {
            self.smallest()
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZES.to_vec())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SortEntry {
    pub column: String,
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Interactive state of a list view.
///
/// Values are never mutated in place: every transformation consumes the state
/// and returns its successor. Changing anything but `page` (or `view`) starts a
/// new loading session and therefore rewinds `page` to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryState {
    /// first entry is the primary sort key
    pub sort: Vec<SortEntry>,
    pub filters: BTreeMap<String, FilterValue>,
    pub search: Option<String>,
    pub restrict: bool,
    /// 1-based
    pub page: u32,
    pub results: u32,
    pub view: Option<ViewMode>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(&PageSizes::default())
    }
}

impl QueryState {
    pub fn new(page_sizes: &PageSizes) -> Self {
        Self {
            sort: vec![],
            filters: BTreeMap::new(),
            search: None,
            restrict: false,
            page: 1,
            results: page_sizes.smallest(),
            view: None,
        }
    }

    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        self.sort
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.direction)
    }

    /// Applies a header click on `column`.
    ///
    /// `None` removes the column from the sort sequence. Otherwise a plain
    /// click (`multi == false`) replaces the whole sequence, while a
    /// multi-sort click updates the entry in place or appends it.
    pub fn sorted_by(self, column: &str, direction: Option<SortDirection>, multi: bool) -> Self {
        let mut sort = self.sort.clone();

        match direction {
            None => sort.retain(|entry| entry.column != column),
            Some(direction) if !multi => sort = vec![SortEntry::new(column, direction)],
            Some(direction) => match sort.iter_mut().find(|entry| entry.column == column) {
                Some(entry) => entry.direction = direction,
                None => sort.push(SortEntry::new(column, direction)),
            },
        }

        Self {
            sort,
            page: 1,
            ..self
        }
    }

    /// Advances `column` through unsorted -> ascending -> descending -> unsorted
    pub fn cycle_sort(self, column: &str, multi: bool) -> Self {
        let next = SortDirection::next(self.sort_direction(column));
        self.sorted_by(column, next, multi)
    }

    /// Sets or clears (`None` or an empty filter) the filter of `column`
    pub fn filtered_by(self, column: &str, filter: Option<FilterValue>) -> Self {
        self.with_filters([(column.to_owned(), filter)])
    }

    pub fn with_filters(
        self,
        updates: impl IntoIterator<Item = (String, Option<FilterValue>)>,
    ) -> Self {
        let mut filters = self.filters.clone();

        for (column, filter) in updates {
            match filter.filter(|value| !value.is_empty()) {
                Some(value) => {
                    filters.insert(column, value);
                }
                None => {
                    filters.remove(&column);
                }
            }
        }

        Self {
            filters,
            page: 1,
            ..self
        }
    }

    pub fn searching(self, search: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);

        Self {
            search,
            page: 1,
            ..self
        }
    }

    pub fn restricted(self, restrict: bool) -> Self {
        Self {
            restrict,
            page: 1,
            ..self
        }
    }

    pub fn on_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn next_page(self) -> Self {
        let page = self.page.saturating_add(1);
        self.on_page(page)
    }

    pub fn with_results(self, results: u32, page_sizes: &PageSizes) -> Self {
        Self {
            results: page_sizes.coerce(results),
            page: 1,
            ..self
        }
    }

    pub fn in_view(self, view: ViewMode) -> Self {
        Self {
            view: Some(view),
            ..self
        }
    }

    /// Applies view defaults, each only if the state has nothing of its kind yet
    pub fn with_defaults(
        self,
        default_sort: &[SortEntry],
        default_filters: &BTreeMap<String, FilterValue>,
    ) -> Self {
        let mut state = self;

        if state.sort.is_empty() && !default_sort.is_empty() {
            state.sort = default_sort.to_vec();
        }

        if state.filters.is_empty() {
            state.filters = default_filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect();
        }

        state
    }

    /// Whether both states describe the same result set, ignoring the page
    /// index and presentation-only fields.
    pub fn same_session(&self, other: &QueryState) -> bool {
        self.sort == other.sort
            && self.filters == other.filters
            && self.search == other.search
            && self.restrict == other.restrict
            && self.results == other.results
    }
}
