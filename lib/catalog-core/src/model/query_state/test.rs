use rstest::rstest;
use similar_asserts::assert_eq;

use super::*;
use crate::model::list_filter::{TextFilter, TextMatchType};

fn columns(state: &QueryState) -> Vec<(&str, SortDirection)> {
    state
        .sort
        .iter()
        .map(|entry| (entry.column.as_str(), entry.direction))
        .collect()
}

#[test]
fn test_multi_sort_keeps_click_order_and_plain_click_replaces() {
    let state = QueryState::default()
        .sorted_by("b", Some(SortDirection::Ascending), true)
        .sorted_by("a", Some(SortDirection::Ascending), true);
    assert_eq!(
        vec![("b", SortDirection::Ascending), ("a", SortDirection::Ascending)],
        columns(&state)
    );

    let state = state.sorted_by("a", Some(SortDirection::Descending), false);
    assert_eq!(vec![("a", SortDirection::Descending)], columns(&state));
}

#[test]
fn test_multi_sort_updates_in_place() {
    let state = QueryState::default()
        .sorted_by("b", Some(SortDirection::Ascending), true)
        .sorted_by("a", Some(SortDirection::Ascending), true)
        .sorted_by("b", Some(SortDirection::Descending), true);

    assert_eq!(
        vec![("b", SortDirection::Descending), ("a", SortDirection::Ascending)],
        columns(&state)
    );
}

#[test]
fn test_sort_removal_removes_only_that_column() {
    let state = QueryState::default()
        .sorted_by("a", Some(SortDirection::Ascending), true)
        .sorted_by("b", Some(SortDirection::Descending), true)
        .sorted_by("c", Some(SortDirection::Ascending), true)
        .sorted_by("b", None, false);

    assert_eq!(
        vec![("a", SortDirection::Ascending), ("c", SortDirection::Ascending)],
        columns(&state)
    );
}

#[test]
fn test_cycle_sort() {
    let state = QueryState::default().cycle_sort("name", false);
    assert_eq!(Some(SortDirection::Ascending), state.sort_direction("name"));
    let state = state.cycle_sort("name", false);
    assert_eq!(Some(SortDirection::Descending), state.sort_direction("name"));
    let state = state.cycle_sort("name", false);
    assert!(state.sort.is_empty());
}

#[rstest]
#[case(FilterValue::text("   "))]
#[case(FilterValue::NumberRange { min: None, max: None })]
#[case(FilterValue::DateRange { from: None, to: None })]
#[case(FilterValue::OneOf(vec![]))]
fn test_empty_filter_removes_column(#[case] empty: FilterValue) {
    let state = QueryState::default()
        .filtered_by("name", Some(FilterValue::text("61")))
        .filtered_by("name", Some(empty));

    assert!(state.filters.is_empty());
}

#[test]
fn test_session_changes_rewind_page() {
    let state = QueryState::default().on_page(4);
    assert_eq!(1, state.clone().filtered_by("name", Some(FilterValue::text("x"))).page);
    assert_eq!(1, state.clone().searching(Some("x")).page);
    assert_eq!(1, state.clone().restricted(true).page);
    assert_eq!(1, state.clone().cycle_sort("name", false).page);
    assert_eq!(4, state.in_view(ViewMode::Card).page);
}

#[test]
fn test_page_is_never_zero() {
    assert_eq!(1, QueryState::default().on_page(0).page);
    assert_eq!(2, QueryState::default().next_page().page);
}

#[test]
fn test_results_are_coerced() {
    let sizes = PageSizes::default();
    assert_eq!(20, QueryState::default().with_results(20, &sizes).results);
    assert_eq!(10, QueryState::default().with_results(125, &sizes).results);
}

#[test]
fn test_page_sizes_are_normalised() {
    let sizes = PageSizes::new([30, 0, 10, 30]).unwrap();
    assert_eq!(&[10, 30], sizes.as_slice());
    assert!(PageSizes::new([0]).is_none());
}

#[test]
fn test_search_is_trimmed() {
    assert_eq!(
        Some("calibration"),
        QueryState::default().searching(Some("  calibration ")).search.as_deref()
    );
    assert_eq!(None, QueryState::default().searching(Some("  ")).search);
}

#[test]
fn test_defaults_apply_only_to_empty_state() {
    let default_sort = vec![SortEntry::new("createTime", SortDirection::Descending)];
    let default_filters = BTreeMap::from([(
        "name".to_owned(),
        FilterValue::Text(TextFilter {
            r#match: TextMatchType::Exclude,
            value: "test".to_owned(),
        }),
    )]);

    let state = QueryState::default().with_defaults(&default_sort, &default_filters);
    assert_eq!(default_sort, state.sort);
    assert_eq!(default_filters, state.filters);

    let state = QueryState::default()
        .cycle_sort("name", false)
        .with_defaults(&default_sort, &default_filters);
    assert_eq!(Some(SortDirection::Ascending), state.sort_direction("name"));
    assert_eq!(None, state.sort_direction("createTime"));
}

#[test]
fn test_same_session_ignores_page_and_view() {
    let state = QueryState::default().searching(Some("x"));
    assert!(state.same_session(&state.clone().on_page(3).in_view(ViewMode::Card)));
    assert!(!state.same_session(&state.clone().restricted(true)));
}
