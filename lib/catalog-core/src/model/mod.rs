pub mod common;
pub mod entity;
pub mod list_filter;
pub mod query_state;
