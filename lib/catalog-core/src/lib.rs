//! Query state and incremental result engine for paginated catalog APIs.
//!
//! The [`service::engine::QueryEngine`] owns the interactive query state of a
//! single list view. The URL query string is the source of truth: every change
//! is written through the [`provider::router::Router`] and decoded back, then
//! compiled into backend filter clauses and loaded page by page.

pub mod config;
pub mod filter_compiler;
pub mod model;
pub mod provider;
pub mod query_string;
pub mod service;
