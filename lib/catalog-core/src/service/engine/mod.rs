//! The query engine of a single list view.
//!
//! The router's query string is the source of truth. Every change is encoded
//! and written to the router first, then read back through
//! [`QueryEngine::sync_from_router`], which either starts a new loading
//! session or loads on towards a larger `page`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::core_config::CoreConfig;
use crate::filter_compiler::FilterCompiler;
use crate::filter_compiler::capabilities::EntityCapabilities;
use crate::model::entity::{EntityRecord, EntityType};
use crate::model::list_filter::{FilterValue, TextFilter};
use crate::model::query_state::{QueryState, SortEntry};
use crate::provider::catalog_api::CatalogApi;
use crate::provider::catalog_api::error::CatalogApiError;
use crate::provider::router::Router;
use crate::query_string::QueryStringCodec;
use crate::service::debounce::{DEFAULT_QUIET_PERIOD, Debouncer};
use crate::service::error::EngineError;
use crate::service::loader::IncrementalLoader;
use crate::service::orchestrator::fingerprint::{RequestKind, SessionFingerprint};
use crate::service::orchestrator::{RequestOrchestrator, SessionPhase, Settlement};


#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub quiet_period: Duration,
    pub lookahead_pages: u32,
    /// applied on load when the location carries no sort
    pub default_sort: Vec<SortEntry>,
    /// applied on load when the location carries no filters
    pub default_filters: BTreeMap<String, FilterValue>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            lookahead_pages: 1,
            default_sort: vec![],
            default_filters: BTreeMap::new(),
        }
    }
}

/// Debounced text input of a view
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TextInput {
    Filter(String),
    Search,
}

#[derive(Debug, PartialEq)]
pub enum EngineEvent {
    CountLoaded(u64),
    PageLoaded { page: u32, appended: usize },
    RequestFailed {
        kind: RequestKind,
        error: CatalogApiError,
    },
}

#[derive(Clone, Copy)]
enum Navigation {
    Push,
    Replace,
}

pub struct QueryEngine<R: Router> {
    router: R,
    codec: QueryStringCodec,
    compiler: FilterCompiler,
    orchestrator: RequestOrchestrator,
    loader: IncrementalLoader,
    state: QueryState,
    quiet_period: Duration,
    text_inputs: BTreeMap<TextInput, Debouncer<String>>,
}

impl<R: Router> QueryEngine<R> {
    /// Builds the state from the router's location, writes view defaults
    /// back in place if needed and starts the first loading session.
    pub fn new(
        mut router: R,
        codec: QueryStringCodec,
        compiler: FilterCompiler,
        api: Arc<dyn CatalogApi>,
        settings: EngineSettings,
    ) -> Self {
        let decoded = codec.decode(&router.current_query_string());
        let defaulted = decoded
            .clone()
            .with_defaults(&settings.default_sort, &settings.default_filters);

        if defaulted != decoded {
            tracing::debug!("Applying view defaults to the location");
            router.replace_query_string(&codec.encode(&defaulted));
        }

        let state = codec.decode(&router.current_query_string());
        let mut engine = Self {
            router,
            codec,
            compiler,
            orchestrator: RequestOrchestrator::new(api),
            loader: IncrementalLoader::new(state.results, settings.lookahead_pages),
            state,
            quiet_period: settings.quiet_period,
            text_inputs: BTreeMap::new(),
        };
        engine.start_session();
        engine
    }

    pub fn from_config(
        config: &CoreConfig,
        entity_type: EntityType,
        router: R,
        api: Arc<dyn CatalogApi>,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let codec = QueryStringCodec::new(config.page_sizes()?);
        let compiler = FilterCompiler::new(
            EntityCapabilities::lookup(config.facility, entity_type),
            config.username.clone(),
        );
        let settings = EngineSettings {
            quiet_period: config.debounce,
            lookahead_pages: config.lookahead_pages,
            ..settings
        };

        Ok(Self::new(router, codec, compiler, api, settings))
    }

    pub fn current_state(&self) -> &QueryState {
        &self.state
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Direct access for navigation outside the engine (back/forward); call
    /// [`Self::sync_from_router`] afterwards.
    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn entity_type(&self) -> EntityType {
        self.compiler.entity_type()
    }

    /// Applies `transform` as a new history entry
    pub fn mutate(&mut self, transform: impl FnOnce(QueryState) -> QueryState) {
        self.navigate(transform, Navigation::Push);
    }

    /// Applies `transform` rewriting the current history entry
    pub fn replace(&mut self, transform: impl FnOnce(QueryState) -> QueryState) {
        self.navigate(transform, Navigation::Replace);
    }

    fn navigate(
        &mut self,
        transform: impl FnOnce(QueryState) -> QueryState,
        navigation: Navigation,
    ) {
        let next = transform(self.state.clone());
        if next == self.state {
            return;
        }

        let query = self.codec.encode(&next);
        match navigation {
            Navigation::Push => self.router.push_query_string(&query),
            Navigation::Replace => self.router.replace_query_string(&query),
        }

        self.sync_from_router();
    }

    /// Re-reads the location and reconciles loading with it
    pub fn sync_from_router(&mut self) {
        let next = self.codec.decode(&self.router.current_query_string());
        let previous = std::mem::replace(&mut self.state, next);

        if !previous.same_session(&self.state) || self.orchestrator.session_fingerprint().is_none()
        {
            self.start_session();
        } else {
            self.request_missing_pages();
        }
    }

    fn start_session(&mut self) {
        self.loader.reset(self.state.results);

        let query = self.compiler.compile(&self.state);
        self.orchestrator.start_session(query);
        self.loader.mark_requested(1);
    }

    /// Requests the next page towards the current one. Pages are loaded one
    /// after the other, the following one once its predecessor arrived, so a
    /// deep link never fans out into a burst of requests.
    fn request_missing_pages(&mut self) {
        let Some(page) = self.loader.next_missing_page(self.state.page) else {
            return;
        };

        if self.loader.mark_requested(page) {
            tracing::trace!(page, target = self.state.page, "Catching up with location");
            self.orchestrator.request_page(page);
        }
    }

    /// Rewrites a location pointing past the last page once the count is known
    fn clamp_page_to_count(&mut self) {
        match self.loader.last_page() {
            Some(last) if self.state.page > last => {
                tracing::debug!(page = self.state.page, last, "Location points past the results");
                self.replace(|state| state.on_page(last));
            }
            _ => {}
        }
    }

    fn current_fingerprint(&self) -> SessionFingerprint {
        SessionFingerprint::new(&self.compiler.compile(&self.state))
    }

    /// Waits for the next response that changes what the view shows.
    /// Stale and cancelled responses are dropped on the way. Returns `None`
    /// once no request is outstanding.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        loop {
            let completion = self.orchestrator.next_completion().await?;
            let current = self.current_fingerprint();

            match self.orchestrator.settle(completion, &current) {
                Settlement::Count(count) => {
                    self.loader.receive_count(count);
                    self.clamp_page_to_count();
                    return Some(EngineEvent::CountLoaded(count));
                }
                Settlement::Page { page, records } => {
                    let appended = self.loader.receive_page(page, records);
                    self.request_missing_pages();
                    return Some(EngineEvent::PageLoaded { page, appended });
                }
                Settlement::Failed { kind, error } => {
                    if let RequestKind::Page(page) = kind {
                        self.loader.mark_failed(page);
                    }
                    return Some(EngineEvent::RequestFailed { kind, error });
                }
                Settlement::Discarded { .. } => continue,
            }
        }
    }

    /// Processes responses until nothing is outstanding
    pub async fn run_until_idle(&mut self) -> Vec<EngineEvent> {
        let mut events = vec![];
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    pub fn row_at(&self, index: usize) -> Option<&EntityRecord> {
        self.loader.row_at(index)
    }

    pub fn rows(&self) -> &[EntityRecord] {
        self.loader.rows()
    }

    pub fn row_count(&self) -> usize {
        self.loader.len()
    }

    /// Total of the current session, `None` until its count arrived
    pub fn total_count(&self) -> Option<u64> {
        self.loader.known_count()
    }

    pub fn is_loading(&self, index: usize) -> bool {
        self.loader.is_loading(index)
    }

    pub fn is_page_failed(&self, page: u32) -> bool {
        self.loader.is_page_failed(page)
    }

    pub fn phase(&self) -> SessionPhase {
        self.orchestrator.phase()
    }

    /// Reports the highest row index the view renders; requests the next
    /// page once it gets close to the end of the loaded rows.
    pub fn on_viewport(&mut self, highest_index: usize) {
        let Some(page) = self.loader.next_page_for_viewport(highest_index) else {
            return;
        };

        if page > self.state.page {
            tracing::trace!(page, highest_index, "Viewport reached the end of loaded rows");
            self.replace(|state| state.on_page(page));
        } else {
            self.request_missing_pages();
        }
    }

    pub fn retry_page(&mut self, page: u32) -> Result<(), EngineError> {
        if self.orchestrator.session_fingerprint().is_none() {
            return Err(EngineError::NoSession);
        }
        if !self.loader.mark_retried(page) {
            return Err(EngineError::PageNotFailed(page));
        }

        self.orchestrator.request_page(page);
        Ok(())
    }

    pub fn retry_count(&mut self) -> Result<(), EngineError> {
        self.orchestrator
            .request_count()
            .map(|_| ())
            .ok_or(EngineError::NoSession)
    }

    /// Records a keystroke in a column's text filter. The state changes only
    /// after the quiet period, see [`Self::tick`].
    pub fn type_text_filter(&mut self, column: &str, value: &str, now: Instant) {
        self.input(TextInput::Filter(column.to_owned()), value, now);
    }

    pub fn type_search(&mut self, value: &str, now: Instant) {
        self.input(TextInput::Search, value, now);
    }

    fn input(&mut self, key: TextInput, value: &str, now: Instant) {
        let quiet_period = self.quiet_period;
        self.text_inputs
            .entry(key)
            .or_insert_with(|| Debouncer::new(quiet_period))
            .input(value.to_owned(), now);
    }

    /// What a text input shows: the pending keystrokes, else the value held
    /// by the state.
    pub fn text_input_echo(&self, key: &TextInput) -> Option<String> {
        if let Some(pending) = self.text_inputs.get(key).and_then(Debouncer::echo) {
            return Some(pending.clone());
        }

        match key {
            TextInput::Filter(column) => match self.state.filters.get(column) {
                Some(FilterValue::Text(filter)) => Some(filter.value.clone()),
                _ => None,
            },
            TextInput::Search => self.state.search.clone(),
        }
    }

    /// Earliest instant at which [`Self::tick`] has something to apply
    pub fn next_deadline(&self) -> Option<Instant> {
        self.text_inputs
            .values()
            .filter_map(Debouncer::deadline)
            .min()
    }

    /// Applies every text input whose quiet period elapsed by `now`, as one
    /// history entry. Returns whether anything was applied.
    pub fn tick(&mut self, now: Instant) -> bool {
        let fired: Vec<(TextInput, String)> = self
            .text_inputs
            .iter_mut()
            .filter_map(|(key, debouncer)| debouncer.fire(now).map(|value| (key.clone(), value)))
            .collect();

        self.apply_text_inputs(fired)
    }

    /// Applies all pending text input immediately, e.g. on Enter
    pub fn flush_text_inputs(&mut self) -> bool {
        let fired: Vec<(TextInput, String)> = self
            .text_inputs
            .iter_mut()
            .filter_map(|(key, debouncer)| debouncer.flush().map(|value| (key.clone(), value)))
            .collect();

        self.apply_text_inputs(fired)
    }

    fn apply_text_inputs(&mut self, fired: Vec<(TextInput, String)>) -> bool {
        self.text_inputs.retain(|_, debouncer| debouncer.is_pending());
        if fired.is_empty() {
            return false;
        }

        self.mutate(|state| {
            fired
                .into_iter()
                .fold(state, |state, (key, value)| match key {
                    TextInput::Filter(column) => {
                        let filter = text_filter(&state, &column, value);
                        state.filtered_by(&column, Some(filter))
                    }
                    TextInput::Search => state.searching(Some(&value)),
                })
        });
        true
    }
}

/// Keeps the match type the column's filter already has
fn text_filter(state: &QueryState, column: &str, value: String) -> FilterValue {
    match state.filters.get(column) {
        Some(FilterValue::Text(existing)) => FilterValue::Text(TextFilter {
            r#match: existing.r#match,
            value,
        }),
        _ => FilterValue::text(value),
    }
}
