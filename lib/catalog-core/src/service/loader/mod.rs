//! Gap-free, duplicate-free accumulation of paged results.
//!
//! Pages may resolve in any order. A page arriving ahead of its predecessor
//! is parked and appended only once every earlier page is present.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::entity::{EntityId, EntityRecord};


/// Rows in server order, keyed by id
#[derive(Clone, Debug, Default)]
pub struct RowBuffer {
    rows: Vec<EntityRecord>,
    ids: HashSet<EntityId>,
}

impl RowBuffer {
    /// Appends the records whose id is not yet present; returns how many
    /// were appended.
    pub fn append(&mut self, records: Vec<EntityRecord>) -> usize {
        let before = self.rows.len();
        for record in records {
            if self.ids.insert(record.id) {
                self.rows.push(record);
            }
        }
        self.rows.len() - before
    }

    pub fn get(&self, index: usize) -> Option<&EntityRecord> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn rows(&self) -> &[EntityRecord] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.ids.clear();
    }
}

#[derive(Clone, Debug)]
pub struct IncrementalLoader {
    page_size: u32,
    lookahead_pages: u32,
    buffer: RowBuffer,
    /// lowest page not yet appended
    next_to_append: u32,
    parked: BTreeMap<u32, Vec<EntityRecord>>,
    pending: BTreeSet<u32>,
    failed: BTreeSet<u32>,
    known_count: Option<u64>,
    /// a short page was appended, nothing follows it
    exhausted: bool,
}

impl IncrementalLoader {
    pub fn new(page_size: u32, lookahead_pages: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            lookahead_pages: lookahead_pages.max(1),
            buffer: RowBuffer::default(),
            next_to_append: 1,
            parked: BTreeMap::new(),
            pending: BTreeSet::new(),
            failed: BTreeSet::new(),
            known_count: None,
            exhausted: false,
        }
    }

    /// Drops every row and all page bookkeeping
    pub fn reset(&mut self, page_size: u32) {
        *self = Self::new(page_size, self.lookahead_pages);
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Records `page` as requested. Returns `false` when the page is already
    /// present, pending, or failed and awaiting an explicit retry.
    pub fn mark_requested(&mut self, page: u32) -> bool {
        if page == 0 || self.is_received(page) || self.failed.contains(&page) {
            return false;
        }
        self.pending.insert(page)
    }

    /// Records `page` as requested again after a failure
    pub fn mark_retried(&mut self, page: u32) -> bool {
        self.failed.remove(&page);
        self.mark_requested(page)
    }

    /// Stores a page response and appends every page that became contiguous.
    /// Returns the number of rows appended.
    pub fn receive_page(&mut self, page: u32, records: Vec<EntityRecord>) -> usize {
        self.pending.remove(&page);
        self.failed.remove(&page);

        if page == 0 || self.is_received(page) {
            tracing::debug!(page, "Ignoring page received twice");
            return 0;
        }

        self.parked.insert(page, records);

        let mut appended = 0;
        while let Some(records) = self.parked.remove(&self.next_to_append) {
            if records.len() < self.page_size as usize {
                self.exhausted = true;
            }
            appended += self.buffer.append(records);
            self.next_to_append += 1;
        }

        if !self.parked.is_empty() {
            tracing::trace!(
                waiting_for = self.next_to_append,
                parked = self.parked.len(),
                "Pages parked until their predecessors arrive"
            );
        }

        appended
    }

    pub fn receive_count(&mut self, count: u64) {
        self.known_count = Some(count);
    }

    pub fn mark_failed(&mut self, page: u32) {
        self.pending.remove(&page);
        self.failed.insert(page);
    }

    pub fn row_at(&self, index: usize) -> Option<&EntityRecord> {
        self.buffer.get(index)
    }

    pub fn rows(&self) -> &[EntityRecord] {
        self.buffer.rows()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Last count received in this session, `None` while pending
    pub fn known_count(&self) -> Option<u64> {
        self.known_count
    }

    pub fn is_loading_page(&self, page: u32) -> bool {
        self.pending.contains(&page)
    }

    pub fn is_page_failed(&self, page: u32) -> bool {
        self.failed.contains(&page)
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.failed.iter().copied()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether the row at `index` is not available yet but is on its way
    pub fn is_loading(&self, index: usize) -> bool {
        if index < self.buffer.len() {
            return false;
        }
        let page = self.page_of(index);
        self.pending.contains(&page) || self.parked.contains_key(&page)
    }

    /// Page to request next, given the highest row index currently rendered.
    ///
    /// A page is due once that index comes within the lookahead distance of
    /// the buffer end, unless a request is already outstanding, the previous
    /// one failed, or the result set is known to be complete.
    pub fn next_page_for_viewport(&self, highest_index: usize) -> Option<u32> {
        if self.exhausted || self.has_pending() || !self.failed.is_empty() {
            return None;
        }

        let lookahead = (self.lookahead_pages * self.page_size) as usize;
        if highest_index.saturating_add(lookahead) < self.buffer.len() {
            return None;
        }

        let next = self
            .parked
            .keys()
            .next_back()
            .map_or(self.next_to_append, |last| last + 1);

        (!self.is_beyond_count(next)).then_some(next)
    }

    /// Next page to load on the way to `target`, one at a time: the lowest
    /// page not yet received, once nothing is pending or failed.
    pub fn next_missing_page(&self, target: u32) -> Option<u32> {
        if self.exhausted || self.has_pending() || !self.failed.is_empty() {
            return None;
        }

        let next = self.next_to_append;
        if next > target || self.is_received(next) || self.is_beyond_count(next) {
            return None;
        }
        Some(next)
    }

    /// Last page holding rows according to the known count, at least 1
    pub fn last_page(&self) -> Option<u32> {
        let count = self.known_count?;
        let pages = count.div_ceil(u64::from(self.page_size)).max(1);
        Some(u32::try_from(pages).unwrap_or(u32::MAX))
    }

    fn is_beyond_count(&self, page: u32) -> bool {
        let first_row = u64::from(page - 1) * u64::from(self.page_size);
        self.known_count.is_some_and(|count| first_row >= count)
    }

    fn is_received(&self, page: u32) -> bool {
        page < self.next_to_append || self.parked.contains_key(&page)
    }

    fn page_of(&self, index: usize) -> u32 {
        u32::try_from(index / self.page_size as usize)
            .map_or(u32::MAX, |page| page.saturating_add(1))
    }
}
