//! Access to the navigation location holding the encoded query state.


#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Router: Send {
    /// Query part of the current location, without the leading `?`
    fn current_query_string(&self) -> String;

    /// Navigates to a new history entry
    fn push_query_string(&mut self, query: &str);

    /// Rewrites the current history entry in place
    fn replace_query_string(&mut self, query: &str);
}

/// In-memory navigation history with browser-like back/forward semantics
#[derive(Clone, Debug)]
pub struct MemoryHistory {
    entries: Vec<String>,
    position: usize,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![strip(initial).to_owned()],
            position: 0,
        }
    }

    /// Returns `false` if already at the oldest entry
    pub fn back(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Returns `false` if already at the newest entry
    pub fn forward(&mut self) -> bool {
        if self.position + 1 >= self.entries.len() {
            return false;
        }
        self.position += 1;
        true
    }

    /// Never zero, the initial entry is always kept
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Router for MemoryHistory {
    fn current_query_string(&self) -> String {
        self.entries
            .get(self.position)
            .cloned()
            .unwrap_or_default()
    }

    fn push_query_string(&mut self, query: &str) {
        self.entries.truncate(self.position + 1);
        self.entries.push(strip(query).to_owned());
        self.position = self.entries.len() - 1;
    }

    fn replace_query_string(&mut self, query: &str) {
        match self.entries.get_mut(self.position) {
            Some(entry) => *entry = strip(query).to_owned(),
            None => self.push_query_string(query),
        }
    }
}

fn strip(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}
