use std::fmt;

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::filter_compiler::CompiledQuery;

/// Identifies the result set of one loading session: entity type, compiled
/// `where`/`order`/`include` clauses and page size.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionFingerprint(String);

impl SessionFingerprint {
    pub fn new(query: &CompiledQuery) -> Self {
        let canonical = json!({
            "entity": query.entity_type,
            "clauses": query.base_filters(),
            "pageSize": query.page_size,
        })
        .to_string();

        Self(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the prefix is enough to tell sessions apart in logs
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RequestKind {
    Count,
    Page(u32),
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Page(page) => write!(f, "page {page}"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RequestFingerprint {
    pub session: SessionFingerprint,
    pub kind: RequestKind,
}

impl RequestFingerprint {
    pub fn count(session: &SessionFingerprint) -> Self {
        Self {
            session: session.clone(),
            kind: RequestKind::Count,
        }
    }

    pub fn page(session: &SessionFingerprint, page: u32) -> Self {
        Self {
            session: session.clone(),
            kind: RequestKind::Page(page),
        }
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session, self.kind)
    }
}
