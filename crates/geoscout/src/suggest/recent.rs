use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Most-recent-first list of searches the user actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RecentSearches {
    entries: Vec<String>,
}

impl RecentSearches {
    pub const MAX_ENTRIES: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Put `term` at the front, removing an identical older entry. Blank terms are ignored.
    pub fn add(&mut self, term: &str) {
        if term.trim().is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != term);
        self.entries.insert(0, term.to_string());
        self.entries.truncate(Self::MAX_ENTRIES);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<String>> for RecentSearches {
    fn from(mut entries: Vec<String>) -> Self {
        entries.retain(|entry| !entry.trim().is_empty());
        entries.truncate(Self::MAX_ENTRIES);
        Self { entries }
    }
}

impl From<RecentSearches> for Vec<String> {
    fn from(recent: RecentSearches) -> Self {
        recent.entries
    }
}

/// Generation counter for overlapping suggestion requests.
///
/// Take a token before starting a request and only display the result if the token
/// is still the latest when it completes.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestSequence {
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Start a new generation, superseding every token issued before.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }
}
