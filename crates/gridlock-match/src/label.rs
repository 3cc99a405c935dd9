//! Match labels and the discovery query that filters on them.
//!
//! A label is a small piece of metadata the handler attaches to its match.
//! It travels with [`MatchInfo`](crate::MatchInfo) and is what matchmaking
//! filters on — the actor never interprets it.

use serde::{Deserialize, Serialize};

/// Discovery metadata for a match.
///
/// `open` counts the seats the match is still advertising: `1` while the
/// match wants another player, `0` once it has a full pair. Handlers update
/// it through [`Outbox::update_label`](crate::Outbox::update_label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLabel {
    pub open: u8,
}

impl MatchLabel {
    /// A label advertising one open seat.
    pub fn open() -> Self {
        Self { open: 1 }
    }

    /// A label advertising no open seats.
    pub fn closed() -> Self {
        Self { open: 0 }
    }

    /// Returns `true` if the label advertises at least one open seat.
    pub fn is_open(&self) -> bool {
        self.open >= 1
    }
}

impl Default for MatchLabel {
    fn default() -> Self {
        Self::open()
    }
}

/// A predicate over match labels, used by [`MatchRegistry::list`](crate::MatchRegistry::list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelQuery {
    min_open: Option<u8>,
}

impl LabelQuery {
    /// Matches every label.
    pub fn any() -> Self {
        Self { min_open: None }
    }

    /// Matches labels advertising at least `n` open seats.
    pub fn open_at_least(n: u8) -> Self {
        Self { min_open: Some(n) }
    }

    /// Evaluates the query against a label.
    pub fn matches(&self, label: &MatchLabel) -> bool {
        match self.min_open {
            None => true,
            Some(n) => label.open >= n,
        }
    }
}
