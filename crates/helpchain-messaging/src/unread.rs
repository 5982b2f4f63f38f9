//! Per-sender unread counts derived from an inbound snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use helpchain_shared::UserId;
use helpchain_store::Message;

/// Unread message count per counterparty.
///
/// Counterparties with nothing unread are absent rather than mapped to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnreadIndex {
    counts: BTreeMap<UserId, usize>,
}

impl UnreadIndex {
    /// Unread count from `sender`, zero when absent.
    pub fn get(&self, sender: &UserId) -> usize {
        self.counts.get(sender).copied().unwrap_or(0)
    }

    pub fn contains(&self, sender: &UserId) -> bool {
        self.counts.contains_key(sender)
    }

    /// Sum over all counterparties.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of counterparties with unread messages.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, usize)> {
        self.counts.iter().map(|(id, count)| (id, *count))
    }

    pub fn as_map(&self) -> &BTreeMap<UserId, usize> {
        &self.counts
    }
}

/// Count unread messages per sender in an inbound snapshot.
///
/// Recomputed from scratch for every snapshot; O(n) in the snapshot size.
pub fn compute_unread_index(inbound: &[Message]) -> UnreadIndex {
    let mut counts = BTreeMap::new();
    for message in inbound.iter().filter(|m| !m.is_read) {
        *counts.entry(message.from_user_id.clone()).or_insert(0) += 1;
    }
    UnreadIndex { counts }
}
