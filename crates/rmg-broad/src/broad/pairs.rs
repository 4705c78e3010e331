// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use core::cmp::Ordering;
use std::collections::BTreeMap;

use crate::broad::tree::{AabbTree, ProxyId};
use crate::types::Aabb;

/// Broad-phase interface for inserting proxies and querying overlapping pairs.
///
/// Implementations must return pairs deterministically: the pair `(a, b)` is
/// canonicalized such that `a < b`, and the full list is sorted ascending by
/// `(a, b)`.
pub trait BroadPhase {
    /// Inserts or updates the proxy with the given `id` and `aabb`.
    fn upsert(&mut self, id: usize, aabb: Aabb);
    /// Removes a proxy if present.
    fn remove(&mut self, id: usize);
    /// Returns a canonical, deterministically-ordered list of overlapping pairs.
    fn pairs(&self) -> Vec<(usize, usize)>;
}

/// BVH-backed pairing front for an embedding engine.
///
/// Maps caller ids onto tree handles so the engine can upsert by its own
/// entity id every tick. Pair overlap is evaluated on the stored fat keys,
/// which is what a broad phase wants: candidates are a superset of the true
/// overlaps and the narrow phase discards the rest.
#[derive(Debug, Default)]
pub struct PairIndex {
    tree: AabbTree<usize>,
    proxies: BTreeMap<usize, ProxyId>,
}

impl PairIndex {
    /// Creates an empty pairing front.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: AabbTree::new(),
            proxies: BTreeMap::new(),
        }
    }

    /// Number of tracked proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Returns `true` when no proxies are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Read access to the underlying tree.
    #[must_use]
    pub fn tree(&self) -> &AabbTree<usize> {
        &self.tree
    }
}

impl BroadPhase for PairIndex {
    fn upsert(&mut self, id: usize, aabb: Aabb) {
        if let Some(proxy) = self.proxies.get(&id) {
            let _ = self.tree.update(*proxy, aabb);
        } else {
            let proxy = self.tree.insert(aabb, id);
            self.proxies.insert(id, proxy);
        }
    }

    fn remove(&mut self, id: usize) {
        if let Some(proxy) = self.proxies.remove(&id) {
            self.tree.remove(proxy);
        }
    }

    fn pairs(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::new();
        for (&id, &proxy) in &self.proxies {
            let Some(key) = self.tree.fat_key(proxy) else {
                continue;
            };
            for (_, &other_id) in self.tree.query(&key) {
                if other_id > id {
                    out.push((id, other_id)); // canonical since id < other_id
                }
            }
        }
        out.sort_unstable_by(|x, y| match x.0.cmp(&y.0) {
            Ordering::Equal => x.1.cmp(&y.1),
            o => o,
        });
        out.dedup();
        out
    }
}
