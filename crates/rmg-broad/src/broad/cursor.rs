// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Query traversal: detached cursors and the borrowing iterators over them.
//!
//! Both fronts share one depth-first walk over an explicit index stack.
//! Children are pushed `child_a` then `child_b`, so subtrees pop in
//! `child_b`-first order; this order is part of the crate's determinism
//! contract and tests depend on it.
//!
//! The borrowing iterators ([`Query`], [`NodeQuery`]) hold `&BvhTree`, so the
//! borrow checker rejects mutation mid-iteration at compile time. A cursor
//! owns its state instead and is advanced with an explicit tree reference;
//! mutation between advances is possible there, and the cursor detects it
//! through a version snapshot rather than yielding stale results.

use crate::broad::arena::NIL;
use crate::broad::error::TreeError;
use crate::broad::tree::{BvhTree, ProxyId};
use crate::types::Volume;

/// Starting stack depth; enough for any plausibly balanced tree, and the
/// stack grows past it rather than capping.
const STACK_CAPACITY: usize = 256;

/// Detached payload cursor.
///
/// Yields `(handle, payload)` for every leaf whose stored key overlaps the
/// filter (or every leaf, when unfiltered). Because the cursor does not
/// borrow the tree, the tree may be mutated between advances; the next
/// advance then fails with [`TreeError::ConcurrentModification`]. A finished
/// cursor fails with [`TreeError::CursorExhausted`]; restart by building a
/// new one.
#[derive(Debug)]
pub struct QueryCursor<K> {
    filter: Option<K>,
    stack: Vec<i32>,
    snapshot: u64,
    finished: bool,
}

impl<K: Volume> QueryCursor<K> {
    pub(crate) fn new<T>(tree: &BvhTree<K, T>, filter: Option<K>) -> Self {
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        if tree.root != NIL {
            stack.push(tree.root);
        }
        Self {
            filter,
            stack,
            snapshot: tree.version(),
            finished: false,
        }
    }

    /// Advances to the next matching leaf in `tree`.
    ///
    /// # Errors
    /// [`TreeError::ConcurrentModification`] if the tree was structurally
    /// mutated since the cursor was built; [`TreeError::CursorExhausted`] if
    /// the cursor already returned `Ok(None)`.
    pub fn next_in<'t, T>(
        &mut self,
        tree: &'t BvhTree<K, T>,
    ) -> Result<Option<(ProxyId, &'t T)>, TreeError> {
        if self.finished {
            return Err(TreeError::CursorExhausted);
        }
        if tree.version() != self.snapshot {
            return Err(TreeError::ConcurrentModification);
        }
        while let Some(index) = self.stack.pop() {
            let slot = index as usize;
            if let Some(filter) = &self.filter {
                if !filter.overlaps(&tree.arena.keys[slot]) {
                    continue;
                }
            }
            let node = tree.arena.nodes[slot];
            if node.is_leaf() {
                if let Some(payload) = tree.arena.payloads[slot].as_ref() {
                    return Ok(Some((ProxyId(index), payload)));
                }
            } else {
                self.stack.push(node.child_a);
                self.stack.push(node.child_b);
            }
        }
        self.finished = true;
        Ok(None)
    }
}

/// Detached node cursor: like [`QueryCursor`], but yields the stored key of
/// *every* visited node that matches the filter, branches included.
#[derive(Debug)]
pub struct NodeCursor<K> {
    filter: Option<K>,
    stack: Vec<i32>,
    snapshot: u64,
    finished: bool,
}

impl<K: Volume> NodeCursor<K> {
    pub(crate) fn new<T>(tree: &BvhTree<K, T>, filter: Option<K>) -> Self {
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        if tree.root != NIL {
            stack.push(tree.root);
        }
        Self {
            filter,
            stack,
            snapshot: tree.version(),
            finished: false,
        }
    }

    /// Advances to the next matching node in `tree`.
    ///
    /// # Errors
    /// Same failure modes as [`QueryCursor::next_in`].
    pub fn next_in<T>(&mut self, tree: &BvhTree<K, T>) -> Result<Option<K>, TreeError> {
        if self.finished {
            return Err(TreeError::CursorExhausted);
        }
        if tree.version() != self.snapshot {
            return Err(TreeError::ConcurrentModification);
        }
        while let Some(index) = self.stack.pop() {
            let slot = index as usize;
            let key = tree.arena.keys[slot];
            if let Some(filter) = &self.filter {
                if !filter.overlaps(&key) {
                    continue;
                }
            }
            let node = tree.arena.nodes[slot];
            if !node.is_leaf() {
                self.stack.push(node.child_a);
                self.stack.push(node.child_b);
            }
            return Ok(Some(key));
        }
        self.finished = true;
        Ok(None)
    }
}

/// Lazy overlap query over a borrowed tree; see [`BvhTree::query`](crate::BvhTree::query).
#[derive(Debug)]
pub struct Query<'a, K, T> {
    tree: &'a BvhTree<K, T>,
    cursor: QueryCursor<K>,
}

impl<'a, K: Volume, T> Query<'a, K, T> {
    pub(crate) fn new(tree: &'a BvhTree<K, T>, cursor: QueryCursor<K>) -> Self {
        Self { tree, cursor }
    }
}

impl<'a, K: Volume, T> Iterator for Query<'a, K, T> {
    type Item = (ProxyId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        // The tree is borrowed for the iterator's whole lifetime, so the
        // cursor's failure modes are unreachable here.
        self.cursor.next_in(self.tree).ok().flatten()
    }
}

/// Lazy node-key query over a borrowed tree; see
/// [`BvhTree::debug_nodes`](crate::BvhTree::debug_nodes).
#[derive(Debug)]
pub struct NodeQuery<'a, K, T> {
    tree: &'a BvhTree<K, T>,
    cursor: NodeCursor<K>,
}

impl<'a, K: Volume, T> NodeQuery<'a, K, T> {
    pub(crate) fn new(tree: &'a BvhTree<K, T>, cursor: NodeCursor<K>) -> Self {
        Self { tree, cursor }
    }
}

impl<K: Volume, T> Iterator for NodeQuery<'_, K, T> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_in(self.tree).ok().flatten()
    }
}
