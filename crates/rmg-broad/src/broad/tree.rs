// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The dynamic bounding-volume hierarchy.
//!
//! Leaves hold caller payloads under fat (padded) keys; branches hold the
//! union of their children. Insertion picks the sibling that minimizes a
//! surface-area cost via branch-and-bound, and every structural change is
//! followed by an AVL-style rotation pass along the mutated path, so the
//! tree stays shallow while payloads move every tick.

use tracing::trace;

use crate::broad::arena::{NodeArena, NIL};
use crate::broad::cursor::{NodeCursor, NodeQuery, Query, QueryCursor};
use crate::broad::error::TreeError;
use crate::broad::heap::CandidateHeap;
use crate::types::{Aabb, Interval, Vec2, Volume};

/// Default arena capacity for [`BvhTree::new`] and [`BvhTree::clear`].
pub const DEFAULT_CAPACITY: usize = 64;
/// Default symmetric padding applied to keys on insert.
pub const DEFAULT_EXPAND_MARGIN: f32 = 2.0;
/// Default multiplier applied to displacements by [`BvhTree::move_proxy`].
pub const DEFAULT_MOVE_MULTIPLIER: f32 = 4.0;

/// Stable handle to a leaf. Handles survive insertions, removals of other
/// leaves, and every update of their own leaf; they die only with
/// [`BvhTree::remove`] or [`BvhTree::clear`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProxyId(pub(crate) i32);

impl ProxyId {
    /// The absent handle. [`BvhTree::remove`] accepts it as a no-op.
    pub const NIL: Self = Self(NIL);

    /// Returns `true` for the absent handle.
    #[must_use]
    pub fn is_nil(self) -> bool {
        self.0 == NIL
    }
}

/// The tree, monomorphized as [`AabbTree`] in 2D and [`IntervalTree`] in 1D.
#[derive(Debug)]
pub struct BvhTree<K, T> {
    pub(crate) arena: NodeArena<K, T>,
    pub(crate) root: i32,
    leaf_count: usize,
    expand_margin: f32,
    move_multiplier: f32,
    version: u64,
    heap: CandidateHeap,
}

/// 2D monomorphization keyed by [`Aabb`].
pub type AabbTree<T> = BvhTree<Aabb, T>;
/// 1D monomorphization keyed by [`Interval`].
pub type IntervalTree<T> = BvhTree<Interval, T>;

impl<K: Volume, T> Default for BvhTree<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Volume, T> BvhTree<K, T> {
    /// Creates an empty tree with default capacity and tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(DEFAULT_CAPACITY, DEFAULT_EXPAND_MARGIN, DEFAULT_MOVE_MULTIPLIER)
    }

    /// Creates an empty tree with the given arena capacity and default tuning.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_tuning(capacity, DEFAULT_EXPAND_MARGIN, DEFAULT_MOVE_MULTIPLIER)
    }

    /// Creates an empty tree with explicit tuning.
    ///
    /// `expand_margin` is the symmetric padding added to every inserted key;
    /// `move_multiplier` scales displacements in [`BvhTree::move_proxy`] and
    /// sizes its staleness check.
    #[must_use]
    pub fn with_tuning(capacity: usize, expand_margin: f32, move_multiplier: f32) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            root: NIL,
            leaf_count: 0,
            expand_margin,
            move_multiplier,
            version: 0,
            heap: CandidateHeap::default(),
        }
    }

    /// Inserts `payload` under `key` padded by the expand margin and returns
    /// its handle.
    pub fn insert(&mut self, key: K, payload: T) -> ProxyId {
        self.insert_padded(key.inflate(self.expand_margin), payload)
    }

    /// Inserts with `key` stored exactly as given (already padded by the
    /// caller's policy).
    fn insert_padded(&mut self, key: K, payload: T) -> ProxyId {
        let leaf = self.arena.allocate(key, Some(payload));
        self.leaf_count += 1;
        self.version += 1;
        self.insert_leaf(leaf);
        ProxyId(leaf)
    }

    /// Removes a leaf. Passing [`ProxyId::NIL`] is a no-op.
    pub fn remove(&mut self, proxy: ProxyId) {
        if proxy.is_nil() {
            return;
        }
        debug_assert!(self.is_live_leaf(proxy.0), "remove: stale proxy handle");
        if !self.is_live_leaf(proxy.0) {
            return;
        }
        self.remove_leaf(proxy.0);
        self.arena.release(proxy.0);
        self.leaf_count -= 1;
        self.version += 1;
    }

    /// Drops every leaf and resets the arena at default capacity.
    pub fn clear(&mut self) {
        self.clear_with_capacity(DEFAULT_CAPACITY);
    }

    /// Drops every leaf and resets the arena at `capacity`.
    pub fn clear_with_capacity(&mut self, capacity: usize) {
        self.arena.reset(capacity);
        self.root = NIL;
        self.leaf_count = 0;
        self.version += 1;
        trace!(capacity, "cleared tree");
    }

    /// Replaces a leaf's key.
    ///
    /// When `key` still fits inside the stored fat key the write happens in
    /// place and nothing else moves (returns `false`, version unchanged).
    /// Otherwise the leaf is detached and re-inserted under `key` padded by
    /// the expand margin (returns `true`). The handle stays valid either way.
    #[must_use = "the flag reports whether the tree was restructured"]
    pub fn update(&mut self, proxy: ProxyId, key: K) -> bool {
        debug_assert!(self.is_live_leaf(proxy.0), "update: stale proxy handle");
        if !self.is_live_leaf(proxy.0) {
            return false;
        }
        let leaf = proxy.0;
        if self.arena.keys[leaf as usize].contains(&key) {
            self.arena.keys[leaf as usize] = key;
            return false;
        }
        self.reinsert(leaf, key.inflate(self.expand_margin));
        true
    }

    /// Replaces a leaf's key with motion prediction.
    ///
    /// The new key is padded by the expand margin and then skewed toward
    /// `displacement` scaled by the move multiplier, so a payload that slows,
    /// reverses, or jitters inside its predicted envelope absorbs the call as
    /// a key overwrite. A reinsert happens when the skewed key escapes the
    /// stored one, or when the stored key has gone stale (grossly larger
    /// than the current motion warrants).
    #[must_use = "the flag reports whether the tree was restructured"]
    pub fn move_proxy(&mut self, proxy: ProxyId, key: K, displacement: K::Delta) -> bool {
        debug_assert!(self.is_live_leaf(proxy.0), "move_proxy: stale proxy handle");
        if !self.is_live_leaf(proxy.0) {
            return false;
        }
        let leaf = proxy.0;
        let padded = key
            .inflate(self.expand_margin)
            .extend_toward(displacement, self.move_multiplier);
        let stored = self.arena.keys[leaf as usize];
        if stored.contains(&padded) && padded.inflate(self.move_multiplier).contains(&stored) {
            self.arena.keys[leaf as usize] = padded;
            return false;
        }
        self.reinsert(leaf, padded);
        true
    }

    /// Detaches `leaf`, rewrites its stored key, and links it back in. The
    /// slot — and therefore the handle — is reused.
    fn reinsert(&mut self, leaf: i32, key: K) {
        trace!(leaf, "reinserting leaf outside its fat key");
        self.remove_leaf(leaf);
        self.version += 1;
        self.arena.keys[leaf as usize] = key;
        self.insert_leaf(leaf);
        self.version += 1;
    }

    /// Returns the stored (padded) key for a live handle.
    #[must_use]
    pub fn fat_key(&self, proxy: ProxyId) -> Option<K> {
        self.is_live_leaf(proxy.0)
            .then(|| self.arena.keys[proxy.0 as usize])
    }

    /// Returns the payload for a live handle.
    #[must_use]
    pub fn payload(&self, proxy: ProxyId) -> Option<&T> {
        if proxy.0 < 0 || proxy.0 as usize >= self.arena.capacity() {
            return None;
        }
        self.arena.payloads[proxy.0 as usize].as_ref()
    }

    /// Number of live leaves (externally visible items).
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Returns `true` when the tree holds no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Number of live arena slots, branches included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// The root's key — the padded bounds of everything stored — or `None`
    /// when the tree is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<K> {
        (self.root != NIL).then(|| self.arena.keys[self.root as usize])
    }

    /// Monotonic counter bumped by every structural mutation. In-place key
    /// overwrites (the `false` paths of update/move) do not bump it.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Lazy overlap query: every `(handle, payload)` whose stored key
    /// overlaps `key`, in deterministic depth-first order.
    #[must_use]
    pub fn query(&self, key: &K) -> Query<'_, K, T> {
        Query::new(self, self.query_cursor(key))
    }

    /// Lazy iteration over every `(handle, payload)` in the tree.
    #[must_use]
    pub fn iter(&self) -> Query<'_, K, T> {
        Query::new(self, self.iter_cursor())
    }

    /// Like [`BvhTree::query`], but yields the stored key of *every* visited
    /// node that overlaps `key`, branches included. Debug aid.
    #[must_use]
    pub fn debug_nodes(&self, key: &K) -> NodeQuery<'_, K, T> {
        NodeQuery::new(self, NodeCursor::new(self, Some(*key)))
    }

    /// Yields the stored key of every node in the tree, branches included.
    #[must_use]
    pub fn debug_all_nodes(&self) -> NodeQuery<'_, K, T> {
        NodeQuery::new(self, NodeCursor::new(self, None))
    }

    /// Detached cursor form of [`BvhTree::query`]; see [`QueryCursor`].
    #[must_use]
    pub fn query_cursor(&self, key: &K) -> QueryCursor<K> {
        QueryCursor::new(self, Some(*key))
    }

    /// Detached cursor form of [`BvhTree::iter`].
    #[must_use]
    pub fn iter_cursor(&self) -> QueryCursor<K> {
        QueryCursor::new(self, None)
    }

    /// Detached cursor form of the debug queries; `None` visits everything.
    #[must_use]
    pub fn debug_cursor(&self, key: Option<K>) -> NodeCursor<K> {
        NodeCursor::new(self, key)
    }

    fn is_live_leaf(&self, index: i32) -> bool {
        index >= 0
            && (index as usize) < self.arena.capacity()
            && self.arena.payloads[index as usize].is_some()
    }

    // ------------------------------------------------------------------
    // Structural internals
    // ------------------------------------------------------------------

    /// Links a detached leaf into the tree next to its optimal sibling.
    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NIL {
            self.root = leaf;
            self.arena.nodes[leaf as usize].parent = NIL;
            return;
        }

        let leaf_key = self.arena.keys[leaf as usize];
        let sibling = self.best_sibling(&leaf_key);
        let old_parent = self.arena.nodes[sibling as usize].parent;
        let sibling_height = self.arena.nodes[sibling as usize].height;
        let branch_key = leaf_key.union(&self.arena.keys[sibling as usize]);

        let branch = self.arena.allocate(branch_key, None);
        {
            let node = &mut self.arena.nodes[branch as usize];
            node.parent = old_parent;
            node.child_a = sibling;
            node.child_b = leaf;
            node.height = sibling_height + 1;
        }
        self.arena.nodes[sibling as usize].parent = branch;
        self.arena.nodes[leaf as usize].parent = branch;

        if old_parent == NIL {
            self.root = branch;
        } else {
            let parent = &mut self.arena.nodes[old_parent as usize];
            if parent.child_a == sibling {
                parent.child_a = branch;
            } else {
                parent.child_b = branch;
            }
        }

        self.refit_from(branch);
    }

    /// Unlinks a leaf, hoisting its sibling into the freed parent slot. The
    /// leaf's own slot is left to the caller.
    fn remove_leaf(&mut self, leaf: i32) {
        if leaf == self.root {
            self.root = NIL;
            return;
        }

        let parent = self.arena.nodes[leaf as usize].parent;
        let grandparent = self.arena.nodes[parent as usize].parent;
        let pnode = self.arena.nodes[parent as usize];
        let sibling = if pnode.child_a == leaf {
            pnode.child_b
        } else {
            pnode.child_a
        };

        if grandparent == NIL {
            self.root = sibling;
            self.arena.nodes[sibling as usize].parent = NIL;
            self.arena.release(parent);
        } else {
            let gnode = &mut self.arena.nodes[grandparent as usize];
            if gnode.child_a == parent {
                gnode.child_a = sibling;
            } else {
                gnode.child_b = sibling;
            }
            self.arena.nodes[sibling as usize].parent = grandparent;
            self.arena.release(parent);
            self.refit_from(grandparent);
        }
    }

    /// Branch-and-bound search for the sibling that minimizes insertion cost.
    ///
    /// The heap is keyed by the accumulated delta cost of enlarging every
    /// ancestor on the path; a subtree is pruned when even the best case —
    /// the new key slotted in with no further enlargement — cannot beat the
    /// current best candidate.
    fn best_sibling(&mut self, key: &K) -> i32 {
        let mut best = self.root;
        let mut best_cost = f32::INFINITY;

        let root_key = self.arena.keys[self.root as usize];
        let seed_delta = key.union(&root_key).surface_area() - root_key.surface_area();
        self.heap.clear();
        self.heap.push(seed_delta, self.root);

        while let Some((delta, index)) = self.heap.pop() {
            let node_key = self.arena.keys[index as usize];
            let union_area = key.union(&node_key).surface_area();

            let cost = union_area + delta;
            if cost < best_cost {
                best_cost = cost;
                best = index;
            }

            let node = self.arena.nodes[index as usize];
            if node.is_leaf() {
                continue;
            }
            let child_delta = delta + (union_area - node_key.surface_area());
            let lower_bound = key.surface_area() + child_delta;
            if lower_bound < best_cost {
                self.heap.push(child_delta, node.child_a);
                self.heap.push(child_delta, node.child_b);
            }
        }

        best
    }

    /// Walks from `start` to the root, rebalancing and then recomputing the
    /// union key and height at every step.
    fn refit_from(&mut self, start: i32) {
        let mut index = start;
        while index != NIL {
            index = self.balance(index);
            self.refresh(index);
            index = self.arena.nodes[index as usize].parent;
        }
    }

    /// Recomputes a branch's key and height from its children.
    fn refresh(&mut self, index: i32) {
        let node = self.arena.nodes[index as usize];
        debug_assert!(!node.is_leaf(), "refresh called on a leaf");
        let a = node.child_a as usize;
        let b = node.child_b as usize;
        self.arena.keys[index as usize] = self.arena.keys[a].union(&self.arena.keys[b]);
        self.arena.nodes[index as usize].height =
            1 + self.arena.nodes[a].height.max(self.arena.nodes[b].height);
    }

    /// Rotates a child up when the subtree under `a` leans more than one
    /// level, returning the index now occupying `a`'s position.
    ///
    /// On equal grandchild heights the second child stays under the rotated
    /// node; query order depends on this, so it must not change.
    fn balance(&mut self, a: i32) -> i32 {
        let node_a = self.arena.nodes[a as usize];
        if node_a.is_leaf() || node_a.height < 2 {
            return a;
        }

        let b = node_a.child_a;
        let c = node_a.child_b;
        let lean = self.arena.nodes[c as usize].height - self.arena.nodes[b as usize].height;

        // Rotate C up.
        if lean > 1 {
            let f = self.arena.nodes[c as usize].child_a;
            let g = self.arena.nodes[c as usize].child_b;

            self.arena.nodes[c as usize].child_a = a;
            self.arena.nodes[c as usize].parent = self.arena.nodes[a as usize].parent;
            self.arena.nodes[a as usize].parent = c;

            let hoisted_parent = self.arena.nodes[c as usize].parent;
            if hoisted_parent == NIL {
                self.root = c;
            } else {
                let parent = &mut self.arena.nodes[hoisted_parent as usize];
                if parent.child_a == a {
                    parent.child_a = c;
                } else {
                    parent.child_b = c;
                }
            }

            if self.arena.nodes[f as usize].height > self.arena.nodes[g as usize].height {
                self.arena.nodes[c as usize].child_b = f;
                self.arena.nodes[a as usize].child_b = g;
                self.arena.nodes[g as usize].parent = a;
            } else {
                self.arena.nodes[c as usize].child_b = g;
                self.arena.nodes[a as usize].child_b = f;
                self.arena.nodes[f as usize].parent = a;
            }
            self.refresh(a);
            self.refresh(c);

            return c;
        }

        // Rotate B up.
        if lean < -1 {
            let d = self.arena.nodes[b as usize].child_a;
            let e = self.arena.nodes[b as usize].child_b;

            self.arena.nodes[b as usize].child_a = a;
            self.arena.nodes[b as usize].parent = self.arena.nodes[a as usize].parent;
            self.arena.nodes[a as usize].parent = b;

            let hoisted_parent = self.arena.nodes[b as usize].parent;
            if hoisted_parent == NIL {
                self.root = b;
            } else {
                let parent = &mut self.arena.nodes[hoisted_parent as usize];
                if parent.child_a == a {
                    parent.child_a = b;
                } else {
                    parent.child_b = b;
                }
            }

            if self.arena.nodes[d as usize].height > self.arena.nodes[e as usize].height {
                self.arena.nodes[b as usize].child_b = d;
                self.arena.nodes[a as usize].child_a = e;
                self.arena.nodes[e as usize].parent = a;
            } else {
                self.arena.nodes[b as usize].child_b = e;
                self.arena.nodes[a as usize].child_a = d;
                self.arena.nodes[d as usize].parent = a;
            }
            self.refresh(a);
            self.refresh(b);

            return b;
        }

        a
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Walks the whole arena and verifies every structural invariant: node
    /// shape, key unions, the height recurrence, the balance bound, mutual
    /// parent/child consistency, and free-list/live-set disjointness.
    ///
    /// # Errors
    /// Returns [`TreeError::InvariantViolation`] naming the first failed
    /// invariant.
    pub fn validate(&self) -> Result<(), TreeError> {
        let capacity = self.arena.capacity();
        let mut reachable = vec![false; capacity];
        let mut live = 0usize;
        let mut leaves = 0usize;

        if self.root != NIL {
            if self.arena.nodes[self.root as usize].parent != NIL {
                return Err(TreeError::InvariantViolation("root has a parent"));
            }
            let mut stack = vec![self.root];
            while let Some(index) = stack.pop() {
                let slot = index as usize;
                if slot >= capacity {
                    return Err(TreeError::InvariantViolation("node index out of range"));
                }
                if reachable[slot] {
                    return Err(TreeError::InvariantViolation("node reachable twice"));
                }
                reachable[slot] = true;
                live += 1;

                let node = self.arena.nodes[slot];
                if node.is_leaf() {
                    leaves += 1;
                    if node.child_b != NIL {
                        return Err(TreeError::InvariantViolation("leaf with one child"));
                    }
                    if node.height != 0 {
                        return Err(TreeError::InvariantViolation("leaf with nonzero height"));
                    }
                    if self.arena.payloads[slot].is_none() {
                        return Err(TreeError::InvariantViolation("leaf without payload"));
                    }
                } else {
                    if node.child_b == NIL {
                        return Err(TreeError::InvariantViolation("branch with one child"));
                    }
                    if self.arena.payloads[slot].is_some() {
                        return Err(TreeError::InvariantViolation("branch holding a payload"));
                    }
                    let a = node.child_a as usize;
                    let b = node.child_b as usize;
                    if self.arena.nodes[a].parent != index || self.arena.nodes[b].parent != index {
                        return Err(TreeError::InvariantViolation("child does not point back"));
                    }
                    let expected_height =
                        1 + self.arena.nodes[a].height.max(self.arena.nodes[b].height);
                    if node.height != expected_height {
                        return Err(TreeError::InvariantViolation("height recurrence broken"));
                    }
                    if (self.arena.nodes[a].height - self.arena.nodes[b].height).abs() > 1 {
                        return Err(TreeError::InvariantViolation("balance bound exceeded"));
                    }
                    if self.arena.keys[slot] != self.arena.keys[a].union(&self.arena.keys[b]) {
                        return Err(TreeError::InvariantViolation("branch key is not the union"));
                    }
                    stack.push(node.child_a);
                    stack.push(node.child_b);
                }
            }
        }

        if live != self.arena.node_count() {
            return Err(TreeError::InvariantViolation("node count mismatch"));
        }
        if leaves != self.leaf_count {
            return Err(TreeError::InvariantViolation("leaf count mismatch"));
        }
        if self.root == NIL && self.arena.node_count() != 0 {
            return Err(TreeError::InvariantViolation("live nodes with no root"));
        }

        let mut free = 0usize;
        let mut cursor = self.arena.free_head();
        while cursor != NIL {
            let slot = cursor as usize;
            if slot >= capacity {
                return Err(TreeError::InvariantViolation("free index out of range"));
            }
            if reachable[slot] {
                return Err(TreeError::InvariantViolation("free slot reachable from root"));
            }
            if self.arena.payloads[slot].is_some() {
                return Err(TreeError::InvariantViolation("free slot holding a payload"));
            }
            free += 1;
            if free > capacity {
                return Err(TreeError::InvariantViolation("free list cycle"));
            }
            cursor = self.arena.nodes[slot].child_a;
        }
        if live + free != capacity {
            return Err(TreeError::InvariantViolation("slots neither live nor free"));
        }

        Ok(())
    }
}

impl<T> AabbTree<T> {
    /// Region query anchored at a single point.
    #[must_use]
    pub fn query_point(&self, p: Vec2) -> Query<'_, Aabb, T> {
        self.query(&Aabb::point(p))
    }
}

impl<T> IntervalTree<T> {
    /// Region query anchored at a single coordinate.
    #[must_use]
    pub fn query_point(&self, x: f32) -> Query<'_, Interval, T> {
        self.query(&Interval::point(x))
    }
}
