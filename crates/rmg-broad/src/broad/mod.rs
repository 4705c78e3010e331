// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dynamic BVH broad phase: arena, tree operations, sibling search, queries.

/// Node pool and free list.
pub(crate) mod arena;
/// Traversal cursors and borrowing query iterators.
pub mod cursor;
/// Error types for cursors and validation.
pub mod error;
/// Candidate heap for the optimal-sibling search.
pub(crate) mod heap;
/// Pairing front consumed by embedding engines.
pub mod pairs;
/// The tree itself.
pub mod tree;
