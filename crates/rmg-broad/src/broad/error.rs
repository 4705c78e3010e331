// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use thiserror::Error;

/// Errors surfaced by cursors and by invariant validation.
///
/// Tree mutations themselves are infallible (modulo allocator exhaustion);
/// the failure modes all live on the read side.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The tree was structurally mutated after the cursor snapshotted its
    /// version; the cursor refuses to yield stale results.
    #[error("tree mutated during traversal")]
    ConcurrentModification,
    /// The cursor already finished its sequence; build a new one to restart.
    #[error("cursor advanced past the end of its sequence")]
    CursorExhausted,
    /// An internal invariant does not hold (tree state corruption).
    #[error("tree invariant violated: {0}")]
    InvariantViolation(&'static str),
}
