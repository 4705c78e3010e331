// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rmg-broad: dynamic bounding-volume hierarchy for broad-phase queries.
//!
//! This crate provides:
//! - A dynamic BVH ([`BvhTree`]) with insertion, removal, in-place update,
//!   motion-predictive movement, and lazy overlap queries, in 2D
//!   ([`AabbTree`]) and 1D ([`IntervalTree`]) monomorphizations.
//! - The key types ([`Aabb`], [`Interval`]) and the dimensional abstraction
//!   over them ([`Volume`]).
//! - A pairing front ([`PairIndex`]) implementing the [`BroadPhase`] trait
//!   an embedding engine consumes.
//!
//! Design notes:
//! - Deterministic: queries walk a fixed depth-first order; insertion cost
//!   ties resolve first-come; rotation tie-breaks are pinned.
//! - Index-based: the tree lives in parallel vectors with a free list, so
//!   steady-state mutation allocates nothing and handles are plain integers.
//! - Fat keys: stored keys are padded (and skewed toward predicted motion)
//!   so most per-tick updates are a single key overwrite.
//! - Float32 throughout; operations favor clarity and reproducibility.
//! - Rustdoc is treated as part of the contract; public items are documented.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::use_self
)]

/// Broad-phase tree machinery.
pub mod broad;
/// Foundational geometric key types.
pub mod types;

pub use broad::cursor::{NodeCursor, NodeQuery, Query, QueryCursor};
pub use broad::error::TreeError;
pub use broad::pairs::{BroadPhase, PairIndex};
pub use broad::tree::{
    AabbTree, BvhTree, IntervalTree, ProxyId, DEFAULT_CAPACITY, DEFAULT_EXPAND_MARGIN,
    DEFAULT_MOVE_MULTIPLIER,
};
pub use types::{Aabb, Interval, Vec2, Volume};
