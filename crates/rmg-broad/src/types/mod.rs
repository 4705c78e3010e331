// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// Axis-aligned bounding box type.
pub mod aabb;
/// 1D interval type.
pub mod interval;
/// Deterministic 2D vector type.
pub mod vec2;
/// The dimensional abstraction shared by both key types.
pub mod volume;

pub use aabb::Aabb;
pub use interval::Interval;
pub use vec2::Vec2;
pub use volume::Volume;
