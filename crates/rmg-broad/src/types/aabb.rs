// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::types::vec2::Vec2;
use crate::types::volume::Volume;

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Values are `f32` and represent metres in world space.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Constructs an AABB from its minimum and maximum corners.
    ///
    /// # Panics
    /// Panics if any component of `min` is greater than its counterpart in `max`.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        let a = min.to_array();
        let b = max.to_array();
        assert!(a[0] <= b[0] && a[1] <= b[1], "invalid AABB: min > max");
        Self { min, max }
    }

    /// Builds an AABB from an origin corner and non-negative extents.
    ///
    /// # Panics
    /// Panics if `w` or `h` is negative.
    #[must_use]
    pub fn from_origin_extents(x: f32, y: f32, w: f32, h: f32) -> Self {
        assert!(w >= 0.0 && h >= 0.0, "invalid AABB: negative extent");
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    /// Builds a zero-extent AABB anchored at `p`, for point queries.
    #[must_use]
    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.max
    }

    /// Returns the extent along the X axis.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.to_array()[0] - self.min.to_array()[0]
    }

    /// Returns the extent along the Y axis.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.to_array()[1] - self.min.to_array()[1]
    }
}

impl Volume for Aabb {
    type Delta = Vec2;

    fn union(&self, other: &Self) -> Self {
        let a = self.min.to_array();
        let b = self.max.to_array();
        let c = other.min.to_array();
        let d = other.max.to_array();
        Self {
            min: Vec2::new(a[0].min(c[0]), a[1].min(c[1])),
            max: Vec2::new(b[0].max(d[0]), b[1].max(d[1])),
        }
    }

    fn contains(&self, other: &Self) -> bool {
        let a_min = self.min.to_array();
        let a_max = self.max.to_array();
        let b_min = other.min.to_array();
        let b_max = other.max.to_array();
        a_min[0] <= b_min[0] && a_min[1] <= b_min[1] && b_max[0] <= a_max[0] && b_max[1] <= a_max[1]
    }

    fn overlaps(&self, other: &Self) -> bool {
        let a_min = self.min.to_array();
        let a_max = self.max.to_array();
        let b_min = other.min.to_array();
        let b_max = other.max.to_array();
        // Inclusive to treat touching edges as overlap for broad-phase pairing.
        !(a_max[0] < b_min[0] || a_min[0] > b_max[0] || a_max[1] < b_min[1] || a_min[1] > b_max[1])
    }

    fn inflate(&self, margin: f32) -> Self {
        let delta = Vec2::new(margin, margin);
        Self {
            min: self.min.sub(&delta),
            max: self.max.add(&delta),
        }
    }

    fn surface_area(&self) -> f32 {
        self.width() * self.height()
    }

    fn extend_toward(&self, delta: Vec2, factor: f32) -> Self {
        let d = delta.scale(factor).to_array();
        let mut min = self.min.to_array();
        let mut max = self.max.to_array();
        for axis in 0..2 {
            if d[axis] < 0.0 {
                min[axis] += d[axis];
            } else {
                max[axis] += d[axis];
            }
        }
        Self {
            min: Vec2::from(min),
            max: Vec2::from(max),
        }
    }
}
