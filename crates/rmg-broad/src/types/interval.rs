// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::types::volume::Volume;

/// Closed 1D interval, the one-dimensional counterpart of [`Aabb`](crate::Aabb).
///
/// Invariant: `min <= max`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    min: f32,
    max: f32,
}

impl Interval {
    /// Constructs an interval from its endpoints.
    ///
    /// # Panics
    /// Panics if `min` is greater than `max`.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        assert!(min <= max, "invalid interval: min > max");
        Self { min, max }
    }

    /// Builds an interval from an origin and a non-negative length.
    ///
    /// # Panics
    /// Panics if `length` is negative.
    #[must_use]
    pub fn from_origin_length(origin: f32, length: f32) -> Self {
        assert!(length >= 0.0, "invalid interval: negative length");
        Self {
            min: origin,
            max: origin + length,
        }
    }

    /// Builds a zero-length interval anchored at `x`, for point queries.
    #[must_use]
    pub fn point(x: f32) -> Self {
        Self { min: x, max: x }
    }

    /// Returns the low endpoint.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Returns the high endpoint.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Returns the length of the interval.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.max - self.min
    }
}

impl Volume for Interval {
    type Delta = f32;

    fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn contains(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    fn overlaps(&self, other: &Self) -> bool {
        // Inclusive so touching endpoints count as overlap.
        !(self.max < other.min || self.min > other.max)
    }

    fn inflate(&self, margin: f32) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    fn surface_area(&self) -> f32 {
        self.length()
    }

    fn extend_toward(&self, delta: f32, factor: f32) -> Self {
        let d = delta * factor;
        if d < 0.0 {
            Self {
                min: self.min + d,
                max: self.max,
            }
        } else {
            Self {
                min: self.min,
                max: self.max + d,
            }
        }
    }
}
