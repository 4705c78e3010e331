// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// Deterministic 2D vector used for positions, extents, and displacements.
///
/// * Components encode world-space metres and may represent either points or
///   offsets depending on the calling context.
/// * Arithmetic uses `f32` so results round like the runtime's float32 mode.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    data: [f32; 2],
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector from components.
    ///
    /// Inputs are interpreted as metres in world coordinates; callers must
    /// ensure values are finite.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { data: [x, y] }
    }

    /// Returns the components as an array.
    #[must_use]
    pub fn to_array(self) -> [f32; 2] {
        self.data
    }

    /// Adds two vectors.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.data[0] + other.data[0], self.data[1] + other.data[1])
    }

    /// Subtracts another vector.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.data[0] - other.data[0], self.data[1] - other.data[1])
    }

    /// Scales the vector by a scalar.
    #[must_use]
    pub fn scale(&self, scalar: f32) -> Self {
        Self::new(self.data[0] * scalar, self.data[1] * scalar)
    }
}

/// Converts a 2-element `[f32; 2]` array into a `Vec2` interpreted as `(x, y)`.
///
/// # Examples
/// ```
/// use rmg_broad::Vec2;
/// let v = Vec2::from([1.0, 2.0]);
/// assert_eq!(v.to_array(), [1.0, 2.0]);
/// ```
impl From<[f32; 2]> for Vec2 {
    fn from(value: [f32; 2]) -> Self {
        Self { data: value }
    }
}
