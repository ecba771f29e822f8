//! World-space coordinates.

use serde::{Deserialize, Serialize};

/// A point or direction in world space. Block positions use integral values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn minus(&self, other: &Vec3) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    pub fn distance_to(&self, other: &Vec3) -> f64 {
        self.minus(other).length()
    }

    /// The block cell containing this point.
    pub fn floored(&self) -> Self {
        Self::new(self.x.floor(), self.y.floor(), self.z.floor())
    }

    /// Integral cell key, used by world backends to index blocks.
    pub fn cell(&self) -> (i64, i64, i64) {
        let f = self.floored();
        (f.x as i64, f.y as i64, f.z as i64)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.x.floor(),
            self.y.floor(),
            self.z.floor()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-9);
        assert!((v.x - 0.6).abs() < 1e-9);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec3::default().normalize(), Vec3::default());
    }

    #[test]
    fn cell_floors_negative_coordinates() {
        assert_eq!(Vec3::new(-0.5, 64.9, 2.1).cell(), (-1, 64, 2));
    }
}
