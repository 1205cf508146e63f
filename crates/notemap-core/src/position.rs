//! Spatial coordinates for laid-out nodes.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point in layout space. 2-D layouts keep `z` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Position { x, y, z }
    }

    pub fn planar(x: f32, y: f32) -> Self {
        Position { x, y, z: 0.0 }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Position) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or the origin for a zero vector.
    pub fn normalized(self) -> Position {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            Position::ORIGIN
        }
    }

    /// Scales the vector down so its length does not exceed `max`.
    pub fn clamp_length(self, max: f32) -> Position {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Bit pattern of the three coordinates, for exact-coincidence checks.
    pub fn to_bits(self) -> [u32; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Position {
    fn sub_assign(&mut self, rhs: Position) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Position {
    type Output = Position;

    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Position::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Position::new(0.5, 1.5, 2.5));
        assert_eq!(b * 2.0, Position::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn clamp_length_limits_magnitude() {
        let v = Position::planar(30.0, 40.0);
        let clamped = v.clamp_length(5.0);
        assert!((clamped.length() - 5.0).abs() < 1e-5);
        assert_eq!(Position::planar(1.0, 0.0).clamp_length(5.0), Position::planar(1.0, 0.0));
    }

    #[test]
    fn normalized_zero_is_origin() {
        assert_eq!(Position::ORIGIN.normalized(), Position::ORIGIN);
    }

    #[test]
    fn missing_z_deserializes_as_zero() {
        let p: Position = serde_json::from_str(r#"{"x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(p, Position::planar(1.0, 2.0));
    }
}
