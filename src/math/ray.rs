//! Ray type and operations

use crate::core::types::Vec3;

/// A ray defined by origin and direction, with a mutable valid interval
///
/// `t_max` bounds the parametric range considered by intersection queries;
/// detail queries shrink it to the closest hit found so far.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
    /// Upper bound of the valid parametric interval
    pub t_max: f32,
}

impl Ray {
    /// Create a new ray with an unbounded interval
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_t_max(origin, direction, f32::INFINITY)
    }

    /// Create a new ray valid on `[0, t_max]`
    ///
    /// A zero direction component yields an infinite inverse, which the
    /// slab tests compare consistently.
    pub fn with_t_max(origin: Vec3, direction: Vec3, t_max: f32) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
            t_max,
        }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Per-axis direction signs, as slab plane indices for the fast AABB test
    pub fn dir_is_neg(&self) -> [usize; 3] {
        [
            (self.inv_direction.x < 0.0) as usize,
            (self.inv_direction.y < 0.0) as usize,
            (self.inv_direction.z < 0.0) as usize,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_inv_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, -4.0, 0.5));
        assert_eq!(ray.inv_direction, Vec3::new(0.5, -0.25, 2.0));
    }

    #[test]
    fn test_default_interval_unbounded() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.t_max, f32::INFINITY);
    }

    #[test]
    fn test_dir_is_neg() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -1.0, 1.0));
        assert_eq!(ray.dir_is_neg(), [0, 1, 0]);
    }

    #[test]
    fn test_zero_component_gives_infinite_inverse() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(ray.inv_direction.y, f32::INFINITY);
    }
}
