//! Axis-aligned bounding box

use crate::core::types::Vec3;
use crate::math::gamma;
use crate::math::ray::Ray;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box: identity element for merging
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB enclosing a single point
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Index of the axis along which the box is longest
    pub fn maximum_extent(&self) -> usize {
        let d = self.size();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Total surface area of the box
    pub fn surface_area(&self) -> f32 {
        let d = self.size();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Check if the box contains no space
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Expand AABB to include point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Return merged AABB containing both
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Ray-box intersection using the slab method
    ///
    /// Returns the parametric interval clipped to `[0, ray.t_max]`, or None
    /// if the ray misses. The far plane of every slab is inflated by
    /// `1 + 2*gamma(3)` before comparison so rounding error cannot discard
    /// a legitimate boundary hit.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let t_lo = (self.min - ray.origin) * ray.inv_direction;
        let t_hi = (self.max - ray.origin) * ray.inv_direction;

        let near = t_lo.min(t_hi);
        let far = t_lo.max(t_hi) * (1.0 + 2.0 * gamma(3));

        let t0 = near.max_element().max(0.0);
        let t1 = far.min_element().min(ray.t_max);

        if t0 <= t1 { Some((t0, t1)) } else { None }
    }

    /// Optimized slab test for traversal
    ///
    /// Uses the ray's precomputed inverse direction; `dir_is_neg` selects
    /// the near and far slab planes per axis so no swaps are needed. Applies
    /// the same conservative far-plane inflation as [`Aabb::intersect_ray`].
    /// True iff the clipped interval overlaps `(0, ray.t_max)`.
    pub fn intersect_ray_fast(&self, ray: &Ray, dir_is_neg: [usize; 3]) -> bool {
        let bounds = [self.min, self.max];
        let inv_dir = ray.inv_direction;

        // x and y slabs
        let mut t_min = (bounds[dir_is_neg[0]].x - ray.origin.x) * inv_dir.x;
        let mut t_max = (bounds[1 - dir_is_neg[0]].x - ray.origin.x) * inv_dir.x;
        let ty_min = (bounds[dir_is_neg[1]].y - ray.origin.y) * inv_dir.y;
        let mut ty_max = (bounds[1 - dir_is_neg[1]].y - ray.origin.y) * inv_dir.y;

        t_max *= 1.0 + 2.0 * gamma(3);
        ty_max *= 1.0 + 2.0 * gamma(3);
        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        if ty_min > t_min {
            t_min = ty_min;
        }
        if ty_max < t_max {
            t_max = ty_max;
        }

        // z slab
        let tz_min = (bounds[dir_is_neg[2]].z - ray.origin.z) * inv_dir.z;
        let mut tz_max = (bounds[1 - dir_is_neg[2]].z - ray.origin.z) * inv_dir.z;

        tz_max *= 1.0 + 2.0 * gamma(3);
        if t_min > tz_max || tz_min > t_max {
            return false;
        }
        if tz_min > t_min {
            t_min = tz_min;
        }
        if tz_max < t_max {
            t_max = tz_max;
        }

        t_min < ray.t_max && t_max > 0.0
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
