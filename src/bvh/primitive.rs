//! Primitive contract consumed by the accelerator

use crate::core::types::Vec3;
use crate::math::{Aabb, Ray};

/// Surface hit reported by a detail intersection query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Ray parameter of the hit
    pub t: f32,
    /// World-space hit position
    pub point: Vec3,
}

/// Capability contract for anything the accelerator can index
///
/// Aggregates satisfy the contract themselves, so accelerators nest.
pub trait Primitive: Send + Sync {
    /// World-space bound, stable for the primitive's lifetime
    fn world_bound(&self) -> Aabb;

    /// Detail query
    ///
    /// On a hit, shrinks `ray.t_max` to the hit distance and returns the
    /// hit. On a miss, `ray.t_max` is left unchanged.
    fn intersect(&self, ray: &mut Ray) -> Option<Hit>;

    /// Occlusion predicate: true iff the ray hits within `[0, ray.t_max]`
    fn intersect_p(&self, ray: &Ray) -> bool;
}

/// Axis-aligned box primitive
///
/// A ray starting inside the box reports the exit face. Used by the demo
/// binary and throughout the test suite; real scenes bring their own
/// primitives.
#[derive(Clone, Copy, Debug)]
pub struct BoxPrimitive {
    bounds: Aabb,
}

impl BoxPrimitive {
    /// Create a box primitive covering `bounds`
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }

    /// Parameter of the first surface crossing in `(0, ray.t_max]`
    ///
    /// Works on the unclipped slab interval: a ray whose origin is inside
    /// the box reports the exit face, and a crossing beyond `ray.t_max` is
    /// a miss rather than a hit at the clipped interval end.
    fn surface_crossing(&self, ray: &Ray) -> Option<f32> {
        let t_lo = (self.bounds.min - ray.origin) * ray.inv_direction;
        let t_hi = (self.bounds.max - ray.origin) * ray.inv_direction;

        let t_near = t_lo.min(t_hi).max_element();
        let t_far = t_lo.max(t_hi).min_element();
        if t_near > t_far {
            return None;
        }

        let t = if t_near > 0.0 { t_near } else { t_far };
        (t > 0.0 && t <= ray.t_max).then_some(t)
    }
}

impl Primitive for BoxPrimitive {
    fn world_bound(&self) -> Aabb {
        self.bounds
    }

    fn intersect(&self, ray: &mut Ray) -> Option<Hit> {
        let t = self.surface_crossing(ray)?;
        ray.t_max = t;
        Some(Hit { t, point: ray.at(t) })
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.surface_crossing(ray).is_some()
    }
}
