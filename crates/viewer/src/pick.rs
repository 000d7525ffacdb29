use glam::{Mat4, Vec2, Vec3};

use crate::scene::Aabb;

const EPSILON: f32 = 1e-8;

/// A world-space ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Cast a ray through a pointer position, given in pixels from the
    /// top-left corner of a viewport of `viewport` pixels.
    ///
    /// Returns `None` for an empty viewport or a degenerate projection.
    pub fn from_viewport(pointer: Vec2, viewport: Vec2, inverse_view_proj: Mat4) -> Option<Self> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            pointer.x / viewport.x * 2.0 - 1.0,
            1.0 - pointer.y / viewport.y * 2.0,
        );
        // wgpu clip space puts depth in 0..1
        let near = inverse_view_proj.project_point3(ndc.extend(0.0));
        let far = inverse_view_proj.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        near.is_finite().then_some(Self {
            origin: near,
            direction,
        })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Möller–Trumbore. Both faces count as hits.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Slab test. Returns the entry distance, or zero when starting inside.
pub fn intersect_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inverse = ray.direction.recip();
    let t1 = (aabb.min - ray.origin) * inverse;
    let t2 = (aabb.max - ray.origin) * inverse;
    // NaN from 0 * inf is dropped by min/max
    let t_min = t1.min(t2).max_element().max(0.0);
    let t_max = t1.max(t2).min_element();
    (t_max >= t_min).then_some(t_min)
}
