//! Ray casts used for pointer picking.

use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Nearest hit on a sphere in front of the origin.
    pub fn cast_sphere(&self, center: Vec3, radius: f32) -> Option<Hit> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt = disc.sqrt();
        let t = if -b - sqrt >= 0.0 { -b - sqrt } else { -b + sqrt };
        if t < 0.0 {
            return None;
        }
        let point = self.at(t);
        Some(Hit {
            distance: t,
            point,
            normal: (point - center).normalize_or_zero(),
        })
    }

    /// Hit on a rectangle lying in the local XY plane of a rigid `transform`.
    pub fn cast_panel(&self, transform: Mat4, half_extents: Vec2) -> Option<Hit> {
        let inv = transform.inverse();
        let origin = inv.transform_point3(self.origin);
        let direction = inv.transform_vector3(self.direction);
        if direction.z.abs() < 1e-6 {
            return None;
        }
        let t = -origin.z / direction.z;
        if t < 0.0 {
            return None;
        }
        let local = origin + direction * t;
        if local.x.abs() > half_extents.x || local.y.abs() > half_extents.y {
            return None;
        }
        let normal = transform.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
        Some(Hit {
            distance: t,
            point: self.at(t),
            normal,
        })
    }
}
