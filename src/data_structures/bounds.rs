//! Axis-aligned bounding boxes and rays.

use cgmath::{ElementWise, InnerSpace, Matrix4, Vector3, Vector4};

/// Axis-aligned bounding box. An empty box has `min > max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Self {
        points.into_iter().fold(Self::empty(), |acc, p| acc.including(p))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn including(mut self, p: Vector3<f32>) -> Self {
        self.min = Vector3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Vector3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
        self
    }

    pub fn union(&self, other: &Aabb) -> Self {
        if other.is_empty() {
            return *self;
        }
        self.including(other.min).including(other.max)
    }

    /// Width, height and depth. Zero for an empty box.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        self.max - self.min
    }

    pub fn max_extent(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// True when there is nothing to normalise against (empty or flat in every axis).
    pub fn is_degenerate(&self) -> bool {
        let extent = self.max_extent();
        self.is_empty() || !extent.is_finite() || extent <= f32::EPSILON
    }

    /// Box enclosing this box after `matrix` was applied to all eight corners.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        if self.is_empty() {
            return *self;
        }
        let corners = (0..8).map(|i| {
            let pick = |bit: usize, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
            let corner = Vector4::new(
                pick(1, self.min.x, self.max.x),
                pick(2, self.min.y, self.max.y),
                pick(4, self.min.z, self.max.z),
                1.0,
            );
            (matrix * corner).truncate()
        });
        Self::from_points(corners)
    }

    /// Slab test. Returns the distance along the ray to the entry point, `0.0` if the
    /// origin is inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let inv = Vector3::new(1.0, 1.0, 1.0).div_element_wise(ray.direction);
        let t0 = (self.min - ray.origin).mul_element_wise(inv);
        let t1 = (self.max - ray.origin).mul_element_wise(inv);
        let t_near = t0.x.min(t1.x).max(t0.y.min(t1.y)).max(t0.z.min(t1.z));
        let t_far = t0.x.max(t1.x).min(t0.y.max(t1.y)).min(t0.z.max(t1.z));
        if t_near.is_nan() || t_far.is_nan() || t_far < t_near.max(0.0) {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}
