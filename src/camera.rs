//! Orbit camera, projection and mouse rays.
//!
//! The camera circles a target point at a given distance. Yaw/pitch are driven by
//! pointer drags, the distance by the mouse wheel. Rays for picking are built by
//! unprojecting the cursor through the inverse view-projection matrix.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4, perspective};

use crate::data_structures::bounds::Ray;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0001;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub distance: f32,
    /// Rotation around the Y axis; zero looks down the negative Z axis.
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel of pointer movement.
    pub sensitivity: f32,
}

impl OrbitCamera {
    pub fn new(target: Point3<f32>, distance: f32, yaw: Rad<f32>, pitch: Rad<f32>) -> Self {
        Self {
            target,
            distance,
            yaw,
            pitch,
            min_distance: 0.5,
            max_distance: 200.0,
            sensitivity: 0.005,
        }
    }

    /// Camera at `distance` in front of the origin looking straight at it.
    pub fn looking_at_origin(distance: f32) -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.0), distance, Rad(0.0), Rad(0.0))
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let offset = Vector3::new(
            cos_pitch * sin_yaw,
            sin_pitch,
            cos_pitch * cos_yaw,
        ) * self.distance;
        self.target + offset
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }

    /// Orbits around the target by a pointer delta in pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.yaw -= Rad(dx as f32 * self.sensitivity);
        self.pitch += Rad(dy as f32 * self.sensitivity);
        self.pitch = Rad(self.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    /// Moves towards (positive) or away from (negative) the target.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount * 0.1)).clamp(self.min_distance, self.max_distance);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.0), 6.0, Rad(0.0), Rad(0.5))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera state the renderer and picking need for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub orbit: OrbitCamera,
    pub projection: Projection,
}

impl Camera {
    pub fn new(orbit: OrbitCamera, projection: Projection) -> Self {
        Self { orbit, projection }
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.orbit.view_matrix()
    }

    /// Ray from the eye through the pixel `(x, y)` of a `width` x `height` viewport.
    pub fn cast_ray_from_mouse(&self, x: f64, y: f64, width: u32, height: u32) -> Option<Ray> {
        let inverse = self.view_proj().invert()?;
        let ndc_x = (2.0 * x / f64::from(width.max(1)) - 1.0) as f32;
        let ndc_y = (1.0 - 2.0 * y / f64::from(height.max(1))) as f32;
        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };
        // wgpu clip space depth runs from 0 (near) to 1 (far)
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = far - near;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(Ray::new(near, direction))
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    /// rgb + intensity
    pub light_color: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            light_position: [0.0; 4],
            light_color: [1.0; 4],
        }
    }

    pub fn update(&mut self, camera: &Camera, light: &crate::data_structures::scene_graph::DirectionalLight) {
        self.view_position = camera.orbit.eye().to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
        let [x, y, z] = light.position;
        self.light_position = [x, y, z, 0.0];
        let [r, g, b] = light.color;
        self.light_color = [r, g, b, light.intensity];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
