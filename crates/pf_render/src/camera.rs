use glam::{Mat4, Vec2, Vec3};

use crate::pick::Ray;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// xyz: direction the light travels, w: intensity.
    pub light_dir: [f32; 4],
    /// rgb: ambient colour, a: intensity.
    pub ambient: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub direction: Vec3,
    pub intensity: f32,
    pub ambient: Vec3,
    pub ambient_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, 0.4).normalize(),
            intensity: 0.8,
            ambient: Vec3::ONE,
            ambient_intensity: 0.5,
        }
    }
}

/// Perspective camera looking from `eye` at `target`.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub viewport: (u32, u32),
}

impl Camera3D {
    pub fn new(eye: Vec3, target: Vec3, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fovy: std::f32::consts::FRAC_PI_4,
            znear: 0.1,
            zfar: 1000.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect(), self.znear, self.zfar)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn build_uniform(&self, lighting: &Lighting) -> SceneUniform {
        SceneUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            eye: self.eye.extend(1.0).to_array(),
            light_dir: lighting
                .direction
                .normalize_or_zero()
                .extend(lighting.intensity)
                .to_array(),
            ambient: lighting.ambient.extend(lighting.ambient_intensity).to_array(),
        }
    }

    /// Window pixel (origin top-left) of a world point, or `None` when it
    /// lies behind the camera or outside the depth range.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Some(Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h))
    }

    /// World-space ray through a window pixel (origin top-left).
    pub fn screen_ray(&self, screen: Vec2) -> Ray {
        let (w, h) = (self.viewport.0.max(1) as f32, self.viewport.1.max(1) as f32);
        let ndc = Vec2::new(2.0 * screen.x / w - 1.0, 1.0 - 2.0 * screen.y / h);
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

/// Camera orbiting `target` on a sphere, parameterised like a turntable:
/// `alpha` is the longitude, `beta` the angle down from +Y.
///
/// Rotation is limited to `limit` radians either side of the start angles,
/// and `beta` never reaches the poles.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub limit: f32,
    home_alpha: f32,
    home_beta: f32,
}

impl OrbitCamera {
    const POLE_MARGIN: f32 = 1e-3;

    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3, limit: f32) -> Self {
        let mut cam = Self {
            alpha,
            beta,
            radius,
            target,
            limit: limit.abs(),
            home_alpha: alpha,
            home_beta: beta,
        };
        cam.clamp();
        cam
    }

    pub fn eye(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(ca * sb, cb, sa * sb)
    }

    pub fn rotate(&mut self, d_alpha: f32, d_beta: f32) {
        self.alpha += d_alpha;
        self.beta += d_beta;
        self.clamp();
    }

    /// Pixel drag to rotation, `sensitivity` radians per pixel.
    pub fn apply_drag(&mut self, dx: f64, dy: f64, sensitivity: f32) {
        self.rotate(-(dx as f32) * sensitivity, -(dy as f32) * sensitivity);
    }

    fn clamp(&mut self) {
        self.alpha = self
            .alpha
            .clamp(self.home_alpha - self.limit, self.home_alpha + self.limit);
        let lo = (self.home_beta - self.limit).max(Self::POLE_MARGIN);
        let hi = (self.home_beta + self.limit).min(std::f32::consts::PI - Self::POLE_MARGIN);
        self.beta = self.beta.clamp(lo, hi);
    }

    pub fn camera(&self, viewport: (u32, u32)) -> Camera3D {
        Camera3D::new(self.eye(), self.target, viewport.0, viewport.1)
    }
}
