//! Floating bubbles: a handful of spheres drifting down under wind and
//! gravity. Tapping one dents and squashes it.

use std::collections::BTreeMap;
use std::f32::consts::PI;

use glam::{Mat4, Vec3};
use pf_core::time::SimClock;
use pf_render::{Hit, Lighting, MeshData, OrbitCamera, Ray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::deform::{DeformConfig, DeformationAnimator, TriggerOutcome};
use crate::motion::{BodyState, MotionConfig, MotionIntegrator, ObjectId};

pub const CLEAR_COLOR: [f64; 3] = [0.2, 0.2, 0.3];
pub const BUBBLE_COLOR: [f32; 4] = [0.5, 0.8, 1.0, 0.6];
pub const PROMPT: &str = "Tap the bubbles";
const DIAMETER_RANGE: std::ops::Range<f32> = 1.0..2.5;
const INITIAL_VELOCITY: Vec3 = Vec3::new(0.0, -0.01, 0.0);

/// Key light plus a hemispheric fill tinted by the environment.
pub fn lighting(ambient: Vec3) -> Lighting {
    Lighting {
        direction: Vec3::new(-1.0, -2.0, -1.0),
        intensity: 0.5,
        ambient,
        ambient_intensity: 0.5,
    }
}

pub fn default_camera() -> OrbitCamera {
    OrbitCamera::new(
        -PI / 2.0,
        PI / 2.5,
        15.0,
        Vec3::new(0.0, -1.0, 0.0),
        5f32.to_radians(),
    )
}

pub struct BubblesScene {
    bodies: BTreeMap<ObjectId, BodyState>,
    meshes: BTreeMap<ObjectId, MeshData>,
    radii: BTreeMap<ObjectId, f32>,
    integrator: MotionIntegrator,
    animator: DeformationAnimator,
    clock: SimClock,
    rng: StdRng,
    pub camera: OrbitCamera,
}

impl BubblesScene {
    pub fn new(count: usize, segments: u32) -> Result<Self, String> {
        Self::with_rng(count, segments, StdRng::from_os_rng())
    }

    pub fn with_rng(count: usize, segments: u32, mut rng: StdRng) -> Result<Self, String> {
        let integrator = MotionIntegrator::new(MotionConfig::default(), &mut rng);
        let animator = DeformationAnimator::new(DeformConfig::default())?;

        let mut bodies = BTreeMap::new();
        let mut meshes = BTreeMap::new();
        let mut radii = BTreeMap::new();
        for i in 0..count {
            let id = ObjectId(i as u32);
            let radius = rng.random_range(DIAMETER_RANGE) / 2.0;
            let position = integrator.spawn_position(&mut rng);
            bodies.insert(id, BodyState::new(position, INITIAL_VELOCITY));
            meshes.insert(id, MeshData::uv_sphere(radius, segments));
            radii.insert(id, radius);
        }
        log::info!("Spawned {count} bubbles, wind {:?}", integrator.wind());

        Ok(Self {
            bodies,
            meshes,
            radii,
            integrator,
            animator,
            clock: SimClock::default(),
            rng,
            camera: default_camera(),
        })
    }

    pub fn bodies(&self) -> &BTreeMap<ObjectId, BodyState> {
        &self.bodies
    }

    pub fn meshes(&self) -> &BTreeMap<ObjectId, MeshData> {
        &self.meshes
    }

    pub fn mesh(&self, id: ObjectId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    pub fn active_animations(&self) -> usize {
        self.animator.active_count()
    }

    pub fn model(&self, id: ObjectId) -> Mat4 {
        self.bodies
            .get(&id)
            .map(|b| Mat4::from_translation(b.position))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// One fixed step: motion first, then deformations. Returns the meshes
    /// whose vertices need re-uploading.
    pub fn step(&mut self, dt_us: u64) -> Vec<ObjectId> {
        let t = self.clock.tick();
        self.integrator.step(&mut self.bodies, t, &mut self.rng);
        self.animator.tick(dt_us, &mut self.bodies, &mut self.meshes)
    }

    /// Nearest bubble under the ray, against its undeformed sphere.
    pub fn pick(&self, ray: &Ray) -> Option<(ObjectId, Hit)> {
        self.bodies
            .iter()
            .filter_map(|(id, body)| {
                let radius = *self.radii.get(id)?;
                ray.cast_sphere(body.position, radius).map(|hit| (*id, hit))
            })
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
    }

    /// Pointer tap. `None` when nothing was hit.
    pub fn tap(&mut self, ray: &Ray) -> Option<(ObjectId, TriggerOutcome)> {
        let (id, hit) = self.pick(ray)?;
        let body = self.bodies.get_mut(&id)?;
        let mesh = self.meshes.get(&id)?;
        // Bubbles never rotate or scale, so the local frame is a translation.
        let contact = hit.point - body.position;
        let outcome = self.animator.trigger(id, contact, hit.normal, body, mesh);
        Some((id, outcome))
    }
}
