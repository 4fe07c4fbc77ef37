//! Per-step motion for the floating bubbles: gravity, a slowly pulsing
//! wind, damping, and a floor that sends bubbles back to the ceiling.

use std::collections::BTreeMap;

use glam::Vec3;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Motion state of one simulated object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Set while a deformation runs; suppresses respawn.
    pub deforming: bool,
    /// Current deformation envelope value in `[0, 1]`.
    pub progress: f32,
}

impl BodyState {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            deforming: false,
            progress: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Added to vertical velocity every step.
    pub gravity: f32,
    pub damping: f32,
    pub floor_y: f32,
    pub ceiling_y: f32,
    /// Full width of the square spawn area, centred on the origin.
    pub horizontal_range: f32,
    pub respawn_velocity: Vec3,
    /// Wind x/z are drawn from `[-wind_spread / 2, wind_spread / 2)`.
    pub wind_spread: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity: -0.0005,
            damping: 0.98,
            floor_y: -1.0,
            ceiling_y: 10.0,
            horizontal_range: 8.0,
            respawn_velocity: Vec3::new(0.0, -0.01, 0.0),
            wind_spread: 0.001,
        }
    }
}

pub struct MotionIntegrator {
    pub config: MotionConfig,
    wind: Vec3,
}

impl MotionIntegrator {
    /// Draw the scene's wind direction once.
    pub fn new<R: Rng + ?Sized>(config: MotionConfig, rng: &mut R) -> Self {
        let half = config.wind_spread * 0.5;
        let wind = if half > 0.0 {
            Vec3::new(rng.random_range(-half..half), 0.0, rng.random_range(-half..half))
        } else {
            Vec3::ZERO
        };
        log::debug!("Wind base vector {wind}");
        Self::with_wind(config, wind)
    }

    pub fn with_wind(config: MotionConfig, wind: Vec3) -> Self {
        Self { config, wind }
    }

    pub fn wind(&self) -> Vec3 {
        self.wind
    }

    /// Wind multiplier at simulation time `t`, between 0.2 and 1.2.
    pub fn wind_factor(t: f32) -> f32 {
        t.sin() * 0.5 + 0.5 + 0.2
    }

    fn random_horizontal<R: Rng + ?Sized>(&self, rng: &mut R) -> (f32, f32) {
        let half = self.config.horizontal_range * 0.5;
        if half <= 0.0 {
            return (0.0, 0.0);
        }
        (rng.random_range(-half..half), rng.random_range(-half..half))
    }

    /// Starting position for a new object: anywhere between the origin
    /// plane and the ceiling.
    pub fn spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let (x, z) = self.random_horizontal(rng);
        let y = if self.config.ceiling_y > 0.0 {
            rng.random_range(0.0..self.config.ceiling_y)
        } else {
            0.0
        };
        Vec3::new(x, y, z)
    }

    /// Advance every body by one step at simulation time `t`. Returns the
    /// ids that were respawned at the ceiling.
    pub fn step<R: Rng + ?Sized>(
        &self,
        bodies: &mut BTreeMap<ObjectId, BodyState>,
        t: f32,
        rng: &mut R,
    ) -> Vec<ObjectId> {
        let current_wind = self.wind * Self::wind_factor(t);
        let mut respawned = Vec::new();

        for (id, body) in bodies.iter_mut() {
            body.velocity.y += self.config.gravity;
            body.velocity += current_wind;
            body.velocity *= self.config.damping;
            body.position += body.velocity;

            if body.position.y < self.config.floor_y && !body.deforming {
                let (x, z) = self.random_horizontal(rng);
                body.position = Vec3::new(x, self.config.ceiling_y, z);
                body.velocity = self.config.respawn_velocity;
                respawned.push(*id);
            }
        }

        if !respawned.is_empty() {
            log::trace!("Respawned {respawned:?}");
        }
        respawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still_air() -> MotionIntegrator {
        MotionIntegrator::with_wind(MotionConfig::default(), Vec3::ZERO)
    }

    fn single(body: BodyState) -> BTreeMap<ObjectId, BodyState> {
        BTreeMap::from([(ObjectId(0), body)])
    }

    #[test]
    fn wind_is_horizontal_and_within_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let integrator = MotionIntegrator::new(MotionConfig::default(), &mut rng);
            let wind = integrator.wind();
            assert_eq!(wind.y, 0.0);
            assert!(wind.x >= -0.0005 && wind.x < 0.0005);
            assert!(wind.z >= -0.0005 && wind.z < 0.0005);
        }
    }

    #[test]
    fn wind_factor_range() {
        assert!((MotionIntegrator::wind_factor(0.0) - 0.7).abs() < 1e-6);
        assert!((MotionIntegrator::wind_factor(std::f32::consts::FRAC_PI_2) - 1.2).abs() < 1e-6);
        assert!((MotionIntegrator::wind_factor(-std::f32::consts::FRAC_PI_2) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn every_step_adds_gravity_before_damping() {
        let integrator = still_air();
        let mut rng = StdRng::seed_from_u64(1);
        let mut bodies = single(BodyState::new(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -0.01, 0.0),
        ));

        for _ in 0..20 {
            let before = bodies[&ObjectId(0)];
            let respawned = integrator.step(&mut bodies, 0.0, &mut rng);
            assert!(respawned.is_empty());
            let after = bodies[&ObjectId(0)];
            let expected_vy = (before.velocity.y - 0.0005) * 0.98;
            assert!((after.velocity.y - expected_vy).abs() < 1e-7);
            assert!((after.position.y - (before.position.y + expected_vy)).abs() < 1e-6);
        }
    }

    #[test]
    fn wind_is_scaled_by_clock() {
        let wind = Vec3::new(0.0004, 0.0, -0.0002);
        let integrator = MotionIntegrator::with_wind(MotionConfig::default(), wind);
        let mut rng = StdRng::seed_from_u64(2);
        let mut bodies = single(BodyState::new(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO));
        let t = 1.0;
        integrator.step(&mut bodies, t, &mut rng);
        let expected = wind * MotionIntegrator::wind_factor(t) * 0.98;
        let v = bodies[&ObjectId(0)].velocity;
        assert!((v.x - expected.x).abs() < 1e-8);
        assert!((v.z - expected.z).abs() < 1e-8);
    }

    #[test]
    fn falling_below_floor_respawns_at_ceiling() {
        let integrator = still_air();
        let mut rng = StdRng::seed_from_u64(3);
        let mut bodies = single(BodyState::new(
            Vec3::new(1.0, -0.99, 1.0),
            Vec3::new(0.0, -0.05, 0.0),
        ));

        let respawned = integrator.step(&mut bodies, 0.0, &mut rng);
        assert_eq!(respawned, vec![ObjectId(0)]);
        let body = bodies[&ObjectId(0)];
        assert_eq!(body.position.y, 10.0);
        assert!(body.position.x >= -4.0 && body.position.x < 4.0);
        assert!(body.position.z >= -4.0 && body.position.z < 4.0);
        assert_eq!(body.velocity, Vec3::new(0.0, -0.01, 0.0));
    }

    #[test]
    fn deforming_body_is_never_respawned() {
        let integrator = still_air();
        let mut rng = StdRng::seed_from_u64(4);
        let mut body = BodyState::new(Vec3::new(0.0, -3.0, 0.0), Vec3::new(0.0, -0.05, 0.0));
        body.deforming = true;
        let mut bodies = single(body);

        for _ in 0..30 {
            assert!(integrator.step(&mut bodies, 0.0, &mut rng).is_empty());
        }
        assert!(bodies[&ObjectId(0)].position.y < -3.0);

        bodies.get_mut(&ObjectId(0)).expect("body").deforming = false;
        assert_eq!(integrator.step(&mut bodies, 0.0, &mut rng), vec![ObjectId(0)]);
    }

    #[test]
    fn spawn_positions_fill_the_column() {
        let integrator = still_air();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let p = integrator.spawn_position(&mut rng);
            assert!(p.y >= 0.0 && p.y < 10.0);
            assert!(p.x.abs() <= 4.0 && p.z.abs() <= 4.0);
        }
    }
}
