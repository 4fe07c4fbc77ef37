//! Squash-and-dent animation played on a bubble when it is tapped.
//!
//! A trigger captures the mesh's rest geometry, nudges the body away from
//! the contact, and starts an envelope that rises to 1 in the first fifth of
//! the animation and falls back to 0. Every step the mesh is rebuilt from
//! the snapshot: the whole bubble squashes along the hit normal and bulges
//! around it, and vertices near the contact are pushed inwards. When the
//! envelope ends the mesh is restored to the snapshot exactly.

use std::collections::BTreeMap;

use glam::Vec3;
use pf_core::animation::{Easing, Keyframe, KeyframeTrack, TrackPlayback};
use pf_render::MeshData;

use crate::motion::{BodyState, ObjectId};

#[derive(Debug, Clone, PartialEq)]
pub struct DeformConfig {
    pub duration_us: u64,
    /// Fraction of the duration at which the envelope peaks.
    pub peak_fraction: f32,
    pub push_strength: f32,
    pub radius_of_effect: f32,
    pub max_indentation: f32,
    /// Shrink along the hit normal at full bounce.
    pub squash: f32,
    /// Growth across the hit normal at full bounce.
    pub bulge: f32,
}

impl Default for DeformConfig {
    fn default() -> Self {
        Self {
            duration_us: 1_500_000,
            peak_fraction: 0.2,
            push_strength: 0.15,
            radius_of_effect: 0.8,
            max_indentation: 0.4,
            squash: 0.2,
            bulge: 0.1,
        }
    }
}

/// Rest positions and normals, captured when a deformation starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySnapshot {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl GeometrySnapshot {
    /// None when the mesh has no positions or is missing normals.
    pub fn capture(mesh: &MeshData) -> Option<Self> {
        if !mesh.has_complete_normals() {
            return None;
        }
        Some(Self {
            positions: mesh.positions.clone(),
            normals: mesh.normals[..mesh.positions.len()].to_vec(),
        })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }
}

#[derive(Debug, Clone)]
pub struct Deformation {
    /// Contact point in the object's local frame.
    pub contact: Vec3,
    /// Unit hit normal in the object's local frame.
    pub normal: Vec3,
    snapshot: GeometrySnapshot,
    playback: TrackPlayback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    AlreadyDeforming,
    MissingGeometry,
}

/// Write the deformed snapshot into `out` for the given envelope value.
pub fn deform_into(
    snapshot: &GeometrySnapshot,
    contact: Vec3,
    normal: Vec3,
    progress: f32,
    config: &DeformConfig,
    out: &mut [Vec3],
) {
    let bounce = (progress * std::f32::consts::PI).sin();
    let scale_down = 1.0 - config.squash * bounce;
    let scale_up = 1.0 + config.bulge * bounce;

    for ((dst, v), n) in out
        .iter_mut()
        .zip(&snapshot.positions)
        .zip(&snapshot.normals)
    {
        let axial = normal * v.dot(normal);
        let perpendicular = *v - axial;
        let mut moved = axial * scale_down + perpendicular * scale_up;

        let distance = v.distance(contact);
        if distance < config.radius_of_effect {
            let falloff = 1.0 - distance / config.radius_of_effect;
            moved -= *n * (falloff * config.max_indentation * progress);
        }
        *dst = moved;
    }
}

pub struct DeformationAnimator {
    pub config: DeformConfig,
    envelope: KeyframeTrack,
    active: BTreeMap<ObjectId, Deformation>,
}

impl DeformationAnimator {
    pub fn new(config: DeformConfig) -> Result<Self, String> {
        if !(0.0..1.0).contains(&config.peak_fraction) || config.peak_fraction == 0.0 {
            return Err(format!(
                "Deformation peak fraction must be inside (0, 1), got {}",
                config.peak_fraction
            ));
        }
        if config.radius_of_effect <= 0.0 {
            return Err(format!(
                "Deformation radius must be positive, got {}",
                config.radius_of_effect
            ));
        }
        let peak_us = (config.duration_us as f64 * config.peak_fraction as f64).round() as u64;
        let envelope = KeyframeTrack::new(
            vec![
                Keyframe::new(0, 0.0),
                Keyframe::new(peak_us, 1.0),
                Keyframe::new(config.duration_us, 0.0),
            ],
            Easing::CubicOut,
        )?;
        Ok(Self {
            config,
            envelope,
            active: BTreeMap::new(),
        })
    }

    pub fn envelope(&self) -> &KeyframeTrack {
        &self.envelope
    }

    pub fn is_active(&self, id: ObjectId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Start a deformation on `id`. Nothing is touched unless the outcome is
    /// `Started`.
    pub fn trigger(
        &mut self,
        id: ObjectId,
        contact: Vec3,
        normal: Vec3,
        body: &mut BodyState,
        mesh: &MeshData,
    ) -> TriggerOutcome {
        if body.deforming || self.active.contains_key(&id) {
            return TriggerOutcome::AlreadyDeforming;
        }
        let Some(snapshot) = GeometrySnapshot::capture(mesh) else {
            log::debug!("Object {id:?} has no deformable geometry, skipping");
            return TriggerOutcome::MissingGeometry;
        };
        let normal = normal.normalize_or_zero();

        body.deforming = true;
        body.progress = 0.0;
        body.velocity -= normal * self.config.push_strength;

        self.active.insert(
            id,
            Deformation {
                contact,
                normal,
                snapshot,
                playback: TrackPlayback::new(),
            },
        );
        log::debug!("Deformation started on {id:?}");
        TriggerOutcome::Started
    }

    /// Advance every active deformation by one step. Returns the ids whose
    /// mesh positions changed.
    pub fn tick(
        &mut self,
        dt_us: u64,
        bodies: &mut BTreeMap<ObjectId, BodyState>,
        meshes: &mut BTreeMap<ObjectId, MeshData>,
    ) -> Vec<ObjectId> {
        let mut dirty = Vec::with_capacity(self.active.len());
        let mut finished = Vec::new();

        for (id, deformation) in self.active.iter_mut() {
            let progress = deformation.playback.tick(dt_us, &self.envelope);
            let Some(mesh) = meshes.get_mut(id) else {
                // Object left the scene mid-animation.
                finished.push(*id);
                continue;
            };

            if deformation.playback.finished {
                mesh.positions.clone_from(&deformation.snapshot.positions);
                if let Some(body) = bodies.get_mut(id) {
                    body.deforming = false;
                    body.progress = 0.0;
                }
                finished.push(*id);
            } else {
                deform_into(
                    &deformation.snapshot,
                    deformation.contact,
                    deformation.normal,
                    progress,
                    &self.config,
                    &mut mesh.positions,
                );
                if let Some(body) = bodies.get_mut(id) {
                    body.progress = progress;
                }
            }
            dirty.push(*id);
        }

        for id in finished {
            self.active.remove(&id);
            log::debug!("Deformation finished on {id:?}");
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_US: u64 = 16_667;

    fn setup() -> (
        DeformationAnimator,
        BTreeMap<ObjectId, BodyState>,
        BTreeMap<ObjectId, MeshData>,
    ) {
        let animator = DeformationAnimator::new(DeformConfig::default()).expect("animator");
        let bodies = BTreeMap::from([(ObjectId(1), BodyState::new(Vec3::ZERO, Vec3::ZERO))]);
        let meshes = BTreeMap::from([(ObjectId(1), MeshData::uv_sphere(1.0, 16))]);
        (animator, bodies, meshes)
    }

    fn trigger(
        animator: &mut DeformationAnimator,
        bodies: &mut BTreeMap<ObjectId, BodyState>,
        meshes: &BTreeMap<ObjectId, MeshData>,
        normal: Vec3,
    ) -> TriggerOutcome {
        trigger_at(animator, bodies, meshes, normal, normal)
    }

    fn trigger_at(
        animator: &mut DeformationAnimator,
        bodies: &mut BTreeMap<ObjectId, BodyState>,
        meshes: &BTreeMap<ObjectId, MeshData>,
        contact: Vec3,
        normal: Vec3,
    ) -> TriggerOutcome {
        let body = bodies.get_mut(&ObjectId(1)).expect("body");
        animator.trigger(ObjectId(1), contact, normal, body, &meshes[&ObjectId(1)])
    }

    #[test]
    fn trigger_sets_flag_and_pushes_away_from_contact() {
        let (mut animator, mut bodies, meshes) = setup();
        let outcome = trigger(&mut animator, &mut bodies, &meshes, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(outcome, TriggerOutcome::Started);
        let body = bodies[&ObjectId(1)];
        assert!(body.deforming);
        assert!((body.velocity - Vec3::new(0.0, 0.0, 0.15)).length() < 1e-6);
        assert!(animator.is_active(ObjectId(1)));
    }

    #[test]
    fn second_trigger_while_deforming_is_ignored() {
        let (mut animator, mut bodies, meshes) = setup();
        trigger(&mut animator, &mut bodies, &meshes, Vec3::X);
        let velocity = bodies[&ObjectId(1)].velocity;
        let outcome = trigger(&mut animator, &mut bodies, &meshes, Vec3::X);
        assert_eq!(outcome, TriggerOutcome::AlreadyDeforming);
        assert_eq!(bodies[&ObjectId(1)].velocity, velocity);
        assert_eq!(animator.active_count(), 1);
    }

    #[test]
    fn missing_geometry_leaves_state_untouched() {
        let (mut animator, mut bodies, mut meshes) = setup();
        meshes.get_mut(&ObjectId(1)).expect("mesh").normals.clear();
        let outcome = trigger(&mut animator, &mut bodies, &meshes, Vec3::Y);
        assert_eq!(outcome, TriggerOutcome::MissingGeometry);
        let body = bodies[&ObjectId(1)];
        assert!(!body.deforming);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(animator.active_count(), 0);

        meshes.insert(ObjectId(1), MeshData::default());
        let outcome = trigger(&mut animator, &mut bodies, &meshes, Vec3::Y);
        assert_eq!(outcome, TriggerOutcome::MissingGeometry);
    }

    #[test]
    fn envelope_hits_zero_peak_zero() {
        for normal in [Vec3::X, Vec3::new(0.3, -0.2, 0.9)] {
            let (mut animator, mut bodies, mut meshes) = setup();
            trigger(&mut animator, &mut bodies, &meshes, normal);
            assert_eq!(bodies[&ObjectId(1)].progress, 0.0);
            // 3 x 100ms lands exactly on the peak at 0.2 of 1.5s
            for _ in 0..3 {
                animator.tick(100_000, &mut bodies, &mut meshes);
            }
            assert_eq!(bodies[&ObjectId(1)].progress, 1.0);
            for _ in 0..12 {
                animator.tick(100_000, &mut bodies, &mut meshes);
            }
            assert_eq!(bodies[&ObjectId(1)].progress, 0.0);
            assert!(!animator.is_active(ObjectId(1)));
        }
    }

    #[test]
    fn envelope_does_not_depend_on_contact_point() {
        let top = Vec3::Y;
        let bottom = Vec3::NEG_Y;
        let (mut a, mut a_bodies, mut a_meshes) = setup();
        let (mut b, mut b_bodies, mut b_meshes) = setup();
        trigger_at(&mut a, &mut a_bodies, &a_meshes, top, Vec3::Y);
        trigger_at(&mut b, &mut b_bodies, &b_meshes, bottom, Vec3::Y);

        let radius = DeformConfig::default().radius_of_effect;
        let rest = a_meshes[&ObjectId(1)].positions.clone();
        let mut compared = 0;
        for _ in 0..89 {
            a.tick(STEP_US, &mut a_bodies, &mut a_meshes);
            b.tick(STEP_US, &mut b_bodies, &mut b_meshes);
            assert_eq!(a_bodies[&ObjectId(1)].progress, b_bodies[&ObjectId(1)].progress);

            // Outside both dents only the shared bounce moves a vertex.
            let a_positions = &a_meshes[&ObjectId(1)].positions;
            let b_positions = &b_meshes[&ObjectId(1)].positions;
            for (i, v) in rest.iter().enumerate() {
                if v.distance(top) >= radius && v.distance(bottom) >= radius {
                    assert_eq!(a_positions[i], b_positions[i], "vertex {i}");
                    compared += 1;
                }
            }
        }
        assert!(compared > 0);
    }

    #[test]
    fn completion_restores_snapshot_exactly() {
        let (mut animator, mut bodies, mut meshes) = setup();
        let rest = meshes[&ObjectId(1)].positions.clone();
        trigger(&mut animator, &mut bodies, &meshes, Vec3::new(0.0, 0.0, -1.0));

        let mut saw_deformed = false;
        for _ in 0..89 {
            let dirty = animator.tick(STEP_US, &mut bodies, &mut meshes);
            assert_eq!(dirty, vec![ObjectId(1)]);
            saw_deformed |= meshes[&ObjectId(1)].positions != rest;
        }
        assert!(saw_deformed);
        assert!(bodies[&ObjectId(1)].deforming);

        animator.tick(STEP_US, &mut bodies, &mut meshes);
        assert_eq!(meshes[&ObjectId(1)].positions, rest);
        assert!(!bodies[&ObjectId(1)].deforming);
        assert_eq!(animator.active_count(), 0);
        assert!(animator.tick(STEP_US, &mut bodies, &mut meshes).is_empty());
    }

    #[test]
    fn dent_pushes_contact_vertex_inwards() {
        let mesh = MeshData::uv_sphere(1.0, 16);
        let snapshot = GeometrySnapshot::capture(&mesh).expect("snapshot");
        let contact = Vec3::Y;
        let mut out = vec![Vec3::ZERO; mesh.positions.len()];
        deform_into(&snapshot, contact, Vec3::Y, 1.0, &DeformConfig::default(), &mut out);

        // Top pole: sin(pi) is ~0 so no bounce, full dent along its normal.
        let top = out[0];
        assert!((top.y - 0.6).abs() < 1e-4, "top pole at {top}");

        // Far side is outside the radius, only the (near-zero) bounce applies.
        let bottom = *out.last().expect("vertex");
        assert!((bottom.y + 1.0).abs() < 1e-4);
    }

    #[test]
    fn bounce_squashes_along_normal_at_mid_envelope() {
        let mesh = MeshData::uv_sphere(1.0, 16);
        let snapshot = GeometrySnapshot::capture(&mesh).expect("snapshot");
        let mut out = vec![Vec3::ZERO; mesh.positions.len()];
        // Contact far away so only the bounce applies; progress 0.5 is full bounce.
        let far = Vec3::splat(100.0);
        deform_into(&snapshot, far, Vec3::Y, 0.5, &DeformConfig::default(), &mut out);
        let top = out[0];
        assert!((top.y - 0.8).abs() < 1e-5);
        let max_radial = out.iter().map(|p| p.x.hypot(p.z)).fold(0.0, f32::max);
        assert!((max_radial - 1.1).abs() < 1e-3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DeformConfig {
            peak_fraction: 1.5,
            ..Default::default()
        };
        assert!(DeformationAnimator::new(config).is_err());
        let config = DeformConfig {
            radius_of_effect: 0.0,
            ..Default::default()
        };
        assert!(DeformationAnimator::new(config).is_err());
    }
}
