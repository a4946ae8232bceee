//! Throw generation with spawn collision avoidance
//!
//! Every die entering a roll gets one [`DiceThrow`]: where it spawns, how it
//! is oriented and how hard it is thrown. New spawns keep clear of occupied
//! spots (resting dice and dice spawned in the same batch) when the tray has
//! room, and degrade to an unconstrained spot when it does not.

use std::f32::consts::{FRAC_PI_6, TAU};

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::planar_distance;
use crate::settings::TraySettings;

/// Initial conditions for one die, consumed by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiceThrow {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Resting pose of a settled die, reported by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiceTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl DiceTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// How a spawn position was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Clear of every occupied position
    Clear,
    /// Attempt budget exhausted; placed without constraint
    Fallback,
}

/// Seeded throw generator
#[derive(Debug, Clone)]
pub struct ThrowGenerator {
    rng: Pcg32,
    settings: TraySettings,
}

impl ThrowGenerator {
    /// Create a generator, seeded from the settings or from entropy
    pub fn new(settings: TraySettings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::debug!("Throw generator seed: {}", seed);
        Self {
            rng: Pcg32::seed_from_u64(seed),
            settings,
        }
    }

    pub fn settings(&self) -> &TraySettings {
        &self.settings
    }

    /// Generate a throw clear of `occupied` where possible
    pub fn generate(&mut self, speed_multiplier: f32, occupied: &[Vec3]) -> (DiceThrow, Placement) {
        let clearance = self.settings.min_clearance;

        let mut placement = Placement::Fallback;
        let mut position = Vec3::ZERO;
        for _ in 0..self.settings.max_attempts {
            let candidate = sample_position(&mut self.rng, &self.settings);
            if occupied.iter().all(|p| planar_distance(*p, candidate) >= clearance) {
                position = candidate;
                placement = Placement::Clear;
                break;
            }
        }
        if placement == Placement::Fallback {
            position = sample_position(&mut self.rng, &self.settings);
            log::debug!(
                "No clear spawn after {} attempts ({} occupied), placing unconstrained",
                self.settings.max_attempts,
                occupied.len()
            );
        }

        let rotation = random_rotation(&mut self.rng);
        let linear_velocity =
            launch_velocity(&mut self.rng, &self.settings, position) * speed_multiplier;
        let spin = self.settings.max_spin.abs();
        let angular_velocity = Vec3::new(
            self.rng.random_range(-spin..=spin),
            self.rng.random_range(-spin..=spin),
            self.rng.random_range(-spin..=spin),
        ) * speed_multiplier;

        (
            DiceThrow {
                position,
                rotation,
                linear_velocity,
                angular_velocity,
            },
            placement,
        )
    }
}

/// Uniform spawn position over the tray at spawn height
fn sample_position(rng: &mut Pcg32, settings: &TraySettings) -> Vec3 {
    let hw = settings.half_width.abs();
    let hd = settings.half_depth.abs();
    Vec3::new(
        rng.random_range(-hw..=hw),
        settings.spawn_height,
        rng.random_range(-hd..=hd),
    )
}

/// Uniformly distributed unit quaternion (Shoemake's method)
fn random_rotation(rng: &mut Pcg32) -> Quat {
    let u1: f32 = rng.random();
    let u2: f32 = rng.random();
    let u3: f32 = rng.random();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(
        a * (TAU * u2).sin(),
        a * (TAU * u2).cos(),
        b * (TAU * u3).sin(),
        b * (TAU * u3).cos(),
    )
    .normalize()
}

/// Launch velocity aimed roughly at the tray centre, slightly downward
fn launch_velocity(rng: &mut Pcg32, settings: &TraySettings, position: Vec3) -> Vec3 {
    let heading = (-position.z).atan2(-position.x) + rng.random_range(-FRAC_PI_6..=FRAC_PI_6);
    let lo = settings.min_launch_speed.min(settings.max_launch_speed).max(0.0);
    let hi = settings.min_launch_speed.max(settings.max_launch_speed).max(0.0);
    let speed = rng.random_range(lo..=hi);
    Vec3::new(heading.cos() * speed, -0.25 * speed, heading.sin() * speed)
}
