//! Dice Tray - roll reconciliation for asynchronously settling dice
//!
//! Core modules:
//! - `dice`: Dice tree model (dice, groups, identities)
//! - `roll`: Roll state, throw generation and the reconciliation store
//! - `settings`: Tray geometry and throw tuning
//! - `history`: Log of finished roll results

pub mod dice;
pub mod history;
pub mod roll;
pub mod settings;

pub use dice::{Combination, Dice, DiceNode, DiceRoll, DiceStyle, Die, DieId, DieKind};
pub use history::RollHistory;
pub use roll::{DiceThrow, DiceTransform, FinishOutcome, RollState, RollStore};
pub use settings::{RollSpeed, TraySettings};

use glam::Vec3;

/// Tray configuration constants (world units, tray centred on the origin)
pub mod consts {
    /// Spawn area extents
    pub const TRAY_HALF_WIDTH: f32 = 0.4;
    pub const TRAY_HALF_DEPTH: f32 = 0.8;
    pub const SPAWN_HEIGHT: f32 = 0.5;

    /// Minimum distance between spawn positions (about two die widths)
    pub const MIN_SPAWN_CLEARANCE: f32 = 0.15;
    /// Placement resamples before falling back to an unconstrained spot
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 32;

    /// Launch speed range at multiplier 1.0
    pub const MIN_LAUNCH_SPEED: f32 = 1.0;
    pub const MAX_LAUNCH_SPEED: f32 = 5.0;
    /// Maximum spin per axis at multiplier 1.0 (radians/sec)
    pub const MAX_SPIN: f32 = 12.0;
    /// Rerolls ignore the configured speed preset
    pub const REROLL_SPEED_MULTIPLIER: f32 = 1.0;
}

/// Distance between two points projected onto the tray floor (XZ plane)
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
