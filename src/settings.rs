//! Tray and throw settings
//!
//! Loaded from a JSON file; anything missing falls back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Throw speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RollSpeed {
    Gentle,
    #[default]
    Normal,
    Fast,
}

impl RollSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollSpeed::Gentle => "Gentle",
            RollSpeed::Normal => "Normal",
            RollSpeed::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gentle" | "slow" => Some(RollSpeed::Gentle),
            "normal" => Some(RollSpeed::Normal),
            "fast" => Some(RollSpeed::Fast),
            _ => None,
        }
    }

    /// Speed multiplier handed to throw generation
    pub fn multiplier(&self) -> f32 {
        match self {
            RollSpeed::Gentle => 0.75,
            RollSpeed::Normal => 1.0,
            RollSpeed::Fast => 1.5,
        }
    }
}

/// Tray geometry and throw tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraySettings {
    // === Tray bounds (spawn area is centred on the origin) ===
    /// Half extent of the spawn area along X
    pub half_width: f32,
    /// Half extent of the spawn area along Z
    pub half_depth: f32,
    /// Height above the tray floor that dice spawn at
    pub spawn_height: f32,

    // === Collision avoidance ===
    /// Minimum horizontal distance between a new spawn and any occupied spot
    pub min_clearance: f32,
    /// Resamples before giving up and placing unconstrained
    pub max_attempts: u32,

    // === Throw forces (before the speed multiplier) ===
    pub min_launch_speed: f32,
    pub max_launch_speed: f32,
    /// Maximum angular speed per axis (radians/sec)
    pub max_spin: f32,

    /// Default speed preset for new rolls
    pub speed: RollSpeed,
    /// Fixed RNG seed for reproducible throws (random when unset)
    pub seed: Option<u64>,
}

impl Default for TraySettings {
    fn default() -> Self {
        Self {
            half_width: TRAY_HALF_WIDTH,
            half_depth: TRAY_HALF_DEPTH,
            spawn_height: SPAWN_HEIGHT,

            min_clearance: MIN_SPAWN_CLEARANCE,
            max_attempts: MAX_PLACEMENT_ATTEMPTS,

            min_launch_speed: MIN_LAUNCH_SPEED,
            max_launch_speed: MAX_LAUNCH_SPEED,
            max_spin: MAX_SPIN,

            speed: RollSpeed::Normal,
            seed: None,
        }
    }
}

impl TraySettings {
    /// Create settings with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded tray settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Invalid tray settings in {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not read {}: {}", path.display(), e),
        }

        log::info!("Using default tray settings");
        Self::default()
    }

    /// Save settings to a file as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Tray settings saved to {}", path.display());
        Ok(())
    }

    /// Effective speed multiplier for an optional per-roll override
    pub fn speed_multiplier(&self, requested: Option<f32>) -> f32 {
        match requested {
            Some(m) if m.is_finite() && m > 0.0 => m,
            Some(m) => {
                log::warn!("Ignoring invalid speed multiplier {}", m);
                self.speed.multiplier()
            }
            None => self.speed.multiplier(),
        }
    }
}
