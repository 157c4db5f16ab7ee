//! Player settings and preferences
//!
//! Persisted as JSON in the key/value store, separate from scores.

use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Physics strategy for the driving game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PhysicsMode {
    /// Direct velocity integration (arcade feel)
    #[default]
    Kinematic,
    /// Force/torque driven rigid body
    RigidBody,
}

impl PhysicsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsMode::Kinematic => "Kinematic",
            PhysicsMode::RigidBody => "RigidBody",
        }
    }
}

impl FromStr for PhysicsMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "kinematic" | "arcade" => Ok(PhysicsMode::Kinematic),
            "rigidbody" | "rigid" | "physics" => Ok(PhysicsMode::RigidBody),
            other => bail!("unknown physics mode {:?}", other),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Driving physics strategy
    pub physics_mode: PhysicsMode,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (fewer particles in the presentation layer)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            physics_mode: PhysicsMode::Kinematic,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Store key
    pub const STORAGE_KEY: &'static str = "arcade_sims_settings";

    /// Effective effect volume (0 when muted)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Load settings, falling back to defaults on missing or bad data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Discarding unreadable settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = store.set(Self::STORAGE_KEY, &json) {
                    log::warn!("Settings not saved: {:#}", e);
                } else {
                    log::info!("Settings saved");
                }
            }
            Err(e) => log::warn!("Settings not serializable: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_when_missing_or_corrupt() {
        let mut store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        store.set(Settings::STORAGE_KEY, "{{{").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            physics_mode: PhysicsMode::RigidBody,
            muted: true,
            ..Default::default()
        };
        settings.save(&mut store);

        let loaded = Settings::load(&store);
        assert_eq!(loaded.physics_mode, PhysicsMode::RigidBody);
        assert_eq!(loaded.effective_volume(), 0.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Rigid".parse::<PhysicsMode>().unwrap(), PhysicsMode::RigidBody);
        assert_eq!("arcade".parse::<PhysicsMode>().unwrap(), PhysicsMode::Kinematic);
        let err = "hover".parse::<PhysicsMode>().unwrap_err();
        assert!(err.to_string().contains("hover"));
        for mode in [PhysicsMode::Kinematic, PhysicsMode::RigidBody] {
            assert_eq!(mode.as_str().parse::<PhysicsMode>().unwrap(), mode);
        }
    }
}
