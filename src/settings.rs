//! Player settings and preferences
//!
//! Persisted separately from score books, as JSON in the storage backend.

use serde::{Deserialize, Serialize};

use crate::consts::PARTICLE_POOL_CAPACITY;
use crate::persistence::{StorageBackend, StorageError, load_json, save_json};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Live particle cap for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => PARTICLE_POOL_CAPACITY / 4,
            QualityPreset::Medium => PARTICLE_POOL_CAPACITY / 2,
            QualityPreset::High => PARTICLE_POOL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,
    /// Explosion particles
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no particles regardless of quality)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "retro_arcade_settings";

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load saved settings, falling back to defaults on any problem
    pub fn load(backend: &dyn StorageBackend) -> Self {
        match load_json(backend, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring saved settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, backend: &mut dyn StorageBackend) -> Result<(), StorageError> {
        save_json(backend, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
