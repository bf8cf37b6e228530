//! Pool / spawner settings.
//!
//! Loaded once at startup (TOML) or built in code, then inserted as a resource.

use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use serde::Deserialize;

use super::error::ConfigError;
use super::template::EntityTemplate;

#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Scene whose unload tears the controller down.
    pub scene_name: String,
    /// Pause/resume spawning without losing the configured rate.
    pub auto_spawn_enabled: bool,
    /// Seconds after activation before the first release.
    pub initial_spawn_delay: f32,
    /// Entities per second. Raw input; negative values are clamped to 0.
    pub spawn_rate: i32,
    pub pool_capacity: usize,
    pub entity_speed: f32,
    /// Seconds before the authority returns a released entity to the pool. 0 = never.
    pub entity_lifetime: f32,
    pub handler_enabled: bool,
    /// Register the hook by template handle instead of template identity.
    pub use_override_template_handle: bool,
    pub template: Option<EntityTemplate>,
    /// Replica-side override of `template`.
    pub replica_template: Option<EntityTemplate>,
    /// Where released entities start.
    pub anchor: [f32; 2],
    pub reliable_announce: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            scene_name: "Main".into(),
            auto_spawn_enabled: true,
            initial_spawn_delay: 0.0,
            spawn_rate: 3,
            pool_capacity: 10,
            entity_speed: 120.0,
            entity_lifetime: 0.0,
            handler_enabled: true,
            use_override_template_handle: false,
            template: Some(EntityTemplate::default()),
            replica_template: None,
            anchor: [0.0, 0.0],
            reliable_announce: true,
        }
    }
}

impl PoolSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check ranges and required fields. Clamps the rate instead of rejecting it.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.handler_enabled && self.template.is_none() {
            return Err(ConfigError::MissingTemplate);
        }

        // Durations must also fit a `Duration`; speed only needs to be a sane float.
        for (field, value, is_duration) in [
            ("initial_spawn_delay", self.initial_spawn_delay, true),
            ("entity_speed", self.entity_speed, false),
            ("entity_lifetime", self.entity_lifetime, true),
        ] {
            let out_of_range = !value.is_finite()
                || value < 0.0
                || (is_duration && Duration::try_from_secs_f32(value).is_err());
            if out_of_range {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        self.spawn_rate = clamp_rate(self.spawn_rate);
        Ok(self)
    }

    /// The configured rate as an unsigned count.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.spawn_rate.max(0) as u32
    }

    #[inline]
    pub fn anchor(&self) -> Vec2 {
        Vec2::from_array(self.anchor)
    }
}

/// Negative rates are a configuration error; clamp to "paused".
pub fn clamp_rate(rate: i32) -> i32 {
    if rate < 0 {
        warn!("negative spawn rate {rate} clamped to 0");
        0
    } else {
        rate
    }
}
