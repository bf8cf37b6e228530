//! Entity templates ("prefabs") shared by the authority and its replicas.
//!
//! A template is identified two ways:
//! - `TemplateId`: the identity the authority announces on the wire.
//! - `TemplateHandle`: a stable hash of the template name, usable as a
//!   registration key when the concrete template object differs per process.

use avian2d::prelude::*;
use bevy::prelude::*;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct TemplateId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TemplateHandle(pub u64);

impl TemplateHandle {
    /// FNV-1a over the template name. Stable across processes and builds.
    pub fn of_name(name: &str) -> Self {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;
        let hash = name
            .bytes()
            .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
        Self(hash)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default = "EntityTemplate::default_tint")]
    pub tint: [f32; 3],
    #[serde(default = "EntityTemplate::default_size")]
    pub size: f32,
}

impl EntityTemplate {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: TemplateId(id),
            name: name.into(),
            tint: Self::default_tint(),
            size: Self::default_size(),
        }
    }

    pub fn with_tint(mut self, tint: [f32; 3]) -> Self {
        self.tint = tint;
        self
    }

    #[inline]
    pub fn handle(&self) -> TemplateHandle {
        TemplateHandle::of_name(&self.name)
    }

    fn default_tint() -> [f32; 3] {
        [0.9, 0.6, 0.2]
    }

    fn default_size() -> f32 {
        10.0
    }

    /// Components every instance of this template carries, in its inactive shape.
    ///
    /// Pool bookkeeping (`PooledEntity`, `EntityState`) is added by the pool.
    pub fn bundle(&self) -> impl Bundle + use<> {
        let [r, g, b] = self.tint;
        (
            Name::new(self.name.clone()),
            Replicated { template: self.id },
            Sprite {
                color: Color::srgb(r, g, b),
                custom_size: Some(Vec2::splat(self.size)),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 1.0),
            Visibility::Hidden,
            RigidBody::Kinematic,
            LinearVelocity(Vec2::ZERO),
        )
    }
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self::new(1, "PooledMover")
    }
}

/// Tags an instance with the template it was built from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replicated {
    pub template: TemplateId,
}
