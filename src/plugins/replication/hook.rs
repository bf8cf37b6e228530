//! Instantiation hook: the extension point that replaces default construction.

use bevy::prelude::*;

use crate::common::template::{TemplateHandle, TemplateId};

use super::messages::OwnerId;

/// Registration key for a hook.
///
/// `Template` keys by the identity the authority announces. `Handle` keys by the
/// name hash of the concrete template this process builds from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKey {
    Template(TemplateId),
    Handle(TemplateHandle),
}

/// Called by the replication layer instead of spawning/despawning directly.
///
/// Both calls run with exclusive world access, between schedule steps.
pub trait InstantiationHook: Send + Sync + 'static {
    /// Materialize a local instance. `None` means "nothing materialized"; the
    /// caller logs it and keeps going.
    fn construct(
        &self,
        world: &mut World,
        owner: OwnerId,
        position: Vec3,
        rotation: Quat,
    ) -> Option<Entity>;

    /// Release a local instance. The hook decides between recycle and destroy.
    fn destruct(&self, world: &mut World, entity: Entity);
}
