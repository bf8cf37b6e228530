//! Replication layer boundary.
//!
//! `Replication` is the process-local face of the replication layer: role queries,
//! the template list, hook registration, and the announce/withdraw bookkeeping.
//! Packets leave through `drain_outbox` and arrive through `receive`; moving them
//! between processes is the transport's job.
//!
//! ```text
//!  authority                                   replica
//!  ─────────                                   ───────
//!  announce(e) ──► outbox ══ transport ══► inbox ──► apply_incoming_replication
//!                                                      └─ hook.construct / default spawn
//!  despawn_replicated(e)
//!    ├─ withdraw(e) ─► outbox ══════════► inbox ──► hook.destruct / despawn
//!    └─ hook.destruct(e) (local)
//! ```

pub mod hook;
pub mod messages;

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::common::error::ReplicationError;
use crate::common::template::{EntityTemplate, Replicated, TemplateId};

pub use hook::{HookKey, InstantiationHook};
pub use messages::{NetworkId, OwnerId, ReplicationMessage};

/// Process role, resolved once when the layer connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Owns the simulation; announces entities.
    Authority,
    /// Observes the authority; materializes announced entities locally.
    Replica,
    /// Authority and replica in one process.
    Host,
}

impl Role {
    #[inline]
    pub fn is_authority(self) -> bool {
        matches!(self, Self::Authority | Self::Host)
    }

    #[inline]
    pub fn is_replica(self) -> bool {
        matches!(self, Self::Replica | Self::Host)
    }
}

/// Local mapping for an entity materialized from a remote announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteEntity {
    pub entity: Entity,
    pub template: TemplateId,
}

#[derive(Resource)]
pub struct Replication {
    role: Option<Role>,
    templates: HashMap<TemplateId, EntityTemplate>,
    /// authority template -> replica-side override
    overrides: HashMap<TemplateId, EntityTemplate>,
    /// override template -> authority template
    aliases: HashMap<TemplateId, TemplateId>,
    hooks: HashMap<HookKey, Arc<dyn InstantiationHook>>,
    announced: HashMap<Entity, NetworkId>,
    remote: HashMap<NetworkId, RemoteEntity>,
    next_id: u64,
    outbox: Vec<ReplicationMessage>,
    inbox: Vec<ReplicationMessage>,
}

impl Replication {
    pub fn new(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::disconnected()
        }
    }

    /// A layer that is present but not connected in any role.
    pub fn disconnected() -> Self {
        Self {
            role: None,
            templates: HashMap::new(),
            overrides: HashMap::new(),
            aliases: HashMap::new(),
            hooks: HashMap::new(),
            announced: HashMap::new(),
            remote: HashMap::new(),
            next_id: 1,
            outbox: Vec::new(),
            inbox: Vec::new(),
        }
    }

    #[inline]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[inline]
    pub fn is_authority(&self) -> bool {
        self.role.is_some_and(Role::is_authority)
    }

    #[inline]
    pub fn is_replica(&self) -> bool {
        self.role.is_some_and(Role::is_replica)
    }

    // -------------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------------

    pub fn register_template(&mut self, template: EntityTemplate) {
        self.templates.insert(template.id, template);
    }

    pub fn template(&self, id: TemplateId) -> Option<&EntityTemplate> {
        self.templates.get(&id)
    }

    /// What default construction builds for an announced template.
    pub fn local_template(&self, id: TemplateId) -> Result<EntityTemplate, ReplicationError> {
        self.template(id)
            .map(|t| self.resolve_override_template(t))
            .ok_or(ReplicationError::UnknownTemplate(id))
    }

    /// Build `source` from `replacement` on this process.
    pub fn add_override(&mut self, source: TemplateId, replacement: EntityTemplate) {
        self.aliases.insert(replacement.id, source);
        self.overrides.insert(source, replacement);
    }

    pub fn remove_override(&mut self, source: TemplateId) -> Option<EntityTemplate> {
        let removed = self.overrides.remove(&source)?;
        self.aliases.remove(&removed.id);
        Some(removed)
    }

    /// The template this process actually builds for `template`.
    pub fn resolve_override_template(&self, template: &EntityTemplate) -> EntityTemplate {
        self.overrides
            .get(&template.id)
            .cloned()
            .unwrap_or_else(|| template.clone())
    }

    /// The identity announced on the wire for a locally built template.
    #[inline]
    pub fn wire_template(&self, local: TemplateId) -> TemplateId {
        self.aliases.get(&local).copied().unwrap_or(local)
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    pub fn register_instantiation_hook(
        &mut self,
        key: HookKey,
        hook: Arc<dyn InstantiationHook>,
    ) -> Result<(), ReplicationError> {
        if self.role.is_none() {
            return Err(ReplicationError::Unavailable);
        }
        if self.hooks.insert(key, hook).is_some() {
            warn!("instantiation hook for {key:?} replaced");
        }
        Ok(())
    }

    pub fn deregister_instantiation_hook(&mut self, key: HookKey) -> bool {
        self.hooks.remove(&key).is_some()
    }

    pub fn has_hook(&self, key: HookKey) -> bool {
        self.hooks.contains_key(&key)
    }

    /// Hook responsible for a wire template: identity key first, then the handle
    /// of the template this process resolves it to.
    pub fn hook_for(&self, template: TemplateId) -> Option<Arc<dyn InstantiationHook>> {
        if let Some(hook) = self.hooks.get(&HookKey::Template(template)) {
            return Some(Arc::clone(hook));
        }
        let resolved = self
            .overrides
            .get(&template)
            .or_else(|| self.templates.get(&template))?;
        self.hooks.get(&HookKey::Handle(resolved.handle())).cloned()
    }

    // -------------------------------------------------------------------------
    // Authority side
    // -------------------------------------------------------------------------

    /// Announce `entity` to replicas. Announcing twice returns the existing id.
    pub fn announce(
        &mut self,
        entity: Entity,
        template: TemplateId,
        owner: OwnerId,
        position: Vec3,
        rotation: Quat,
        reliable: bool,
    ) -> Result<NetworkId, ReplicationError> {
        if !self.is_authority() {
            return Err(ReplicationError::NotAuthority);
        }
        if let Some(id) = self.announced.get(&entity) {
            return Ok(*id);
        }

        let id = NetworkId(self.next_id);
        self.next_id += 1;
        self.announced.insert(entity, id);
        self.outbox.push(ReplicationMessage::Spawn {
            id,
            template: self.wire_template(template),
            owner,
            position,
            rotation,
            reliable,
        });
        Ok(id)
    }

    /// Withdraw an announcement. Idempotent: `false` when nothing was announced.
    pub fn withdraw(&mut self, entity: Entity) -> bool {
        let Some(id) = self.announced.remove(&entity) else {
            return false;
        };
        self.outbox.push(ReplicationMessage::Despawn { id });
        true
    }

    #[inline]
    pub fn is_announced(&self, entity: Entity) -> bool {
        self.announced.contains_key(&entity)
    }

    pub fn network_id(&self, entity: Entity) -> Option<NetworkId> {
        self.announced.get(&entity).copied()
    }

    pub fn announced_count(&self) -> usize {
        self.announced.len()
    }

    // -------------------------------------------------------------------------
    // Transport hand-off
    // -------------------------------------------------------------------------

    pub fn drain_outbox(&mut self) -> Vec<ReplicationMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn receive(&mut self, messages: impl IntoIterator<Item = ReplicationMessage>) {
        self.inbox.extend(messages);
    }

    // -------------------------------------------------------------------------
    // Replica side
    // -------------------------------------------------------------------------

    pub fn local_entity(&self, id: NetworkId) -> Option<Entity> {
        self.remote.get(&id).map(|r| r.entity)
    }

    pub fn remote_count(&self) -> usize {
        self.remote.len()
    }
}

/// Register the replica-side apply system.
pub fn plugin(app: &mut App) {
    app.add_systems(
        PreUpdate,
        apply_incoming_replication.run_if(replica_connected),
    );
}

fn replica_connected(replication: Option<Res<Replication>>) -> bool {
    replication.is_some_and(|r| r.is_replica())
}

/// Despawn `entity` unless it is already gone.
pub fn despawn_if_exists(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        return false;
    }
    world.despawn(entity)
}

/// Announce an existing entity from its `Replicated` + `Transform` components.
pub fn announce_entity(world: &mut World, entity: Entity, reliable: bool) -> Option<NetworkId> {
    let template = world.get::<Replicated>(entity)?.template;
    let (position, rotation) = world
        .get::<Transform>(entity)
        .map(|tf| (tf.translation, tf.rotation))
        .unwrap_or_default();

    let mut replication = world.get_resource_mut::<Replication>()?;
    match replication.announce(entity, template, OwnerId::AUTHORITY, position, rotation, reliable) {
        Ok(id) => {
            debug!("announced {entity} as {id:?}");
            Some(id)
        }
        Err(e) => {
            warn!("announce {entity} failed: {e}");
            None
        }
    }
}

/// Authority-side despawn: withdraw from replicas, then release locally through
/// the hook (or a plain despawn when no hook owns the template).
pub fn despawn_replicated(world: &mut World, entity: Entity) {
    let template = world.get::<Replicated>(entity).map(|r| r.template);

    if !world.contains_resource::<Replication>() {
        despawn_if_exists(world, entity);
        return;
    }

    let hook = {
        let mut replication = world.resource_mut::<Replication>();
        replication.withdraw(entity);
        template.and_then(|t| {
            let wire = replication.wire_template(t);
            replication.hook_for(wire)
        })
    };

    match hook {
        Some(hook) => hook.destruct(world, entity),
        None => {
            despawn_if_exists(world, entity);
        }
    }
}

/// Apply packets received from the authority.
///
/// Spawn goes through the registered hook when one exists, otherwise the
/// template is built directly. A hook that yields `None` leaves no mapping.
pub fn apply_incoming_replication(world: &mut World) {
    let inbox = {
        let mut replication = world.resource_mut::<Replication>();
        std::mem::take(&mut replication.inbox)
    };

    for message in inbox {
        match message {
            ReplicationMessage::Spawn {
                id,
                template,
                owner,
                position,
                rotation,
                ..
            } => apply_spawn(world, id, template, owner, position, rotation),
            ReplicationMessage::Despawn { id } => apply_despawn(world, id),
        }
    }
}

fn apply_spawn(
    world: &mut World,
    id: NetworkId,
    template: TemplateId,
    owner: OwnerId,
    position: Vec3,
    rotation: Quat,
) {
    let (hook, fallback) = {
        let replication = world.resource::<Replication>();
        if replication.remote.contains_key(&id) {
            debug!("duplicate spawn for {id:?} ignored");
            return;
        }
        (replication.hook_for(template), replication.local_template(template))
    };

    let entity = match (hook, fallback) {
        (Some(hook), _) => hook.construct(world, owner, position, rotation),
        (None, Ok(template)) => Some(
            world
                .spawn(template.bundle())
                .insert((
                    Transform::from_translation(position).with_rotation(rotation),
                    Visibility::Visible,
                ))
                .id(),
        ),
        (None, Err(e)) => {
            warn!("spawn for {id:?} skipped: {e}");
            return;
        }
    };

    let Some(entity) = entity else {
        warn!("spawn for {id:?}: no entity materialized");
        return;
    };

    debug!("materialized {id:?} as {entity}");
    world
        .resource_mut::<Replication>()
        .remote
        .insert(id, RemoteEntity { entity, template });
}

fn apply_despawn(world: &mut World, id: NetworkId) {
    let (remote, hook) = {
        let mut replication = world.resource_mut::<Replication>();
        let Some(remote) = replication.remote.remove(&id) else {
            debug!("despawn for unknown {id:?} ignored");
            return;
        };
        let hook = replication.hook_for(remote.template);
        (remote, hook)
    };

    match hook {
        Some(hook) => hook.destruct(world, remote.entity),
        None => {
            despawn_if_exists(world, remote.entity);
        }
    }
}

#[cfg(test)]
mod tests;
