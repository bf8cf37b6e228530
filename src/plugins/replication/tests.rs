use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bevy::prelude::*;

use crate::common::error::ReplicationError;
use crate::common::template::{EntityTemplate, TemplateId};

use super::*;

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

/// Hook that records calls and never materializes anything.
#[derive(Default)]
struct CountingHook {
    constructs: AtomicUsize,
    destructs: AtomicUsize,
}

impl InstantiationHook for CountingHook {
    fn construct(&self, _: &mut World, _: OwnerId, _: Vec3, _: Quat) -> Option<Entity> {
        self.constructs.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn destruct(&self, world: &mut World, entity: Entity) {
        self.destructs.fetch_add(1, Ordering::SeqCst);
        despawn_if_exists(world, entity);
    }
}

fn template() -> EntityTemplate {
    EntityTemplate::new(1, "Mover")
}

fn spawn_message(id: u64, template: TemplateId) -> ReplicationMessage {
    ReplicationMessage::Spawn {
        id: NetworkId(id),
        template,
        owner: OwnerId::AUTHORITY,
        position: Vec3::new(1.0, 2.0, 0.0),
        rotation: Quat::IDENTITY,
        reliable: true,
    }
}

fn replica_world() -> World {
    let mut world = World::new();
    let mut replication = Replication::new(Role::Replica);
    replication.register_template(template());
    world.insert_resource(replication);
    world
}

// --------------------------------------------------------------------------------------
// Role + registration
// --------------------------------------------------------------------------------------

#[test]
fn role_queries() {
    assert!(Role::Host.is_authority() && Role::Host.is_replica());
    assert!(Role::Authority.is_authority() && !Role::Authority.is_replica());
    assert!(!Role::Replica.is_authority() && Role::Replica.is_replica());

    let offline = Replication::disconnected();
    assert!(offline.role().is_none());
    assert!(!offline.is_authority() && !offline.is_replica());
}

#[test]
fn registration_fails_when_unavailable() {
    let mut offline = Replication::disconnected();
    let err = offline
        .register_instantiation_hook(HookKey::Template(TemplateId(1)), Arc::new(CountingHook::default()))
        .unwrap_err();
    assert_eq!(err, ReplicationError::Unavailable);
}

#[test]
fn hook_lookup_by_handle_follows_override() {
    let mut replication = Replication::new(Role::Replica);
    replication.register_template(template());
    let replacement = EntityTemplate::new(9, "MoverReplica");
    replication.add_override(template().id, replacement.clone());
    replication
        .register_instantiation_hook(HookKey::Handle(replacement.handle()), Arc::new(CountingHook::default()))
        .unwrap();

    assert!(replication.hook_for(template().id).is_some());
    assert_eq!(replication.resolve_override_template(&template()), replacement);
    assert_eq!(replication.wire_template(replacement.id), template().id);

    replication.remove_override(template().id);
    assert_eq!(replication.resolve_override_template(&template()), template());
    assert_eq!(replication.wire_template(replacement.id), replacement.id);
}

#[test]
fn deregister_removes_hook() {
    let mut replication = Replication::new(Role::Authority);
    let key = HookKey::Template(TemplateId(1));
    replication
        .register_instantiation_hook(key, Arc::new(CountingHook::default()))
        .unwrap();

    assert!(replication.deregister_instantiation_hook(key));
    assert!(!replication.deregister_instantiation_hook(key));
    assert!(replication.hook_for(TemplateId(1)).is_none());
}

#[test]
fn template_handle_is_stable_per_name() {
    assert_eq!(template().handle(), EntityTemplate::new(77, "Mover").handle());
    assert_ne!(template().handle(), EntityTemplate::new(1, "Other").handle());
}

// --------------------------------------------------------------------------------------
// Announce / withdraw
// --------------------------------------------------------------------------------------

#[test]
fn announce_is_idempotent_per_entity() {
    let mut world = World::new();
    let e = world.spawn_empty().id();
    let mut replication = Replication::new(Role::Authority);

    let a = replication
        .announce(e, TemplateId(1), OwnerId::AUTHORITY, Vec3::ZERO, Quat::IDENTITY, true)
        .unwrap();
    let b = replication
        .announce(e, TemplateId(1), OwnerId::AUTHORITY, Vec3::ZERO, Quat::IDENTITY, true)
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(replication.drain_outbox().len(), 1);
}

#[test]
fn announce_requires_authority() {
    let mut world = World::new();
    let e = world.spawn_empty().id();
    let mut replication = Replication::new(Role::Replica);

    let err = replication
        .announce(e, TemplateId(1), OwnerId::AUTHORITY, Vec3::ZERO, Quat::IDENTITY, true)
        .unwrap_err();
    assert_eq!(err, ReplicationError::NotAuthority);
}

#[test]
fn withdraw_is_idempotent() {
    let mut world = World::new();
    let e = world.spawn_empty().id();
    let mut replication = Replication::new(Role::Authority);
    let id = replication
        .announce(e, TemplateId(1), OwnerId::AUTHORITY, Vec3::ZERO, Quat::IDENTITY, false)
        .unwrap();
    replication.drain_outbox();

    assert_eq!(replication.network_id(e), Some(id));
    assert!(replication.withdraw(e));
    assert!(!replication.withdraw(e));
    assert_eq!(replication.network_id(e), None);
    assert_eq!(replication.drain_outbox(), vec![ReplicationMessage::Despawn { id }]);
}

#[test]
fn announce_uses_authority_identity_for_override_template() {
    let mut world = World::new();
    let e = world.spawn_empty().id();
    let mut replication = Replication::new(Role::Host);
    replication.add_override(TemplateId(1), EntityTemplate::new(9, "MoverReplica"));

    replication
        .announce(e, TemplateId(9), OwnerId::AUTHORITY, Vec3::ZERO, Quat::IDENTITY, true)
        .unwrap();

    let out = replication.drain_outbox();
    assert!(matches!(out[0], ReplicationMessage::Spawn { template: TemplateId(1), .. }));
}

#[test]
fn despawn_replicated_without_hook_destroys() {
    let mut world = World::new();
    world.insert_resource(Replication::new(Role::Authority));
    let e = world.spawn((Replicated { template: TemplateId(1) }, Transform::default())).id();
    announce_entity(&mut world, e, true).unwrap();

    despawn_replicated(&mut world, e);

    assert!(world.get_entity(e).is_err());
    assert!(!world.resource::<Replication>().is_announced(e));
}

// --------------------------------------------------------------------------------------
// Replica apply
// --------------------------------------------------------------------------------------

#[test]
fn incoming_spawn_without_hook_uses_default_construction() {
    let mut world = replica_world();
    world
        .resource_mut::<Replication>()
        .receive([spawn_message(5, template().id)]);

    apply_incoming_replication(&mut world);

    let e = world.resource::<Replication>().local_entity(NetworkId(5)).unwrap();
    let tf = world.get::<Transform>(e).unwrap();
    assert_eq!(tf.translation, Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(world.get::<Replicated>(e).unwrap().template, template().id);
}

#[test]
fn incoming_spawn_calls_hook_and_tolerates_none() {
    let mut world = replica_world();
    let hook = Arc::new(CountingHook::default());
    world
        .resource_mut::<Replication>()
        .register_instantiation_hook(HookKey::Template(template().id), hook.clone())
        .unwrap();
    world
        .resource_mut::<Replication>()
        .receive([spawn_message(5, template().id)]);

    apply_incoming_replication(&mut world);

    assert_eq!(hook.constructs.load(Ordering::SeqCst), 1);
    assert_eq!(world.resource::<Replication>().remote_count(), 0);
}

#[test]
fn local_template_follows_override_and_reports_unknown() {
    let mut replication = Replication::new(Role::Replica);
    replication.register_template(template());
    assert_eq!(replication.local_template(template().id), Ok(template()));

    let replacement = EntityTemplate::new(9, "MoverReplica");
    replication.add_override(template().id, replacement.clone());
    assert_eq!(replication.local_template(template().id), Ok(replacement));

    assert_eq!(
        replication.local_template(TemplateId(404)),
        Err(ReplicationError::UnknownTemplate(TemplateId(404)))
    );
}

#[test]
fn incoming_spawn_for_unknown_template_is_skipped() {
    let mut world = replica_world();
    world
        .resource_mut::<Replication>()
        .receive([spawn_message(5, TemplateId(404))]);

    apply_incoming_replication(&mut world);

    assert_eq!(world.resource::<Replication>().remote_count(), 0);
}

#[test]
fn duplicate_spawn_materializes_once() {
    let mut world = replica_world();
    world
        .resource_mut::<Replication>()
        .receive([spawn_message(5, template().id), spawn_message(5, template().id)]);

    apply_incoming_replication(&mut world);

    let count = world.query::<&Replicated>().iter(&world).count();
    assert_eq!(count, 1);
}

#[test]
fn incoming_despawn_goes_through_hook() {
    let mut world = replica_world();
    let e = world.spawn(template().bundle()).id();
    world
        .resource_mut::<Replication>()
        .remote
        .insert(NetworkId(5), RemoteEntity { entity: e, template: template().id });
    let hook = Arc::new(CountingHook::default());
    world
        .resource_mut::<Replication>()
        .register_instantiation_hook(HookKey::Template(template().id), hook.clone())
        .unwrap();

    world
        .resource_mut::<Replication>()
        .receive([ReplicationMessage::Despawn { id: NetworkId(5) }]);
    apply_incoming_replication(&mut world);

    assert_eq!(hook.destructs.load(Ordering::SeqCst), 1);
    assert!(world.get_entity(e).is_err());
    assert!(world.resource::<Replication>().local_entity(NetworkId(5)).is_none());
}

#[test]
fn despawn_for_unknown_id_is_ignored() {
    let mut world = replica_world();
    world
        .resource_mut::<Replication>()
        .receive([ReplicationMessage::Despawn { id: NetworkId(99) }]);

    apply_incoming_replication(&mut world);
}
