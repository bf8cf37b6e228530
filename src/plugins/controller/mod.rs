//! Pool controller: composition root for pooling on one process.
//!
//! Activation (`OnEnter(InGame)`), once per scene:
//! 1. validate settings, resolve the role from the replication layer
//! 2. pick the prototype (authority template, or the replica override)
//! 3. fill the pool, register the hook
//! 4. authority only: create and start the spawn scheduler
//! 5. subscribe to scene-lifecycle notifications
//!
//! Teardown (unload of our scene), exactly once per activation, in order:
//! stop scheduler → deregister hook (+ override) → tear down pool → unsubscribe.
//!
//! Configuration and dependency problems are logged here and degrade to "no
//! pooling": the replication layer then falls back to default construction.

use std::sync::Arc;
use std::time::Duration;

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::common::settings::PoolSettings;
use crate::common::state::GameState;
use crate::common::template::TemplateId;
use crate::plugins::pool::{EntityPool, PooledInstantiationHook};
use crate::plugins::replication::{HookKey, Replication, Role};
use crate::plugins::scene::{self, SceneLifecycleEvent, SceneSubscription};
use crate::plugins::spawner::SpawnScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    #[default]
    Inactive,
    Active,
    TornDown,
}

#[derive(Resource, Debug, Default)]
pub struct PoolController {
    phase: ControllerPhase,
    role: Option<Role>,
    hook_key: Option<HookKey>,
    /// Authority template whose override this process registered.
    override_source: Option<TemplateId>,
}

impl PoolController {
    #[inline]
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    #[inline]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[inline]
    pub fn hook_key(&self) -> Option<HookKey> {
        self.hook_key
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<PoolController>()
        .add_systems(OnEnter(GameState::InGame), activate_controller)
        .add_systems(
            Update,
            listen_for_scene_unload.run_if(resource_exists::<SceneSubscription>),
        );
}

pub fn activate_controller(world: &mut World) {
    world.init_resource::<PoolController>();
    if world.resource::<PoolController>().phase == ControllerPhase::Active {
        debug!("pool controller already active");
        return;
    }

    let settings = match world.resource::<PoolSettings>().clone().validate() {
        Ok(settings) => settings,
        Err(e) => {
            error!("pool settings rejected, pooling disabled: {e}");
            return;
        }
    };

    let Some(role) = world.get_resource::<Replication>().and_then(Replication::role) else {
        warn!("replication layer unavailable, pooling disabled");
        return;
    };

    let Some(template) = settings.template.clone() else {
        warn!("no entity template configured, pooling disabled");
        return;
    };

    // Template selection.
    let (prototype, override_source) = {
        let mut replication = world.resource_mut::<Replication>();
        replication.register_template(template.clone());

        let mut override_source = None;
        if settings.handler_enabled && role.is_replica() {
            if let Some(replacement) = settings
                .replica_template
                .clone()
                .filter(|t| t.id != template.id)
            {
                replication.add_override(template.id, replacement);
                override_source = Some(template.id);
            }
        }
        (replication.resolve_override_template(&template), override_source)
    };

    // Replicas without the handler keep default construction and need no pool.
    let owns_pool = role.is_authority() || settings.handler_enabled;
    if owns_pool {
        let mut pool = EntityPool::new(settings.handler_enabled);
        pool.initialize(world, settings.pool_capacity, prototype.clone());
        world.insert_resource(pool);
    }

    let mut hook_key = None;
    if settings.handler_enabled {
        let key = if settings.use_override_template_handle {
            HookKey::Handle(prototype.handle())
        } else {
            HookKey::Template(template.id)
        };
        match world
            .resource_mut::<Replication>()
            .register_instantiation_hook(key, Arc::new(PooledInstantiationHook))
        {
            Ok(()) => hook_key = Some(key),
            Err(e) => warn!("instantiation hook not registered: {e}"),
        }
    }

    if role.is_authority() {
        let now = world
            .get_resource::<Time>()
            .map(Time::elapsed)
            .unwrap_or_default();
        // `validate` guarantees the delay fits a `Duration`.
        let delay = Duration::try_from_secs_f32(settings.initial_spawn_delay).unwrap_or_default();
        let deadline = now.saturating_add(delay);
        let mut scheduler = SpawnScheduler::new(settings.rate(), deadline);
        scheduler.start(now);
        world.insert_resource(scheduler);
    }

    scene::subscribe(world, settings.scene_name.clone());

    let mut controller = world.resource_mut::<PoolController>();
    controller.phase = ControllerPhase::Active;
    controller.role = Some(role);
    controller.hook_key = hook_key;
    controller.override_source = override_source;
    info!(
        "pool controller active as {role:?} (prototype `{}`, pool {})",
        prototype.name,
        if owns_pool { "on" } else { "off" }
    );
}

/// Full teardown. Only the first call after an activation does anything.
pub fn teardown_controller(world: &mut World) {
    let (hook_key, override_source) = {
        let Some(mut controller) = world.get_resource_mut::<PoolController>() else {
            return;
        };
        if controller.phase != ControllerPhase::Active {
            debug!("pool controller teardown ignored ({:?})", controller.phase);
            return;
        }
        controller.phase = ControllerPhase::TornDown;
        (controller.hook_key.take(), controller.override_source.take())
    };

    if let Some(mut scheduler) = world.remove_resource::<SpawnScheduler>() {
        scheduler.stop();
    }

    if let Some(mut replication) = world.get_resource_mut::<Replication>() {
        if let Some(key) = hook_key {
            replication.deregister_instantiation_hook(key);
        }
        if let Some(source) = override_source {
            replication.remove_override(source);
        }
    }

    if let Some(mut pool) = world.remove_resource::<EntityPool>() {
        pool.teardown(world);
    }

    scene::unsubscribe(world);
    info!("pool controller torn down");
}

fn listen_for_scene_unload(
    mut reader: MessageReader<SceneLifecycleEvent>,
    subscription: Res<SceneSubscription>,
    mut commands: Commands,
) {
    let unload = reader
        .read()
        .fold(false, |hit, ev| hit || ev.unloads(&subscription.scene));
    if unload {
        info!("scene `{}` unloading", subscription.scene);
        commands.queue(teardown_controller);
    }
}
