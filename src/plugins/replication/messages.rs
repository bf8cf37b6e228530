//! Wire-level replication events.
//!
//! The transport that carries these between processes is not part of this crate;
//! `Replication::drain_outbox` / `Replication::receive` are the hand-off points.

use bevy::prelude::*;

use crate::common::template::TemplateId;

/// Identity of a replicated entity, shared by the authority and every replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(pub u64);

/// Process that owns a replicated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

impl OwnerId {
    pub const AUTHORITY: Self = Self(0);
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplicationMessage {
    Spawn {
        id: NetworkId,
        template: TemplateId,
        owner: OwnerId,
        position: Vec3,
        rotation: Quat,
        reliable: bool,
    },
    Despawn {
        id: NetworkId,
    },
}
