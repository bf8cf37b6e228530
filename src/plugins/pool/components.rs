use bevy::prelude::*;

/// Per-instance pool bookkeeping, addressed directly by the entity handle.
///
/// Invariant: `evicted` implies `!pool_member`. `evict` is the only way to set it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledEntity {
    handler_managed: bool,
    pool_member: bool,
    evicted: bool,
}

impl PooledEntity {
    pub fn new(handler_managed: bool) -> Self {
        Self {
            handler_managed,
            pool_member: true,
            evicted: false,
        }
    }

    #[inline]
    pub fn handler_managed(&self) -> bool {
        self.handler_managed
    }

    #[inline]
    pub fn pool_member(&self) -> bool {
        self.pool_member
    }

    #[inline]
    pub fn evicted(&self) -> bool {
        self.evicted
    }

    /// Owned by the hook and still recyclable.
    #[inline]
    pub fn is_pool_managed(&self) -> bool {
        self.handler_managed && self.pool_member && !self.evicted
    }

    /// Permanently remove from the pool. Terminal.
    #[inline]
    pub fn evict(&mut self) {
        self.pool_member = false;
        self.evicted = true;
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityState {
    #[default]
    Inactive,
    Active,
}
