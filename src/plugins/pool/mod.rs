//! Entity pool: recycled replicated instances.
//!
//! # Lifecycle of one member
//! ```text
//!   initialize / grow         acquire                 hook.destruct
//!  ─────────────────► Inactive ──────► Active ──────────────────────┐
//!                        ▲                                           │
//!                        └───────────── deactivate ◄─────────────────┘
//!
//!   teardown: evict (terminal) → withdraw if announced → despawn
//! ```
//!
//! The pool resource exists only while the controller is active; the controller
//! inserts it on activation and removes it on teardown.

pub mod components;
pub mod entity_pool;
pub mod hook;

pub use components::{EntityState, PooledEntity};
pub use entity_pool::{activate, deactivate, EntityPool};
pub use hook::PooledInstantiationHook;
