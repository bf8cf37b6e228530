//! Error types.
//!
//! Both enums are handled at the boundary that produces them (settings load,
//! controller activation). Nothing here is ever returned out of the spawn loop.

use thiserror::Error;

use super::template::TemplateId;

/// Errors raised while loading or validating [`PoolSettings`](super::settings::PoolSettings).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML for `PoolSettings`.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The instantiation hook is enabled but no template was configured.
    #[error("handler enabled but no entity template configured")]
    MissingTemplate,

    /// A numeric field is out of range.
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// Errors raised by the replication layer towards its callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicationError {
    /// The layer is not connected in any role.
    #[error("replication layer unavailable")]
    Unavailable,

    /// The call requires the authority role.
    #[error("operation requires authority")]
    NotAuthority,

    /// The template was never registered with the layer.
    #[error("unknown template {0:?}")]
    UnknownTemplate(TemplateId),
}
