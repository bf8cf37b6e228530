//! Common, shared types.

pub mod error;
pub mod settings;
pub mod state;
pub mod template;

#[cfg(test)]
pub mod test_utils;
