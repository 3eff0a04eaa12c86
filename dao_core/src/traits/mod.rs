//! Trait definitions
//!
//! This module contains the traits that define the entity capabilities and
//! the operation surface of the generic access engine.

pub mod dao;
pub mod entity;

// Re-export all public items for convenience
pub use dao::Dao;
pub use entity::{AsTimestamp, Embeddable, Entity, EntityKey};
