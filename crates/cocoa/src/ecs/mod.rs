//! # Sparse-Set ECS
//!
//! A small entity-component-system sized for an editor scene: entities are
//! generational handles and each component type lives in its own sparse
//! set.
//!
//! ## Module Overview
//!
//! - [`entity`]: Generational entity IDs
//! - [`storage`]: Per-type sparse sets behind a type-erased trait
//! - [`world`]: Central container (entities + components + names)

pub mod entity;
pub(crate) mod storage;
pub mod world;

pub use entity::Entity;
pub use world::{Bundle, World};
