//! # Sheet Records
//!
//! The externally owned side of the influence graph: character sheet records,
//! their free-text relationship entries, the store collaborator the graph reads
//! from and writes to, and the change notifications the store emits.
//!
//! This crate holds no graph logic. It is the single source of truth for the
//! records; `influence_core` only derives an index from it.

pub mod entities;
pub mod events;
pub mod store;

pub use entities::*;
pub use events::*;
pub use store::*;
