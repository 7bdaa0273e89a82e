//! # Influence Core
//!
//! Derives a directed influence graph between player characters from the
//! free-text relationship entries on their sheets, answers "does A have
//! influence over B?" by display name, and keeps paired sheets reciprocal.
//!
//! ## Core Components
//!
//! - **names**: name normalization and composite keys
//! - **graph**: edge store and full-rescan graph builder
//! - **query**: substring edge queries and the per-token key cache
//! - **sync**: symmetry sync between paired characters
//! - **listener**: store change notifications to rebuild/sync/invalidate
//! - **service**: the owned service tying these together
//!
//! The record store stays the source of truth; everything here is rebuilt
//! from it on demand.

pub mod config;
pub mod error;
pub mod graph;
pub mod listener;
pub mod names;
pub mod query;
pub mod service;
pub mod sync;

pub use config::*;
pub use error::{InfluenceError, Result};
pub use graph::*;
pub use listener::*;
pub use names::*;
pub use query::*;
pub use service::*;
pub use sync::*;
