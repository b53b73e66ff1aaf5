//! Editing a fog-of-war map of the places that have been explored.
//!
//! The data model lives in [`fogmap_map`]. This crate adds an [`EditSession`] that owns the current map and its undo history,
//! and moves maps in and out of archives.

mod config;
mod session;

pub use config::SessionConfig;
pub use session::EditSession;

pub use fogmap_core as core;
pub use fogmap_map as map;
