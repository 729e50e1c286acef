// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling watch binding globs.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about the dispatcher; it only turns filesystem
//! changes into task-level `ChangeDetected` events.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{WatchBinding, WatchBindings};
pub use watcher::{spawn_watcher, WatcherHandle};
