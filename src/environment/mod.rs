// src/environment/mod.rs

//! Build environments.
//!
//! - [`model`] holds the immutable [`Environment`] value.
//! - [`resolver`] turns a [`Target`] plus [`OverrideFlags`] into one.

pub mod model;
pub mod resolver;

pub use model::{EnvName, Environment};
pub use resolver::{EnvironmentResolver, OverrideFlags, Target};
