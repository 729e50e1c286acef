// src/exec/mod.rs

//! Producer layer.
//!
//! This module is responsible for actually doing the work of each task and
//! reporting success or a diagnostic back to the executor.
//!
//! - [`backend`] provides the `Producer` trait, request/report types and the
//!   `NoopProducer` used when nothing is configured.
//! - [`command`] runs configured shell commands with `tokio::process`.
//! - [`copy`] is the built-in resources producer.
//! - [`clean`] removes the environment's output root.

pub mod backend;
pub mod clean;
pub mod command;
pub mod copy;

pub use backend::{NoopProducer, Producer, ProducerReport, ProducerRequest};
pub use clean::CleanProducer;
pub use command::CommandProducer;
pub use copy::CopyProducer;
