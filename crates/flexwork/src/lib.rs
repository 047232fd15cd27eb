//! Domain library for the flexible work arrangement portal.

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod workflows;
