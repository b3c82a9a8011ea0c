//! Research data-processing registrations: question registry, blueprint evaluation,
//! progress tracking, and the HTTP-facing service around them.

pub mod config;
pub mod error;
pub mod registrations;
pub mod telemetry;
