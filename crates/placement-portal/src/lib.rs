//! Placement portal: job eligibility, applications, interviews and student profiles.

pub mod config;
pub mod error;
pub mod portal;
pub mod telemetry;
