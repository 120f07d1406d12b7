//! `skillstop-runtime` – Wiring
//!
//! Turns configuration into a bound termination handler and drives it.
//!
//! # Modules
//!
//! - [`config`] – [`GuardConfig`][config::GuardConfig]: TOML-backed hardware
//!   variant, workspace, joint limits and policy selection.
//! - [`runner`] – [`SkillRunner`][runner::SkillRunner]: a fixed-step
//!   reference control loop that runs a handler until it reports `done`.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber.

pub mod config;
pub mod runner;
pub mod telemetry;

pub use config::{GuardConfig, PolicyConfig};
pub use runner::{JointCommand, LinearJointTrajectory, SkillOutcome, SkillRunner};
