//! # Arm library.
//!
//! This library allows other crates in the workspace (and the integration tests) to access items
//! defined inside the arm executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm subsystem - joint targets and the rate limited position loops driving them
pub mod arm;

/// Command interface - the callback surface driven by the scheduler
pub mod command;

/// Data store - per-cycle data and the end of run summary
pub mod data_store;

/// Testing dashboard - registry of manually invocable commands
pub mod dashboard;

/// Motion primitives - elbow and full arm moves to fixed angles
pub mod motion;

/// Executable parameters
pub mod params;

/// Fixed arm poses
pub mod presets;

/// Command scheduler - ticks running commands once per cycle
pub mod scheduler;

/// Staged pose sequencer - the elbow-then-arm scoring sequence
pub mod sequence;
