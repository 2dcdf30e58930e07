//! # Drive-by-wire library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the drive-by-wire crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store - latest inputs and module outputs
pub mod data_store;

/// Executable parameters
pub mod params;

/// Actuator publisher - sends demands to the throttle, brake and steering
pub mod publisher;

/// Twist control module - converts twist commands into actuator demands
pub mod twist_ctrl;
