//! # Communications interface crate.
//!
//! Provides the message definitions shared between the drive-by-wire executable and its
//! collaborators.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inbound messages (measured velocity, twist commands, DBW enable flag)
pub mod input;

/// Command definitions for equipment (the vehicle's throttle, brake and steering actuators)
pub mod eqpt;
