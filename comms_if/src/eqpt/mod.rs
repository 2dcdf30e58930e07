//! # Equipment Interface
//!
//! This module defines the interface structures which will be sent to the vehicle's actuator
//! interface.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod dbw;
