//! # Drive-By-Wire Executable Parameters
//!
//! This module provide parameters for the drive-by-wire executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbwExecParams {
    /// Time after which an input that has stopped arriving forces drive-by-wire off.
    ///
    /// Units: seconds
    pub input_timeout_s: f64,

    /// Value of the enable flag before the first enable message is received
    pub initial_dbw_enabled: bool,

    /// If true the published actuator commands are written to the session archive
    pub archive_outputs: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DbwExecParams {
    fn default() -> Self {
        Self {
            input_timeout_s: 0.5,
            initial_dbw_enabled: true,
            archive_outputs: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file() {
        let p: DbwExecParams = util::params::from_toml_str("input_timeout_s = 2.0").unwrap();

        assert_eq!(p.input_timeout_s, 2.0);
        assert!(p.initial_dbw_enabled);
        assert!(p.archive_outputs);
    }
}
