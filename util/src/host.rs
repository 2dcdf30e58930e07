//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable which points at the root of the software tree. Parameter files and
/// session directories are resolved relative to this root.
pub const SW_ROOT_ENV_VAR: &str = "DBW_SW_ROOT";

/// Get the root directory of the software tree.
pub fn get_dbw_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
