//! Host platform utility functions

use std::path::PathBuf;
use thiserror::Error;

/// Name of the environment variable pointing at the software root, the
/// directory containing `params` and `sessions`.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SEQ_SW_ROOT";

/// Errors from querying the host environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({}) is not set", SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("The software root {0:?} is not a directory")]
    SwRootNotDir(PathBuf),
}

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, HostError> {
    let root = match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(r) => PathBuf::from(r),
        None => return Err(HostError::SwRootNotSet),
    };

    if !root.is_dir() {
        return Err(HostError::SwRootNotDir(root));
    }

    Ok(root)
}
