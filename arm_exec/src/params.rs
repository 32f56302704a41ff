//! # Arm Executable Parameters
//!
//! This module provide parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::time::Duration;

use crate::scheduler::SchedulerParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {

    /// Scheduler configuration
    pub scheduler: SchedulerParams,

    /// Number of cycles after which the executable gives up on the invoked command
    pub max_cycles: u64,

    /// Timeout applied to the invoked command, if any
    ///
    /// Units: seconds
    pub command_timeout_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors in the executable parameters.
#[derive(Debug, thiserror::Error)]
pub enum ArmExecParamsError {
    #[error("The command timeout must be positive and representable, found {0} s")]
    InvalidCommandTimeout(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmExecParams {
    /// The command timeout as a duration, if one is set.
    pub fn command_timeout(&self) -> Result<Option<Duration>, ArmExecParamsError> {
        match self.command_timeout_s {
            Some(t) if t > 0.0 => Duration::try_from_secs_f64(t)
                .map(Some)
                .map_err(|_| ArmExecParamsError::InvalidCommandTimeout(t)),
            Some(t) => Err(ArmExecParamsError::InvalidCommandTimeout(t)),
            None => Ok(None),
        }
    }
}
