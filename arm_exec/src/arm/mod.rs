//! Arm subsystem
//!
//! Models the three actuated joints of the arm (shoulder, elbow, turret) and the position loops
//! driving them. Motion commands set joint targets, the cyclic processing moves each joint
//! towards its target within the joint's rate limit.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// Internal
use crate::command::SubsystemId;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of actuated joints on the arm.
pub const NUM_JOINTS: usize = 3;

/// Identity of the arm, used as the requirement of every arm motion.
pub const ARM_SUBSYSTEM: SubsystemId = SubsystemId("Arm");

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Actuated joints of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    Shoulder,
    Elbow,
    Turret,
}

/// Possible errors that can occur during Arm operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    #[error("Failed to load the arm parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid arm parameters: {0}")]
    InvalidParams(String),

    #[error("Target for the {0} must be finite, found {1}")]
    NonFiniteTarget(Joint, f64),

    #[error("The processing period must be positive and finite, found {0} s")]
    InvalidPeriod(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Joint {
    /// All joints, in index order.
    pub const ALL: [Joint; NUM_JOINTS] = [Joint::Shoulder, Joint::Elbow, Joint::Turret];

    /// Index of this joint in per-joint arrays.
    pub fn index(self) -> usize {
        match self {
            Joint::Shoulder => 0,
            Joint::Elbow => 1,
            Joint::Turret => 2,
        }
    }
}

impl Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Joint::Shoulder => write!(f, "shoulder"),
            Joint::Elbow => write!(f, "elbow"),
            Joint::Turret => write!(f, "turret"),
        }
    }
}
