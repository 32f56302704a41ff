//! Fixed arm poses.
//!
//! All angles are in degrees, in the same joint frames as [`Arm`](crate::arm::Arm).

use serde::Serialize;

/// Dashboard category for commands registered for manual testing.
pub const TEST_COMMANDS_CATEGORY: &str = "TestCommands";

/// A target position for every joint of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PosePreset {
    pub shoulder_deg: f64,
    pub elbow_deg: f64,
    pub turret_deg: f64,
}

// ---- CONE HIGH POST, CENTERED ----

pub const CONE_HIGH_POST_CENTER_NAME: &str = "ConeHighPostCenter";

/// Elbow angle the arm extends to before the shoulder moves, clearing the bumpers.
pub const CONE_HIGH_POST_CENTER_ELBOW_CLEARANCE_DEG: f64 = -133.0;

/// Final scoring pose.
pub const CONE_HIGH_POST_CENTER: PosePreset = PosePreset {
    shoulder_deg: 42.0,
    elbow_deg: -113.0,
    turret_deg: -144.0,
};
