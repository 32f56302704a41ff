//! # Staged pose sequencer
//!
//! [`SequencedPosePreset`] brings the arm into a scoring pose in two stages: the elbow is first
//! extended to a clearance angle, then the whole arm is driven to the final pose. It owns both
//! child motions and steps through a linear state machine, making at most one transition per
//! tick:
//!
//! ```text
//! Init -> ScheduleElbow -> AwaitingElbow -> ScheduleArm -> AwaitingArm -> Done
//! ```
//!
//! Issuing a child and waiting for it are separate states, so a child is always admitted by the
//! scheduler for at least one cycle before its completion is polled.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use serde::Serialize;
use std::{cell::RefCell, fmt::Display, rc::Rc};

use crate::{
    arm::{Arm, ARM_SUBSYSTEM},
    command::Command,
    dashboard::{DashboardError, TestingDashboard},
    motion::{ArmMove, ChildMotion, ElbowMove, MotionHandle},
    presets::{
        CONE_HIGH_POST_CENTER, CONE_HIGH_POST_CENTER_ELBOW_CLEARANCE_DEG,
        CONE_HIGH_POST_CENTER_NAME, TEST_COMMANDS_CATEGORY,
    },
    scheduler::SchedulerHandle,
};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Sequence placing a cone on the high post from the center of the grid.
pub type ConeHighPostCenter = SequencedPosePreset<MotionHandle<ElbowMove>, MotionHandle<ArmMove>>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Progress of a [`SequencedPosePreset`] through one activation. Ordered in sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SequenceState {
    Init,
    ScheduleElbow,
    AwaitingElbow,
    ScheduleArm,
    AwaitingArm,
    Done,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Two stage arm motion: elbow first, then the full pose.
pub struct SequencedPosePreset<E, A> {
    name: String,

    elbow: E,

    arm: A,

    state: SequenceState,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Display for SequenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SequenceState::{:?}", self)
    }
}

impl<E: ChildMotion, A: ChildMotion> SequencedPosePreset<E, A> {
    pub fn new(name: &str, elbow: E, arm: A) -> Self {
        Self {
            name: name.to_string(),
            elbow,
            arm,
            state: SequenceState::Init,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn elbow(&self) -> &E {
        &self.elbow
    }

    pub fn arm(&self) -> &A {
        &self.arm
    }

    fn advance(&mut self, next: SequenceState) {
        debug!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }
}

impl<E: ChildMotion, A: ChildMotion> Command for SequencedPosePreset<E, A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) {
        self.state = SequenceState::Init;
    }

    fn tick(&mut self) {
        match self.state {
            SequenceState::Init => self.advance(SequenceState::ScheduleElbow),
            SequenceState::ScheduleElbow => {
                info!("{}: issuing {}", self.name, self.elbow.name());
                self.elbow.schedule();
                self.advance(SequenceState::AwaitingElbow);
            }
            SequenceState::AwaitingElbow => {
                if self.elbow.is_finished() {
                    self.advance(SequenceState::ScheduleArm);
                }
            }
            SequenceState::ScheduleArm => {
                info!("{}: issuing {}", self.name, self.arm.name());
                self.arm.schedule();
                self.advance(SequenceState::AwaitingArm);
            }
            SequenceState::AwaitingArm => {
                if self.arm.is_finished() {
                    self.advance(SequenceState::Done);
                }
            }
            SequenceState::Done => (),
        }
    }

    /// On interruption the child still in flight, if any, is withdrawn so the arm stops where it
    /// is.
    fn end(&mut self, interrupted: bool) {
        if !interrupted {
            return;
        }

        info!("{}: interrupted in {}", self.name, self.state);

        match self.state {
            SequenceState::AwaitingElbow => self.elbow.cancel(),
            SequenceState::AwaitingArm => self.arm.cancel(),
            _ => (),
        }
    }

    fn is_finished(&self) -> bool {
        self.state == SequenceState::Done
    }

    fn status(&self) -> Option<String> {
        Some(self.state.to_string())
    }
}

impl ConeHighPostCenter {
    /// Build the sequence, with its child motions issued through `scheduler`.
    pub fn cone_high_post_center(arm: &Rc<RefCell<Arm>>, scheduler: &SchedulerHandle) -> Self {
        Self::new(
            CONE_HIGH_POST_CENTER_NAME,
            MotionHandle::new(
                ElbowMove::new(arm.clone(), CONE_HIGH_POST_CENTER_ELBOW_CLEARANCE_DEG),
                scheduler.clone(),
            ),
            MotionHandle::new(
                ArmMove::new(arm.clone(), CONE_HIGH_POST_CENTER),
                scheduler.clone(),
            ),
        )
    }

    /// Register a fresh instance with the testing dashboard, under the arm subsystem.
    pub fn register_with_testing_dashboard(
        dashboard: &mut TestingDashboard,
        arm: &Rc<RefCell<Arm>>,
    ) -> Result<(), DashboardError> {
        let cmd = Self::cone_high_post_center(arm, &dashboard.scheduler());

        dashboard.register_command(
            ARM_SUBSYSTEM,
            TEST_COMMANDS_CATEGORY,
            CONE_HIGH_POST_CENTER_NAME,
            Rc::new(RefCell::new(cmd)),
        )
    }
}
