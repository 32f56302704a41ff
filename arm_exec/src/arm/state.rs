//! Implementations for the Arm state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use super::{ArmError, ArmParams, Joint, NUM_JOINTS};
use util::{maths, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm subsystem state
#[derive(Debug, Default)]
pub struct Arm {
    pub(crate) params: ArmParams,

    /// Current joint positions.
    ///
    /// Units: degrees
    pub(crate) current_deg: [f64; NUM_JOINTS],

    /// Joint position targets, always within the joint limits.
    ///
    /// Units: degrees
    pub(crate) target_deg: [f64; NUM_JOINTS],

    /// True for each joint whose last target had to be clamped into the limits.
    pub(crate) pos_limited: [bool; NUM_JOINTS],
}

/// Input data to the Arm.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Time since the last processing cycle.
    ///
    /// Units: seconds
    pub period_s: f64,
}

/// Status report for Arm processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    pub pos_limited: [bool; NUM_JOINTS],
    pub rate_limited: [bool; NUM_JOINTS],
    pub at_target: [bool; NUM_JOINTS],
}

/// Telemetry for the arm.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct ArmTm {
    pub current_deg: [f64; NUM_JOINTS],
    pub target_deg: [f64; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Arm {
    type InitData = &'static str;
    type InitError = ArmError;

    type InputData = InputData;
    type OutputData = [f64; NUM_JOINTS];
    type StatusReport = StatusReport;
    type ProcError = ArmError;

    /// Initialise the Arm module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: ArmParams =
            util::params::load(init_data).map_err(ArmError::ParamLoadError)?;

        *self = Self::new(params)?;

        Ok(())
    }

    /// Move every joint towards its target by no more than its rate limit allows this cycle.
    ///
    /// Outputs the demanded joint positions.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let period_s = input_data.period_s;
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(ArmError::InvalidPeriod(period_s));
        }

        let mut report = StatusReport {
            pos_limited: self.pos_limited,
            ..Default::default()
        };

        for joint in Joint::ALL.iter() {
            let i = joint.index();

            let (pos, limited) = maths::step_towards(
                self.current_deg[i],
                self.target_deg[i],
                self.params.max_rate_degs[i] * period_s,
            );

            self.current_deg[i] = pos;
            report.rate_limited[i] = limited;
            report.at_target[i] = self.at_target(*joint);
        }

        Ok((self.current_deg, report))
    }
}

impl Arm {
    /// Create a new arm at rest in its start position.
    pub fn new(params: ArmParams) -> Result<Self, ArmError> {
        params.validate()?;

        Ok(Self {
            current_deg: params.start_pos_deg,
            target_deg: params.start_pos_deg,
            pos_limited: [false; NUM_JOINTS],
            params,
        })
    }

    /// Set the target position of a joint.
    ///
    /// Targets outside the joint's limits are clamped and flagged in the status report. Returns
    /// the target actually set.
    pub fn set_target(&mut self, joint: Joint, target_deg: f64) -> Result<f64, ArmError> {
        if !target_deg.is_finite() {
            return Err(ArmError::NonFiniteTarget(joint, target_deg));
        }

        let i = joint.index();
        let (target, limited) = maths::clamp(
            target_deg,
            self.params.min_pos_deg[i],
            self.params.max_pos_deg[i],
        );

        if limited {
            debug!(
                "{} target {:.1} deg clamped to {:.1} deg",
                joint, target_deg, target
            );
        }

        self.target_deg[i] = target;
        self.pos_limited[i] = limited;

        Ok(target)
    }

    /// Stop a joint where it currently is.
    pub fn hold(&mut self, joint: Joint) {
        let i = joint.index();
        self.target_deg[i] = self.current_deg[i];
        self.pos_limited[i] = false;
    }

    /// Current position of a joint in degrees.
    pub fn angle(&self, joint: Joint) -> f64 {
        self.current_deg[joint.index()]
    }

    /// Target position of a joint in degrees.
    pub fn target(&self, joint: Joint) -> f64 {
        self.target_deg[joint.index()]
    }

    /// Returns true if the joint has converged on its target.
    pub fn at_target(&self, joint: Joint) -> bool {
        self.is_near(joint, self.target(joint))
    }

    /// Returns true if the joint is within its tolerance of the given angle.
    pub fn is_near(&self, joint: Joint, angle_deg: f64) -> bool {
        let i = joint.index();
        maths::within_tolerance(
            self.current_deg[i],
            angle_deg,
            self.params.tolerance_deg[i],
        )
    }

    pub fn params(&self) -> &ArmParams {
        &self.params
    }

    pub fn get_tm(&self) -> ArmTm {
        ArmTm {
            current_deg: self.current_deg,
            target_deg: self.target_deg,
        }
    }
}
