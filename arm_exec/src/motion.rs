//! # Arm motion primitives
//!
//! Commands which drive one or more arm joints to fixed angles and finish once the joints have
//! converged, plus [`MotionHandle`], which lets a composite command issue them as children.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::{cell::RefCell, rc::Rc};

use crate::{
    arm::{Arm, Joint, ARM_SUBSYSTEM},
    command::{Command, CommandRef, SubsystemId},
    presets::PosePreset,
    scheduler::SchedulerHandle,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const ARM_REQUIREMENTS: &[SubsystemId] = &[ARM_SUBSYSTEM];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A child motion as seen by a composite command.
pub trait ChildMotion {
    /// Name of the motion, for logging.
    fn name(&self) -> String;

    /// Issue the motion to the scheduler. Callers must issue at most once per activation.
    fn schedule(&mut self);

    /// Returns true once the motion has converged.
    fn is_finished(&self) -> bool;

    /// Withdraw the motion from the scheduler. Has no effect if it isn't running.
    fn cancel(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Extend the elbow to a fixed angle, leaving the other joints alone.
///
/// Finished once the elbow is within tolerance of the angle this move demanded, whatever target
/// the arm holds by then.
pub struct ElbowMove {
    arm: Rc<RefCell<Arm>>,
    target_deg: f64,

    /// Clamped elbow target set by the current activation, none before the first demand.
    demanded_deg: Option<f64>,
}

/// Drive the shoulder and elbow to a preset pose.
///
/// The preset's turret angle is carried but not driven, the turret keeps whatever position it has.
pub struct ArmMove {
    arm: Rc<RefCell<Arm>>,
    pose: PosePreset,

    /// Clamped (shoulder, elbow) targets set by the current activation.
    demanded_deg: Option<(f64, f64)>,
}

/// Owned handle to a motion command, issued through the scheduler.
pub struct MotionHandle<C: Command + 'static> {
    cmd: Rc<RefCell<C>>,
    scheduler: SchedulerHandle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ElbowMove {
    pub fn new(arm: Rc<RefCell<Arm>>, target_deg: f64) -> Self {
        Self {
            arm,
            target_deg,
            demanded_deg: None,
        }
    }

    pub fn target_deg(&self) -> f64 {
        self.target_deg
    }

    fn demand(&mut self) {
        let mut arm = self.arm.borrow_mut();
        match arm.set_target(Joint::Elbow, self.target_deg) {
            Ok(t) => self.demanded_deg = Some(t),
            Err(e) => {
                warn!("ElbowMove cannot set elbow target: {}", e);
                arm.hold(Joint::Elbow);
                self.demanded_deg = None;
            }
        }
    }
}

impl Command for ElbowMove {
    fn name(&self) -> &str {
        "ElbowMove"
    }

    fn requirements(&self) -> &[SubsystemId] {
        ARM_REQUIREMENTS
    }

    fn initialize(&mut self) {
        self.demanded_deg = None;
        self.demand();
    }

    fn tick(&mut self) {
        self.demand();
    }

    fn end(&mut self, interrupted: bool) {
        if interrupted {
            self.arm.borrow_mut().hold(Joint::Elbow);
        }
    }

    fn is_finished(&self) -> bool {
        match self.demanded_deg {
            Some(t) => self.arm.borrow().is_near(Joint::Elbow, t),
            None => false,
        }
    }
}

impl ArmMove {
    pub fn new(arm: Rc<RefCell<Arm>>, pose: PosePreset) -> Self {
        Self {
            arm,
            pose,
            demanded_deg: None,
        }
    }

    pub fn pose(&self) -> &PosePreset {
        &self.pose
    }

    /// Turret angle of the preset. Not driven by this command.
    pub fn turret_deg(&self) -> f64 {
        self.pose.turret_deg
    }

    fn demand(&mut self) {
        let mut arm = self.arm.borrow_mut();

        let shoulder = arm.set_target(Joint::Shoulder, self.pose.shoulder_deg);
        let elbow = arm.set_target(Joint::Elbow, self.pose.elbow_deg);

        self.demanded_deg = match (shoulder, elbow) {
            (Ok(s), Ok(e)) => Some((s, e)),
            (shoulder, elbow) => {
                for (joint, result) in [(Joint::Shoulder, shoulder), (Joint::Elbow, elbow)].iter() {
                    if let Err(e) = result {
                        warn!("ArmMove cannot set {} target: {}", joint, e);
                    }
                }
                arm.hold(Joint::Shoulder);
                arm.hold(Joint::Elbow);
                None
            }
        };
    }
}

impl Command for ArmMove {
    fn name(&self) -> &str {
        "ArmMove"
    }

    fn requirements(&self) -> &[SubsystemId] {
        ARM_REQUIREMENTS
    }

    fn initialize(&mut self) {
        self.demanded_deg = None;
        self.demand();
    }

    fn tick(&mut self) {
        self.demand();
    }

    fn end(&mut self, interrupted: bool) {
        if interrupted {
            let mut arm = self.arm.borrow_mut();
            arm.hold(Joint::Shoulder);
            arm.hold(Joint::Elbow);
        }
    }

    fn is_finished(&self) -> bool {
        match self.demanded_deg {
            Some((shoulder, elbow)) => {
                let arm = self.arm.borrow();
                arm.is_near(Joint::Shoulder, shoulder) && arm.is_near(Joint::Elbow, elbow)
            }
            None => false,
        }
    }
}

impl<C: Command + 'static> MotionHandle<C> {
    pub fn new(cmd: C, scheduler: SchedulerHandle) -> Self {
        Self {
            cmd: Rc::new(RefCell::new(cmd)),
            scheduler,
        }
    }

    /// The underlying command.
    pub fn command(&self) -> &Rc<RefCell<C>> {
        &self.cmd
    }

    fn command_ref(&self) -> CommandRef {
        self.cmd.clone()
    }
}

impl<C: Command + 'static> ChildMotion for MotionHandle<C> {
    fn name(&self) -> String {
        self.cmd.borrow().name().to_string()
    }

    fn schedule(&mut self) {
        self.scheduler.schedule(self.command_ref());
    }

    fn is_finished(&self) -> bool {
        self.cmd.borrow().is_finished()
    }

    fn cancel(&mut self) {
        self.scheduler.cancel(self.command_ref());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        arm::{ArmParams, InputData},
        scheduler::{Scheduler, SchedulerParams},
    };
    use util::module::State;

    fn arm() -> Rc<RefCell<Arm>> {
        Rc::new(RefCell::new(
            Arm::new(ArmParams {
                max_rate_degs: [50.0, 50.0, 50.0],
                min_pos_deg: [-30.0, -160.0, -180.0],
                max_pos_deg: [110.0, 10.0, 180.0],
                tolerance_deg: [0.5, 0.5, 0.5],
                start_pos_deg: [0.0, 0.0, 0.0],
            })
            .unwrap(),
        ))
    }

    /// Run scheduler and arm for `n` cycles of 0.1 s.
    fn run(sched: &mut Scheduler, arm: &Rc<RefCell<Arm>>, n: usize) {
        for _ in 0..n {
            sched.run_cycle();
            arm.borrow_mut()
                .proc(&InputData { period_s: 0.1 })
                .unwrap();
        }
    }

    #[test]
    fn test_elbow_move_converges() {
        let arm = arm();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let mut elbow = MotionHandle::new(ElbowMove::new(arm.clone(), -20.0), sched.handle());

        // Nothing demanded yet, even though the arm is at rest on its target
        assert!(!elbow.is_finished());
        elbow.schedule();

        // Admission sets the target
        run(&mut sched, &arm, 1);
        assert!(!elbow.is_finished());
        assert_eq!(arm.borrow().target(Joint::Elbow), -20.0);

        // 5 deg per cycle, converged but not retired until the next tick
        run(&mut sched, &arm, 3);
        assert!(elbow.is_finished());
        assert!(!sched.is_idle());
        run(&mut sched, &arm, 1);
        assert!(sched.is_idle());
        assert_eq!(arm.borrow().angle(Joint::Elbow), -20.0);
        assert_eq!(arm.borrow().angle(Joint::Shoulder), 0.0);
    }

    #[test]
    fn test_arm_move_leaves_turret() {
        let arm = arm();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let pose = PosePreset {
            shoulder_deg: 10.0,
            elbow_deg: -15.0,
            turret_deg: -144.0,
        };
        let mut arm_move = MotionHandle::new(ArmMove::new(arm.clone(), pose), sched.handle());

        assert_eq!(arm_move.command().borrow().turret_deg(), -144.0);

        arm_move.schedule();
        run(&mut sched, &arm, 10);

        assert!(arm_move.is_finished());
        assert!(sched.is_idle());
        assert_eq!(arm.borrow().angle(Joint::Shoulder), 10.0);
        assert_eq!(arm.borrow().angle(Joint::Elbow), -15.0);
        assert_eq!(arm.borrow().angle(Joint::Turret), 0.0);
    }

    #[test]
    fn test_cancel_holds_joint() {
        let arm = arm();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let mut elbow = MotionHandle::new(ElbowMove::new(arm.clone(), -100.0), sched.handle());

        elbow.schedule();
        run(&mut sched, &arm, 3);
        elbow.cancel();
        run(&mut sched, &arm, 1);

        // Stopped where it was when the cancel was applied
        assert!(sched.is_idle());
        assert_eq!(arm.borrow().angle(Joint::Elbow), -15.0);
        assert_eq!(arm.borrow().target(Joint::Elbow), -15.0);
        assert_eq!(elbow.name(), "ElbowMove");
    }

    #[test]
    fn test_displaced_move_not_finished() {
        let arm = arm();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let mut elbow = MotionHandle::new(ElbowMove::new(arm.clone(), -100.0), sched.handle());
        let mut other = MotionHandle::new(ElbowMove::new(arm.clone(), -10.0), sched.handle());

        elbow.schedule();
        run(&mut sched, &arm, 2);
        other.schedule();
        run(&mut sched, &arm, 10);

        // The other move converged on its own target, the displaced one never got to -100
        assert!(sched.is_idle());
        assert!(other.is_finished());
        assert_eq!(arm.borrow().angle(Joint::Elbow), -10.0);
        assert!(!elbow.is_finished());
    }

    #[test]
    fn test_clamped_target_finishes() {
        let arm = arm();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let mut elbow = MotionHandle::new(ElbowMove::new(arm.clone(), 40.0), sched.handle());

        // Limit is +10, the move is done once it gets there
        elbow.schedule();
        run(&mut sched, &arm, 3);
        assert!(elbow.is_finished());
        assert_eq!(arm.borrow().angle(Joint::Elbow), 10.0);
    }
}
