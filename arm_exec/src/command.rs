//! # Command interface
//!
//! Commands are the unit of work ticked by the [`Scheduler`](crate::scheduler::Scheduler). Each
//! command goes through the same lifecycle on every activation:
//!
//! - `initialize` once when the scheduler admits it,
//! - `tick` once per cycle while it is running,
//! - `end` once, with `interrupted = false` if it retired because `is_finished` returned true, or
//!   `interrupted = true` if it was cancelled, timed out, or displaced by another command needing
//!   the same subsystem.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use std::{cell::RefCell, fmt::Display, rc::Rc};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Shared handle to a command, as held by the scheduler and the testing dashboard.
pub type CommandRef = Rc<RefCell<dyn Command>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Opaque identity of a piece of hardware.
///
/// Used by the scheduler for mutual exclusion between commands and by the dashboard as a category
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubsystemId(pub &'static str);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The callback surface the scheduler drives.
pub trait Command {
    /// Human readable name, used in logs and on the dashboard.
    fn name(&self) -> &str;

    /// Subsystems this command needs exclusive use of while running.
    fn requirements(&self) -> &[SubsystemId] {
        &[]
    }

    /// Called when the command is admitted by the scheduler.
    fn initialize(&mut self);

    /// Called once per scheduler cycle while the command is running. Must not block.
    fn tick(&mut self);

    /// Called once when the command stops running.
    fn end(&mut self, interrupted: bool);

    /// Returns true when the command has completed.
    fn is_finished(&self) -> bool;

    /// Short description of the command's progress, for telemetry.
    fn status(&self) -> Option<String> {
        None
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns true if both handles point at the same command instance.
pub fn same_command(a: &CommandRef, b: &CommandRef) -> bool {
    // Data addresses only, vtable pointers are not unique
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Returns true if the two requirement sets share at least one subsystem.
pub fn requirements_overlap(a: &[SubsystemId], b: &[SubsystemId]) -> bool {
    a.iter().any(|s| b.contains(s))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Display for SubsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Nop;

    impl Command for Nop {
        fn name(&self) -> &str {
            "Nop"
        }
        fn initialize(&mut self) {}
        fn tick(&mut self) {}
        fn end(&mut self, _interrupted: bool) {}
        fn is_finished(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_same_command() {
        let a: CommandRef = Rc::new(RefCell::new(Nop));
        let b: CommandRef = Rc::new(RefCell::new(Nop));
        let a2 = a.clone();

        assert!(same_command(&a, &a2));
        assert!(!same_command(&a, &b));
    }

    #[test]
    fn test_requirements_overlap() {
        const ARM: SubsystemId = SubsystemId("Arm");
        const DRIVE: SubsystemId = SubsystemId("Drive");

        assert!(requirements_overlap(&[ARM], &[DRIVE, ARM]));
        assert!(!requirements_overlap(&[ARM], &[DRIVE]));
        assert!(!requirements_overlap(&[], &[ARM]));
        assert!(Nop.requirements().is_empty());
    }
}
