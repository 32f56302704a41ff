//! # Testing dashboard
//!
//! Registry of commands which can be started and stopped by hand, grouped by the subsystem they
//! act on and a category label.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use crate::{
    arm::{Arm, ARM_SUBSYSTEM},
    command::{CommandRef, SubsystemId},
    motion::{ArmMove, ElbowMove},
    presets::{
        CONE_HIGH_POST_CENTER, CONE_HIGH_POST_CENTER_ELBOW_CLEARANCE_DEG, TEST_COMMANDS_CATEGORY,
    },
    scheduler::{SchedulerError, SchedulerHandle},
    sequence::ConeHighPostCenter,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Dashboard of manually invocable commands.
pub struct TestingDashboard {
    scheduler: SchedulerHandle,

    /// Registered commands, keyed by display name.
    commands: BTreeMap<String, Registered>,
}

/// A row of the dashboard, as displayed to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEntry {
    pub subsystem: SubsystemId,
    pub category: String,
    pub name: String,
}

struct Registered {
    subsystem: SubsystemId,
    category: String,
    cmd: CommandRef,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur when using the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("A command named \"{0}\" is already registered")]
    DuplicateCommand(String),

    #[error("No command named \"{0}\" is registered")]
    UnknownCommand(String),

    #[error("Cannot schedule the command: {0}")]
    SchedulerError(SchedulerError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TestingDashboard {
    pub fn new(scheduler: SchedulerHandle) -> Self {
        Self {
            scheduler,
            commands: BTreeMap::new(),
        }
    }

    /// Handle to the scheduler used to invoke commands.
    pub fn scheduler(&self) -> SchedulerHandle {
        self.scheduler.clone()
    }

    /// Add a command under the given subsystem and category. Display names must be unique.
    pub fn register_command(
        &mut self,
        subsystem: SubsystemId,
        category: &str,
        name: &str,
        cmd: CommandRef,
    ) -> Result<(), DashboardError> {
        if self.commands.contains_key(name) {
            return Err(DashboardError::DuplicateCommand(name.to_string()));
        }

        self.commands.insert(
            name.to_string(),
            Registered {
                subsystem,
                category: category.to_string(),
                cmd,
            },
        );

        info!("Registered {}/{}/{}", subsystem, category, name);

        Ok(())
    }

    /// Schedule the named command, returning its handle.
    pub fn invoke(&self, name: &str) -> Result<CommandRef, DashboardError> {
        let cmd = self.get(name)?;
        info!("Dashboard invoking {}", name);
        self.scheduler.schedule(cmd.clone());
        Ok(cmd)
    }

    /// Schedule the named command, interrupting it if it hasn't finished within `timeout`.
    pub fn invoke_with_timeout(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<CommandRef, DashboardError> {
        let cmd = self.get(name)?;
        info!("Dashboard invoking {} with a {:?} timeout", name, timeout);
        self.scheduler
            .schedule_with_timeout(cmd.clone(), timeout)
            .map_err(DashboardError::SchedulerError)?;
        Ok(cmd)
    }

    /// Request the named command is cancelled.
    pub fn cancel(&self, name: &str) -> Result<(), DashboardError> {
        let cmd = self.get(name)?;
        info!("Dashboard cancelling {}", name);
        self.scheduler.cancel(cmd);
        Ok(())
    }

    /// Get the handle of the named command.
    pub fn get(&self, name: &str) -> Result<CommandRef, DashboardError> {
        self.commands
            .get(name)
            .map(|r| r.cmd.clone())
            .ok_or_else(|| DashboardError::UnknownCommand(name.to_string()))
    }

    /// All registered commands, ordered by subsystem, category, then name.
    pub fn entries(&self) -> Vec<DashboardEntry> {
        let mut entries: Vec<DashboardEntry> = self
            .commands
            .iter()
            .map(|(name, r)| DashboardEntry {
                subsystem: r.subsystem,
                category: r.category.clone(),
                name: name.clone(),
            })
            .collect();

        entries.sort_by(|a, b| {
            (a.subsystem, &a.category, &a.name).cmp(&(b.subsystem, &b.category, &b.name))
        });

        entries
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Register every manually testable arm command. Called once at startup.
pub fn register_test_commands(
    dashboard: &mut TestingDashboard,
    arm: &Rc<RefCell<Arm>>,
) -> Result<(), DashboardError> {
    ConeHighPostCenter::register_with_testing_dashboard(dashboard, arm)?;

    dashboard.register_command(
        ARM_SUBSYSTEM,
        TEST_COMMANDS_CATEGORY,
        "ElbowExtendClearance",
        Rc::new(RefCell::new(ElbowMove::new(
            arm.clone(),
            CONE_HIGH_POST_CENTER_ELBOW_CLEARANCE_DEG,
        ))),
    )?;

    dashboard.register_command(
        ARM_SUBSYSTEM,
        TEST_COMMANDS_CATEGORY,
        "ArmToConeHighPostCenter",
        Rc::new(RefCell::new(ArmMove::new(arm.clone(), CONE_HIGH_POST_CENTER))),
    )?;

    Ok(())
}
