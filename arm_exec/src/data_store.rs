//! # Data Store

use serde::Serialize;

use crate::{
    arm::{self, ArmTm},
    scheduler::SchedulerTm,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Arm
    pub arm_output: [f64; arm::NUM_JOINTS],
    pub arm_status_rpt: arm::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Largest number of consecutive cycle overruns seen this run
    pub max_consec_cycle_overruns: u64,
}

/// Summary of a run, written to the session directory at shutdown.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Name of the invoked command
    pub command: String,

    /// True if the command reported finished
    pub finished: bool,

    /// Last status reported by the command, if it reports one
    pub status: Option<String>,

    pub num_cycles: u64,

    pub max_consec_cycle_overruns: u64,

    pub arm: ArmTm,

    pub scheduler: SchedulerTm,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_second = (cycle_frequency_hz.round() as u64).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.arm_status_rpt = arm::StatusReport::default();
    }

    /// Record the outcome of a cycle's timing.
    pub fn cycle_end(&mut self, overran: bool) {
        if overran {
            self.num_consec_cycle_overruns += 1;
            self.max_consec_cycle_overruns = self
                .max_consec_cycle_overruns
                .max(self.num_consec_cycle_overruns);
        } else {
            self.num_consec_cycle_overruns = 0;
        }

        self.num_cycles += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_1_hz_flag() {
        let mut ds = DataStore::default();
        let mut flags = Vec::new();

        for _ in 0..101 {
            ds.cycle_start(50.0);
            flags.push(ds.is_1_hz_cycle);
            ds.cycle_end(false);
        }

        assert_eq!(flags.iter().filter(|f| **f).count(), 3);
        assert!(flags[0] && flags[50] && flags[100]);
    }

    #[test]
    fn test_overrun_counters() {
        let mut ds = DataStore::default();

        for overran in [true, true, false, true].iter() {
            ds.cycle_end(*overran);
        }

        assert_eq!(ds.num_consec_cycle_overruns, 1);
        assert_eq!(ds.max_consec_cycle_overruns, 2);
        assert_eq!(ds.num_cycles, 4);
    }
}
