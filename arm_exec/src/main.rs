//! Arm sequencing executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the arm and register the test commands with the dashboard
//!     - Invoke the requested command
//!     - Main loop:
//!         - Scheduler cycle (command ticks, retirement, admission)
//!         - Arm processing
//!         - Cycle management
//!     - Write the run summary to the session directory
//!
//! # Modules
//!
//! All hardware modules (e.g. `arm`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::{
    cell::RefCell,
    rc::Rc,
    thread,
    time::Instant,
};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm::{self, Arm},
    command::Command,
    dashboard::{register_test_commands, TestingDashboard},
    data_store::{DataStore, RunSummary},
    params::ArmExecParams,
    scheduler::Scheduler,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modules whose debug output is only wanted in verbose runs.
const QUIET_TARGETS: &[&str] = &["arm_lib::arm", "arm_lib::scheduler"];

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Runs an arm command from the testing dashboard")]
struct Opt {
    /// Name of the dashboard command to invoke
    #[structopt(default_value = "ConeHighPostCenter")]
    command: String,

    /// List the dashboard commands and exit
    #[structopt(short, long)]
    list: bool,

    /// Override the maximum number of cycles from the parameter file
    #[structopt(long)]
    max_cycles: Option<u64>,

    /// Log debug output from every module
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let quiet_targets: &[&'static str] = if opt.verbose { &[] } else { QUIET_TARGETS };
    logger_init(LevelFilter::Trace, quiet_targets, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Arm Sequencing Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;
    let max_cycles = opt.max_cycles.unwrap_or(exec_params.max_cycles);

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let mut arm = Arm::default();
    arm.init("arm.toml").wrap_err("Failed to initialise Arm")?;
    let arm = Rc::new(RefCell::new(arm));
    info!("Arm init complete");

    let mut scheduler = Scheduler::new(exec_params.scheduler.clone())
        .wrap_err("Failed to initialise the Scheduler")?;
    let cycle_period = scheduler.cycle_period();
    let cycle_frequency_hz = 1.0 / cycle_period.as_secs_f64();
    info!("Scheduler init complete");

    let mut dashboard = TestingDashboard::new(scheduler.handle());
    register_test_commands(&mut dashboard, &arm)
        .wrap_err("Failed to register the test commands")?;

    info!("Module initialisation complete\n");

    if opt.list {
        for entry in dashboard.entries() {
            info!("{}/{}/{}", entry.subsystem, entry.category, entry.name);
        }
        return Ok(());
    }

    // ---- INVOKE COMMAND ----

    let timeout = exec_params
        .command_timeout()
        .wrap_err("Invalid exec params")?;

    let cmd = match timeout {
        Some(t) => dashboard.invoke_with_timeout(&opt.command, t),
        None => dashboard.invoke(&opt.command),
    }
    .wrap_err_with(|| format!("Failed to invoke {}", opt.command))?;

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need clearing at the start of a cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- SCHEDULER PROCESSING ----

        scheduler.run_cycle();

        // ---- ARM PROCESSING ----

        match arm.borrow_mut().proc(&arm::InputData {
            period_s: cycle_period.as_secs_f64(),
        }) {
            Ok((output, status_rpt)) => {
                ds.arm_output = output;
                ds.arm_status_rpt = status_rpt;
            }
            Err(e) => warn!("Error during Arm processing: {}", e),
        }

        if ds.is_1_hz_cycle {
            debug!("Arm: {:?}", arm.borrow().get_tm());
        }

        if scheduler.is_idle() {
            info!("No commands running");
            break;
        }

        if scheduler.num_cycles() >= max_cycles {
            warn!("Reached the cycle limit ({}), cancelling all commands", max_cycles);
            scheduler.cancel_all();
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        let overran = match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                thread::sleep(d);
                false
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                true
            }
        };

        ds.cycle_end(overran);
    }

    // ---- SHUTDOWN ----

    let summary = {
        let c = cmd.borrow();
        RunSummary {
            command: opt.command.clone(),
            finished: c.is_finished(),
            status: c.status(),
            num_cycles: scheduler.num_cycles(),
            max_consec_cycle_overruns: ds.max_consec_cycle_overruns,
            arm: arm.borrow().get_tm(),
            scheduler: scheduler.get_tm(),
        }
    };

    match session.save_json("run_summary.json", &summary) {
        Ok(path) => info!("Run summary written to {:?}", path),
        Err(e) => warn!("Could not write the run summary: {}", e),
    }

    info!("End of execution");

    if summary.finished {
        Ok(())
    } else {
        Err(eyre!(
            "{} did not finish, last status: {}",
            summary.command,
            summary.status.as_deref().unwrap_or("none")
        ))
    }
}
