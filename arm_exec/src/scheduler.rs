//! # Command scheduler
//!
//! The [`Scheduler`] owns the list of running commands and ticks each of them once per cycle.
//! Commands (and anything else holding a [`SchedulerHandle`]) never touch the running list
//! directly. Schedule and cancel requests are queued on the handle and applied by the scheduler at
//! the end of the cycle in the order they were made, so a command scheduled from inside another
//! command's `tick` is initialised at the end of that cycle and first ticked on the next one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::command::{requirements_overlap, same_command, CommandRef, SubsystemId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerParams {
    /// Period of one scheduler cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,
}

/// Cloneable handle used to make requests of the scheduler.
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    requests: Rc<RefCell<Vec<Request>>>,
}

/// Periodic command scheduler.
pub struct Scheduler {
    params: SchedulerParams,

    cycle_period: Duration,

    handle: SchedulerHandle,

    running: Vec<Running>,

    /// Number of cycles already executed
    num_cycles: u64,
}

/// Telemetry summarising the scheduler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerTm {
    pub num_cycles: u64,
    pub running: Vec<String>,
}

/// A command admitted by the scheduler.
struct Running {
    cmd: CommandRef,
    name: String,
    requirements: Vec<SubsystemId>,
    admitted_cycle: u64,
    timeout_cycles: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("The cycle period must be positive and finite, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("A command timeout must be positive, found {0:?}")]
    InvalidTimeout(Duration),
}

enum Request {
    Schedule {
        cmd: CommandRef,
        timeout: Option<Duration>,
    },
    Cancel(CommandRef),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.02,
        }
    }
}

impl SchedulerHandle {
    /// Request that the command is started at the end of the current cycle.
    pub fn schedule(&self, cmd: CommandRef) {
        self.requests
            .borrow_mut()
            .push(Request::Schedule { cmd, timeout: None });
    }

    /// Request that the command is started, and interrupted if it hasn't finished within
    /// `timeout`.
    pub fn schedule_with_timeout(
        &self,
        cmd: CommandRef,
        timeout: Duration,
    ) -> Result<(), SchedulerError> {
        if timeout == Duration::from_secs(0) {
            return Err(SchedulerError::InvalidTimeout(timeout));
        }

        self.requests.borrow_mut().push(Request::Schedule {
            cmd,
            timeout: Some(timeout),
        });

        Ok(())
    }

    /// Request that the command is interrupted at the end of the current cycle. Has no effect if
    /// the command isn't running by then.
    pub fn cancel(&self, cmd: CommandRef) {
        self.requests.borrow_mut().push(Request::Cancel(cmd));
    }

    fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    fn has_requests(&self) -> bool {
        !self.requests.borrow().is_empty()
    }
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Result<Self, SchedulerError> {
        if !(params.cycle_period_s > 0.0) {
            return Err(SchedulerError::InvalidCyclePeriod(params.cycle_period_s));
        }
        let cycle_period = Duration::try_from_secs_f64(params.cycle_period_s)
            .map_err(|_| SchedulerError::InvalidCyclePeriod(params.cycle_period_s))?;

        Ok(Self {
            params,
            cycle_period,
            handle: SchedulerHandle::default(),
            running: Vec::new(),
            num_cycles: 0,
        })
    }

    /// Get a new handle to this scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Nominal period of one cycle.
    pub fn cycle_period(&self) -> Duration {
        self.cycle_period
    }

    /// Execute one scheduler cycle.
    ///
    /// 1. Tick every running command, in the order they were admitted.
    /// 2. Retire commands which report finished, or have run past their timeout.
    /// 3. Apply queued schedule and cancel requests.
    pub fn run_cycle(&mut self) {
        self.num_cycles += 1;

        let mut i = 0;
        while i < self.running.len() {
            let retire = {
                let entry = &self.running[i];
                let mut cmd = entry.cmd.borrow_mut();

                cmd.tick();
                let finished = cmd.is_finished();

                if finished {
                    Some(false)
                } else if entry.is_timed_out(self.num_cycles) {
                    warn!(
                        "{} timed out after {} cycles",
                        entry.name,
                        self.num_cycles - entry.admitted_cycle
                    );
                    Some(true)
                } else {
                    None
                }
            };

            match retire {
                Some(interrupted) => {
                    let entry = self.running.remove(i);
                    entry.cmd.borrow_mut().end(interrupted);
                    if !interrupted {
                        info!("{} finished", entry.name);
                    }
                }
                None => i += 1,
            }
        }

        for request in self.handle.take_requests() {
            match request {
                Request::Schedule { cmd, timeout } => self.admit(cmd, timeout),
                Request::Cancel(cmd) => {
                    self.cancel(&cmd);
                }
            }
        }
    }

    /// Immediately interrupt the given command. Returns false if it wasn't running.
    pub fn cancel(&mut self, cmd: &CommandRef) -> bool {
        match self.running.iter().position(|r| same_command(&r.cmd, cmd)) {
            Some(idx) => {
                let entry = self.running.remove(idx);
                entry.cmd.borrow_mut().end(true);
                info!("{} cancelled", entry.name);
                true
            }
            None => {
                debug!("Cancel requested for a command which isn't running");
                false
            }
        }
    }

    /// Interrupt every running command and drop any queued requests, including those made by the
    /// commands' own `end`.
    pub fn cancel_all(&mut self) {
        for entry in self.running.drain(..) {
            entry.cmd.borrow_mut().end(true);
            info!("{} cancelled", entry.name);
        }

        let dropped = self.handle.take_requests().len();
        if dropped > 0 {
            debug!("Dropped {} queued scheduler requests", dropped);
        }
    }

    /// Returns true if the command is currently running.
    pub fn is_scheduled(&self, cmd: &CommandRef) -> bool {
        self.running.iter().any(|r| same_command(&r.cmd, cmd))
    }

    pub fn num_running(&self) -> usize {
        self.running.len()
    }

    /// Returns true if there are no running commands and no queued requests.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && !self.handle.has_requests()
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn get_tm(&self) -> SchedulerTm {
        SchedulerTm {
            num_cycles: self.num_cycles,
            running: self.running.iter().map(|r| r.name.clone()).collect(),
        }
    }

    fn admit(&mut self, cmd: CommandRef, timeout: Option<Duration>) {
        if self.is_scheduled(&cmd) {
            debug!("{} is already running, schedule ignored", cmd.borrow().name());
            return;
        }

        let (name, requirements) = {
            let c = cmd.borrow();
            (c.name().to_string(), c.requirements().to_vec())
        };

        // Interrupt anything holding a subsystem the new command needs
        let mut i = 0;
        while i < self.running.len() {
            if requirements_overlap(&self.running[i].requirements, &requirements) {
                let entry = self.running.remove(i);
                entry.cmd.borrow_mut().end(true);
                info!("{} interrupted by {}", entry.name, name);
            } else {
                i += 1;
            }
        }

        let timeout_cycles = timeout.and_then(|t| {
            util::time::seconds_to_cycles(t.as_secs_f64(), self.params.cycle_period_s)
        });

        cmd.borrow_mut().initialize();
        info!("{} scheduled", name);

        self.running.push(Running {
            cmd,
            name,
            requirements,
            admitted_cycle: self.num_cycles,
            timeout_cycles,
        });
    }
}

impl Running {
    fn is_timed_out(&self, num_cycles: u64) -> bool {
        match self.timeout_cycles {
            Some(t) => num_cycles - self.admitted_cycle >= t,
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Command;

    const ARM: SubsystemId = SubsystemId("Arm");

    type Log = Rc<RefCell<Vec<String>>>;

    /// Command which finishes after a fixed number of ticks, logging every callback.
    struct Counted {
        name: &'static str,
        reqs: Vec<SubsystemId>,
        finish_after: Option<u32>,
        ticks: u32,
        log: Log,
    }

    impl Counted {
        fn new(
            name: &'static str,
            reqs: Vec<SubsystemId>,
            finish_after: Option<u32>,
            log: &Log,
        ) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                name,
                reqs,
                finish_after,
                ticks: 0,
                log: log.clone(),
            }))
        }
    }

    impl Command for Counted {
        fn name(&self) -> &str {
            self.name
        }
        fn requirements(&self) -> &[SubsystemId] {
            &self.reqs
        }
        fn initialize(&mut self) {
            self.ticks = 0;
            self.log.borrow_mut().push(format!("{}:init", self.name));
        }
        fn tick(&mut self) {
            self.ticks += 1;
            self.log.borrow_mut().push(format!("{}:tick", self.name));
        }
        fn end(&mut self, interrupted: bool) {
            self.log
                .borrow_mut()
                .push(format!("{}:end({})", self.name, interrupted));
        }
        fn is_finished(&self) -> bool {
            match self.finish_after {
                Some(n) => self.ticks >= n,
                None => false,
            }
        }
    }

    /// Command which schedules another command on its first tick.
    struct Spawner {
        child: CommandRef,
        handle: SchedulerHandle,
        spawned: bool,
    }

    impl Command for Spawner {
        fn name(&self) -> &str {
            "Spawner"
        }
        fn initialize(&mut self) {
            self.spawned = false;
        }
        fn tick(&mut self) {
            if !self.spawned {
                self.handle.schedule(self.child.clone());
                self.spawned = true;
            }
        }
        fn end(&mut self, _interrupted: bool) {}
        fn is_finished(&self) -> bool {
            false
        }
    }

    /// Command which withdraws its child when interrupted.
    struct Withdrawer {
        child: CommandRef,
        handle: SchedulerHandle,
    }

    impl Command for Withdrawer {
        fn name(&self) -> &str {
            "Withdrawer"
        }
        fn initialize(&mut self) {}
        fn tick(&mut self) {}
        fn end(&mut self, interrupted: bool) {
            if interrupted {
                self.handle.cancel(self.child.clone());
            }
        }
        fn is_finished(&self) -> bool {
            false
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_invalid_cycle_period() {
        assert!(matches!(
            Scheduler::new(SchedulerParams { cycle_period_s: 0.0 }),
            Err(SchedulerError::InvalidCyclePeriod(_))
        ));
        assert!(matches!(
            Scheduler::new(SchedulerParams {
                cycle_period_s: f64::NAN
            }),
            Err(SchedulerError::InvalidCyclePeriod(_))
        ));
        assert!(matches!(
            Scheduler::new(SchedulerParams { cycle_period_s: 1e30 }),
            Err(SchedulerError::InvalidCyclePeriod(_))
        ));
        assert_eq!(
            Scheduler::new(SchedulerParams::default()).unwrap().cycle_period(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_lifecycle() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let cmd = Counted::new("A", vec![], Some(2), &log);

        sched.handle().schedule(cmd.clone());
        assert!(!sched.is_idle());

        // Admitted at the end of the first cycle, without being ticked
        sched.run_cycle();
        assert_eq!(entries(&log), vec!["A:init"]);
        assert_eq!(sched.num_running(), 1);

        sched.run_cycle();
        sched.run_cycle();
        assert_eq!(
            entries(&log),
            vec!["A:init", "A:tick", "A:tick", "A:end(false)"]
        );
        assert!(sched.is_idle());
        assert_eq!(sched.num_cycles(), 3);
    }

    #[test]
    fn test_duplicate_schedule_ignored() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let cmd = Counted::new("A", vec![], None, &log);

        sched.handle().schedule(cmd.clone());
        sched.run_cycle();
        sched.handle().schedule(cmd.clone());
        sched.run_cycle();

        assert_eq!(entries(&log), vec!["A:init", "A:tick"]);
        assert_eq!(sched.num_running(), 1);
    }

    #[test]
    fn test_requirement_conflict_interrupts() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let a = Counted::new("A", vec![ARM], None, &log);
        let b = Counted::new("B", vec![ARM], None, &log);
        let a_ref: CommandRef = a.clone();
        let b_ref: CommandRef = b.clone();

        sched.handle().schedule(a_ref.clone());
        sched.run_cycle();
        sched.handle().schedule(b_ref.clone());
        sched.run_cycle();

        assert_eq!(
            entries(&log),
            vec!["A:init", "A:tick", "A:end(true)", "B:init"]
        );
        assert!(!sched.is_scheduled(&a_ref));
        assert!(sched.is_scheduled(&b_ref));
    }

    #[test]
    fn test_timeout() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams {
            cycle_period_s: 0.02,
        })
        .unwrap();
        let cmd = Counted::new("A", vec![], None, &log);

        sched
            .handle()
            .schedule_with_timeout(cmd.clone(), Duration::from_millis(60))
            .unwrap();

        for _ in 0..10 {
            sched.run_cycle();
        }

        assert_eq!(
            entries(&log),
            vec!["A:init", "A:tick", "A:tick", "A:tick", "A:end(true)"]
        );
        assert!(sched.is_idle());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let log = Log::default();
        let sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let cmd = Counted::new("A", vec![], None, &log);

        assert!(matches!(
            sched
                .handle()
                .schedule_with_timeout(cmd, Duration::from_secs(0)),
            Err(SchedulerError::InvalidTimeout(_))
        ));
        assert!(sched.is_idle());
    }

    #[test]
    fn test_cancel_request() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let cmd = Counted::new("A", vec![], None, &log);

        sched.handle().schedule(cmd.clone());
        sched.run_cycle();
        sched.handle().cancel(cmd.clone());
        sched.run_cycle();

        assert_eq!(entries(&log), vec!["A:init", "A:tick", "A:end(true)"]);

        // Cancelling something that isn't running does nothing
        let cmd_ref: CommandRef = cmd;
        assert!(!sched.cancel(&cmd_ref));
    }

    #[test]
    fn test_schedule_from_tick_admitted_same_cycle() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let child = Counted::new("C", vec![], None, &log);
        let spawner = Rc::new(RefCell::new(Spawner {
            child: child.clone(),
            handle: sched.handle(),
            spawned: false,
        }));

        sched.handle().schedule(spawner);
        sched.run_cycle();
        assert!(entries(&log).is_empty());

        // Spawner ticks and requests the child, which is initialised this cycle
        sched.run_cycle();
        assert_eq!(entries(&log), vec!["C:init"]);

        sched.run_cycle();
        assert_eq!(entries(&log), vec!["C:init", "C:tick"]);
        assert_eq!(sched.get_tm().running, vec!["Spawner", "C"]);
    }

    #[test]
    fn test_cancel_all() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let a = Counted::new("A", vec![], None, &log);
        let b = Counted::new("B", vec![], None, &log);

        sched.handle().schedule(a);
        sched.run_cycle();
        sched.handle().schedule(b);
        sched.cancel_all();

        assert_eq!(entries(&log), vec!["A:init", "A:end(true)"]);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_cancel_all_drops_requests_from_end() {
        let log = Log::default();
        let mut sched = Scheduler::new(SchedulerParams::default()).unwrap();
        let child = Counted::new("Child", vec![ARM], None, &log);
        let parent = Rc::new(RefCell::new(Withdrawer {
            child: child.clone(),
            handle: sched.handle(),
        }));

        sched.handle().schedule(parent.clone());
        sched.handle().schedule(child.clone());
        sched.run_cycle();
        assert_eq!(sched.num_running(), 2);

        sched.cancel_all();

        assert_eq!(sched.num_running(), 0);
        assert!(sched.is_idle());
        assert_eq!(entries(&log), vec!["Child:init", "Child:end(true)"]);

        // Nothing left over to apply on the next cycle
        sched.run_cycle();
        assert!(sched.is_idle());
        assert_eq!(entries(&log).len(), 2);
    }
}
