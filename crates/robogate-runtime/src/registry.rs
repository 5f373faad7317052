// crates/robogate-runtime/src/registry.rs
// ============================================================================
// Module: Run Registry
// Description: Owns per-run control-loop tasks and their lifecycle status
//              (C7 `start_run`/`stop_run`/`auto_resume`).
// Purpose: Replace a global in-process task table with an explicit,
//          run_id-keyed registry (§9 "global task table → explicit registry").
// Dependencies: tokio, robogate-core
// ============================================================================

//! ## Overview
//! [`RunRegistry`] is the only place a run's [`Run`] row and its control-loop
//! [`tokio::task::JoinHandle`] are held together. The loop task itself never
//! references the registry, the hub, or the event log by anything but
//! `run_id` and the collaborators its caller hands it (§9 "cyclic
//! references... break with indirection by run_id"): the registry observes
//! completion from the outside via the future it spawned, not by the task
//! reaching back in.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use robogate_core::MissionId;
use robogate_core::MonotonicClock;
use robogate_core::Run;
use robogate_core::RunId;
use robogate_core::RunStatus;
use tokio::task::JoinHandle;

use crate::control_loop::LoopOutcome;
use crate::errors::RunServiceError;

/// A caller-facing reference to an active run's control-loop task.
///
/// Cloning is cheap; every clone shares the same stop flag, so any of them
/// can request a stop.
#[derive(Clone)]
pub struct RunHandle {
    run_id: RunId,
    stop_flag: Arc<AtomicBool>,
}

impl RunHandle {
    /// The run this handle belongs to.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Requests that the control loop stop at its next suspension point.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested (mirrors what the loop itself observes).
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

struct Entry {
    run: Run,
    stop_flag: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Entry {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Run_id-keyed registry of control-loop tasks (§4.7, §9).
///
/// Holds the only copy of each [`Run`] row this process knows about: a
/// minimal in-memory record sufficient to answer lifecycle queries, not a
/// persistent or multi-tenant run store (that scope is explicitly out, per
/// the spec's mission/audit-trail CRUD non-goal).
pub struct RunRegistry {
    entries: Mutex<HashMap<RunId, Entry>>,
    clock: MonotonicClock,
}

impl RunRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock: MonotonicClock::new() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RunId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new run: creates its row in `running` status and spawns its
    /// control-loop task.
    ///
    /// `make_loop` is handed the run id and a fresh stop flag, and must
    /// return the future driving that run's ticks; this registry does not
    /// know how to build that future itself (it depends on the sim, store,
    /// hub, and config collaborators, which belong to the caller).
    ///
    /// # Errors
    ///
    /// Returns [`RunServiceError::AlreadyRunning`] if `run_id` already has an
    /// active task.
    pub fn start_run<F, Fut>(
        self: &Arc<Self>,
        mission_id: MissionId,
        run_id: RunId,
        make_loop: F,
    ) -> Result<RunHandle, RunServiceError>
    where
        F: FnOnce(RunId, Arc<AtomicBool>) -> Fut,
        Fut: Future<Output = LoopOutcome> + Send + 'static,
    {
        let mut entries = self.lock();
        if entries.get(&run_id).is_some_and(Entry::is_active) {
            return Err(RunServiceError::AlreadyRunning { run_id });
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let run = Run::start(run_id.clone(), mission_id, self.clock.now());
        let handle = RunHandle { run_id: run_id.clone(), stop_flag: Arc::clone(&stop_flag) };

        let registry = Arc::clone(self);
        let finishing_run_id = run_id.clone();
        let loop_future = make_loop(run_id.clone(), Arc::clone(&stop_flag));
        let task = tokio::spawn(async move {
            let outcome = loop_future.await;
            registry.finish(&finishing_run_id, outcome);
        });

        entries.insert(run_id, Entry { run, stop_flag, task });
        Ok(handle)
    }

    /// Requests a stop for an active run.
    ///
    /// # Errors
    ///
    /// Returns [`RunServiceError::UnknownRun`] if no task is registered for
    /// `run_id`.
    pub fn stop_run(&self, run_id: &RunId) -> Result<(), RunServiceError> {
        let entries = self.lock();
        let entry = entries.get(run_id).ok_or_else(|| RunServiceError::UnknownRun { run_id: run_id.clone() })?;
        entry.stop_flag.store(true, Ordering::Release);
        Ok(())
    }

    /// Re-spawns control-loop tasks for every row in `running_rows` that has
    /// no active task in this registry (§4.7 "process restart auto-resumes
    /// any row in running status whose loop task is absent").
    pub fn auto_resume<F, Fut>(self: &Arc<Self>, running_rows: &[Run], mut make_loop: F)
    where
        F: FnMut(&Run, Arc<AtomicBool>) -> Fut,
        Fut: Future<Output = LoopOutcome> + Send + 'static,
    {
        for run in running_rows {
            if self.lock().get(&run.id).is_some_and(Entry::is_active) {
                continue;
            }
            let stop_flag = Arc::new(AtomicBool::new(false));
            let registry = Arc::clone(self);
            let finishing_run_id = run.id.clone();
            let loop_future = make_loop(run, Arc::clone(&stop_flag));
            let task = tokio::spawn(async move {
                let outcome = loop_future.await;
                registry.finish(&finishing_run_id, outcome);
            });
            self.lock().insert(run.id.clone(), Entry { run: run.clone(), stop_flag, task });
        }
    }

    fn finish(&self, run_id: &RunId, outcome: LoopOutcome) {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(run_id) {
            let next = match outcome {
                LoopOutcome::Stopped => RunStatus::Stopped,
                LoopOutcome::Completed => RunStatus::Completed,
                LoopOutcome::Failed => RunStatus::Failed,
            };
            entry.run.transition_to(next, self.clock.now());
        }
    }

    /// Returns a snapshot of `run_id`'s row.
    ///
    /// # Errors
    ///
    /// Returns [`RunServiceError::UnknownRun`] if this registry has never
    /// seen `run_id`.
    pub fn get(&self, run_id: &RunId) -> Result<Run, RunServiceError> {
        self.lock().get(run_id).map(|entry| entry.run.clone()).ok_or_else(|| RunServiceError::UnknownRun {
            run_id: run_id.clone(),
        })
    }

    /// Lists every run row this registry currently knows about.
    #[must_use]
    pub fn list(&self) -> Vec<Run> {
        self.lock().values().map(|entry| entry.run.clone()).collect()
    }

    /// Drops bookkeeping for tasks that have finished and reached a
    /// terminal status, freeing their `JoinHandle`s (§9 "explicit registry").
    pub fn reap(&self) {
        self.lock().retain(|_, entry| !(entry.task.is_finished() && entry.run.status.is_terminal()));
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}
