use log::{debug, error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Whether periodic ticking is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

enum SchedulerCommand {
    /// The shared interval changed; recompute the next deadline.
    Reschedule,
    Stop,
}

struct Worker {
    commands: Sender<SchedulerCommand>,
    handle: JoinHandle<()>,
}

/// Fixed-rate timer that runs a tick callback on its own thread.
///
/// The first tick fires immediately on `start`, then one per interval. The
/// interval is read from a shared atomic before each wait, so a change takes
/// effect from the next firing. Stopping never interrupts a running tick.
pub struct Scheduler {
    worker: Option<Worker>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { worker: None }
    }

    pub fn run_state(&self) -> RunState {
        match &self.worker {
            Some(worker) if !worker.handle.is_finished() => RunState::Running,
            _ => RunState::Idle,
        }
    }

    /// Starts periodic ticking. Returns `false` if a series is already running.
    pub fn start<F>(&mut self, interval_ms: Arc<AtomicU64>, tick: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        if self.run_state() == RunState::Running {
            debug!("Scheduler already running; ignoring start.");
            return false;
        }
        // Reap a worker that exited on its own.
        self.reap();

        let (commands, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("wireworld-scheduler".to_string())
            .spawn(move || run_worker(interval_ms, receiver, tick));

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { commands, handle });
                info!("Simulation run started.");
                true
            }
            Err(e) => {
                error!("Failed to spawn scheduler thread: {}", e);
                false
            }
        }
    }

    /// Wakes the worker so it picks up a changed interval.
    pub fn reschedule(&self) {
        if let Some(worker) = &self.worker {
            // A send error means the worker already exited; nothing to reschedule.
            let _ = worker.commands.send(SchedulerCommand::Reschedule);
        }
    }

    /// Cancels future ticks and waits for the worker to exit.
    /// Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        let _ = worker.commands.send(SchedulerCommand::Stop);
        if worker.handle.join().is_err() {
            error!("Scheduler thread panicked.");
        }
        info!("Simulation run stopped.");
        true
    }

    fn reap(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.handle.join().is_err() {
                error!("Scheduler thread panicked.");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<F>(interval_ms: Arc<AtomicU64>, commands: mpsc::Receiver<SchedulerCommand>, mut tick: F)
where
    F: FnMut(),
{
    let mut last_fire = Instant::now();
    tick();

    loop {
        let period = Duration::from_millis(interval_ms.load(Ordering::Relaxed));
        let deadline = last_fire + period;
        let timeout = deadline.saturating_duration_since(Instant::now());

        match commands.recv_timeout(timeout) {
            Ok(SchedulerCommand::Reschedule) => {
                debug!("Scheduler interval now {:?}.", Duration::from_millis(interval_ms.load(Ordering::Relaxed)));
            }
            Ok(SchedulerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                // Fixed rate, but do not burst to catch up after a long stall.
                last_fire = if now.duration_since(deadline) > period { now } else { deadline };
                tick();
            }
        }
    }
}
