//! Detached simulation worker
//!
//! The worker thread owns the `SimulationState` outright and runs it on its
//! own fixed-interval clock. The presentation side talks to it with
//! `WorkerCommand`s and receives `WorkerSnapshot` copies; it never blocks on
//! the worker and never touches its state.
//!
//! Every `Init` opens a new generation. Snapshots are tagged with the
//! generation that produced them, and ones from an earlier run are dropped on
//! arrival so a restart never shows the previous car.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{RunnerConfig, SimulationRunner, Topology};
use crate::consts::SIM_DT;
use crate::sim::{CarInput, DisplaySnapshot, SimulationState, TrackConfig, step_simulation};

/// Clock debt beyond this many ticks is dropped instead of caught up
pub const MAX_CATCHUP_TICKS: u32 = 5;
/// Longest tick the worker clock accepts, seconds
pub const MAX_TICK_DT: f32 = 1.0;
/// Undrained snapshots held before new ones are dropped
const SNAPSHOT_BUFFER: usize = 1;

/// Presentation → worker
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Create a fresh simulation on this track
    Init {
        track: Arc<TrackConfig>,
        generation: u64,
    },
    /// Control input changed
    Input(CarInput),
    /// Replace the active track, keep the car where it is
    SetTrack(Arc<TrackConfig>),
    Shutdown,
}

/// Worker → presentation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSnapshot {
    /// `Init` this copy descends from
    pub generation: u64,
    /// Ticks simulated when the copy was taken
    pub tick: u64,
    pub snapshot: DisplaySnapshot,
}

pub struct WorkerRunner {
    commands: Sender<WorkerCommand>,
    snapshots: Receiver<WorkerSnapshot>,
    latest: Option<WorkerSnapshot>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
    alive: bool,
}

impl WorkerRunner {
    /// Start the worker thread. It idles until the first `Init`.
    pub fn spawn(config: RunnerConfig) -> io::Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (snapshot_tx, snapshot_rx) = mpsc::sync_channel(SNAPSHOT_BUFFER);

        let handle = thread::Builder::new()
            .name("drift-sim".into())
            .spawn(move || Worker::new(config).run(command_rx, snapshot_tx))?;

        Ok(Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            latest: None,
            generation: 0,
            handle: Some(handle),
            alive: true,
        })
    }

    /// Tick number of the newest snapshot received
    pub fn latest_tick(&self) -> Option<u64> {
        self.latest.map(|s| s.tick)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn send(&mut self, command: WorkerCommand) {
        if !self.alive {
            return;
        }
        if self.commands.send(command).is_err() {
            log::warn!("Simulation worker is gone; keeping last snapshot");
            self.alive = false;
        }
    }
}

impl SimulationRunner for WorkerRunner {
    fn topology(&self) -> Topology {
        Topology::Worker
    }

    fn start(&mut self, track: Arc<TrackConfig>) {
        self.generation += 1;
        self.latest = None;
        let generation = self.generation;
        self.send(WorkerCommand::Init { track, generation });
    }

    fn apply_input(&mut self, input: CarInput) {
        self.send(WorkerCommand::Input(input));
    }

    fn set_track(&mut self, track: Arc<TrackConfig>) {
        self.send(WorkerCommand::SetTrack(track));
    }

    fn pump(&mut self, _frame_dt: f32) {
        if !self.alive {
            return;
        }
        loop {
            match self.snapshots.try_recv() {
                Ok(snapshot) if snapshot.generation == self.generation => {
                    self.latest = Some(snapshot)
                }
                Ok(stale) => log::trace!("Dropping snapshot from generation {}", stale.generation),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.alive {
                        log::warn!("Simulation worker stopped; keeping last snapshot");
                        self.alive = false;
                    }
                    break;
                }
            }
        }
    }

    fn latest_snapshot(&self) -> Option<DisplaySnapshot> {
        self.latest.map(|s| s.snapshot)
    }

    fn destroy(&mut self) {
        if self.alive {
            // Best effort; the worker also exits when the channel closes
            let _ = self.commands.send(WorkerCommand::Shutdown);
            self.alive = false;
        }
        // Detach rather than join: no in-flight tick is awaited
        self.handle.take();
    }
}

impl Drop for WorkerRunner {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Worker-side state, only ever touched on the worker thread
struct Worker {
    config: RunnerConfig,
    sim: Option<(SimulationState, Arc<TrackConfig>)>,
    generation: u64,
    input: CarInput,
    ticks: u64,
}

impl Worker {
    fn new(mut config: RunnerConfig) -> Self {
        config.tick_dt = clock_tick_dt(config.tick_dt);
        Self {
            config,
            sim: None,
            generation: 0,
            input: CarInput::default(),
            ticks: 0,
        }
    }

    fn run(mut self, commands: Receiver<WorkerCommand>, snapshots: SyncSender<WorkerSnapshot>) {
        let tick = Duration::from_secs_f32(self.config.tick_dt);
        let every = u64::from(self.config.snapshot_every_ticks.max(1));
        let mut deadline = Instant::now();

        log::debug!("Simulation worker started ({:?} per tick)", tick);

        loop {
            // Nothing to simulate yet: block until told otherwise
            if self.sim.is_none() {
                let Ok(command) = commands.recv() else {
                    break;
                };
                if !self.handle(command, &snapshots) {
                    break;
                }
                deadline = Instant::now();
                continue;
            }

            // Commands observed now apply from this tick on
            let mut open = true;
            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if !self.handle(command, &snapshots) {
                            open = false;
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        open = false;
                        break;
                    }
                }
            }
            if !open {
                break;
            }

            if let Some((state, track)) = self.sim.as_mut() {
                step_simulation(state, &self.input, self.config.tick_dt, track, &self.config.tuning);
                self.ticks += 1;
                if self.ticks % every == 0 && !self.publish(&snapshots) {
                    break;
                }
            }

            deadline += tick;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else if now - deadline > tick * MAX_CATCHUP_TICKS {
                log::debug!("Worker fell behind by {:?}, resetting clock", now - deadline);
                deadline = now;
            }
        }

        log::debug!("Simulation worker exiting after {} ticks", self.ticks);
    }

    /// Returns false when the worker should exit
    fn handle(&mut self, command: WorkerCommand, snapshots: &SyncSender<WorkerSnapshot>) -> bool {
        match command {
            WorkerCommand::Init { track, generation } => {
                self.sim = Some((SimulationState::new(&track), track));
                self.generation = generation;
                self.publish(snapshots)
            }
            WorkerCommand::Input(input) => {
                self.input = input;
                true
            }
            WorkerCommand::SetTrack(track) => {
                match self.sim.as_mut() {
                    Some((_, current)) => *current = track,
                    None => log::debug!("Ignoring track swap before init"),
                }
                true
            }
            WorkerCommand::Shutdown => false,
        }
    }

    /// Returns false once the presentation side is gone. A full buffer just
    /// drops this copy; the next one supersedes it anyway.
    fn publish(&self, snapshots: &SyncSender<WorkerSnapshot>) -> bool {
        let Some((state, _)) = self.sim.as_ref() else {
            return true;
        };
        let snapshot = WorkerSnapshot {
            generation: self.generation,
            tick: self.ticks,
            snapshot: state.snapshot(),
        };
        match snapshots.try_send(snapshot) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("Snapshot buffer full, dropping tick {}", self.ticks);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Tick length the worker clock can actually sleep on
fn clock_tick_dt(tick_dt: f32) -> f32 {
    if tick_dt.is_finite() && tick_dt > 0.0 && tick_dt <= MAX_TICK_DT {
        tick_dt
    } else {
        log::warn!("Unusable worker tick {tick_dt}s, using {SIM_DT}s");
        SIM_DT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::create_track_config;

    /// Pump until `done` holds or a generous deadline passes
    fn pump_until(runner: &mut WorkerRunner, mut done: impl FnMut(&WorkerRunner) -> bool) -> bool {
        let give_up = Instant::now() + Duration::from_secs(5);
        while Instant::now() < give_up {
            runner.pump(0.0);
            if done(runner) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_worker_publishes_snapshots() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        assert!(runner.latest_snapshot().is_none());
        runner.start(Arc::new(create_track_config(3)));
        assert!(pump_until(&mut runner, |r| r.latest_tick().is_some_and(|t| t >= 4)));
        runner.destroy();
    }

    #[test]
    fn test_worker_applies_input() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        runner.start(Arc::new(create_track_config(3)));
        runner.apply_input(CarInput::from_keys(true, false, false, false, false));
        assert!(pump_until(&mut runner, |r| {
            r.latest_snapshot().is_some_and(|s| s.telemetry.speed > 10.0)
        }));
        runner.destroy();
    }

    #[test]
    fn test_snapshot_ticks_are_ordered() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        runner.start(Arc::new(create_track_config(4)));
        let mut last = 0;
        let mut seen = 0;
        assert!(pump_until(&mut runner, |r| {
            if let Some(tick) = r.latest_tick() {
                assert!(tick >= last);
                if tick > last {
                    seen += 1;
                }
                last = tick;
            }
            seen >= 3
        }));
    }

    #[test]
    fn test_destroy_keeps_last_snapshot() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        runner.start(Arc::new(create_track_config(5)));
        assert!(pump_until(&mut runner, |r| r.latest_snapshot().is_some()));
        let before = runner.latest_snapshot();
        runner.destroy();
        assert!(!runner.is_alive());
        runner.pump(0.0);
        runner.apply_input(CarInput::default());
        assert_eq!(runner.latest_snapshot(), before);
    }

    #[test]
    fn test_restart_discards_previous_run() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        runner.start(Arc::new(create_track_config(6)));
        runner.apply_input(CarInput::from_keys(true, false, false, false, false));
        assert!(pump_until(&mut runner, |r| {
            r.latest_snapshot().is_some_and(|s| s.telemetry.speed > 50.0)
        }));

        runner.apply_input(CarInput::default());
        runner.start(Arc::new(create_track_config(7)));
        assert!(runner.latest_snapshot().is_none());

        assert!(pump_until(&mut runner, |r| r.latest_snapshot().is_some()));
        let fresh = runner.latest_snapshot().unwrap();
        assert_eq!(fresh.car.position.y, 0.0);
        assert_eq!(fresh.telemetry.speed, 0.0);
        runner.destroy();
    }

    #[test]
    fn test_unusable_tick_falls_back() {
        assert_eq!(clock_tick_dt(f32::INFINITY), SIM_DT);
        assert_eq!(clock_tick_dt(f32::NAN), SIM_DT);
        assert_eq!(clock_tick_dt(-1.0), SIM_DT);
        assert_eq!(clock_tick_dt(1.0e9), SIM_DT);
        assert_eq!(clock_tick_dt(0.01), 0.01);

        let config = RunnerConfig {
            tick_dt: f32::INFINITY,
            ..Default::default()
        };
        let mut runner = WorkerRunner::spawn(config).unwrap();
        runner.start(Arc::new(create_track_config(8)));
        assert!(pump_until(&mut runner, |r| r.latest_tick().is_some_and(|t| t >= 2)));
        assert!(runner.is_alive());
        runner.destroy();
    }

    #[test]
    fn test_unpumped_snapshots_stay_bounded() {
        let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
        runner.start(Arc::new(create_track_config(9)));
        // Dozens of snapshots' worth of ticks without draining
        thread::sleep(Duration::from_millis(300));

        let mut received = 0;
        while let Ok(snapshot) = runner.snapshots.try_recv() {
            assert_eq!(snapshot.generation, 1);
            received += 1;
        }
        // One more may land while draining
        assert!(received <= SNAPSHOT_BUFFER + 1);
        runner.destroy();
    }
}
