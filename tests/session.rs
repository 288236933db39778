//! Session and runner contract tests
//!
//! Run with: cargo test --test session

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use drift_arcade::consts::SIM_DT;
use drift_arcade::renderer::{FrameUniforms, RenderFrame, RenderSurface};
use drift_arcade::runtime::{
    RunnerConfig, Session, SimulationRunner, Topology, WorkerRunner, with_fallback,
};
use drift_arcade::sim::{
    CarInput, DisplaySnapshot, SimulationState, Telemetry, TrackConfig, create_track_config,
};
use drift_arcade::{SessionError, Settings};

struct TestSurface {
    size: (u32, u32),
    frames: usize,
    last: Option<FrameUniforms>,
}

impl TestSurface {
    fn new() -> Self {
        Self::sized(800, 600)
    }

    fn sized(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: 0,
            last: None,
        }
    }
}

impl RenderSurface for TestSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, frame: &RenderFrame<'_>) {
        self.frames += 1;
        self.last = Some(frame.uniforms());
    }
}

fn settings(topology: Topology) -> Settings {
    Settings {
        topology,
        seed: Some(1234),
        ..Default::default()
    }
}

fn throttle() -> CarInput {
    CarInput::from_keys(true, false, false, false, false)
}

#[test]
fn test_local_session_drives() {
    let mut session = Session::start(settings(Topology::Local), Some(TestSurface::new())).unwrap();
    assert_eq!(session.topology(), Topology::Local);

    session.handle_input(throttle());
    for _ in 0..60 {
        session.frame(SIM_DT * 1.01);
    }

    assert!(session.telemetry().speed > 100.0);
    assert_eq!(session.surface().frames, 60);

    let uniforms = session.surface().last.unwrap();
    assert_eq!(uniforms.track_width, session.track().width());
    assert!(uniforms.car_pos[1] > 0.0);
}

#[test]
fn test_worker_session_drives() {
    let mut session =
        Session::start(settings(Topology::Worker), Some(TestSurface::new())).unwrap();
    assert_eq!(session.topology(), Topology::Worker);

    session.handle_input(throttle());
    let give_up = Instant::now() + Duration::from_secs(5);
    while session.telemetry().speed < 50.0 && Instant::now() < give_up {
        session.frame(1.0 / 60.0);
        thread::sleep(Duration::from_millis(5));
    }
    assert!(session.telemetry().speed >= 50.0);
    session.destroy();
}

#[test]
fn test_worker_new_track_shows_fresh_car() {
    let mut session =
        Session::start(settings(Topology::Worker), Some(TestSurface::new())).unwrap();
    session.handle_input(throttle());
    let give_up = Instant::now() + Duration::from_secs(5);
    while session.display().car.position.y < 100.0 && Instant::now() < give_up {
        session.frame(1.0 / 60.0);
        thread::sleep(Duration::from_millis(5));
    }
    assert!(session.display().car.position.y >= 100.0);

    // Released so the restarted car stays parked
    session.handle_input(CarInput::default());
    session.new_track(2).unwrap();
    session.frame(1.0 / 60.0);

    let display = session.display();
    assert_eq!(session.track().seed(), 2);
    assert_eq!(display.car.position.y, 0.0);
    assert_eq!(display.telemetry.speed, 0.0);
    session.destroy();
}

#[test]
fn test_worker_failure_falls_back_to_local() {
    let session = Session::start_with_runner(
        settings(Topology::Worker),
        Some(TestSurface::new()),
        |config| with_fallback(Err(io::Error::other("threads unavailable")), config),
    )
    .unwrap();
    assert_eq!(session.topology(), Topology::Local);
}

#[test]
fn test_missing_surface_is_fatal() {
    let result = Session::<TestSurface>::start(settings(Topology::Local), None);
    assert!(matches!(result, Err(SessionError::NoSurface)));
}

#[test]
fn test_zero_sized_surface_is_fatal() {
    let result = Session::start(settings(Topology::Local), Some(TestSurface::sized(0, 600)));
    assert!(matches!(
        result,
        Err(SessionError::ZeroSizedSurface {
            width: 0,
            height: 600
        })
    ));
}

#[test]
fn test_track_swap_is_idempotent_and_keeps_car() {
    let mut session = Session::start(settings(Topology::Local), Some(TestSurface::new())).unwrap();
    session.handle_input(throttle());
    for _ in 0..30 {
        session.frame(SIM_DT * 1.01);
    }
    let before = session.display().car;

    let same = Arc::clone(session.track());
    session.set_track(same);
    let rebuilt = Arc::new(create_track_config(1234));
    session.set_track(rebuilt);
    assert_eq!(session.track().seed(), 1234);

    let other = Arc::new(create_track_config(999));
    session.set_track(Arc::clone(&other));
    assert!(Arc::ptr_eq(session.track(), &other));

    // No tick has run since; the car has not been repositioned
    session.frame(0.0);
    assert_eq!(session.display().car, before);
}

#[test]
fn test_telemetry_is_throttled() {
    let pushes = Rc::new(RefCell::new(Vec::<Telemetry>::new()));
    let mut session = Session::start(settings(Topology::Local), Some(TestSurface::new())).unwrap();
    let sink = Rc::clone(&pushes);
    session.set_telemetry_sink(move |t: &Telemetry| sink.borrow_mut().push(*t));

    let mut returned = 0;
    for _ in 0..60 {
        if session.frame(1.0 / 60.0).is_some() {
            returned += 1;
        }
    }

    // One second at 120 ms spacing, plus the immediate first push
    let count = pushes.borrow().len();
    assert_eq!(count, returned);
    assert!((7..=10).contains(&count), "got {count} pushes");
}

/// Publishes one snapshot, then goes silent
struct StallingRunner {
    snapshot: Option<DisplaySnapshot>,
    pumps: u32,
}

impl SimulationRunner for StallingRunner {
    fn topology(&self) -> Topology {
        Topology::Worker
    }

    fn start(&mut self, track: Arc<TrackConfig>) {
        let mut state = SimulationState::new(&track);
        state.drift.score = 50.0;
        self.snapshot = Some(state.snapshot());
    }

    fn apply_input(&mut self, _input: CarInput) {}

    fn set_track(&mut self, _track: Arc<TrackConfig>) {}

    fn pump(&mut self, _frame_dt: f32) {
        self.pumps += 1;
    }

    fn latest_snapshot(&self) -> Option<DisplaySnapshot> {
        if self.pumps <= 1 { self.snapshot } else { None }
    }

    fn destroy(&mut self) {}
}

#[test]
fn test_stalled_snapshots_keep_last_display() {
    let mut session = Session::start_with_runner(
        settings(Topology::Worker),
        Some(TestSurface::new()),
        |_| {
            Box::new(StallingRunner {
                snapshot: None,
                pumps: 0,
            })
        },
    )
    .unwrap();

    session.frame(1.0 / 60.0);
    assert_eq!(session.telemetry().score, 50.0);
    for _ in 0..30 {
        session.frame(1.0 / 60.0);
    }
    assert_eq!(session.telemetry().score, 50.0);
    assert_eq!(session.surface().frames, 31);
}

#[test]
fn test_destroyed_worker_keeps_last_snapshot() {
    let mut runner = WorkerRunner::spawn(RunnerConfig::default()).unwrap();
    runner.start(Arc::new(create_track_config(5)));

    let give_up = Instant::now() + Duration::from_secs(5);
    while runner.latest_snapshot().is_none() && Instant::now() < give_up {
        runner.pump(0.0);
        thread::sleep(Duration::from_millis(2));
    }
    let last = runner.latest_snapshot();
    assert!(last.is_some());

    runner.destroy();
    runner.pump(1.0);
    assert_eq!(runner.latest_snapshot(), last);
}

#[test]
fn test_independent_sessions_coexist() {
    let mut a = Session::start(settings(Topology::Local), Some(TestSurface::new())).unwrap();
    let mut b = Session::start(settings(Topology::Local), Some(TestSurface::new())).unwrap();
    a.handle_input(throttle());
    for _ in 0..30 {
        a.frame(SIM_DT * 1.01);
        b.frame(SIM_DT * 1.01);
    }
    assert!(a.telemetry().speed > 0.0);
    assert_eq!(b.telemetry().speed, 0.0);
}
