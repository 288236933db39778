//! Session lifecycle
//!
//! A `Session` owns everything one running game needs: the runner, the
//! active track, display smoothing, the render scale controller and the
//! telemetry throttle. Nothing lives in statics, so independent sessions can
//! coexist. Lifecycle is `start` → `frame`* → `destroy` (or drop).

use std::sync::Arc;

use super::{
    DisplaySmoother, RenderScaleController, RunnerConfig, SimulationRunner, Topology, connect,
};
use crate::error::SessionError;
use crate::renderer::{RenderFrame, RenderSurface};
use crate::settings::Settings;
use crate::sim::{
    CarInput, DisplaySnapshot, SimulationState, Telemetry, TrackConfig, create_track_config,
};

/// Receives periodic telemetry pushes
pub trait TelemetrySink {
    fn push(&mut self, telemetry: &Telemetry);
}

impl<F: FnMut(&Telemetry)> TelemetrySink for F {
    fn push(&mut self, telemetry: &Telemetry) {
        self(telemetry)
    }
}

/// Fires at most once per interval of accumulated frame time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryThrottle {
    interval: f32,
    elapsed: f32,
}

impl TelemetryThrottle {
    /// The first `tick` always fires
    pub fn new(interval_secs: f32) -> Self {
        let interval = interval_secs.max(0.0);
        Self {
            interval,
            elapsed: interval,
        }
    }

    pub fn tick(&mut self, dt: f32) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}

pub struct Session<S: RenderSurface> {
    settings: Settings,
    surface: S,
    runner: Box<dyn SimulationRunner>,
    track: Arc<TrackConfig>,
    smoother: DisplaySmoother,
    quality: RenderScaleController,
    throttle: TelemetryThrottle,
    sink: Option<Box<dyn TelemetrySink>>,
    input: CarInput,
    frames: u64,
    active: bool,
}

impl<S: RenderSurface> Session<S> {
    /// Start a session with the topology named in `settings`
    pub fn start(settings: Settings, surface: Option<S>) -> Result<Self, SessionError> {
        let topology = settings.topology;
        Self::start_with_runner(settings, surface, |config| connect(config, topology))
    }

    /// Start a session with a caller-built runner
    pub fn start_with_runner(
        settings: Settings,
        surface: Option<S>,
        make_runner: impl FnOnce(RunnerConfig) -> Box<dyn SimulationRunner>,
    ) -> Result<Self, SessionError> {
        settings.validate()?;

        let surface = surface.ok_or(SessionError::NoSurface)?;
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Err(SessionError::ZeroSizedSurface { width, height });
        }

        let seed = settings.seed.unwrap_or_else(rand::random);
        let track = Arc::new(create_track_config(seed).with_width(settings.track_width)?);

        let mut runner = make_runner(RunnerConfig::from_settings(&settings));
        runner.start(Arc::clone(&track));

        let mut smoother = DisplaySmoother::default();
        smoother.snap(SimulationState::new(&track).snapshot());

        let quality = RenderScaleController::new(
            settings.quality.frame_budget_ms(),
            settings.max_render_scale(),
        );
        let mut surface = surface;
        surface.set_render_scale(quality.scale());

        log::info!(
            "Session started: seed {}, {}x{}, {:?} topology, {} quality",
            seed,
            width,
            height,
            runner.topology(),
            settings.quality.as_str()
        );

        Ok(Self {
            throttle: TelemetryThrottle::new(settings.telemetry_interval()),
            settings,
            surface,
            runner,
            track,
            smoother,
            quality,
            sink: None,
            input: CarInput::default(),
            frames: 0,
            active: true,
        })
    }

    pub fn set_telemetry_sink(&mut self, sink: impl TelemetrySink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Forward a control input; repeats of the current input are not resent
    pub fn handle_input(&mut self, input: CarInput) {
        let input = input.clamped();
        if input == self.input {
            return;
        }
        self.input = input;
        self.runner.apply_input(input);
    }

    /// Advance one presentation frame: catch up or drain the simulation,
    /// smooth, render. Returns telemetry when a push was due.
    pub fn frame(&mut self, frame_dt: f32) -> Option<Telemetry> {
        if !self.active {
            return None;
        }
        self.frames += 1;
        self.runner.pump(frame_dt);

        // Without a fresh snapshot the last displayed state stays up
        let display = match self.runner.latest_snapshot() {
            Some(target) => match self.runner.topology() {
                Topology::Worker => self.smoother.follow(target, frame_dt),
                Topology::Local => self.smoother.snap(target),
            },
            None => self.display(),
        };

        if let Some(scale) = self.quality.record_frame(frame_dt) {
            self.surface.set_render_scale(scale);
        }
        self.surface.render(&RenderFrame {
            display: &display,
            track: &self.track,
            render_scale: self.quality.scale(),
        });

        if !self.throttle.tick(frame_dt) {
            return None;
        }
        let telemetry = display.telemetry;
        if let Some(sink) = self.sink.as_mut() {
            sink.push(&telemetry);
        }
        Some(telemetry)
    }

    /// Swap the active track without moving the car. Same track is a no-op.
    pub fn set_track(&mut self, track: Arc<TrackConfig>) {
        if Arc::ptr_eq(&track, &self.track) || *track == *self.track {
            return;
        }
        log::info!("Track swapped to seed {}", track.seed());
        self.runner.set_track(Arc::clone(&track));
        self.track = track;
    }

    /// Generate a new track and restart the car on it
    pub fn new_track(&mut self, seed: u32) -> Result<(), SessionError> {
        let track = Arc::new(create_track_config(seed).with_width(self.settings.track_width)?);
        self.runner.start(Arc::clone(&track));
        self.smoother.snap(SimulationState::new(&track).snapshot());
        self.track = track;
        log::info!("New track, seed {}", seed);
        Ok(())
    }

    pub fn track(&self) -> &Arc<TrackConfig> {
        &self.track
    }

    pub fn topology(&self) -> Topology {
        self.runner.topology()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Last displayed snapshot
    pub fn display(&self) -> DisplaySnapshot {
        self.smoother.current().unwrap_or_default()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.display().telemetry
    }

    pub fn render_scale(&self) -> f32 {
        self.quality.scale()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Immediate teardown; any in-flight tick is abandoned
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.sink = None;
        self.runner.destroy();
        log::info!("Session destroyed after {} frames", self.frames);
    }
}

impl<S: RenderSurface> Drop for Session<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
