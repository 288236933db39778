//! Drift Arcade entry point
//!
//! Native builds run a short scripted drive against a headless surface and
//! log telemetry. The browser build is driven by its host page instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{Duration, Instant};

    use drift_arcade::Settings;
    use drift_arcade::renderer::{RenderFrame, RenderSurface, TrackSampleCache, edge_points};
    use drift_arcade::runtime::Session;
    use drift_arcade::sim::{CarInput, Telemetry};

    /// Settings file location override
    const SETTINGS_ENV: &str = "DRIFT_ARCADE_SETTINGS";
    const FRAME_DT: f32 = 1.0 / 60.0;
    const RUN_SECONDS: f32 = 6.0;
    /// How far ahead of the camera decoration is sampled
    const VIEW_AHEAD: f32 = 600.0;

    /// Surface that draws nothing but exercises the frame contract
    struct HeadlessSurface {
        cache: TrackSampleCache,
        frames: u64,
        render_scale: f32,
    }

    impl RenderSurface for HeadlessSurface {
        fn size(&self) -> (u32, u32) {
            (1280, 720)
        }

        fn render(&mut self, frame: &RenderFrame<'_>) {
            self.frames += 1;
            let uniforms = frame.uniforms();
            let camera_y = frame.display.camera.y;
            let edges = edge_points(
                &mut self.cache,
                frame.track,
                camera_y - VIEW_AHEAD * 0.25,
                camera_y + VIEW_AHEAD,
                24.0,
            );
            if self.frames % 60 == 0 {
                let (hits, misses) = self.cache.stats();
                log::debug!(
                    "frame {}: car ({:.0}, {:.0}), {} edge pairs, cache {}/{} hit/miss, scale {:.2}",
                    self.frames,
                    uniforms.car_pos[0],
                    uniforms.car_pos[1],
                    edges.len(),
                    hits,
                    misses,
                    self.render_scale
                );
            }
        }

        fn set_render_scale(&mut self, scale: f32) {
            self.render_scale = scale;
        }
    }

    fn load_settings() -> Settings {
        let Ok(path) = std::env::var(SETTINGS_ENV) else {
            return Settings::default();
        };
        match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Settings::default()
            }
        }
    }

    /// Scripted keys: straight, drift right, flick left, brake
    fn scripted_input(t: f32) -> CarInput {
        match t {
            t if t < 2.0 => CarInput::from_keys(true, false, false, false, false),
            t if t < 3.5 => CarInput::from_keys(true, false, false, true, true),
            t if t < 4.5 => CarInput::from_keys(true, false, true, false, false),
            _ => CarInput::from_keys(false, true, false, false, false),
        }
    }

    pub fn run() -> Result<(), drift_arcade::SessionError> {
        let settings = load_settings();
        let surface = HeadlessSurface {
            cache: TrackSampleCache::default(),
            frames: 0,
            render_scale: 1.0,
        };

        let mut session = Session::start(settings, Some(surface))?;
        session.set_telemetry_sink(|t: &Telemetry| {
            log::info!(
                "speed {:>5.1}  drift {:>5.2}  score {:>7.1}  x{:.2}  combo {:.2}{}",
                t.speed,
                t.drift_angle,
                t.score,
                t.multiplier,
                t.combo,
                if t.on_track { "" } else { "  [grass]" }
            );
        });

        let started = Instant::now();
        let mut last = started;
        let mut elapsed = 0.0;
        while elapsed < RUN_SECONDS {
            session.handle_input(scripted_input(elapsed));
            let now = Instant::now();
            let dt = (now - last).as_secs_f32();
            last = now;
            elapsed += dt;
            session.frame(dt);

            let next = now + Duration::from_secs_f32(FRAME_DT);
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            }
        }

        let telemetry = session.telemetry();
        log::info!(
            "Finished after {:.1}s: score {:.1}, {} frames drawn",
            started.elapsed().as_secs_f32(),
            telemetry.score,
            session.surface().frames
        );
        session.destroy();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    drift_arcade::init_logging();
    log::info!("Drift Arcade (native, headless) starting...");

    if let Err(e) = headless::run() {
        log::error!("Session failed to start: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host page drives the session on wasm
}
