//! Adaptive render scale
//!
//! Tracks an exponential moving average of frame time and, every half
//! second, nudges the render scale down when over budget or back up when
//! comfortably under it. Runs purely off presentation frames; the simulation
//! clock never sees it.

/// EMA smoothing factor per recorded frame
const EMA_ALPHA: f32 = 0.1;
/// Seconds between scale adjustments
const EVAL_INTERVAL: f32 = 0.5;
/// Over budget by this factor ⇒ step down
const OVER_BUDGET: f32 = 1.15;
/// Under budget by this factor ⇒ step up
const UNDER_BUDGET: f32 = 0.75;
const STEP_DOWN: f32 = 0.1;
const STEP_UP: f32 = 0.05;
pub const MIN_RENDER_SCALE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderScaleController {
    budget_ms: f32,
    max_scale: f32,
    scale: f32,
    ema_ms: Option<f32>,
    since_eval: f32,
}

impl RenderScaleController {
    pub fn new(budget_ms: f32, max_scale: f32) -> Self {
        let max_scale = max_scale.max(MIN_RENDER_SCALE);
        Self {
            budget_ms,
            max_scale,
            scale: max_scale,
            ema_ms: None,
            since_eval: 0.0,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Smoothed frame time in milliseconds
    pub fn average_ms(&self) -> Option<f32> {
        self.ema_ms
    }

    /// Feed one frame's duration. Returns the new scale when it changed.
    pub fn record_frame(&mut self, frame_secs: f32) -> Option<f32> {
        if !(frame_secs.is_finite() && frame_secs > 0.0) {
            return None;
        }
        let ms = frame_secs * 1000.0;
        let ema = match self.ema_ms {
            Some(prev) => prev + (ms - prev) * EMA_ALPHA,
            None => ms,
        };
        self.ema_ms = Some(ema);

        self.since_eval += frame_secs;
        if self.since_eval < EVAL_INTERVAL {
            return None;
        }
        self.since_eval = 0.0;

        let target = if ema > self.budget_ms * OVER_BUDGET {
            self.scale - STEP_DOWN
        } else if ema < self.budget_ms * UNDER_BUDGET {
            self.scale + STEP_UP
        } else {
            return None;
        };
        let next = target.clamp(MIN_RENDER_SCALE, self.max_scale);
        if (next - self.scale).abs() < f32::EPSILON {
            return None;
        }

        log::warn!(
            "Render scale {:.2} -> {:.2} (avg frame {:.1}ms, budget {:.1}ms)",
            self.scale,
            next,
            ema,
            self.budget_ms
        );
        self.scale = next;
        Some(next)
    }
}
