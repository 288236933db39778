//! On-track classification against the centerline curve
//!
//! The naive test `|x - centerX(y)| <= w/2` breaks on sharp bends, where the
//! curve folds back in X and the road overlaps itself. Instead we march along
//! the curve looking for the nearest sampled point: a coarse scan around the
//! car, then a fine pass around the coarse best. The curve is band-limited, so
//! sampling is a reliable stand-in for an exact closest-point solve.

use glam::Vec2;

use super::track::{TrackConfig, center_x, sample_track};

/// Coarse scan spacing along Y
pub const COARSE_STEP: f32 = 10.0;
/// Fine refinement spacing along Y
pub const FINE_STEP: f32 = 2.0;
/// Coarse window on each side of the car, in track widths
pub const SEARCH_WINDOW_WIDTHS: f32 = 1.5;

/// Probe offsets below this fraction of the threshold are certainly on-track
pub const PROBE_INSIDE: f32 = 0.8;
/// Probe offsets above this fraction of the threshold are treated as off-track
pub const PROBE_OUTSIDE: f32 = 1.25;

/// Result of the cheap single-sample check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The sample point itself is within reach, so the nearest point is too
    Inside,
    /// Well beyond the edge along the local normal
    Outside,
    /// Needs the full search
    Ambiguous,
}

#[inline]
fn clamp_margin(margin: f32) -> f32 {
    if margin.is_nan() {
        1.0
    } else {
        margin.clamp(0.1, 1.0)
    }
}

#[inline]
fn threshold(config: &TrackConfig, margin: f32) -> f32 {
    config.half_width() * clamp_margin(margin)
}

#[inline]
fn dist_sq_to_curve(config: &TrackConfig, p: Vec2, y: f32) -> f32 {
    p.distance_squared(Vec2::new(center_x(config, y), y))
}

/// Whether `(car_x, car_y)` lies within `margin` times the half-width of the
/// nearest point on the centerline. `margin` is clamped to [0.1, 1].
pub fn is_on_track(config: &TrackConfig, car_x: f32, car_y: f32, margin: f32) -> bool {
    if !(car_x.is_finite() && car_y.is_finite()) {
        return false;
    }

    let limit = threshold(config, margin);
    let limit_sq = limit * limit;
    let p = Vec2::new(car_x, car_y);

    // Coarse pass, symmetric so the car's own Y is always sampled
    let window = config.width() * SEARCH_WINDOW_WIDTHS;
    let steps = (window / COARSE_STEP).ceil() as i32;
    let mut best_y = car_y;
    let mut best_sq = f32::INFINITY;
    for i in -steps..=steps {
        let y = car_y + i as f32 * COARSE_STEP;
        let d = dist_sq_to_curve(config, p, y);
        if d < best_sq {
            best_sq = d;
            best_y = y;
        }
    }
    if best_sq <= limit_sq {
        return true;
    }

    // Fine pass around the coarse best
    let fine_steps = (COARSE_STEP / FINE_STEP).ceil() as i32;
    for i in -fine_steps..=fine_steps {
        let y = best_y + i as f32 * FINE_STEP;
        let d = dist_sq_to_curve(config, p, y);
        if d < best_sq {
            best_sq = d;
            if best_sq <= limit_sq {
                return true;
            }
        }
    }

    log::debug!(
        "Off-track at ({:.1}, {:.1}): nearest {:.1} > {:.1}",
        car_x,
        car_y,
        best_sq.sqrt(),
        limit
    );
    false
}

/// Single-sample classification used to skip the full search when the answer
/// is obvious.
pub fn probe(config: &TrackConfig, car_x: f32, car_y: f32, margin: f32) -> Probe {
    if !(car_x.is_finite() && car_y.is_finite()) {
        return Probe::Outside;
    }

    let limit = threshold(config, margin);
    let sample = sample_track(config, car_y);
    let offset = (car_x - sample.center_x).abs();

    // (center_x, car_y) is a curve point, so this bounds the true distance from above
    if offset <= limit * PROBE_INSIDE {
        return Probe::Inside;
    }

    // Distance to the local tangent line
    let perpendicular = offset * sample.tangent.y;
    if perpendicular >= limit * PROBE_OUTSIDE {
        Probe::Outside
    } else {
        Probe::Ambiguous
    }
}
