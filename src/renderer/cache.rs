//! Memoized track samples for decoration
//!
//! Road edges, curbs and scenery all want `sample_track` at the same handful
//! of Y positions every frame. Samples are cached by quantized Y in a bounded
//! map; the oldest entry goes first when it fills up.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;

use crate::sim::{TrackConfig, TrackSample, sample_track};

pub const DEFAULT_QUANTUM: f32 = 4.0;
pub const DEFAULT_CAPACITY: usize = 2048;
/// Upper bound on points returned by one `edge_points` call
const MAX_EDGE_POINTS: usize = 4096;

#[derive(Debug, Clone)]
pub struct TrackSampleCache {
    quantum: f32,
    capacity: usize,
    entries: HashMap<i64, TrackSample>,
    /// Insertion order, oldest first
    order: VecDeque<i64>,
    /// Track the entries belong to
    track: Option<TrackConfig>,
    hits: u64,
    misses: u64,
}

impl Default for TrackSampleCache {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTUM, DEFAULT_CAPACITY)
    }
}

impl TrackSampleCache {
    pub fn new(quantum: f32, capacity: usize) -> Self {
        let quantum = if quantum.is_finite() && quantum > 0.0 {
            quantum
        } else {
            DEFAULT_QUANTUM
        };
        let capacity = capacity.max(1);
        Self {
            quantum,
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            track: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Y snapped to the cache grid
    pub fn quantize(&self, y: f32) -> f32 {
        (y / self.quantum).round() * self.quantum
    }

    /// Track sample at the grid point nearest `y`
    pub fn sample(&mut self, track: &TrackConfig, y: f32) -> TrackSample {
        if !y.is_finite() {
            return sample_track(track, y);
        }
        if self.track.as_ref() != Some(track) {
            if self.track.is_some() {
                log::debug!("Track changed, dropping {} cached samples", self.entries.len());
            }
            self.clear();
            self.track = Some(track.clone());
        }

        let key = (y / self.quantum).round() as i64;
        if let Some(sample) = self.entries.get(&key) {
            self.hits += 1;
            return *sample;
        }

        self.misses += 1;
        let sample = sample_track(track, key as f32 * self.quantum);
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, sample);
        self.order.push_back(key);
        sample
    }
}

/// Left/right road edge points every `step` units between `from_y` and `to_y`
pub fn edge_points(
    cache: &mut TrackSampleCache,
    track: &TrackConfig,
    from_y: f32,
    to_y: f32,
    step: f32,
) -> Vec<(Vec2, Vec2)> {
    if !(step.is_finite() && step > 0.0 && from_y.is_finite() && to_y.is_finite()) {
        return Vec::new();
    }
    let (lo, hi) = if from_y <= to_y {
        (from_y, to_y)
    } else {
        (to_y, from_y)
    };
    let count = (((hi - lo) / step).floor() as usize + 1).min(MAX_EDGE_POINTS);
    let half = track.half_width();

    (0..count)
        .map(|i| {
            let y = cache.quantize(lo + i as f32 * step);
            let sample = cache.sample(track, y);
            let center = Vec2::new(sample.center_x, y);
            // Normal points toward -x
            (center + sample.normal * half, center - sample.normal * half)
        })
        .collect()
}
