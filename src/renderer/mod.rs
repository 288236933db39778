//! Renderer contract
//!
//! The core doesn't draw anything itself. Once per presentation frame the
//! session hands a `RenderFrame` to whatever `RenderSurface` it was started
//! with; the frame borrows everything immutably so the renderer can't write
//! back into simulation state.

pub mod cache;

use bytemuck::{Pod, Zeroable};

use crate::sim::{DisplaySnapshot, TrackConfig};

pub use cache::{TrackSampleCache, edge_points};

/// Bands packed into the uniform block; extra bands are dropped
pub const MAX_UNIFORM_BANDS: usize = 4;

/// A drawable target supplied by the embedding application
pub trait RenderSurface {
    /// Drawable size in physical pixels
    fn size(&self) -> (u32, u32);

    fn render(&mut self, frame: &RenderFrame<'_>);

    /// Called when the adaptive render scale changes
    fn set_render_scale(&mut self, _scale: f32) {}
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub display: &'a DisplaySnapshot,
    pub track: &'a TrackConfig,
    pub render_scale: f32,
}

impl RenderFrame<'_> {
    /// Pack the frame into a GPU-uploadable uniform block
    pub fn uniforms(&self) -> FrameUniforms {
        let mut bands = [[0.0; 4]; MAX_UNIFORM_BANDS];
        let mut band_count = 0;
        for (slot, band) in bands.iter_mut().zip(self.track.bands()) {
            *slot = [band.amplitude, band.frequency, band.phase, 0.0];
            band_count += 1;
        }

        let car = &self.display.car;
        FrameUniforms {
            car_pos: car.position.to_array(),
            car_vel: car.velocity.to_array(),
            camera_pos: self.display.camera.to_array(),
            car_heading: car.heading,
            track_width: self.track.width(),
            render_scale: self.render_scale,
            band_count,
            _pad: [0; 2],
            bands,
        }
    }
}

/// Per-frame uniforms (must match WGSL struct layout)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub car_pos: [f32; 2],    // offset 0
    pub car_vel: [f32; 2],    // offset 8
    pub camera_pos: [f32; 2], // offset 16
    pub car_heading: f32,     // offset 24
    pub track_width: f32,     // offset 28
    pub render_scale: f32,    // offset 32
    pub band_count: u32,      // offset 36
    pub _pad: [u32; 2],       // offset 40 - align bands to 16 bytes
    /// (amplitude, frequency, phase, unused) per band
    pub bands: [[f32; 4]; MAX_UNIFORM_BANDS], // offset 48
}
