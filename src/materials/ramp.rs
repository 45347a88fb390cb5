//! Colour ramps for toon shading.
//!
//! A ramp is a list of `(position, colour)` stops. It is baked into a 256x1
//! lookup table that holds the colour of the last stop at or before each
//! sample position. There is no interpolation between stops: the bands must
//! stay crisp once they are sampled with a nearest filter.

use serde::Deserialize;

use crate::{error::ViewerError, materials::color::Color};

/// Number of texels in a baked ramp.
pub const RAMP_WIDTH: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RampStop {
    pub pos: f32,
    pub color: Color,
}

impl RampStop {
    pub fn new(pos: f32, color: Color) -> Self {
        Self { pos, color }
    }

    /// Shorthand for a stop with a `#rrggbb` colour.
    pub fn hex(pos: f32, color: &str) -> Result<Self, ViewerError> {
        Ok(Self {
            pos,
            color: Color::parse(color)?,
        })
    }
}

/// A validated ramp with its stops sorted by position.
#[derive(Clone, Debug, PartialEq)]
pub struct Ramp {
    stops: Vec<RampStop>,
}

impl Ramp {
    /// Validate and sort `stops`.
    ///
    /// The sort is stable, so stops sharing a position keep their list order.
    /// Positions outside [0, 1] are kept: below 0 acts like 0, above 1 is never
    /// reached by any texel.
    pub fn new(stops: &[RampStop]) -> Result<Self, ViewerError> {
        if stops.is_empty() {
            return Err(ViewerError::EmptyRamp);
        }
        if let Some(stop) = stops.iter().find(|stop| !stop.pos.is_finite()) {
            return Err(ViewerError::InvalidStopPosition(stop.pos));
        }
        for stop in stops.iter().filter(|stop| !(0.0..=1.0).contains(&stop.pos)) {
            log::warn!("Ramp stop at {} lies outside [0, 1]", stop.pos);
        }
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[RampStop] {
        &self.stops
    }

    /// The stop with the greatest position `<= pos`.
    ///
    /// Falls back to the first sorted stop when every stop lies above `pos`.
    pub fn active_stop(&self, pos: f32) -> &RampStop {
        self.stops
            .iter()
            .rev()
            .find(|stop| stop.pos <= pos)
            .unwrap_or(&self.stops[0])
    }

    pub fn texels(&self) -> RampTexels {
        let mut data = Vec::with_capacity(RAMP_WIDTH * 4);
        for i in 0..RAMP_WIDTH {
            let pos = i as f32 / RAMP_WIDTH as f32;
            data.extend_from_slice(&self.active_stop(pos).color.to_rgba8());
        }
        RampTexels { data }
    }
}

/// Bake `stops` straight into a lookup table.
pub fn generate_ramp_texels(stops: &[RampStop]) -> Result<RampTexels, ViewerError> {
    Ok(Ramp::new(stops)?.texels())
}

/// The baked RGBA8 lookup table of a ramp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RampTexels {
    data: Vec<u8>,
}

impl RampTexels {
    pub fn len(&self) -> usize {
        self.data.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn texel(&self, idx: usize) -> [u8; 4] {
        let stride = idx * 4;
        [
            self.data[stride],
            self.data[stride + 1],
            self.data[stride + 2],
            self.data[stride + 3],
        ]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Nearest-neighbour lookup with clamp-to-edge addressing, the way the
    /// GPU sampler reads the table.
    pub fn sample(&self, u: f32) -> [u8; 4] {
        self.texel(texel_index(u, self.len()))
    }
}

pub(crate) fn texel_index(u: f32, width: usize) -> usize {
    let idx = (u.clamp(0.0, 1.0) * width as f32).floor() as usize;
    idx.min(width - 1)
}
