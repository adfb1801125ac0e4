//! Shared primitive types used across the interactive session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One engine step. The session advances the engine exactly once per tick.
pub type Step = u64;

/// Index into the environment's discrete action space.
pub type Action = usize;

/// Name of a data channel ("rgb" for every procgen game).
pub type ChannelKey = String;

/// The channel both vision modes read from.
pub const RGB_KEY: &str = "rgb";

/// Shape of one channel, outermost dimension first (height, width, channels).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    pub fn hwc(height: usize, width: usize, channels: usize) -> Self {
        Self(vec![height, width, channels])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

/// A single HWC, row-major RGB image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub height:   usize,
    pub width:    usize,
    pub channels: usize,
    pub pixels:   Vec<u8>,
}

impl Frame {
    pub fn blank(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
            pixels: vec![0; height * width * channels],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::hwc(self.height, self.width, self.channels)
    }

    /// Paint a solid rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, top: usize, left: usize, h: usize, w: usize, rgb: [u8; 3]) {
        let bottom = (top + h).min(self.height);
        let right = (left + w).min(self.width);
        for y in top..bottom {
            for x in left..right {
                let base = (y * self.width + x) * self.channels;
                for (c, value) in rgb.iter().enumerate().take(self.channels) {
                    self.pixels[base + c] = *value;
                }
            }
        }
    }

    /// Nearest-neighbour upscale by an integer factor.
    pub fn upscale(&self, factor: usize) -> Frame {
        let mut out = Frame::blank(self.height * factor, self.width * factor, self.channels);
        for y in 0..out.height {
            for x in 0..out.width {
                let src = ((y / factor) * self.width + x / factor) * self.channels;
                let dst = (y * out.width + x) * self.channels;
                out.pixels[dst..dst + self.channels]
                    .copy_from_slice(&self.pixels[src..src + self.channels]);
            }
        }
        out
    }
}

/// Named frames, keyed by channel.
pub type Channels = BTreeMap<ChannelKey, Frame>;

/// What the engine hands back after each step (or at reset).
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub reward: f32,
    pub ob:     Channels,
    /// True on the first observation of a new episode.
    pub first:  bool,
}
