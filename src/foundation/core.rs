use std::fmt;
use std::time::Duration;

use crate::foundation::error::{ScatterError, ScatterResult};

pub use kurbo::{Point, Vec2};

/// Absolute 0-based frame index counted from the start of a frame loop.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Display refresh rate represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ScatterResult<Self> {
        if den == 0 {
            return Err(ScatterError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScatterError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration of one frame.
    pub fn frame_duration(self) -> Duration {
        Duration::from_secs_f64(self.frame_duration_secs())
    }
}

/// Pixel dimensions of a drawing surface backing or a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Straight-alpha particle color.
///
/// `r`, `g`, `b` are channel means in `0..=255` and may be fractional; `a` is normalized to
/// `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParticleColor {
    /// Red channel mean.
    pub r: f64,
    /// Green channel mean.
    pub g: f64,
    /// Blue channel mean.
    pub b: f64,
    /// Alpha in `0..=1`.
    pub a: f64,
}

impl ParticleColor {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        }
    }

    /// Quantize to straight-alpha RGBA8 for painting.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(v: f64) -> u8 {
            v.round().clamp(0.0, 255.0) as u8
        }

        [q(self.r), q(self.g), q(self.b), q(self.a * 255.0)]
    }
}

impl fmt::Display for ParticleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
