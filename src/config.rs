use std::time::Duration;

use crate::assets::source::FetchMode;
use crate::foundation::error::{ScatterError, ScatterResult};

/// Side length, in source pixels, of the square block one particle summarizes.
///
/// Always `>= 1`; construct through [`BlockSide::from_quality`] or [`BlockSide::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BlockSide(u32);

impl BlockSide {
    /// Create a block side from an explicit pixel count.
    pub fn new(side: u32) -> ScatterResult<Self> {
        if side == 0 {
            return Err(ScatterError::validation("block side must be >= 1"));
        }
        Ok(Self(side))
    }

    /// Normalize a `quality` value into a block side.
    ///
    /// - `quality > 1`: pixels per particle, truncated toward zero (`4.9 -> 4`).
    /// - `quality <= 1`: particles per pixel, `floor(1 / quality)` (`0.125 -> 8`).
    pub fn from_quality(quality: f64) -> ScatterResult<Self> {
        if !quality.is_finite() {
            return Err(ScatterError::validation(format!(
                "quality must be finite, got {quality}"
            )));
        }
        if quality <= 0.0 {
            return Err(ScatterError::validation(format!(
                "quality must be > 0, got {quality}"
            )));
        }

        let side = if quality > 1.0 {
            quality.trunc()
        } else {
            (1.0 / quality).floor()
        };
        if !side.is_finite() || side < 1.0 || side > f64::from(u32::MAX) {
            return Err(ScatterError::validation(format!(
                "quality {quality} yields an unusable block side {side}"
            )));
        }
        Self::new(side as u32)
    }

    /// Block side in pixels.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Block side as `f64`, the particle draw diameter.
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

/// User-facing hover options. Every field is optional in serialized form.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoverOptions {
    /// Sampling granularity; see [`BlockSide::from_quality`].
    pub quality: f64,
    /// Pointer influence radius in image pixels.
    pub force_radius: f64,
    /// Repel displacement scale per frame.
    pub force_speed: f64,
    /// Fraction of the remaining distance to origin closed per frame.
    pub return_speed: f64,
    /// Distance to origin under which a returning particle snaps to rest.
    pub rest_epsilon: f64,
    /// Quiet period before a burst of resize notifications is committed.
    pub resize_debounce_ms: u64,
    /// Which image sources the loader admits.
    pub fetch_mode: FetchMode,
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            quality: 4.0,
            force_radius: 50.0,
            force_speed: 5.0,
            return_speed: 0.1,
            rest_epsilon: 0.01,
            resize_debounce_ms: 200,
            fetch_mode: FetchMode::Anonymous,
        }
    }
}

impl HoverOptions {
    /// Parse options from JSON text.
    pub fn from_json_str(s: &str) -> ScatterResult<Self> {
        serde_json::from_str(s).map_err(|e| ScatterError::serde(format!("hover options: {e}")))
    }

    /// Validate every field and normalize `quality` into a [`BlockSide`].
    pub fn validate_and_normalize(&self) -> ScatterResult<HoverConfig> {
        let block_side = BlockSide::from_quality(self.quality)?;

        if !self.force_radius.is_finite() || self.force_radius <= 0.0 {
            return Err(ScatterError::validation(format!(
                "force_radius must be finite and > 0, got {}",
                self.force_radius
            )));
        }
        if !self.force_speed.is_finite() || self.force_speed < 0.0 {
            return Err(ScatterError::validation(format!(
                "force_speed must be finite and >= 0, got {}",
                self.force_speed
            )));
        }
        if !(self.return_speed > 0.0 && self.return_speed <= 1.0) {
            return Err(ScatterError::validation(format!(
                "return_speed must be in (0, 1], got {}",
                self.return_speed
            )));
        }
        if !self.rest_epsilon.is_finite() || self.rest_epsilon <= 0.0 {
            return Err(ScatterError::validation(format!(
                "rest_epsilon must be finite and > 0, got {}",
                self.rest_epsilon
            )));
        }

        Ok(HoverConfig {
            block_side,
            force_radius: self.force_radius,
            force_speed: self.force_speed,
            return_speed: self.return_speed,
            rest_epsilon: self.rest_epsilon,
            resize_debounce: Duration::from_millis(self.resize_debounce_ms),
            fetch_mode: self.fetch_mode,
        })
    }
}

/// Validated engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverConfig {
    /// Canonical sampling granularity.
    pub block_side: BlockSide,
    /// Pointer influence radius in image pixels.
    pub force_radius: f64,
    /// Repel displacement scale per frame.
    pub force_speed: f64,
    /// Easing fraction per frame, in `(0, 1]`.
    pub return_speed: f64,
    /// Snap-to-rest threshold in image pixels.
    pub rest_epsilon: f64,
    /// Resize debounce quiet period.
    pub resize_debounce: Duration,
    /// Loader source policy.
    pub fetch_mode: FetchMode,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            block_side: BlockSide(4),
            force_radius: 50.0,
            force_speed: 5.0,
            return_speed: 0.1,
            rest_epsilon: 0.01,
            resize_debounce: Duration::from_millis(200),
            fetch_mode: FetchMode::Anonymous,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
