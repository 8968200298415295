use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ScatterError, ScatterResult};

/// Decoded raster image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8, row-major, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

impl PixelBuffer {
    /// Wrap raw straight-alpha RGBA8 bytes, checking the length against the dimensions.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> ScatterResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| ScatterError::validation("pixel buffer dimensions overflow"))?;
        if rgba8.len() != expected {
            return Err(ScatterError::validation(format!(
                "pixel buffer length {} does not match {width}x{height} RGBA8 ({expected})",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Native dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// RGBA8 of the pixel at column `x`, row `y`. Caller guarantees bounds.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.rgba8[i],
            self.rgba8[i + 1],
            self.rgba8[i + 2],
            self.rgba8[i + 3],
        ]
    }
}

/// Decode any raster format supported by `image` into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> ScatterResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ScatterError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(PixelBuffer {
        width,
        height,
        rgba8: Arc::new(rgba.into_raw()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
