use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{ScatterError, ScatterResult};
use crate::render::FrameRGBA;
use crate::sampler::ParticleGrid;

const CIRCLE_TOLERANCE: f64 = 0.1;

/// Backing size of a freshly attached surface before any image is installed.
pub const DEFAULT_BACKING: Canvas = Canvas {
    width: 300,
    height: 150,
};

/// CPU drawing surface backed by a `vello_cpu` pixmap.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    /// Allocate a transparent surface with the given backing size.
    pub fn new(backing: Canvas) -> ScatterResult<Self> {
        let (width, height) = backing_dims(backing)?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Backing size in pixels.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    /// Change the backing size. Contents are discarded when the size changes.
    pub fn resize(&mut self, backing: Canvas) -> ScatterResult<()> {
        let (width, height) = backing_dims(backing)?;
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixmap = vello_cpu::Pixmap::new(width, height);
        }
        Ok(())
    }

    /// Clear to fully transparent.
    pub fn clear(&mut self) {
        clear_pixmap(&mut self.pixmap);
    }

    /// Clear, then paint every particle as a filled circle of diameter `block_side`.
    pub fn paint_particles(&mut self, grid: &ParticleGrid) {
        let radius = grid.block_side().as_f64() / 2.0;
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for particle in grid.particles() {
            let [r, g, b, a] = particle.color().to_rgba8();
            if a == 0 {
                continue;
            }
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(particle.position()), radius);
            ctx.fill_path(&circle.to_path(CIRCLE_TOLERANCE));
        }

        ctx.flush();
        clear_pixmap(&mut self.pixmap);
        ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Copy the current pixels out as premultiplied RGBA8.
    pub fn readback(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

fn backing_dims(backing: Canvas) -> ScatterResult<(u16, u16)> {
    if backing.is_empty() {
        return Err(ScatterError::surface(format!(
            "surface backing must be non-empty, got {}x{}",
            backing.width, backing.height
        )));
    }
    let width: u16 = backing
        .width
        .try_into()
        .map_err(|_| ScatterError::surface("surface width exceeds u16"))?;
    let height: u16 = backing
        .height
        .try_into()
        .map_err(|_| ScatterError::surface("surface height exceeds u16"))?;
    Ok((width, height))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
