//! Down-sampling of a decoded image into a grid of particles.
//!
//! The buffer is partitioned row-major from the top-left into square blocks of
//! [`BlockSide`] pixels. Row and column counts are `round(height / side)` and
//! `round(width / side)`, so the last row/column may overhang the buffer by up to half a block.
//! Overhanging blocks are clamped to the buffer and averaged over their in-bounds pixels only.

use crate::assets::decode::PixelBuffer;
use crate::config::BlockSide;
use crate::foundation::core::{ParticleColor, Point, Vec2};

/// One sampled cell of the source image.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Particle {
    position: Point,
    origin: Point,
    color: ParticleColor,
}

impl Particle {
    /// Create a particle resting at `origin`.
    pub fn at_rest(origin: Point, color: ParticleColor) -> Self {
        Self {
            position: origin,
            origin,
            color,
        }
    }

    /// Current draw position in image pixel space.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Rest position assigned at sampling time.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Averaged block color.
    pub fn color(&self) -> ParticleColor {
        self.color
    }

    /// Vector from origin to the current position.
    pub fn displacement(&self) -> Vec2 {
        self.position - self.origin
    }

    /// Exact rest check (`position == origin`).
    pub fn is_at_rest(&self) -> bool {
        self.position == self.origin
    }

    pub(crate) fn set_position(&mut self, p: Point) {
        self.position = p;
    }
}

/// Particles produced by one sampling pass, in row-major order.
///
/// Membership is fixed at creation; only positions change afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParticleGrid {
    block_side: BlockSide,
    rows: u32,
    cols: u32,
    particles: Vec<Particle>,
}

impl ParticleGrid {
    /// Grid with no particles.
    pub fn empty(block_side: BlockSide) -> Self {
        Self {
            block_side,
            rows: 0,
            cols: 0,
            particles: Vec::new(),
        }
    }

    /// Block side the grid was sampled with; also the particle draw diameter.
    pub fn block_side(&self) -> BlockSide {
        self.block_side
    }

    /// Number of block rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of block columns.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of particles (`rows * cols`).
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Return `true` when the grid holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Borrow the particles in row-major order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Particle at block `(row, col)`.
    pub fn get(&self, row: u32, col: u32) -> Option<&Particle> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.particles
            .get((row as usize) * (self.cols as usize) + (col as usize))
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

/// Sample `buffer` into a particle grid. Deterministic and pure.
#[tracing::instrument(skip(buffer), fields(width = buffer.width, height = buffer.height))]
pub fn sample(buffer: &PixelBuffer, block_side: BlockSide) -> ParticleGrid {
    let d = block_side.get();
    let df = block_side.as_f64();
    let rows = (f64::from(buffer.height) / df).round() as u32;
    let cols = (f64::from(buffer.width) / df).round() as u32;

    let mut particles = Vec::with_capacity((rows as usize) * (cols as usize));
    for row in 0..rows {
        for col in 0..cols {
            let y0 = u64::from(row) * u64::from(d);
            let x0 = u64::from(col) * u64::from(d);
            let color = average_block(buffer, x0, y0, d);
            let center = Point::new(x0 as f64 + df / 2.0, y0 as f64 + df / 2.0);
            particles.push(Particle::at_rest(center, color));
        }
    }

    tracing::debug!(rows, cols, block_side = d, "sampled particle grid");
    ParticleGrid {
        block_side,
        rows,
        cols,
        particles,
    }
}

fn average_block(buffer: &PixelBuffer, x0: u64, y0: u64, d: u32) -> ParticleColor {
    let x1 = (x0 + u64::from(d)).min(u64::from(buffer.width));
    let y1 = (y0 + u64::from(d)).min(u64::from(buffer.height));
    if x0 >= x1 || y0 >= y1 {
        return ParticleColor::transparent();
    }

    let mut sum = [0u64; 4];
    for y in y0..y1 {
        for x in x0..x1 {
            let px = buffer.pixel(x as u32, y as u32);
            for (acc, c) in sum.iter_mut().zip(px) {
                *acc += u64::from(c);
            }
        }
    }

    let n = ((x1 - x0) * (y1 - y0)) as f64;
    ParticleColor {
        r: sum[0] as f64 / n,
        g: sum[1] as f64 / n,
        b: sum[2] as f64 / n,
        a: sum[3] as f64 / n / 255.0,
    }
}

#[cfg(test)]
#[path = "../tests/unit/sampler.rs"]
mod tests;
