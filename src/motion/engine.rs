use std::path::PathBuf;
use std::time::Instant;

use crate::assets::decode::PixelBuffer;
use crate::assets::loader::{ImageLoader, PendingLoad};
use crate::assets::source::ImageSource;
use crate::config::{HoverConfig, HoverOptions};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{ScatterError, ScatterResult};
use crate::host::HostEvent;
use crate::motion::frame_loop::LoopState;
use crate::motion::physics::{MotionParams, Step, step_particle};
use crate::motion::pointer::{Debouncer, DisplayRect, PointerState, ScaleState};
use crate::render::FrameRGBA;
use crate::render::cpu::{CpuSurface, DEFAULT_BACKING};
use crate::sampler::{ParticleGrid, sample};

/// Image load progress as seen by the wrapper.
#[derive(Debug, Default)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading {
        /// Source description.
        source: String,
    },
    /// Decoded but waiting for a surface before sampling.
    Deferred,
    /// Sampled and installed.
    Ready {
        /// Number of particles in the installed grid.
        particles: usize,
    },
    /// The last load failed; the grid is empty and the surface blank.
    Failed(ScatterError),
}

impl LoadStatus {
    /// Return `true` once a grid has been installed.
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadStatus::Ready { .. })
    }
}

/// Counts of per-particle outcomes for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Particles pushed by the pointer.
    pub repelled: usize,
    /// Particles easing back toward origin.
    pub returning: usize,
    /// Particles that snapped to origin this tick.
    pub settled: usize,
    /// Particles at rest and untouched.
    pub resting: usize,
}

impl TickStats {
    /// Number of particles whose position changed.
    pub fn moved(&self) -> usize {
        self.repelled + self.returning + self.settled
    }
}

/// Owns the particle grid, pointer and scale caches, and the drawing surface, and advances the
/// hover simulation one frame at a time.
#[derive(Debug)]
pub struct MotionEngine {
    config: HoverConfig,
    params: MotionParams,
    loader: ImageLoader,
    surface: Option<CpuSurface>,
    display: Option<DisplayRect>,
    grid: ParticleGrid,
    pointer: PointerState,
    scale: ScaleState,
    resize: Debouncer<DisplayRect>,
    pending_load: Option<PendingLoad>,
    deferred: Option<PixelBuffer>,
    load_status: LoadStatus,
    pub(super) loop_state: LoopState,
    pub(super) frame: FrameIndex,
}

impl MotionEngine {
    /// Create an engine with a validated config, loading relative sources from `assets_root`.
    pub fn new(config: HoverConfig, assets_root: impl Into<PathBuf>) -> Self {
        Self {
            params: MotionParams::from(&config),
            loader: ImageLoader::new(assets_root, config.fetch_mode),
            surface: None,
            display: None,
            grid: ParticleGrid::empty(config.block_side),
            pointer: PointerState::Absent,
            scale: ScaleState::default(),
            resize: Debouncer::new(config.resize_debounce),
            pending_load: None,
            deferred: None,
            load_status: LoadStatus::Idle,
            loop_state: LoopState::Stopped,
            frame: FrameIndex(0),
            config,
        }
    }

    /// Validate `opts` and create an engine.
    pub fn from_options(
        opts: &HoverOptions,
        assets_root: impl Into<PathBuf>,
    ) -> ScatterResult<Self> {
        Ok(Self::new(opts.validate_and_normalize()?, assets_root))
    }

    /// Active configuration.
    pub fn config(&self) -> &HoverConfig {
        &self.config
    }

    /// Installed particle grid (empty until an image is installed).
    pub fn grid(&self) -> &ParticleGrid {
        &self.grid
    }

    /// Current pointer state in image pixel space.
    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Cached page-to-image mapping.
    pub fn scale(&self) -> ScaleState {
        self.scale
    }

    /// Last committed display rect.
    pub fn display(&self) -> Option<DisplayRect> {
        self.display
    }

    /// Image load progress.
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Number of frames executed by the loop.
    pub fn frame_index(&self) -> FrameIndex {
        self.frame
    }

    /// Attached surface, if any.
    pub fn surface(&self) -> Option<&CpuSurface> {
        self.surface.as_ref()
    }

    /// Return `true` when both the surface and a sampled grid are in place.
    pub fn is_ready(&self) -> bool {
        self.surface.is_some() && self.load_status.is_ready()
    }

    /// Mount a drawing surface displayed at `rect`.
    ///
    /// The first layout measurement is committed immediately. An image that finished loading
    /// before the surface existed is sampled now. Replacing a mounted surface stops the running
    /// loop; the new surface keeps the installed image's backing size.
    pub fn attach_surface(&mut self, rect: DisplayRect) -> ScatterResult<()> {
        let previous = self.surface.take();
        if previous.is_some() {
            self.stop();
            self.resize.cancel();
        }

        let backing = match (&self.deferred, &previous) {
            (Some(buf), _) => buf.canvas(),
            (None, Some(old)) if self.load_status.is_ready() => old.canvas(),
            _ => DEFAULT_BACKING,
        };
        self.surface = Some(CpuSurface::new(backing)?);
        self.commit_layout(rect);

        if let Some(buffer) = self.deferred.take() {
            self.install_or_fail(buffer);
        }
        Ok(())
    }

    /// Tear down the surface: stops the loop and drops all per-surface state.
    pub fn detach_surface(&mut self) {
        self.stop();
        self.surface = None;
        self.display = None;
        self.grid = ParticleGrid::empty(self.config.block_side);
        self.pointer = PointerState::Absent;
        self.scale = ScaleState::default();
        self.resize.cancel();
        self.pending_load = None;
        self.deferred = None;
        self.load_status = LoadStatus::Idle;
    }

    /// Start loading `source` on a background thread, superseding any in-flight load.
    pub fn request_load(&mut self, source: impl Into<ImageSource>) {
        let source = source.into();
        let pending = self.loader.spawn(source);
        self.load_status = LoadStatus::Loading {
            source: pending.description().to_string(),
        };
        self.pending_load = Some(pending);
    }

    /// Load `source` on the calling thread and install it.
    ///
    /// Failures are returned to the caller rather than recorded in [`LoadStatus::Failed`]; the
    /// grid and surface are still reset to blank.
    pub fn load_blocking(&mut self, source: impl Into<ImageSource>) -> ScatterResult<()> {
        self.pending_load = None;
        let res = self
            .loader
            .load_blocking(&source.into())
            .and_then(|buffer| self.install_image(buffer));
        if res.is_err() {
            self.blank();
            self.load_status = LoadStatus::Idle;
        }
        res
    }

    /// Collect a finished background load, if any. Returns `true` when a load completed.
    pub fn poll_load(&mut self) -> bool {
        let Some(pending) = self.pending_load.as_mut() else {
            return false;
        };
        let Some(result) = pending.try_take() else {
            return false;
        };
        self.pending_load = None;

        match result {
            Ok(buffer) => self.install_or_fail(buffer),
            Err(e) => self.fail_load(e),
        }
        true
    }

    /// Sample `buffer` and swap the resulting grid in wholesale.
    ///
    /// Resizes the surface backing to the image's native size and recomputes the scale ratio.
    /// Without a surface the buffer is held until [`MotionEngine::attach_surface`].
    #[tracing::instrument(skip(self, buffer), fields(width = buffer.width, height = buffer.height))]
    pub fn install_image(&mut self, buffer: PixelBuffer) -> ScatterResult<()> {
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("no surface attached; deferring sampling");
            self.deferred = Some(buffer);
            self.load_status = LoadStatus::Deferred;
            return Ok(());
        };

        surface.resize(buffer.canvas())?;
        surface.clear();

        let grid = sample(&buffer, self.config.block_side);
        let particles = grid.len();
        self.grid = grid;

        if let Some(rect) = self.display {
            self.commit_layout(rect);
        }
        self.load_status = LoadStatus::Ready { particles };
        Ok(())
    }

    /// Apply one host notification. Malformed events are skipped.
    pub fn handle_event(&mut self, event: &HostEvent, now: Instant) {
        match event {
            HostEvent::PointerMove { page_x, page_y } => self.move_pointer(*page_x, *page_y),
            HostEvent::TouchMove { touches } => match touches.first() {
                Some(t) => self.move_pointer(t.page_x, t.page_y),
                None => tracing::warn!("touch move without contacts; skipped"),
            },
            HostEvent::PointerLeave | HostEvent::TouchEnd => {
                self.pointer = PointerState::Absent;
            }
            HostEvent::Resize { rect } => {
                if rect.is_usable() {
                    self.resize.push(*rect, now);
                } else {
                    tracing::warn!(?rect, "unusable resize rect; skipped");
                }
            }
        }
    }

    /// Commit a pending resize once its quiet period has elapsed.
    pub fn flush_resize(&mut self, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(rect) => {
                self.commit_layout(rect);
                true
            }
            None => false,
        }
    }

    /// Advance every particle by one frame.
    ///
    /// No-op until the surface and grid are ready. All positions are computed before any is
    /// written, so a fault leaves the grid at its last-known-good state.
    pub fn tick(&mut self) -> ScatterResult<TickStats> {
        if !self.is_ready() {
            return Ok(TickStats::default());
        }

        let pointer = self.pointer;
        let steps = self
            .grid
            .particles()
            .iter()
            .map(|p| step_particle(p.position(), p.origin(), pointer, &self.params))
            .collect::<ScatterResult<Vec<Step>>>()?;

        let mut stats = TickStats::default();
        for (particle, step) in self.grid.particles_mut().iter_mut().zip(steps) {
            match step {
                Step::Repelled(p) => {
                    stats.repelled += 1;
                    particle.set_position(p);
                }
                Step::Returning(p) => {
                    stats.returning += 1;
                    particle.set_position(p);
                }
                Step::Settled(p) => {
                    stats.settled += 1;
                    particle.set_position(p);
                }
                Step::Resting => stats.resting += 1,
            }
        }
        Ok(stats)
    }

    /// Clear the surface and paint the grid as it is now. No-op without a surface.
    pub fn render(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.paint_particles(&self.grid);
        }
    }

    /// Read back the surface pixels.
    pub fn snapshot(&self) -> Option<FrameRGBA> {
        self.surface.as_ref().map(CpuSurface::readback)
    }

    fn move_pointer(&mut self, page_x: f64, page_y: f64) {
        if !page_x.is_finite() || !page_y.is_finite() {
            tracing::warn!(page_x, page_y, "non-finite pointer coordinates; skipped");
            return;
        }
        self.pointer = PointerState::Present(self.scale.to_image(page_x, page_y));
    }

    fn commit_layout(&mut self, rect: DisplayRect) {
        let backing = self
            .surface
            .as_ref()
            .map(CpuSurface::canvas)
            .unwrap_or(Canvas {
                width: 0,
                height: 0,
            });
        match ScaleState::compute(backing, rect) {
            Some(scale) => {
                self.display = Some(rect);
                self.scale = scale;
                tracing::debug!(
                    ratio = scale.ratio,
                    left = scale.left,
                    top = scale.top,
                    "layout committed"
                );
            }
            None => tracing::warn!(?rect, "unusable layout; keeping previous scale"),
        }
    }

    fn install_or_fail(&mut self, buffer: PixelBuffer) {
        if let Err(e) = self.install_image(buffer) {
            self.fail_load(e);
        }
    }

    fn fail_load(&mut self, err: ScatterError) {
        tracing::warn!(error = %err, "image load failed");
        self.blank();
        self.load_status = LoadStatus::Failed(err);
    }

    fn blank(&mut self) {
        self.grid = ParticleGrid::empty(self.config.block_side);
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/engine.rs"]
mod tests;
