//! Pixelscatter turns a raster image into a grid of colored particles that scatter away from the
//! pointer and ease back to their origins.
//!
//! The public API is engine-oriented:
//!
//! - Validate [`HoverOptions`] into a [`HoverConfig`]
//! - Create a [`MotionEngine`], attach a surface and load an image
//! - Feed [`HostEvent`]s and drive frames with a [`FrameClock`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Hover options and their validated form.
pub mod config;
/// Host notifications and scripted timelines.
pub mod host;
pub(crate) mod motion;
/// CPU drawing surface and frame readback.
pub mod render;
/// Block-average particle sampling.
pub mod sampler;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, ParticleColor, Point, Vec2};
pub use crate::foundation::error::{ScatterError, ScatterResult};

pub use crate::assets::decode::{PixelBuffer, decode_image};
pub use crate::assets::loader::{ImageLoader, PendingLoad};
pub use crate::assets::source::{FetchMode, ImageSource};
pub use crate::config::{BlockSide, HoverConfig, HoverOptions};
pub use crate::host::{EventScript, HostEvent, ScriptedEvent, TouchPoint};
pub use crate::motion::engine::{LoadStatus, MotionEngine, TickStats};
pub use crate::motion::frame_loop::{
    FrameClock, FrameObserver, FrameReport, FrameStatus, IntervalClock, LoopHandle, LoopState,
    VirtualClock,
};
pub use crate::motion::physics::{MotionParams, RestState, Step, step_particle};
pub use crate::motion::pointer::{Debouncer, DisplayRect, PointerState, ScaleState};
pub use crate::render::FrameRGBA;
pub use crate::render::cpu::{CpuSurface, DEFAULT_BACKING};
pub use crate::sampler::{Particle, ParticleGrid, sample};
