//! Cancellable per-frame loop driving [`MotionEngine`].
//!
//! The loop is an explicit `Stopped -> Running -> Stopped` state machine. [`MotionEngine::run`]
//! hands out a [`LoopHandle`]; cancelling it (or detaching the surface) stops the loop before
//! its next frame. Frames are strictly sequential: one `tick` followed by one `render`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::{Fps, FrameIndex};
use crate::motion::engine::{MotionEngine, TickStats};

/// Cancellation token for a running loop. Cheap to clone and safe to cancel from any thread.
#[derive(Clone, Debug, Default)]
pub struct LoopHandle {
    cancelled: Arc<AtomicBool>,
}

impl LoopHandle {
    /// Request the loop to stop before its next frame.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Return `true` once [`LoopHandle::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Loop lifecycle.
#[derive(Clone, Debug, Default)]
pub enum LoopState {
    /// No loop scheduled.
    #[default]
    Stopped,
    /// Frames execute until the handle is cancelled.
    Running(LoopHandle),
}

/// What one frame callback did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The loop is stopped; nothing ran.
    Stopped,
    /// Running, but the surface or grid is not ready yet.
    Waiting,
    /// One tick and one render ran.
    Rendered(TickStats),
    /// The tick faulted; positions were kept and the last-known-good state was rendered.
    Faulted,
}

/// Result of one frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Index of the frame that ran (or would have run, when stopped).
    pub index: FrameIndex,
    /// Outcome.
    pub status: FrameStatus,
}

/// Source of display refresh signals.
pub trait FrameClock {
    /// Block until the next refresh and return its timestamp, or `None` when the host stops
    /// delivering frames.
    fn next_frame(&mut self) -> Option<Instant>;
}

/// Real-time clock that sleeps until each refresh deadline.
#[derive(Clone, Debug)]
pub struct IntervalClock {
    period: Duration,
    next: Option<Instant>,
}

impl IntervalClock {
    /// Clock refreshing at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self {
            period: fps.frame_duration(),
            next: None,
        }
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&mut self) -> Option<Instant> {
        let now = Instant::now();
        let deadline = match self.next {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                deadline
            }
            // Missed deadlines resync instead of bursting to catch up.
            _ => now,
        };
        self.next = Some(deadline + self.period);
        Some(deadline)
    }
}

/// Deterministic clock: advances a virtual timestamp by one period per frame without sleeping.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    now: Instant,
    period: Duration,
    remaining: Option<u64>,
}

impl VirtualClock {
    /// Unbounded virtual clock starting at `start`.
    pub fn new(fps: Fps, start: Instant) -> Self {
        Self {
            now: start,
            period: fps.frame_duration(),
            remaining: None,
        }
    }

    /// Stop delivering frames after `frames` refreshes.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameClock for VirtualClock {
    fn next_frame(&mut self) -> Option<Instant> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let t = self.now;
        self.now += self.period;
        Some(t)
    }
}

/// Hooks invoked around each frame by [`MotionEngine::drive`].
///
/// `before_frame` is where host events are delivered; `after_frame` sees the painted surface.
pub trait FrameObserver {
    /// Called before frame `index` runs.
    fn before_frame(&mut self, _engine: &mut MotionEngine, _index: FrameIndex, _now: Instant) {}

    /// Called after a frame ran.
    fn after_frame(&mut self, _engine: &mut MotionEngine, _report: &FrameReport) {}
}

impl FrameObserver for () {}

impl MotionEngine {
    /// Move to `Running` and return the handle that cancels this run.
    ///
    /// A loop that is already running is cancelled first, so at most one loop is live.
    pub fn run(&mut self) -> LoopHandle {
        if let LoopState::Running(old) = &self.loop_state {
            old.cancel();
        }
        let handle = LoopHandle::default();
        self.loop_state = LoopState::Running(handle.clone());
        handle
    }

    /// Cancel the current loop, if any, and move to `Stopped`.
    pub fn stop(&mut self) {
        if let LoopState::Running(handle) = &self.loop_state {
            handle.cancel();
        }
        self.loop_state = LoopState::Stopped;
    }

    /// Return `true` while a loop is running and its handle is not cancelled.
    pub fn is_running(&self) -> bool {
        matches!(&self.loop_state, LoopState::Running(h) if !h.is_cancelled())
    }

    /// One display-refresh callback: collect loads, commit debounced layout, tick, render.
    ///
    /// Faults inside the tick are logged and the frame renders the last-known-good state; they
    /// never stop the loop.
    pub fn frame(&mut self, now: Instant) -> FrameReport {
        let index = self.frame;
        if !self.is_running() {
            self.loop_state = LoopState::Stopped;
            return FrameReport {
                index,
                status: FrameStatus::Stopped,
            };
        }

        self.poll_load();
        self.flush_resize(now);

        let status = if !self.is_ready() {
            FrameStatus::Waiting
        } else {
            let status = match self.tick() {
                Ok(stats) => FrameStatus::Rendered(stats),
                Err(e) => {
                    tracing::warn!(frame = index.0, error = %e, "tick faulted; keeping last-known-good positions");
                    FrameStatus::Faulted
                }
            };
            self.render();
            status
        };

        self.frame = FrameIndex(index.0 + 1);
        FrameReport { index, status }
    }

    /// Run frames from `clock` until the loop is cancelled or the clock ends.
    ///
    /// Returns the number of frames that ran.
    pub fn drive<C, O>(&mut self, clock: &mut C, observer: &mut O) -> u64
    where
        C: FrameClock + ?Sized,
        O: FrameObserver + ?Sized,
    {
        let mut ran = 0u64;
        while self.is_running() {
            let Some(now) = clock.next_frame() else {
                break;
            };
            let index = self.frame;
            observer.before_frame(self, index, now);

            let report = self.frame(now);
            if report.status == FrameStatus::Stopped {
                break;
            }
            ran += 1;
            observer.after_frame(self, &report);
        }
        if !self.is_running() {
            self.loop_state = LoopState::Stopped;
        }
        ran
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/frame_loop.rs"]
mod tests;
