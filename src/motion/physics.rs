//! Per-particle force model.
//!
//! Each frame a particle is either repelled by the pointer (inside the force radius), eased
//! toward its origin (outside the radius and displaced), or left untouched. This is a heuristic
//! relaxation, not an integrator: there is no velocity state between frames.

use crate::config::HoverConfig;
use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{ScatterError, ScatterResult};
use crate::motion::pointer::PointerState;
use crate::sampler::Particle;

/// Conceptual per-particle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestState {
    /// Position equals origin.
    AtRest,
    /// Position differs from origin.
    Displaced,
}

impl RestState {
    /// Classify a particle.
    pub fn of(particle: &Particle) -> Self {
        if particle.is_at_rest() {
            RestState::AtRest
        } else {
            RestState::Displaced
        }
    }
}

/// Force parameters consumed by [`step_particle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
    /// Pointer influence radius.
    pub force_radius: f64,
    /// Repel displacement scale.
    pub force_speed: f64,
    /// Easing fraction per frame.
    pub return_speed: f64,
    /// Snap-to-rest threshold.
    pub rest_epsilon: f64,
}

impl From<&HoverConfig> for MotionParams {
    fn from(cfg: &HoverConfig) -> Self {
        Self {
            force_radius: cfg.force_radius,
            force_speed: cfg.force_speed,
            return_speed: cfg.return_speed,
            rest_epsilon: cfg.rest_epsilon,
        }
    }
}

/// Outcome of one step for one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Pushed away from the pointer to this position.
    Repelled(Point),
    /// Eased toward origin, still displaced.
    Returning(Point),
    /// Came within the rest threshold and snapped to origin.
    Settled(Point),
    /// At rest outside the force radius; unchanged.
    Resting,
}

impl Step {
    /// New position, if the step moves the particle.
    pub fn position(self) -> Option<Point> {
        match self {
            Step::Repelled(p) | Step::Returning(p) | Step::Settled(p) => Some(p),
            Step::Resting => None,
        }
    }
}

/// Compute one frame of motion for a particle at `position` resting at `origin`.
///
/// When the pointer sits exactly on the particle the push direction defaults to `-x`
/// (the pointer is treated as lying on the `+x` side), so the particle receives the full
/// `force_speed` displacement instead of an undefined direction.
pub fn step_particle(
    position: Point,
    origin: Point,
    pointer: PointerState,
    params: &MotionParams,
) -> ScatterResult<Step> {
    if let Some(ptr) = pointer.point() {
        let to_pointer = ptr - position;
        let dist = to_pointer.hypot();
        if dist < params.force_radius {
            let force = (params.force_radius - dist) / params.force_radius;
            let dir = if dist > 0.0 {
                to_pointer / dist
            } else {
                Vec2::new(1.0, 0.0)
            };
            let next = position - dir * (force * params.force_speed);
            return finite(Step::Repelled(next));
        }
    }

    if position == origin {
        return Ok(Step::Resting);
    }

    let to_origin = origin - position;
    if to_origin.hypot() <= params.rest_epsilon {
        return Ok(Step::Settled(origin));
    }

    let next = position + to_origin * params.return_speed;
    // Easing can round back onto `position` when the gap is a few ulps wide.
    if next == position || (origin - next).hypot() <= params.rest_epsilon {
        return Ok(Step::Settled(origin));
    }
    finite(Step::Returning(next))
}

fn finite(step: Step) -> ScatterResult<Step> {
    match step.position() {
        Some(p) if !p.is_finite() => Err(ScatterError::motion(format!(
            "non-finite particle position ({}, {})",
            p.x, p.y
        ))),
        _ => Ok(step),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/physics.rs"]
mod tests;
