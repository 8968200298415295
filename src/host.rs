//! Notifications delivered by the hosting environment, and a replayable timeline of them.

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ScatterError, ScatterResult};
use crate::motion::pointer::DisplayRect;

/// One page-relative touch contact.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TouchPoint {
    /// Page-relative x.
    pub page_x: f64,
    /// Page-relative y.
    pub page_y: f64,
}

/// Input notification from the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Pointer moved over the surface.
    PointerMove {
        /// Page-relative x.
        page_x: f64,
        /// Page-relative y.
        page_y: f64,
    },
    /// Pointer left the surface.
    PointerLeave,
    /// Touch contacts moved; the first contact is the primary one.
    TouchMove {
        /// Active contacts.
        touches: Vec<TouchPoint>,
    },
    /// All touch contacts ended.
    TouchEnd,
    /// The surface's page layout changed.
    Resize {
        /// New page-relative layout box.
        rect: DisplayRect,
    },
}

/// Host event scheduled for delivery before a given frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScriptedEvent {
    /// Frame before whose tick the event is delivered.
    pub frame: u64,
    /// The event.
    pub event: HostEvent,
}

fn default_fps() -> u32 {
    60
}

/// Replayable timeline of host events.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventScript {
    /// Refresh rate of the virtual display.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Surface layout at mount time; defaults to the image's native size at the page origin.
    #[serde(default)]
    pub display: Option<DisplayRect>,
    /// Events, delivered in frame order (stable for equal frames).
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

impl Default for EventScript {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            display: None,
            events: Vec::new(),
        }
    }
}

impl EventScript {
    /// Parse and validate a script from JSON text.
    pub fn from_json_str(s: &str) -> ScatterResult<Self> {
        let mut script: EventScript = serde_json::from_str(s)
            .map_err(|e| ScatterError::serde(format!("event script: {e}")))?;
        script.validate()?;
        script.events.sort_by_key(|e| e.frame);
        Ok(script)
    }

    /// Check the refresh rate and display rect.
    pub fn validate(&self) -> ScatterResult<()> {
        self.fps()?;
        if let Some(rect) = self.display
            && !rect.is_usable()
        {
            return Err(ScatterError::validation(
                "event script display rect must be finite with positive width",
            ));
        }
        Ok(())
    }

    /// Refresh rate as [`Fps`].
    pub fn fps(&self) -> ScatterResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Events scheduled for `frame`, in script order.
    pub fn events_at(&self, frame: FrameIndex) -> impl Iterator<Item = &HostEvent> {
        self.events
            .iter()
            .filter(move |e| e.frame == frame.0)
            .map(|e| &e.event)
    }
}

#[cfg(test)]
#[path = "../tests/unit/host.rs"]
mod tests;
