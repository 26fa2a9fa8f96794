// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge autoscroll: nudge the camera while a drag hugs the container edge.
//!
//! While a frame is being dragged, moving the pointer into the margin along
//! the container's border starts a repeating nudge in that direction. Only
//! one direction is ever active. Moving back inside stops it, and moving to
//! another edge stops the old nudge before starting the new one.
//!
//! The host calls [`EdgeAutoscroll::tick`] as often as its scheduler allows
//! (typically once per animation frame) to apply the nudge.
//!
//! ```
//! use kurbo::{Point, Rect};
//! use sandpit_event_state::autoscroll::{AutoscrollChange, EdgeAutoscroll, EdgeDirection};
//! use sandpit_view2d::ViewportCamera;
//!
//! let mut camera = ViewportCamera::default();
//! let mut autoscroll = EdgeAutoscroll::default();
//! autoscroll.begin(Rect::new(0.0, 0.0, 800.0, 600.0));
//!
//! let change = autoscroll.update(Point::new(400.0, 5.0));
//! assert_eq!(change, AutoscrollChange::Started(EdgeDirection::Up));
//! autoscroll.tick(&mut camera);
//! assert_eq!(camera.top(), -4.0);
//!
//! autoscroll.end();
//! assert!(!autoscroll.tick(&mut camera));
//! ```

use kurbo::{Point, Rect, Vec2};
use sandpit_view2d::ViewportCamera;

/// One of the eight nudge directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeDirection {
    /// Top-left corner.
    LeftUp,
    /// Top edge.
    Up,
    /// Top-right corner.
    RightUp,
    /// Right edge.
    Right,
    /// Bottom-right corner.
    RightDown,
    /// Bottom edge.
    Down,
    /// Bottom-left corner.
    LeftDown,
    /// Left edge.
    Left,
}

impl EdgeDirection {
    /// Unit step for this direction, with `y` growing downward.
    #[must_use]
    pub fn unit(self) -> Vec2 {
        let (x, y) = match self {
            Self::LeftUp => (-1.0, -1.0),
            Self::Up => (0.0, -1.0),
            Self::RightUp => (1.0, -1.0),
            Self::Right => (1.0, 0.0),
            Self::RightDown => (1.0, 1.0),
            Self::Down => (0.0, 1.0),
            Self::LeftDown => (-1.0, 1.0),
            Self::Left => (-1.0, 0.0),
        };
        Vec2::new(x, y)
    }
}

/// Tuning for [`EdgeAutoscroll`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoscrollOptions {
    /// Width of the edge band, in client pixels, that triggers scrolling.
    pub margin: f64,
    /// Distance moved per tick, in virtual units.
    pub step: f64,
}

impl Default for AutoscrollOptions {
    fn default() -> Self {
        Self {
            margin: 16.0,
            step: 4.0,
        }
    }
}

/// What an [`EdgeAutoscroll::update`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoscrollChange {
    /// Nothing changed.
    Unchanged,
    /// A nudge started from rest.
    Started(EdgeDirection),
    /// The old nudge stopped and a new one started.
    Switched {
        /// Direction that was active.
        from: EdgeDirection,
        /// Direction that is active now.
        to: EdgeDirection,
    },
    /// The active nudge stopped.
    Stopped(EdgeDirection),
}

/// Which edge band, if any, `pointer` is in.
///
/// Corners win over edges. Comparisons are strict, so a pointer exactly on
/// the inner edge of the band does not trigger.
#[must_use]
pub fn edge_direction(container: Rect, pointer: Point, margin: f64) -> Option<EdgeDirection> {
    let left = pointer.x < container.x0 + margin;
    let right = pointer.x > container.x1 - margin;
    let up = pointer.y < container.y0 + margin;
    let down = pointer.y > container.y1 - margin;
    if left && up {
        Some(EdgeDirection::LeftUp)
    } else if right && up {
        Some(EdgeDirection::RightUp)
    } else if right && down {
        Some(EdgeDirection::RightDown)
    } else if left && down {
        Some(EdgeDirection::LeftDown)
    } else if up {
        Some(EdgeDirection::Up)
    } else if right {
        Some(EdgeDirection::Right)
    } else if down {
        Some(EdgeDirection::Down)
    } else if left {
        Some(EdgeDirection::Left)
    } else {
        None
    }
}

/// Drives the edge nudge for one drag at a time.
#[derive(Clone, Debug, Default)]
pub struct EdgeAutoscroll {
    options: AutoscrollOptions,
    container: Option<Rect>,
    active: Option<EdgeDirection>,
}

impl EdgeAutoscroll {
    /// Creates an idle autoscroller.
    #[must_use]
    pub fn new(options: AutoscrollOptions) -> Self {
        Self {
            options,
            container: None,
            active: None,
        }
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> AutoscrollOptions {
        self.options
    }

    /// Starts watching a drag against `container` (client coordinates).
    ///
    /// Any nudge left over from a previous drag is stopped.
    pub fn begin(&mut self, container: Rect) {
        self.stop();
        self.container = Some(container);
    }

    /// Feeds a pointer position (client coordinates) during the drag.
    pub fn update(&mut self, pointer: Point) -> AutoscrollChange {
        let Some(container) = self.container else {
            return AutoscrollChange::Unchanged;
        };
        let next = edge_direction(container, pointer, self.options.margin);
        match (self.active, next) {
            (None, None) => AutoscrollChange::Unchanged,
            (Some(from), None) => {
                self.stop();
                AutoscrollChange::Stopped(from)
            }
            (None, Some(to)) => {
                log::trace!("autoscroll: start {to:?}");
                self.active = Some(to);
                AutoscrollChange::Started(to)
            }
            (Some(from), Some(to)) if from == to => AutoscrollChange::Unchanged,
            (Some(from), Some(to)) => {
                self.stop();
                log::trace!("autoscroll: switch {from:?} -> {to:?}");
                self.active = Some(to);
                AutoscrollChange::Switched { from, to }
            }
        }
    }

    /// Applies one nudge if a direction is active.
    ///
    /// Returns `true` if the camera was asked to move.
    pub fn tick(&mut self, camera: &mut ViewportCamera) -> bool {
        let Some(direction) = self.active else {
            return false;
        };
        let delta = direction.unit() * self.options.step;
        camera.move_by(delta.x, delta.y);
        true
    }

    /// Ends the drag: stops any nudge and forgets the container.
    pub fn end(&mut self) {
        self.stop();
        self.container = None;
    }

    /// The active direction, if any.
    #[must_use]
    pub fn active(&self) -> Option<EdgeDirection> {
        self.active
    }

    /// Returns `true` between [`begin`](Self::begin) and [`end`](Self::end).
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.container.is_some()
    }

    fn stop(&mut self) {
        if let Some(direction) = self.active.take() {
            log::trace!("autoscroll: stop {direction:?}");
        }
    }
}
