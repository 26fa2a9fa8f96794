// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag tracking: per-move deltas, total offset, and release velocity.
//!
//! ## Usage
//!
//! 1) Start tracking with [`DragState::start`] and the press position and time.
//! 2) On each move, call [`DragState::update`] to get the delta since the last move.
//! 3) Use [`DragState::distance`] to tell a tap from a drag.
//! 4) On release, [`DragState::release_velocity`] gives the fling velocity.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Vec2};
//! use sandpit_event_state::drag::DragState;
//!
//! let mut drag = DragState::default();
//! drag.start(Point::new(10.0, 20.0), 0);
//! assert!(drag.is_dragging());
//!
//! let delta = drag.update(Point::new(15.0, 25.0), 20).unwrap();
//! assert_eq!(delta, Vec2::new(5.0, 5.0));
//! assert_eq!(drag.total_offset(), Some(Vec2::new(5.0, 5.0)));
//!
//! // 5px over 20ms.
//! assert_eq!(drag.release_velocity(20, 100), Vec2::new(0.25, 0.25));
//! ```

use kurbo::{Point, Vec2};

/// Samples closer together than this (in ms) are merged when estimating velocity.
const VELOCITY_SAMPLE_MS: u64 = 16;

/// Tracks one drag: positions, timing, and a running velocity estimate.
#[derive(Debug, Clone, Default, Copy)]
pub struct DragState {
    /// Start position of the drag operation.
    pub start_pos: Option<Point>,
    /// Last recorded pointer position during drag.
    pub last_pos: Option<Point>,
    /// Time of the last recorded position, in milliseconds.
    pub last_time_ms: u64,
    /// Farthest the pointer has been from `start_pos`.
    max_distance: f64,
    /// Position and time the current velocity window started at.
    sample: Option<(Point, u64)>,
    /// Most recent velocity estimate, in pixels per millisecond.
    velocity: Vec2,
}

impl DragState {
    /// Start tracking a new drag operation from the given position.
    pub fn start(&mut self, pos: Point, time_ms: u64) {
        *self = Self {
            start_pos: Some(pos),
            last_pos: Some(pos),
            last_time_ms: time_ms,
            max_distance: 0.0,
            sample: Some((pos, time_ms)),
            velocity: Vec2::ZERO,
        };
    }

    /// Record a new position, returning the movement delta since the last one.
    ///
    /// Returns `None` when no drag is in progress.
    pub fn update(&mut self, pos: Point, time_ms: u64) -> Option<Vec2> {
        let start = self.start_pos?;
        let last = self.last_pos.unwrap_or(pos);
        self.last_pos = Some(pos);
        self.last_time_ms = time_ms;
        self.max_distance = self.max_distance.max((pos - start).hypot());

        match self.sample {
            Some((sample_pos, sample_time)) => {
                let dt = time_ms.saturating_sub(sample_time);
                if dt >= VELOCITY_SAMPLE_MS {
                    self.velocity = (pos - sample_pos) / millis(dt);
                    self.sample = Some((pos, time_ms));
                }
            }
            None => self.sample = Some((pos, time_ms)),
        }
        Some(pos - last)
    }

    /// Get total offset from the drag start to the last recorded position.
    #[must_use]
    pub fn total_offset(&self) -> Option<Vec2> {
        Some(self.last_pos? - self.start_pos?)
    }

    /// Largest distance from the start seen during this drag.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.max_distance
    }

    /// Velocity in pixels per millisecond to hand off on release.
    ///
    /// A pointer that sat still for longer than `idle_ms` before releasing
    /// has no velocity. A flick shorter than one sample window still reports
    /// the velocity of what it did cover.
    #[must_use]
    pub fn release_velocity(&self, now_ms: u64, idle_ms: u64) -> Vec2 {
        if self.start_pos.is_none() || now_ms.saturating_sub(self.last_time_ms) > idle_ms {
            return Vec2::ZERO;
        }
        if let (Some((sample_pos, sample_time)), Some(last)) = (self.sample, self.last_pos) {
            let dt = self.last_time_ms.saturating_sub(sample_time);
            if dt > 0 && self.velocity == Vec2::ZERO {
                return (last - sample_pos) / millis(dt);
            }
        }
        self.velocity
    }

    /// End the current drag operation and reset state.
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` while a drag operation is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.start_pos.is_some()
    }
}

fn millis(dt: u64) -> f64 {
    f64::from(u32::try_from(dt).unwrap_or(u32::MAX))
}
