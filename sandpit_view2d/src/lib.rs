// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sandpit View 2D: the camera over a canvas's virtual space.
//!
//! A Sandpit canvas is an unbounded virtual plane that frames live on. This
//! crate models the camera looking at that plane:
//! - Pan and zoom, in virtual units or in client pixels.
//! - Zoom about a pivot so the point under the pointer stays put.
//! - Optional bounds for the visible region and for the zoom factor.
//! - Frame-driven inertia after a fling.
//! - A single change observer, called once per logical update.
//!
//! It does **not** read input events. Gesture interpretation lives one level
//! up (see `sandpit_event_state`), which turns pointer, touch, and wheel
//! input into the operations exposed here.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Point;
//! use sandpit_view2d::{AxisBounds, ViewPortBounds, ViewportCamera};
//!
//! let mut camera = ViewportCamera::default();
//! camera.update_container_size(800.0, 600.0);
//!
//! // Zoom in by 50% around the pointer.
//! let pointer = Point::new(200.0, 150.0);
//! let under_pointer = camera.client_to_virtual_point(pointer);
//! camera.move_by_in_client_space(0.0, 0.0, 0.5, Some(pointer));
//! assert_eq!(camera.zoom_factor(), 1.5);
//! let still_under = camera.client_to_virtual_point(pointer);
//! assert!((still_under.x - under_pointer.x).abs() < 1e-9);
//!
//! // Keep the view inside x in [0, 1000].
//! camera.set_bounds(ViewPortBounds::NONE.with_x(AxisBounds::new(0.0, 1000.0)));
//! camera.move_by(-5_000.0, 0.0);
//! assert_eq!(camera.left(), 0.0);
//! ```
//!
//! ## Inertia
//!
//! ```rust
//! use sandpit_view2d::ViewportCamera;
//!
//! let mut camera = ViewportCamera::default();
//! camera.update_container_size(800.0, 600.0);
//! camera.move_with_deceleration_in_client_space(-40.0, 0.0);
//!
//! // Call once per animation frame.
//! while camera.step() {}
//! assert!(camera.left() < 0.0);
//! ```
//!
//! ## Design notes
//!
//! - The zoom factor is uniform and always strictly positive; it never drops
//!   below [`MIN_ZOOM_FACTOR`].
//! - Bounds are applied on every commit, so a direct write can never leave
//!   the camera outside them.
//! - When the visible span is wider than a closed range on both sides, the
//!   range is centered instead of pinned to one edge.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod camera;
mod persist;

pub use bounds::{AxisBounds, ViewPortBounds};
pub use camera::{CameraOptions, MIN_ZOOM_FACTOR, UpdateObserver, ViewportCamera, ViewportState};
pub use persist::{SettleDebounce, ViewportSnapshot};
