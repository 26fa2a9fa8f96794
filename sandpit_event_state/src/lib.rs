// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sandpit Event State: input handling for pannable, zoomable canvases.
//!
//! This crate sits between the host's raw input and the camera from
//! `sandpit_view2d`. Each module handles one piece:
//!
//! - [`interactable`]: which elements take over presses, resolved innermost-first
//! - [`drag`]: per-move deltas, tap slop, and release velocity for one drag
//! - [`gesture`]: press, pan, pinch, and wheel interpretation
//! - [`autoscroll`]: nudging the camera while a drag hugs the container edge
//! - [`space`]: one canvas's camera and interaction state, with a symmetric lifecycle
//!
//! ## Design Philosophy
//!
//! Everything here is a plain state machine fed by the host. Nothing
//! schedules its own timers: inertia and autoscroll advance only when the
//! host calls [`Space::animation_frame`] (or the underlying `step`/`tick`),
//! so tearing a canvas down is synchronous and leaves nothing running.
//!
//! The crate does not know about any particular UI toolkit. Hit-testing goes
//! through the [`ElementTree`] trait, and positions are container-relative
//! client pixels supplied by the host.
//!
//! ## Usage
//!
//! ```rust
//! use kurbo::{Point, Size};
//! use sandpit_event_state::{
//!     Behavior, Buttons, ElementTree, GestureEvent, InputEvent, InteractableId,
//!     ResizeSource, ResizeSubscription, Space, SpaceOptions,
//! };
//!
//! struct Host;
//! impl ResizeSource for Host {
//!     fn subscribe(&mut self) -> ResizeSubscription { ResizeSubscription(1) }
//!     fn unsubscribe(&mut self, _: ResizeSubscription) {}
//!     fn container_size(&self) -> Size { Size::new(800.0, 600.0) }
//! }
//!
//! // Node 7 is a frame's drag handle; everything else is background.
//! struct Tree;
//! impl ElementTree for Tree {
//!     type Node = u32;
//!     fn parent(&self, _: u32) -> Option<u32> { None }
//!     fn interactable_id(&self, node: u32) -> Option<InteractableId> {
//!         (node == 7).then_some(InteractableId(7))
//!     }
//! }
//!
//! let mut host = Host;
//! let mut space = Space::create(&mut host, SpaceOptions::default(), |_| {});
//! space.register_interactable(InteractableId(7), Behavior::Capture);
//!
//! // Dragging the background pans.
//! let down = |target| InputEvent::MouseDown {
//!     position: Point::new(100.0, 100.0),
//!     buttons: Buttons::PRIMARY,
//!     target,
//! };
//! space.handle_input(&Tree, down(None), 0);
//! space.handle_input(&Tree, InputEvent::MouseMove {
//!     position: Point::new(80.0, 100.0),
//!     buttons: Buttons::PRIMARY,
//!     target: None,
//! }, 16);
//! space.handle_input(&Tree, InputEvent::MouseUp { position: Point::new(80.0, 100.0) }, 400);
//! assert_eq!(space.camera().left(), 20.0);
//!
//! // Pressing the handle is routed to the host instead.
//! let events = space.handle_input(&Tree, down(Some(7)), 500);
//! assert!(matches!(
//!     events.as_slice(),
//!     [GestureEvent::PressStart { target: Some(InteractableId(7)), .. }]
//! ));
//!
//! // Tearing down while the handle is held cancels the press.
//! let cancelled = space.destroy(&mut host);
//! assert!(matches!(cancelled.as_slice(), [GestureEvent::PressCancel { .. }]));
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo's and the camera's `std` feature.
//! - `libm`: floating-point support without `std`.
//!
//! This crate is `no_std` compatible (with `alloc`) for all modules.

#![no_std]

extern crate alloc;

pub mod autoscroll;
pub mod drag;
pub mod gesture;
pub mod interactable;
pub mod space;

pub use autoscroll::{AutoscrollChange, AutoscrollOptions, EdgeAutoscroll, EdgeDirection};
pub use gesture::{
    Buttons, GestureContext, GestureEvent, GestureEvents, GestureInterpreter, GestureOptions,
    GesturePhase, InputEvent, Modifiers, PointerKind, PressCoordinates, PressDecision,
    PressPolicy, PressRequest, Touches, WheelDeltaMode,
};
pub use interactable::{Behavior, ElementTree, InteractableId, InteractableRegistry};
pub use space::{ResizeSource, ResizeSubscription, Space, SpaceOptions};
