// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sandpit Frame: live JSX frames that survive typos and runtime errors.
//!
//! A frame shows the rendering of a JSX snippet that is being edited live.
//! Two kinds of failure must never blank it out:
//! - A source that does not compile (mid-edit): [`RenderFrame`] keeps the last
//!   artifact that compiled and keeps rendering it.
//! - An artifact that throws while evaluating or rendering: [`ErrorBoundary`]
//!   catches the error and shows a fallback.
//!
//! Around those sit the application-level pieces: [`FrameStore`] for frame
//! layout and selection, [`FrameSet`] for the live state of every stored
//! frame, [`insert_snippet`] for library snippets, and [`StatusMessages`] for
//! transient notices.
//!
//! ## Minimal example
//!
//! ```rust
//! use sandpit_frame::{ErrorBoundary, FrameStatus, RenderFrame};
//! use sandpit_jsx::Scope;
//!
//! let scope = Scope::new();
//! let mut frame = RenderFrame::with_source("<p>Hello</p>");
//! let mut boundary = ErrorBoundary::new();
//!
//! // Mid-edit the source is broken; the old artifact keeps rendering.
//! frame.on_source_change("<p>Hello</");
//! assert_eq!(frame.status(), FrameStatus::Stale);
//! let view = boundary.render(frame.artifact(), &scope);
//! assert_eq!(view.node().unwrap().to_string(), "<p>Hello</p>");
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `sandpit_jsx/std`.
//! - `serde`: derives `Serialize`/`Deserialize` for [`FrameConfig`] and
//!   [`FrameId`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod boundary;
mod frame;
mod snippet;
mod status;
mod store;

pub use boundary::{BoundaryError, BoundaryView, ErrorBoundary};
pub use frame::{FrameStatus, FrameUpdate, RenderFrame};
pub use snippet::{InsertError, check_snippet_location, insert_snippet};
pub use status::{STATUS_MESSAGE_DURATION_MS, StatusMessage, StatusMessages, Tone};
pub use store::{FrameCommand, FrameConfig, FrameEvent, FrameEvents, FrameId, FrameSet, FrameStore};
