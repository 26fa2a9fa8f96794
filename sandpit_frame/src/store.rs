// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame store and the live frames that mirror it.
//!
//! [`FrameStore`] is plain data: frame configurations plus the selection,
//! changed only by [`FrameStore::apply`]. [`FrameSet`] owns the compiled
//! state and error boundary of every stored frame and follows the store
//! through [`FrameSet::sync`].

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use sandpit_jsx::Scope;
use smallvec::SmallVec;

use crate::boundary::{BoundaryView, ErrorBoundary};
use crate::frame::RenderFrame;

/// Identifier of a stored frame. Never reused within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {}", self.0)
    }
}

/// Persisted layout and source of one frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameConfig {
    /// Identifier.
    pub id: FrameId,
    /// JSX source.
    pub code: String,
    /// Left edge in canvas space.
    pub x: f64,
    /// Top edge in canvas space.
    pub y: f64,
    /// Width in canvas units.
    pub width: f64,
    /// Height in canvas units.
    pub height: f64,
}

/// A requested change to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameCommand {
    /// Adds a frame and selects nothing new.
    Add {
        /// JSX source.
        code: String,
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Moves a frame.
    Move {
        /// Frame to move.
        id: FrameId,
        /// New left edge.
        x: f64,
        /// New top edge.
        y: f64,
    },
    /// Resizes a frame.
    Resize {
        /// Frame to resize.
        id: FrameId,
        /// New width.
        width: f64,
        /// New height.
        height: f64,
    },
    /// Replaces a frame's source.
    UpdateCode {
        /// Frame to edit.
        id: FrameId,
        /// New JSX source.
        code: String,
    },
    /// Changes the selection.
    Select(Option<FrameId>),
    /// Removes a frame.
    Delete(FrameId),
}

/// What a command changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// A frame was added.
    Added(FrameId),
    /// A frame moved.
    Moved(FrameId),
    /// A frame was resized.
    Resized(FrameId),
    /// A frame's source changed.
    CodeChanged(FrameId),
    /// The selection changed.
    SelectionChanged {
        /// Previously selected frame.
        from: Option<FrameId>,
        /// Newly selected frame.
        to: Option<FrameId>,
    },
    /// A frame was removed.
    Deleted(FrameId),
}

/// Events produced by one command.
pub type FrameEvents = SmallVec<[FrameEvent; 2]>;

/// Frame configurations in insertion order, plus the selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStore {
    frames: Vec<FrameConfig>,
    selected: Option<FrameId>,
    next_id: u64,
}

impl FrameStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from persisted frames. Ids continue after the
    /// largest one seen; duplicate ids keep their first occurrence.
    #[must_use]
    pub fn from_frames(frames: impl IntoIterator<Item = FrameConfig>) -> Self {
        let mut store = Self::new();
        for mut frame in frames {
            if store.index_of(frame.id).is_some() {
                log::debug!("dropping duplicate {}", frame.id);
                continue;
            }
            sanitize_position(&mut frame.x, &mut frame.y);
            sanitize_size(&mut frame.width, &mut frame.height);
            store.next_id = store.next_id.max(frame.id.0.saturating_add(1));
            store.frames.push(frame);
        }
        store
    }

    /// All frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[FrameConfig] {
        &self.frames
    }

    /// Looks up a frame.
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&FrameConfig> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// The selected frame, if any.
    #[must_use]
    pub fn selected(&self) -> Option<FrameId> {
        self.selected
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn index_of(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().position(|f| f.id == id)
    }

    /// Applies `command` and reports what changed.
    ///
    /// Commands naming an unknown frame change nothing and return no events.
    /// Non-finite positions become `0` and sizes are clamped to `0` or more.
    pub fn apply(&mut self, command: FrameCommand) -> FrameEvents {
        let mut events = FrameEvents::new();
        match command {
            FrameCommand::Add {
                code,
                mut x,
                mut y,
                mut width,
                mut height,
            } => {
                sanitize_position(&mut x, &mut y);
                sanitize_size(&mut width, &mut height);
                let id = FrameId(self.next_id);
                self.next_id += 1;
                self.frames.push(FrameConfig {
                    id,
                    code,
                    x,
                    y,
                    width,
                    height,
                });
                events.push(FrameEvent::Added(id));
            }
            FrameCommand::Move { id, mut x, mut y } => {
                sanitize_position(&mut x, &mut y);
                if let Some(i) = self.index_of(id) {
                    let frame = &mut self.frames[i];
                    if frame.x != x || frame.y != y {
                        frame.x = x;
                        frame.y = y;
                        events.push(FrameEvent::Moved(id));
                    }
                }
            }
            FrameCommand::Resize {
                id,
                mut width,
                mut height,
            } => {
                sanitize_size(&mut width, &mut height);
                if let Some(i) = self.index_of(id) {
                    let frame = &mut self.frames[i];
                    if frame.width != width || frame.height != height {
                        frame.width = width;
                        frame.height = height;
                        events.push(FrameEvent::Resized(id));
                    }
                }
            }
            FrameCommand::UpdateCode { id, code } => {
                if let Some(i) = self.index_of(id)
                    && self.frames[i].code != code
                {
                    self.frames[i].code = code;
                    events.push(FrameEvent::CodeChanged(id));
                }
            }
            FrameCommand::Select(to) => {
                let to = to.filter(|id| self.index_of(*id).is_some());
                if to != self.selected {
                    let from = core::mem::replace(&mut self.selected, to);
                    events.push(FrameEvent::SelectionChanged { from, to });
                }
            }
            FrameCommand::Delete(id) => {
                if let Some(i) = self.index_of(id) {
                    self.frames.remove(i);
                    events.push(FrameEvent::Deleted(id));
                    if self.selected == Some(id) {
                        self.selected = None;
                        events.push(FrameEvent::SelectionChanged {
                            from: Some(id),
                            to: None,
                        });
                    }
                }
            }
        }
        if events.is_empty() {
            log::trace!("frame command changed nothing");
        }
        events
    }
}

fn sanitize_position(x: &mut f64, y: &mut f64) {
    for v in [x, y] {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
}

fn sanitize_size(width: &mut f64, height: &mut f64) {
    for v in [width, height] {
        *v = if v.is_finite() { v.max(0.0) } else { 0.0 };
    }
}

#[derive(Debug, Default)]
struct LiveFrame {
    frame: RenderFrame,
    boundary: ErrorBoundary,
}

/// Live state for every frame in a [`FrameStore`].
#[derive(Debug, Default)]
pub struct FrameSet {
    live: HashMap<FrameId, LiveFrame>,
}

impl FrameSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the set in line with `store`.
    ///
    /// Frames new to the store are created and compiled, removed frames are
    /// dropped, and every remaining frame sees its current source.
    pub fn sync(&mut self, store: &FrameStore) {
        self.live.retain(|id, _| {
            let keep = store.get(*id).is_some();
            if !keep {
                log::debug!("dropping live state of {id}");
            }
            keep
        });
        for config in store.frames() {
            self.live
                .entry(config.id)
                .or_default()
                .frame
                .on_source_change(&config.code);
        }
    }

    /// The compiled state of a frame.
    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&RenderFrame> {
        self.live.get(&id).map(|live| &live.frame)
    }

    /// Renders a frame against `scope` through its error boundary.
    ///
    /// Returns `None` for a frame the set does not hold.
    pub fn render(&mut self, id: FrameId, scope: &Scope) -> Option<BoundaryView<'_>> {
        let live = self.live.get_mut(&id)?;
        Some(live.boundary.render(live.frame.artifact(), scope))
    }

    /// Number of live frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no frames are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn add(store: &mut FrameStore, code: &str) -> FrameId {
        match store
            .apply(FrameCommand::Add {
                code: code.to_string(),
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            })
            .as_slice()
        {
            [FrameEvent::Added(id)] => *id,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn ids_are_not_reused() {
        let mut store = FrameStore::new();
        let a = add(&mut store, "<a />");
        store.apply(FrameCommand::Delete(a));
        let b = add(&mut store, "<b />");
        assert_ne!(a, b);
    }

    #[test]
    fn deleting_the_selection_clears_it() {
        let mut store = FrameStore::new();
        let a = add(&mut store, "<a />");
        store.apply(FrameCommand::Select(Some(a)));
        let events = store.apply(FrameCommand::Delete(a));
        assert_eq!(
            events.as_slice(),
            [
                FrameEvent::Deleted(a),
                FrameEvent::SelectionChanged {
                    from: Some(a),
                    to: None
                }
            ]
        );
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn unknown_ids_and_no_ops_produce_no_events() {
        let mut store = FrameStore::new();
        let a = add(&mut store, "<a />");
        let ghost = FrameId(99);
        assert!(store.apply(FrameCommand::Delete(ghost)).is_empty());
        assert!(store.apply(FrameCommand::Select(Some(ghost))).is_empty());
        assert!(
            store
                .apply(FrameCommand::Move { id: a, x: 0.0, y: 0.0 })
                .is_empty()
        );
        assert!(
            store
                .apply(FrameCommand::UpdateCode {
                    id: a,
                    code: "<a />".to_string()
                })
                .is_empty()
        );
    }

    #[test]
    fn sizes_are_sanitized() {
        let mut store = FrameStore::new();
        let a = add(&mut store, "");
        store.apply(FrameCommand::Resize {
            id: a,
            width: -10.0,
            height: f64::NAN,
        });
        let frame = store.get(a).unwrap();
        assert_eq!((frame.width, frame.height), (0.0, 0.0));
        store.apply(FrameCommand::Move {
            id: a,
            x: f64::INFINITY,
            y: 3.0,
        });
        assert_eq!(store.get(a).unwrap().x, 0.0);
    }

    #[test]
    fn restored_stores_continue_ids() {
        let frame = |id| FrameConfig {
            id: FrameId(id),
            code: String::new(),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let mut store = FrameStore::from_frames([frame(4), frame(2), frame(4)]);
        assert_eq!(store.len(), 2);
        assert_eq!(add(&mut store, ""), FrameId(5));
    }

    #[test]
    fn frame_set_follows_the_store() {
        let mut store = FrameStore::new();
        let a = add(&mut store, "<p>a</p>");
        let b = add(&mut store, "<p>b</p>");
        let mut set = FrameSet::new();
        set.sync(&store);
        assert_eq!(set.len(), 2);

        store.apply(FrameCommand::Delete(a));
        store.apply(FrameCommand::UpdateCode {
            id: b,
            code: "<p>c</p>".to_string(),
        });
        set.sync(&store);
        assert!(set.frame(a).is_none());
        assert!(set.render(a, &Scope::new()).is_none());
        let view = set.render(b, &Scope::new()).unwrap();
        assert_eq!(view.node().unwrap().to_string(), "<p>c</p>");
    }
}
