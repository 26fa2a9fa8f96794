// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A frame's compiled state, which survives typos.

use alloc::string::String;

use sandpit_jsx::{Artifact, CompileError, compile};

/// Where a [`RenderFrame`] stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Nothing has compiled yet.
    Empty,
    /// The current source compiled.
    Valid,
    /// The current source does not compile; the last good artifact is kept.
    Stale,
}

/// Result of feeding new source to a [`RenderFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameUpdate {
    /// The source is identical to what the frame already holds.
    Unchanged,
    /// The source compiled and replaced the artifact.
    Compiled,
    /// The source failed to compile; the previous artifact (if any) stays.
    Retained,
}

/// Compiles a frame's source as it changes and keeps the last good result.
///
/// Once any compile has succeeded the frame always holds an artifact; a
/// failed compile never clears it, only a later successful one replaces it.
/// The compile error of the current source is kept as a diagnostic for an
/// editor linter and is never shown in place of the render.
#[derive(Clone, Debug, Default)]
pub struct RenderFrame {
    source: String,
    last_valid: Option<Artifact>,
    diagnostic: Option<CompileError>,
}

impl RenderFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame and compiles `source` into it.
    #[must_use]
    pub fn with_source(source: &str) -> Self {
        let mut frame = Self::new();
        frame.compile_into(source);
        frame
    }

    /// Recompiles after an edit.
    pub fn on_source_change(&mut self, source: &str) -> FrameUpdate {
        if source == self.source && (self.last_valid.is_some() || self.diagnostic.is_some()) {
            return FrameUpdate::Unchanged;
        }
        self.compile_into(source)
    }

    fn compile_into(&mut self, source: &str) -> FrameUpdate {
        self.source.clear();
        self.source.push_str(source);
        match compile(source) {
            Ok(artifact) => {
                self.last_valid = Some(artifact);
                self.diagnostic = None;
                FrameUpdate::Compiled
            }
            Err(err) => {
                log::debug!("frame: keeping previous render, compile failed: {err}");
                self.diagnostic = Some(err);
                FrameUpdate::Retained
            }
        }
    }

    /// The artifact to render: the last one that compiled.
    #[must_use]
    pub fn artifact(&self) -> Option<&Artifact> {
        self.last_valid.as_ref()
    }

    /// The source most recently fed in, valid or not.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Why the current source does not compile, if it does not.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&CompileError> {
        self.diagnostic.as_ref()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> FrameStatus {
        match (&self.last_valid, &self.diagnostic) {
            (None, _) => FrameStatus::Empty,
            (Some(_), None) => FrameStatus::Valid,
            (Some(_), Some(_)) => FrameStatus::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_before_any_success_stays_empty() {
        let mut frame = RenderFrame::new();
        assert_eq!(frame.status(), FrameStatus::Empty);
        assert_eq!(frame.on_source_change("<a>"), FrameUpdate::Retained);
        assert_eq!(frame.status(), FrameStatus::Empty);
        assert!(frame.artifact().is_none());
        assert!(frame.diagnostic().is_some());
    }

    #[test]
    fn failure_after_success_is_stale_and_keeps_the_artifact() {
        let mut frame = RenderFrame::with_source("<b>ok</b>");
        assert_eq!(frame.status(), FrameStatus::Valid);
        let good = frame.artifact().cloned().unwrap();

        assert_eq!(frame.on_source_change("<b>ok</"), FrameUpdate::Retained);
        assert_eq!(frame.status(), FrameStatus::Stale);
        assert!(frame.artifact().unwrap().ptr_eq(&good));
        assert_eq!(frame.source(), "<b>ok</");

        assert_eq!(frame.on_source_change("<b>ok!</b>"), FrameUpdate::Compiled);
        assert_eq!(frame.status(), FrameStatus::Valid);
        assert!(!frame.artifact().unwrap().ptr_eq(&good));
        assert!(frame.diagnostic().is_none());
    }

    #[test]
    fn identical_source_is_not_recompiled() {
        let mut frame = RenderFrame::with_source("<i />");
        let first = frame.artifact().cloned().unwrap();
        assert_eq!(frame.on_source_change("<i />"), FrameUpdate::Unchanged);
        assert!(frame.artifact().unwrap().ptr_eq(&first));
    }

    #[test]
    fn empty_source_compiles() {
        let mut frame = RenderFrame::new();
        assert_eq!(frame.on_source_change(""), FrameUpdate::Compiled);
        assert_eq!(frame.status(), FrameStatus::Valid);
        assert!(frame.artifact().unwrap().is_empty());
    }
}
