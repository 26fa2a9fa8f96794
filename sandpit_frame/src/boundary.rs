// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error boundary around evaluate + render.

use sandpit_jsx::{Artifact, EvalError, RenderError, RenderNode, Scope, evaluate, render};

/// A failure caught by an [`ErrorBoundary`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoundaryError {
    /// Evaluating the artifact failed.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Rendering the evaluated value failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What an [`ErrorBoundary`] shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryView<'a> {
    /// No artifact to render yet.
    Empty,
    /// A fresh render of the current artifact.
    Rendered(&'a RenderNode),
    /// The current artifact failed.
    Fallback {
        /// Most recent successful render, if there ever was one.
        last_good: Option<&'a RenderNode>,
        /// What went wrong.
        error: &'a BoundaryError,
    },
}

impl<'a> BoundaryView<'a> {
    /// The tree to display, if any. A fallback without a previous render
    /// displays nothing.
    #[must_use]
    pub fn node(&self) -> Option<&'a RenderNode> {
        match *self {
            Self::Empty => None,
            Self::Rendered(node) => Some(node),
            Self::Fallback { last_good, .. } => last_good,
        }
    }

    /// Returns `true` for [`BoundaryView::Fallback`].
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Catches evaluation and render failures so they never reach the host.
///
/// Once an artifact fails, the boundary keeps showing its fallback for that
/// artifact without retrying. Handing it a different artifact (by identity,
/// not by structure) clears the caught error and tries again.
#[derive(Clone, Debug, Default)]
pub struct ErrorBoundary {
    artifact: Option<Artifact>,
    last_good: Option<RenderNode>,
    caught: Option<BoundaryError>,
}

impl ErrorBoundary {
    /// Creates a boundary that has rendered nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `artifact` against `scope`, or falls back.
    pub fn render(&mut self, artifact: Option<&Artifact>, scope: &Scope) -> BoundaryView<'_> {
        let Some(artifact) = artifact else {
            self.artifact = None;
            self.caught = None;
            return BoundaryView::Empty;
        };
        let same = self.artifact.as_ref().is_some_and(|a| a.ptr_eq(artifact));
        if !same {
            self.artifact = Some(artifact.clone());
            self.caught = None;
        }
        if self.caught.is_none() {
            match run(artifact, scope) {
                Ok(node) => self.last_good = Some(node),
                Err(err) => {
                    log::warn!("frame render failed, showing fallback: {err}");
                    self.caught = Some(err);
                }
            }
        }
        match &self.caught {
            Some(error) => BoundaryView::Fallback {
                last_good: self.last_good.as_ref(),
                error,
            },
            None => self
                .last_good
                .as_ref()
                .map_or(BoundaryView::Empty, BoundaryView::Rendered),
        }
    }

    /// The error currently being shown a fallback for.
    #[must_use]
    pub fn caught(&self) -> Option<&BoundaryError> {
        self.caught.as_ref()
    }

    /// Forgets the caught error so the next render retries.
    pub fn reset(&mut self) {
        self.caught = None;
    }
}

fn run(artifact: &Artifact, scope: &Scope) -> Result<RenderNode, BoundaryError> {
    let value = evaluate(artifact, scope)?;
    Ok(render(&value)?)
}
