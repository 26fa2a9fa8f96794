// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transient status messages that dismiss themselves.

use alloc::borrow::Cow;

/// How long a status message stays up, in milliseconds.
pub const STATUS_MESSAGE_DURATION_MS: u64 = 3000;

/// Whether a message reports success or a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Something worked.
    Positive,
    /// Something was refused.
    Critical,
}

/// A short message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    /// Text to show.
    pub message: Cow<'static, str>,
    /// Tone to show it in.
    pub tone: Tone,
}

impl StatusMessage {
    /// A positive message.
    pub fn positive(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Positive,
        }
    }

    /// A critical message.
    pub fn critical(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Critical,
        }
    }
}

/// The single visible status message and its dismissal deadline.
///
/// Showing a new message replaces the old one and restarts the timer.
#[derive(Clone, Debug)]
pub struct StatusMessages {
    duration_ms: u64,
    current: Option<(StatusMessage, u64)>,
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self::new(STATUS_MESSAGE_DURATION_MS)
    }
}

impl StatusMessages {
    /// Messages that stay up for `duration_ms`.
    #[must_use]
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            current: None,
        }
    }

    /// Shows `message` from `now_ms`.
    pub fn show(&mut self, message: StatusMessage, now_ms: u64) {
        let deadline = now_ms.saturating_add(self.duration_ms);
        self.current = Some((message, deadline));
    }

    /// The visible message, if any.
    #[must_use]
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref().map(|(message, _)| message)
    }

    /// Dismisses the message once its time is up, returning it.
    pub fn poll(&mut self, now_ms: u64) -> Option<StatusMessage> {
        match &self.current {
            Some((_, deadline)) if now_ms >= *deadline => self.current.take().map(|(m, _)| m),
            _ => None,
        }
    }

    /// Dismisses the message right away.
    pub fn dismiss(&mut self) -> Option<StatusMessage> {
        self.current.take().map(|(message, _)| message)
    }
}
