// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// The persisted part of a camera: where it looks and how close.
///
/// Container size is deliberately absent; it belongs to the host element and
/// is re-measured on mount.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportSnapshot {
    /// Virtual-space x at the container's left edge.
    pub left: f64,
    /// Virtual-space y at the container's top edge.
    pub top: f64,
    /// Zoom factor.
    pub zoom: f64,
}

impl Default for ViewportSnapshot {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            zoom: 1.0,
        }
    }
}

/// Trailing-edge debounce for persisting camera positions.
///
/// Every camera update calls [`note`]. The host polls with the current time;
/// once `delay_ms` has passed without a new note, [`poll`] hands back the
/// most recent snapshot exactly once.
///
/// [`note`]: SettleDebounce::note
/// [`poll`]: SettleDebounce::poll
#[derive(Clone, Debug, PartialEq)]
pub struct SettleDebounce {
    delay_ms: u64,
    pending: Option<(ViewportSnapshot, u64)>,
}

impl Default for SettleDebounce {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY_MS)
    }
}

impl SettleDebounce {
    /// Quiet period before a position counts as settled.
    pub const DEFAULT_DELAY_MS: u64 = 500;

    /// Creates a debounce with the given quiet period.
    #[must_use]
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Records a snapshot observed at `now_ms`, restarting the quiet period.
    pub fn note(&mut self, snapshot: ViewportSnapshot, now_ms: u64) {
        self.pending = Some((snapshot, now_ms));
    }

    /// Returns the settled snapshot if the quiet period has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<ViewportSnapshot> {
        let (snapshot, at) = self.pending?;
        if now_ms.saturating_sub(at) >= self.delay_ms {
            self.pending = None;
            Some(snapshot)
        } else {
            None
        }
    }

    /// Returns the pending snapshot immediately, if any.
    pub fn flush(&mut self) -> Option<ViewportSnapshot> {
        self.pending.take().map(|(snapshot, _)| snapshot)
    }

    /// Drops the pending snapshot.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Returns `true` if a snapshot is waiting to settle.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
