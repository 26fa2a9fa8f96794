// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactable registry: which regions of a canvas take over presses.
//!
//! Elements inside a canvas may be tagged with an [`InteractableId`]. The
//! registry maps those ids to a [`Behavior`]. When a press lands on some
//! node, [`InteractableRegistry::resolve`] walks up from that node and the
//! innermost registered ancestor wins.
//!
//! ## Minimal example
//!
//! ```
//! use sandpit_event_state::interactable::{
//!     Behavior, ElementTree, InteractableId, InteractableRegistry,
//! };
//!
//! // A tiny tree: node 0 is the root, 1 is its child, 2 is 1's child.
//! struct Chain;
//! impl ElementTree for Chain {
//!     type Node = usize;
//!     fn parent(&self, node: usize) -> Option<usize> {
//!         node.checked_sub(1)
//!     }
//!     fn interactable_id(&self, node: usize) -> Option<InteractableId> {
//!         (node < 2).then_some(InteractableId(node as u64))
//!     }
//! }
//!
//! let mut registry = InteractableRegistry::new();
//! registry.register(InteractableId(0), Behavior::NoPan);
//! registry.register(InteractableId(1), Behavior::Capture);
//!
//! // Node 2 is untagged; its parent (1) is the innermost interactable.
//! assert_eq!(
//!     registry.resolve(&Chain, 2),
//!     Some((InteractableId(1), Behavior::Capture))
//! );
//!
//! registry.unregister(InteractableId(1));
//! assert_eq!(
//!     registry.resolve(&Chain, 2),
//!     Some((InteractableId(0), Behavior::NoPan))
//! );
//! ```

use core::fmt;

use hashbrown::HashMap;

/// Identifier attached to an interactable element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractableId(pub u64);

impl fmt::Display for InteractableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an interactable region treats presses that start inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Presses are left alone entirely: no panning, no capture.
    ///
    /// Used for regions with their own native interaction, such as text
    /// inputs or scrollable panes.
    NoPan,
    /// Presses are routed to the interactable instead of panning the canvas.
    Capture,
}

/// Read access to the host's element hierarchy.
///
/// The registry never owns elements; it only needs to walk from a node to
/// its ancestors and read the tags placed on them.
pub trait ElementTree {
    /// Handle to a node in the host tree.
    type Node: Copy;

    /// The parent of `node`, or `None` at the root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The interactable id tagged on `node`, if any.
    fn interactable_id(&self, node: Self::Node) -> Option<InteractableId>;

    /// Lowercase or uppercase tag name of `node` (for example `"a"`), if the
    /// host has one.
    fn tag_name(&self, node: Self::Node) -> Option<&str> {
        let _ = node;
        None
    }
}

/// Bookkeeping for the interactables currently mounted in one canvas.
#[derive(Clone, Debug, Default)]
pub struct InteractableRegistry {
    entries: HashMap<InteractableId, Behavior>,
}

impl InteractableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or re-registers) an interactable.
    ///
    /// Returns the previous behavior if `id` was already present.
    pub fn register(&mut self, id: InteractableId, behavior: Behavior) -> Option<Behavior> {
        log::trace!("interactable {id} registered as {behavior:?}");
        self.entries.insert(id, behavior)
    }

    /// Removes an interactable. Unknown ids are ignored.
    pub fn unregister(&mut self, id: InteractableId) -> Option<Behavior> {
        self.entries.remove(&id)
    }

    /// Behavior registered for `id`.
    #[must_use]
    pub fn get(&self, id: InteractableId) -> Option<Behavior> {
        self.entries.get(&id).copied()
    }

    /// Number of registered interactables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Finds the innermost registered interactable at or above `node`.
    ///
    /// Tags whose id is not registered (for example an element that is
    /// mid-unmount) are skipped and the walk continues upward.
    pub fn resolve<T: ElementTree>(
        &self,
        tree: &T,
        node: T::Node,
    ) -> Option<(InteractableId, Behavior)> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(id) = tree.interactable_id(n)
                && let Some(behavior) = self.get(id)
            {
                return Some((id, behavior));
            }
            current = tree.parent(n);
        }
        None
    }
}
