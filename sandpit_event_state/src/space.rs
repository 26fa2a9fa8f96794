// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One pannable, zoomable canvas: camera, gestures, interactables, and edge
//! autoscroll, created and torn down together.

use kurbo::{Point, Rect, Size};
use sandpit_view2d::{CameraOptions, ViewPortBounds, ViewportCamera};

use crate::autoscroll::{AutoscrollChange, AutoscrollOptions, EdgeAutoscroll};
use crate::gesture::{GestureContext, GestureEvents, GestureInterpreter, GestureOptions, InputEvent};
use crate::interactable::{Behavior, ElementTree, InteractableId, InteractableRegistry};

/// Token for one container-resize subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(pub u64);

/// Host side of container resize notifications.
///
/// A [`Space`] subscribes exactly once in [`Space::create`] and unsubscribes
/// exactly once in [`Space::destroy`]. While subscribed, the host forwards
/// size changes to [`Space::container_resized`].
pub trait ResizeSource {
    /// Starts observing the container.
    fn subscribe(&mut self) -> ResizeSubscription;

    /// Stops observing the container.
    fn unsubscribe(&mut self, subscription: ResizeSubscription);

    /// Current container size in client pixels.
    fn container_size(&self) -> Size;
}

/// Everything needed to build a [`Space`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpaceOptions {
    /// Camera inertia tuning.
    pub camera: CameraOptions,
    /// Initial camera bounds.
    pub bounds: ViewPortBounds,
    /// Gesture tuning.
    pub gestures: GestureOptions,
    /// Edge autoscroll tuning.
    pub autoscroll: AutoscrollOptions,
}

/// A canvas and the interaction state that belongs to it.
#[derive(Debug)]
pub struct Space {
    camera: ViewportCamera,
    gestures: GestureInterpreter,
    registry: InteractableRegistry,
    autoscroll: EdgeAutoscroll,
    subscription: Option<ResizeSubscription>,
}

impl Space {
    /// Subscribes to container resizes and sets up the camera.
    ///
    /// `on_create` runs once the camera knows its container size and bounds,
    /// before any input is handled; use it to restore a saved position.
    pub fn create(
        host: &mut impl ResizeSource,
        options: SpaceOptions,
        on_create: impl FnOnce(&mut ViewportCamera),
    ) -> Self {
        let subscription = host.subscribe();
        let size = host.container_size();
        let mut camera = ViewportCamera::new(options.camera);
        camera.update_container_size(size.width, size.height);
        camera.set_bounds(options.bounds);
        on_create(&mut camera);
        log::debug!("space: created with subscription {subscription:?}, container {size:?}");
        Self {
            camera,
            gestures: GestureInterpreter::new(options.gestures),
            registry: InteractableRegistry::new(),
            autoscroll: EdgeAutoscroll::new(options.autoscroll),
            subscription: Some(subscription),
        }
    }

    /// Tears everything down.
    ///
    /// Cancels inertia and autoscroll, abandons any gesture, and
    /// unsubscribes from resizes, all before returning. Every later call on
    /// this space is a no-op. Calling it twice is harmless.
    ///
    /// Returns the events of the abandoned gesture: a captured press comes
    /// back as [`GestureEvent::PressCancel`] so its owner can clean up.
    ///
    /// [`GestureEvent::PressCancel`]: crate::GestureEvent::PressCancel
    pub fn destroy(&mut self, host: &mut impl ResizeSource) -> GestureEvents {
        let Some(subscription) = self.subscription.take() else {
            return GestureEvents::new();
        };
        self.camera.destroy();
        self.autoscroll.end();
        let cancelled = self.gestures.cancel();
        self.registry.clear();
        host.unsubscribe(subscription);
        log::debug!("space: destroyed, {} gesture events", cancelled.len());
        cancelled
    }

    /// Returns `true` after [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.subscription.is_none()
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &ViewportCamera {
        &self.camera
    }

    /// Mutable access to the camera (already inert after destroy).
    pub fn camera_mut(&mut self) -> &mut ViewportCamera {
        &mut self.camera
    }

    /// The gesture interpreter, for installing a press policy.
    pub fn gestures_mut(&mut self) -> &mut GestureInterpreter {
        &mut self.gestures
    }

    /// Interactables mounted in this space.
    #[must_use]
    pub fn registry(&self) -> &InteractableRegistry {
        &self.registry
    }

    /// Mounts an interactable.
    pub fn register_interactable(&mut self, id: InteractableId, behavior: Behavior) {
        if !self.is_destroyed() {
            self.registry.register(id, behavior);
        }
    }

    /// Unmounts an interactable.
    pub fn unregister_interactable(&mut self, id: InteractableId) {
        self.registry.unregister(id);
    }

    /// Forwards a container resize from the host.
    pub fn container_resized(&mut self, size: Size) {
        if !self.is_destroyed() {
            self.camera.update_container_size(size.width, size.height);
        }
    }

    /// Feeds one input event through the gesture interpreter.
    pub fn handle_input<T: ElementTree>(
        &mut self,
        tree: &T,
        event: InputEvent<T::Node>,
        now_ms: u64,
    ) -> GestureEvents {
        if self.is_destroyed() {
            return GestureEvents::new();
        }
        let mut cx = GestureContext {
            tree,
            registry: &self.registry,
            camera: &mut self.camera,
        };
        self.gestures.handle(event, now_ms, &mut cx)
    }

    /// A frame drag started; `container` is the canvas rect in client pixels.
    pub fn begin_frame_drag(&mut self, container: Rect) {
        if !self.is_destroyed() {
            self.autoscroll.begin(container);
        }
    }

    /// The dragged frame's pointer moved (client pixels).
    pub fn frame_drag_moved(&mut self, pointer: Point) -> AutoscrollChange {
        if self.is_destroyed() {
            return AutoscrollChange::Unchanged;
        }
        self.autoscroll.update(pointer)
    }

    /// The frame drag ended or was cancelled.
    pub fn end_frame_drag(&mut self) {
        self.autoscroll.end();
    }

    /// Advances inertia and autoscroll by one tick.
    ///
    /// Returns `true` if the host should schedule another frame.
    pub fn animation_frame(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let gliding = self.camera.step();
        let nudging = self.autoscroll.tick(&mut self.camera);
        gliding || nudging
    }
}
