// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture interpretation: raw pointer, touch, and wheel input into camera
//! moves and press events.
//!
//! A [`GestureInterpreter`] runs one session at a time:
//!
//! ```text
//! Idle -> Undecided -> { Panning | Captured | Ignoring } -> Idle
//! Idle -> Pinching -> Idle
//! ```
//!
//! - A press starts from the primary mouse button alone or a single touch.
//!   The host's [`PressPolicy`] decides first; otherwise a press on an `a`
//!   or `button` element under the mouse is ignored, a press inside a
//!   [`Behavior::NoPan`] region is ignored, a press inside a
//!   [`Behavior::Capture`] region is captured, and anything else pans.
//! - Captured presses are reported as [`GestureEvent`]s and never move the
//!   camera, until [`GestureInterpreter::release_capture`] hands the rest of
//!   the press back to panning.
//! - A press that never moved farther than the tap slop ends as a tap. A pan
//!   released with some speed left hands off to the camera's inertia.
//! - A second touch cancels the single-touch session and starts a pinch.
//! - Wheel input zooms about the pointer when exactly Ctrl or exactly Meta
//!   is held, and pans otherwise.
//!
//! Positions are container-relative client pixels throughout.

use alloc::boxed::Box;
use core::fmt;

use bitflags::bitflags;
use kurbo::{Point, Vec2};
use sandpit_view2d::ViewportCamera;
use smallvec::SmallVec;

use crate::drag::DragState;
use crate::interactable::{Behavior, ElementTree, InteractableId, InteractableRegistry};

/// Zoom scale for pixel-mode wheel deltas with Ctrl held (trackpad pinch).
const CTRL_WHEEL_SCALE: f64 = 5.0;
/// Zoom scale for pixel-mode wheel deltas with Meta held.
const META_WHEEL_SCALE: f64 = 1.0;
/// Approximate pixel height of one wheel "line".
const LINE_WHEEL_SCALE: f64 = 7.156_25;

bitflags! {
    /// Keyboard modifiers held during an input event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt / Option.
        const ALT = 1 << 2;
        /// Meta / Command.
        const META = 1 << 3;
    }
}

bitflags! {
    /// Mouse buttons held during an input event, in DOM `buttons` order.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        /// Usually the left button.
        const PRIMARY = 1 << 0;
        /// Usually the right button.
        const SECONDARY = 1 << 1;
        /// Usually the wheel button.
        const AUXILIARY = 1 << 2;
        /// Browser back.
        const BACK = 1 << 3;
        /// Browser forward.
        const FORWARD = 1 << 4;
    }
}

/// Unit of a wheel delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WheelDeltaMode {
    /// Pixels.
    #[default]
    Pixel,
    /// Lines of text.
    Line,
    /// Pages.
    Page,
}

/// Touch contacts currently on the surface.
pub type Touches = SmallVec<[Point; 2]>;

/// Raw input delivered by the host.
///
/// `N` is the host's node handle, used to hit-test presses and hovers.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent<N> {
    /// A mouse button went down.
    MouseDown {
        /// Pointer position.
        position: Point,
        /// Every button held after the change.
        buttons: Buttons,
        /// Node under the pointer.
        target: Option<N>,
    },
    /// The mouse moved.
    MouseMove {
        /// Pointer position.
        position: Point,
        /// Every button held.
        buttons: Buttons,
        /// Node under the pointer.
        target: Option<N>,
    },
    /// A mouse button went up (anywhere, including outside the container).
    MouseUp {
        /// Pointer position.
        position: Point,
    },
    /// A finger touched down.
    TouchStart {
        /// All contacts, including the new one.
        touches: Touches,
        /// Node under the new contact.
        target: Option<N>,
    },
    /// One or more fingers moved.
    TouchMove {
        /// All contacts.
        touches: Touches,
    },
    /// A finger lifted.
    TouchEnd {
        /// Contacts still down.
        touches: Touches,
        /// Where the lifted finger was.
        position: Point,
    },
    /// The platform cancelled all touches.
    TouchCancel,
    /// A wheel or trackpad scroll.
    Wheel {
        /// Pointer position.
        position: Point,
        /// Scroll delta in `mode` units.
        delta: Vec2,
        /// Unit of `delta`.
        mode: WheelDeltaMode,
        /// Modifiers held.
        modifiers: Modifiers,
    },
    /// A platform pinch gesture began (desktop Safari style).
    PinchStart {
        /// Gesture center.
        center: Point,
        /// Initial scale, usually `1.0`.
        scale: f64,
    },
    /// A platform pinch gesture changed.
    PinchChange {
        /// Cumulative scale since the gesture began.
        scale: f64,
    },
    /// A platform pinch gesture ended.
    PinchEnd,
    /// A context-menu request (right click or long press).
    ContextMenu {
        /// Pointer position.
        position: Point,
        /// Node under the pointer.
        target: Option<N>,
    },
}

/// Input device a press came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    /// Mouse or trackpad click.
    Mouse,
    /// Single finger.
    Touch,
}

/// A position in both coordinate systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressCoordinates {
    /// Container-relative client pixels.
    pub container: Point,
    /// Virtual-space units.
    pub space: Point,
}

/// What the interpreter tells the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    /// A captured press began.
    PressStart {
        /// Interactable the press was routed to, if one was resolved.
        target: Option<InteractableId>,
        /// Where it began.
        at: PressCoordinates,
    },
    /// A captured press moved.
    PressMove {
        /// Interactable the press is routed to.
        target: Option<InteractableId>,
        /// Current position.
        at: PressCoordinates,
    },
    /// A captured press ended normally.
    PressEnd {
        /// Interactable the press was routed to.
        target: Option<InteractableId>,
        /// Where it ended.
        at: PressCoordinates,
    },
    /// A captured press was cancelled (for example by a second touch).
    PressCancel {
        /// Interactable the press was routed to.
        target: Option<InteractableId>,
    },
    /// An uncaptured press ended without travelling past the tap slop.
    Tap {
        /// Where it ended.
        at: PressCoordinates,
    },
    /// The pointer started hovering a capturing interactable.
    HoverEnter(InteractableId),
    /// The pointer stopped hovering a capturing interactable.
    HoverLeave(InteractableId),
    /// The mouse moved with no buttons held.
    Hover {
        /// Innermost interactable under the pointer.
        target: Option<InteractableId>,
        /// Pointer position.
        at: PressCoordinates,
    },
    /// A context-menu request.
    ContextMenu {
        /// Innermost interactable under the pointer.
        target: Option<InteractableId>,
        /// Pointer position.
        at: PressCoordinates,
    },
}

/// Events produced by one input event.
pub type GestureEvents = SmallVec<[GestureEvent; 2]>;

/// How a press should be handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressDecision {
    /// Pan the canvas.
    Pan,
    /// Route the press to the host.
    Capture,
    /// Do nothing at all.
    Ignore,
}

/// Everything a [`PressPolicy`] can look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressRequest {
    /// Device the press came from.
    pub pointer: PointerKind,
    /// Where it began.
    pub at: PressCoordinates,
    /// Innermost registered interactable under the press.
    pub interactable: Option<(InteractableId, Behavior)>,
}

/// Host override consulted before the built-in press rules.
///
/// Returning `None` falls through to the built-in rules.
pub type PressPolicy = Box<dyn FnMut(&PressRequest) -> Option<PressDecision>>;

/// Tuning knobs for a [`GestureInterpreter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureOptions {
    /// Presses that never travel farther than this (client pixels) are taps.
    pub tap_slop: f64,
    /// A pan released after sitting still this long (ms) does not glide.
    pub fling_idle_ms: u64,
    /// Release velocity (px/ms) is multiplied by this to get the camera's
    /// initial inertial velocity (px/frame).
    pub fling_multiplier: f64,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            tap_slop: 4.0,
            fling_idle_ms: 100,
            fling_multiplier: 20.0,
        }
    }
}

/// Observable phase of the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    /// No press or pinch in progress.
    Idle,
    /// Pressed, still within the tap slop.
    Undecided,
    /// Panning the camera.
    Panning,
    /// Routed to an interactable or the host.
    Captured,
    /// Swallowed.
    Ignoring,
    /// Two-finger pinch.
    Pinching,
}

/// What the interpreter needs from its surroundings for one event.
pub struct GestureContext<'a, T: ElementTree> {
    /// Host element hierarchy for hit-testing.
    pub tree: &'a T,
    /// Interactables currently mounted.
    pub registry: &'a InteractableRegistry,
    /// Camera to move.
    pub camera: &'a mut ViewportCamera,
}

impl<T: ElementTree> fmt::Debug for GestureContext<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureContext")
            .field("registry", self.registry)
            .field("camera", self.camera)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PressMode {
    Undecided,
    Panning,
    Captured(Option<InteractableId>),
    Ignoring,
}

#[derive(Clone, Copy, Debug, Default)]
enum Session {
    #[default]
    Idle,
    Press {
        pointer: PointerKind,
        mode: PressMode,
        drag: DragState,
    },
    Pinch {
        start_spread: f64,
        last_scale: f64,
        center: DragState,
    },
}

/// Turns raw input into camera moves and [`GestureEvent`]s.
pub struct GestureInterpreter {
    options: GestureOptions,
    policy: Option<PressPolicy>,
    session: Session,
    /// Center and last scale of a platform pinch gesture.
    native_pinch: Option<(Point, f64)>,
    hovered: Option<InteractableId>,
}

impl fmt::Debug for GestureInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureInterpreter")
            .field("options", &self.options)
            .field("has_policy", &self.policy.is_some())
            .field("session", &self.session)
            .field("native_pinch", &self.native_pinch)
            .field("hovered", &self.hovered)
            .finish()
    }
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureOptions::default())
    }
}

impl GestureInterpreter {
    /// Creates an idle interpreter.
    #[must_use]
    pub fn new(options: GestureOptions) -> Self {
        Self {
            options,
            policy: None,
            session: Session::Idle,
            native_pinch: None,
            hovered: None,
        }
    }

    /// Installs the host override for press decisions.
    pub fn set_press_policy(
        &mut self,
        policy: impl FnMut(&PressRequest) -> Option<PressDecision> + 'static,
    ) {
        self.policy = Some(Box::new(policy));
    }

    /// Removes the host override.
    pub fn clear_press_policy(&mut self) {
        self.policy = None;
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> GestureOptions {
        self.options
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        match self.session {
            Session::Idle => GesturePhase::Idle,
            Session::Pinch { .. } => GesturePhase::Pinching,
            Session::Press { mode, .. } => match mode {
                PressMode::Undecided => GesturePhase::Undecided,
                PressMode::Panning => GesturePhase::Panning,
                PressMode::Captured(_) => GesturePhase::Captured,
                PressMode::Ignoring => GesturePhase::Ignoring,
            },
        }
    }

    /// The capturing interactable the mouse is hovering, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<InteractableId> {
        self.hovered
    }

    /// Hands a captured press back to panning.
    ///
    /// Returns `false` if no press is captured.
    pub fn release_capture(&mut self) -> bool {
        if let Session::Press { mode, .. } = &mut self.session
            && let PressMode::Captured(target) = *mode
        {
            log::debug!("gesture: capture released by {target:?}");
            *mode = PressMode::Panning;
            return true;
        }
        false
    }

    /// Abandons the current session.
    ///
    /// A captured press is reported as cancelled.
    pub fn cancel(&mut self) -> GestureEvents {
        let mut out = GestureEvents::new();
        if let Session::Press {
            mode: PressMode::Captured(target),
            ..
        } = core::mem::take(&mut self.session)
        {
            out.push(GestureEvent::PressCancel { target });
        }
        self.native_pinch = None;
        out
    }

    /// Feeds one input event.
    ///
    /// `now_ms` is a monotonic timestamp used for release velocity.
    pub fn handle<T: ElementTree>(
        &mut self,
        event: InputEvent<T::Node>,
        now_ms: u64,
        cx: &mut GestureContext<'_, T>,
    ) -> GestureEvents {
        let mut out = GestureEvents::new();
        match event {
            InputEvent::MouseDown {
                position,
                buttons,
                target,
            } => {
                if buttons == Buttons::PRIMARY {
                    self.start_press(PointerKind::Mouse, position, target, now_ms, cx, &mut out);
                } else {
                    log::trace!("gesture: ignoring mouse down with {buttons:?}");
                }
            }
            InputEvent::MouseMove {
                position,
                buttons,
                target,
            } => match self.session {
                Session::Press {
                    pointer: PointerKind::Mouse,
                    ..
                } => {
                    if buttons == Buttons::PRIMARY {
                        self.press_move(position, now_ms, cx.camera, &mut out);
                    }
                }
                _ if buttons.is_empty() => self.hover(position, target, cx, &mut out),
                _ => {}
            },
            InputEvent::MouseUp { position } => {
                if matches!(
                    self.session,
                    Session::Press {
                        pointer: PointerKind::Mouse,
                        ..
                    }
                ) {
                    self.finish_press(position, now_ms, cx.camera, &mut out);
                }
            }
            InputEvent::TouchStart { touches, target } => {
                self.touch_start(&touches, target, now_ms, cx, &mut out);
            }
            InputEvent::TouchMove { touches } => self.touch_move(&touches, now_ms, cx.camera, &mut out),
            InputEvent::TouchEnd { touches, position } => match self.session {
                Session::Press {
                    pointer: PointerKind::Touch,
                    ..
                } if touches.is_empty() => {
                    self.finish_press(position, now_ms, cx.camera, &mut out);
                }
                Session::Pinch { center, .. } if touches.len() < 2 => {
                    self.session = Session::Idle;
                    self.fling(&center, now_ms, cx.camera);
                }
                _ => {}
            },
            InputEvent::TouchCancel => out = self.cancel(),
            InputEvent::Wheel {
                position,
                delta,
                mode,
                modifiers,
            } => wheel(cx.camera, position, delta, mode, modifiers),
            InputEvent::PinchStart { center, scale } => {
                cx.camera.cancel_animation();
                self.native_pinch = Some((center, scale));
            }
            InputEvent::PinchChange { scale } => {
                if let Some((center, last)) = &mut self.native_pinch {
                    let d_zoom = (scale - *last) / 2.0;
                    *last = scale;
                    cx.camera.move_by_in_client_space(0.0, 0.0, d_zoom, Some(*center));
                }
            }
            InputEvent::PinchEnd => self.native_pinch = None,
            InputEvent::ContextMenu { position, target } => {
                let target = target
                    .and_then(|node| cx.registry.resolve(cx.tree, node))
                    .map(|(id, _)| id);
                out.push(GestureEvent::ContextMenu {
                    target,
                    at: coordinates(cx.camera, position),
                });
            }
        }
        out
    }

    fn start_press<T: ElementTree>(
        &mut self,
        pointer: PointerKind,
        position: Point,
        target: Option<T::Node>,
        now_ms: u64,
        cx: &mut GestureContext<'_, T>,
        out: &mut GestureEvents,
    ) {
        cx.camera.cancel_animation();
        let at = coordinates(cx.camera, position);
        let interactable = target.and_then(|node| cx.registry.resolve(cx.tree, node));
        let request = PressRequest {
            pointer,
            at,
            interactable,
        };
        let decision = self
            .policy
            .as_mut()
            .and_then(|policy| policy(&request))
            .unwrap_or_else(|| default_decision(cx.tree, target, &request));
        let mode = match decision {
            PressDecision::Pan => PressMode::Undecided,
            PressDecision::Capture => PressMode::Captured(interactable.map(|(id, _)| id)),
            PressDecision::Ignore => PressMode::Ignoring,
        };
        log::debug!("gesture: {pointer:?} press at {position:?} -> {mode:?}");

        let mut drag = DragState::default();
        drag.start(position, now_ms);
        self.session = Session::Press {
            pointer,
            mode,
            drag,
        };
        if let PressMode::Captured(target) = mode {
            out.push(GestureEvent::PressStart { target, at });
        }
    }

    fn press_move(
        &mut self,
        position: Point,
        now_ms: u64,
        camera: &mut ViewportCamera,
        out: &mut GestureEvents,
    ) {
        let Session::Press { mode, drag, .. } = &mut self.session else {
            return;
        };
        let Some(delta) = drag.update(position, now_ms) else {
            return;
        };
        match *mode {
            PressMode::Captured(target) => out.push(GestureEvent::PressMove {
                target,
                at: coordinates(camera, position),
            }),
            PressMode::Ignoring => {}
            PressMode::Undecided | PressMode::Panning => {
                camera.move_by_in_client_space(-delta.x, -delta.y, 0.0, Some(position));
                if *mode == PressMode::Undecided && drag.distance() > self.options.tap_slop {
                    log::trace!("gesture: press left the tap slop, panning");
                    *mode = PressMode::Panning;
                }
            }
        }
    }

    fn finish_press(
        &mut self,
        position: Point,
        now_ms: u64,
        camera: &mut ViewportCamera,
        out: &mut GestureEvents,
    ) {
        let Session::Press { mode, drag, .. } = core::mem::take(&mut self.session) else {
            return;
        };
        let at = coordinates(camera, position);
        match mode {
            PressMode::Captured(target) => out.push(GestureEvent::PressEnd { target, at }),
            PressMode::Undecided => out.push(GestureEvent::Tap { at }),
            PressMode::Panning => self.fling(&drag, now_ms, camera),
            PressMode::Ignoring => {}
        }
    }

    fn touch_start<T: ElementTree>(
        &mut self,
        touches: &[Point],
        target: Option<T::Node>,
        now_ms: u64,
        cx: &mut GestureContext<'_, T>,
        out: &mut GestureEvents,
    ) {
        match (touches, self.session) {
            ([single], Session::Idle) => {
                self.start_press(PointerKind::Touch, *single, target, now_ms, cx, out);
            }
            ([first, second, ..], session) => {
                match session {
                    Session::Idle => {}
                    Session::Press {
                        pointer: PointerKind::Touch,
                        ..
                    } => out.extend(self.cancel()),
                    Session::Press { .. } | Session::Pinch { .. } => return,
                }
                cx.camera.cancel_animation();
                let mut center = DragState::default();
                center.start(first.midpoint(*second), now_ms);
                log::debug!("gesture: pinch started");
                self.session = Session::Pinch {
                    start_spread: first.distance(*second),
                    last_scale: 1.0,
                    center,
                };
            }
            _ => {}
        }
    }

    fn touch_move(
        &mut self,
        touches: &[Point],
        now_ms: u64,
        camera: &mut ViewportCamera,
        out: &mut GestureEvents,
    ) {
        if let (
            [single],
            Session::Press {
                pointer: PointerKind::Touch,
                ..
            },
        ) = (touches, self.session)
        {
            self.press_move(*single, now_ms, camera, out);
            return;
        }
        if let (
            [first, second, ..],
            Session::Pinch {
                start_spread,
                last_scale,
                center,
            },
        ) = (touches, &mut self.session)
        {
            let scale = if *start_spread > 0.0 {
                first.distance(*second) / *start_spread
            } else {
                1.0
            };
            let d_zoom = (scale - *last_scale) / 2.0;
            *last_scale = scale;
            let mid = first.midpoint(*second);
            let delta = center.update(mid, now_ms).unwrap_or(Vec2::ZERO);
            camera.move_by_in_client_space(-delta.x, -delta.y, d_zoom, Some(mid));
        }
    }

    fn hover<T: ElementTree>(
        &mut self,
        position: Point,
        target: Option<T::Node>,
        cx: &GestureContext<'_, T>,
        out: &mut GestureEvents,
    ) {
        let resolved = target.and_then(|node| cx.registry.resolve(cx.tree, node));
        let capturing = resolved
            .filter(|(_, behavior)| *behavior == Behavior::Capture)
            .map(|(id, _)| id);
        if capturing != self.hovered {
            if let Some(old) = self.hovered {
                out.push(GestureEvent::HoverLeave(old));
            }
            if let Some(new) = capturing {
                out.push(GestureEvent::HoverEnter(new));
            }
            self.hovered = capturing;
        }
        out.push(GestureEvent::Hover {
            target: resolved.map(|(id, _)| id),
            at: coordinates(cx.camera, position),
        });
    }

    fn fling(&self, drag: &DragState, now_ms: u64, camera: &mut ViewportCamera) {
        let velocity = drag.release_velocity(now_ms, self.options.fling_idle_ms);
        if velocity == Vec2::ZERO {
            return;
        }
        let k = -self.options.fling_multiplier;
        camera.move_with_deceleration_in_client_space(velocity.x * k, velocity.y * k);
    }
}

fn coordinates(camera: &ViewportCamera, position: Point) -> PressCoordinates {
    PressCoordinates {
        container: position,
        space: camera.client_to_virtual_point(position),
    }
}

fn default_decision<T: ElementTree>(
    tree: &T,
    target: Option<T::Node>,
    request: &PressRequest,
) -> PressDecision {
    if request.pointer == PointerKind::Mouse
        && let Some(tag) = target.and_then(|node| tree.tag_name(node))
        && (tag.eq_ignore_ascii_case("a") || tag.eq_ignore_ascii_case("button"))
    {
        return PressDecision::Ignore;
    }
    match request.interactable {
        Some((_, Behavior::NoPan)) => PressDecision::Ignore,
        Some((_, Behavior::Capture)) => PressDecision::Capture,
        None => PressDecision::Pan,
    }
}

/// Applies a wheel event to the camera.
fn wheel(
    camera: &mut ViewportCamera,
    position: Point,
    delta: Vec2,
    mode: WheelDeltaMode,
    modifiers: Modifiers,
) {
    let zoom = modifiers == Modifiers::CTRL || modifiers == Modifiers::META;
    if !zoom {
        camera.move_by_in_client_space(delta.x / 2.0, delta.y / 2.0, 0.0, None);
        return;
    }
    let height = camera.container_size().height;
    if height <= 0.0 {
        return;
    }
    let scale = match mode {
        WheelDeltaMode::Pixel if modifiers == Modifiers::CTRL => CTRL_WHEEL_SCALE,
        WheelDeltaMode::Pixel => META_WHEEL_SCALE,
        WheelDeltaMode::Line => LINE_WHEEL_SCALE,
        WheelDeltaMode::Page => height,
    };
    let d_zoom = -(delta.y * scale) / height;
    camera.move_by_in_client_space(0.0, 0.0, d_zoom, Some(position));
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;
    use smallvec::smallvec;

    /// Flat tree: every node is a root; node `n` is tagged with id `n` and
    /// node 99 is a `button`.
    struct Flat;

    impl ElementTree for Flat {
        type Node = u64;

        fn parent(&self, _node: u64) -> Option<u64> {
            None
        }

        fn interactable_id(&self, node: u64) -> Option<InteractableId> {
            Some(InteractableId(node))
        }

        fn tag_name(&self, node: u64) -> Option<&str> {
            (node == 99).then_some("BUTTON")
        }
    }

    struct Rig {
        gestures: GestureInterpreter,
        registry: InteractableRegistry,
        camera: ViewportCamera,
    }

    impl Rig {
        fn new() -> Self {
            let mut camera = ViewportCamera::default();
            camera.update_container_size(800.0, 600.0);
            let mut registry = InteractableRegistry::new();
            registry.register(InteractableId(1), Behavior::NoPan);
            registry.register(InteractableId(2), Behavior::Capture);
            Self {
                gestures: GestureInterpreter::default(),
                registry,
                camera,
            }
        }

        fn send(&mut self, event: InputEvent<u64>, now_ms: u64) -> GestureEvents {
            let mut cx = GestureContext {
                tree: &Flat,
                registry: &self.registry,
                camera: &mut self.camera,
            };
            self.gestures.handle(event, now_ms, &mut cx)
        }

        fn down(&mut self, x: f64, y: f64, target: Option<u64>) -> GestureEvents {
            self.send(
                InputEvent::MouseDown {
                    position: Point::new(x, y),
                    buttons: Buttons::PRIMARY,
                    target,
                },
                0,
            )
        }

        fn drag_to(&mut self, x: f64, y: f64, now_ms: u64) -> GestureEvents {
            self.send(
                InputEvent::MouseMove {
                    position: Point::new(x, y),
                    buttons: Buttons::PRIMARY,
                    target: None,
                },
                now_ms,
            )
        }

        fn up(&mut self, x: f64, y: f64, now_ms: u64) -> GestureEvents {
            self.send(
                InputEvent::MouseUp {
                    position: Point::new(x, y),
                },
                now_ms,
            )
        }
    }

    #[test]
    fn only_primary_alone_starts_a_press() {
        let mut rig = Rig::new();
        let out = rig.send(
            InputEvent::MouseDown {
                position: Point::ZERO,
                buttons: Buttons::PRIMARY | Buttons::SECONDARY,
                target: None,
            },
            0,
        );
        assert!(out.is_empty());
        assert_eq!(rig.gestures.phase(), GesturePhase::Idle);
        rig.down(0.0, 0.0, None);
        assert_eq!(rig.gestures.phase(), GesturePhase::Undecided);
    }

    #[test]
    fn dragging_the_background_pans_opposite_to_the_pointer() {
        let mut rig = Rig::new();
        rig.down(100.0, 100.0, None);
        rig.drag_to(90.0, 100.0, 16);
        assert_eq!(rig.camera.left(), 10.0);
        assert_eq!(rig.gestures.phase(), GesturePhase::Panning);
        rig.up(90.0, 100.0, 500);
        assert_eq!(rig.gestures.phase(), GesturePhase::Idle);
        // Released long after the last move: no glide.
        assert!(!rig.camera.is_animating());
    }

    #[test]
    fn quick_release_hands_off_to_inertia() {
        let mut rig = Rig::new();
        rig.down(100.0, 100.0, None);
        rig.drag_to(60.0, 100.0, 16);
        rig.drag_to(20.0, 100.0, 32);
        rig.up(20.0, 100.0, 40);
        assert!(rig.camera.is_animating());
        let before = rig.camera.left();
        rig.camera.step();
        assert!(rig.camera.left() > before);
    }

    #[test]
    fn short_press_is_a_tap() {
        let mut rig = Rig::new();
        rig.down(100.0, 100.0, None);
        rig.drag_to(101.0, 101.0, 10);
        let out = rig.up(101.0, 101.0, 20);
        assert!(matches!(out.as_slice(), [GestureEvent::Tap { .. }]));
    }

    #[test]
    fn no_pan_regions_and_buttons_are_ignored() {
        let mut rig = Rig::new();
        rig.down(100.0, 100.0, Some(1));
        assert_eq!(rig.gestures.phase(), GesturePhase::Ignoring);
        rig.drag_to(0.0, 0.0, 16);
        assert_eq!(rig.camera.left(), 0.0);
        assert!(rig.up(0.0, 0.0, 20).is_empty());

        rig.down(100.0, 100.0, Some(99));
        assert_eq!(rig.gestures.phase(), GesturePhase::Ignoring);
    }

    #[test]
    fn capture_routes_the_press() {
        let mut rig = Rig::new();
        let out = rig.down(10.0, 10.0, Some(2));
        assert!(matches!(
            out.as_slice(),
            [GestureEvent::PressStart {
                target: Some(InteractableId(2)),
                ..
            }]
        ));
        let out = rig.drag_to(50.0, 10.0, 16);
        assert!(matches!(out.as_slice(), [GestureEvent::PressMove { .. }]));
        assert_eq!(rig.camera.left(), 0.0);
        let out = rig.up(50.0, 10.0, 20);
        assert!(matches!(out.as_slice(), [GestureEvent::PressEnd { .. }]));
    }

    #[test]
    fn released_capture_pans() {
        let mut rig = Rig::new();
        rig.down(10.0, 10.0, Some(2));
        assert!(rig.gestures.release_capture());
        assert!(!rig.gestures.release_capture());
        rig.drag_to(0.0, 10.0, 16);
        assert_eq!(rig.camera.left(), 10.0);
    }

    #[test]
    fn policy_decides_first() {
        let mut rig = Rig::new();
        let asked = Rc::new(Cell::new(0));
        let seen = Rc::clone(&asked);
        rig.gestures.set_press_policy(move |request| {
            seen.set(seen.get() + 1);
            (request.interactable.is_none()).then_some(PressDecision::Capture)
        });
        let out = rig.down(0.0, 0.0, None);
        assert!(matches!(
            out.as_slice(),
            [GestureEvent::PressStart { target: None, .. }]
        ));
        rig.up(0.0, 0.0, 1);
        // Falls through to the built-in rules for NoPan.
        rig.down(0.0, 0.0, Some(1));
        assert_eq!(rig.gestures.phase(), GesturePhase::Ignoring);
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn press_start_cancels_deceleration() {
        let mut rig = Rig::new();
        rig.camera.move_with_deceleration_in_client_space(30.0, 0.0);
        assert!(rig.camera.is_animating());
        rig.down(0.0, 0.0, Some(1));
        assert!(!rig.camera.is_animating());
    }

    #[test]
    fn second_touch_cancels_capture_and_pinches() {
        let mut rig = Rig::new();
        let out = rig.send(
            InputEvent::TouchStart {
                touches: smallvec![Point::new(100.0, 100.0)],
                target: Some(2),
            },
            0,
        );
        assert_eq!(out.len(), 1);
        let out = rig.send(
            InputEvent::TouchStart {
                touches: smallvec![Point::new(100.0, 100.0), Point::new(200.0, 100.0)],
                target: None,
            },
            5,
        );
        assert_eq!(
            out.as_slice(),
            [GestureEvent::PressCancel {
                target: Some(InteractableId(2))
            }]
        );
        assert_eq!(rig.gestures.phase(), GesturePhase::Pinching);

        // Fingers spread to twice the distance about a fixed center.
        rig.send(
            InputEvent::TouchMove {
                touches: smallvec![Point::new(50.0, 100.0), Point::new(250.0, 100.0)],
            },
            10,
        );
        assert_eq!(rig.camera.zoom_factor(), 1.5);

        rig.send(
            InputEvent::TouchEnd {
                touches: smallvec![Point::new(50.0, 100.0)],
                position: Point::new(250.0, 100.0),
            },
            500,
        );
        assert_eq!(rig.gestures.phase(), GesturePhase::Idle);
    }

    #[test]
    fn ctrl_wheel_zooms_and_plain_wheel_pans() {
        let mut rig = Rig::new();
        rig.send(
            InputEvent::Wheel {
                position: Point::new(400.0, 300.0),
                delta: Vec2::new(0.0, -12.0),
                mode: WheelDeltaMode::Pixel,
                modifiers: Modifiers::CTRL,
            },
            0,
        );
        assert_eq!(rig.camera.zoom_factor(), 1.1);

        let mut rig = Rig::new();
        rig.send(
            InputEvent::Wheel {
                position: Point::ZERO,
                delta: Vec2::new(20.0, 40.0),
                mode: WheelDeltaMode::Pixel,
                modifiers: Modifiers::CTRL | Modifiers::SHIFT,
            },
            0,
        );
        assert_eq!(rig.camera.zoom_factor(), 1.0);
        assert_eq!((rig.camera.left(), rig.camera.top()), (10.0, 20.0));
    }

    #[test]
    fn hover_tracks_capturing_interactables() {
        let mut rig = Rig::new();
        let hover = |target| InputEvent::MouseMove {
            position: Point::new(5.0, 5.0),
            buttons: Buttons::empty(),
            target,
        };
        let out = rig.send(hover(Some(2)), 0);
        assert_eq!(out[0], GestureEvent::HoverEnter(InteractableId(2)));
        assert!(matches!(out[1], GestureEvent::Hover { .. }));
        let out = rig.send(hover(Some(2)), 1);
        assert_eq!(out.len(), 1);
        let out = rig.send(hover(Some(1)), 2);
        assert_eq!(out[0], GestureEvent::HoverLeave(InteractableId(2)));
        assert_eq!(out.len(), 2);
        assert_eq!(rig.gestures.hovered(), None);
    }

    #[test]
    fn native_pinch_zooms_about_its_center() {
        let mut rig = Rig::new();
        rig.send(
            InputEvent::PinchStart {
                center: Point::new(200.0, 200.0),
                scale: 1.0,
            },
            0,
        );
        rig.send(InputEvent::PinchChange { scale: 1.4 }, 1);
        assert!((rig.camera.zoom_factor() - 1.2).abs() < 1e-12);
        rig.send(InputEvent::PinchEnd, 2);
        rig.send(InputEvent::PinchChange { scale: 3.0 }, 3);
        assert!((rig.camera.zoom_factor() - 1.2).abs() < 1e-12);
    }
}
