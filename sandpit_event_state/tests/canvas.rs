// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for `sandpit_event_state` driven through a whole [`Space`].

use kurbo::{Point, Rect, Size, Vec2};
use proptest::prelude::*;
use sandpit_event_state::{
    AutoscrollChange, Behavior, Buttons, EdgeDirection, ElementTree, GestureEvent, GesturePhase,
    InputEvent, InteractableId, Modifiers, ResizeSource, ResizeSubscription, Space, SpaceOptions,
    WheelDeltaMode,
};

struct Host {
    subscribed: u32,
}

impl ResizeSource for Host {
    fn subscribe(&mut self) -> ResizeSubscription {
        self.subscribed += 1;
        ResizeSubscription(u64::from(self.subscribed))
    }

    fn unsubscribe(&mut self, _subscription: ResizeSubscription) {
        self.subscribed -= 1;
    }

    fn container_size(&self) -> Size {
        Size::new(1000.0, 800.0)
    }
}

/// Frames are nodes 1..; node `10 * n` is the handle inside frame `n`, and
/// node `10 * n + 1` is a text box inside it.
struct Frames;

impl ElementTree for Frames {
    type Node = u32;

    fn parent(&self, node: u32) -> Option<u32> {
        (node >= 10).then_some(node / 10)
    }

    fn interactable_id(&self, node: u32) -> Option<InteractableId> {
        match node % 10 {
            0 => Some(InteractableId(u64::from(node))),
            1 if node > 10 => Some(InteractableId(u64::from(node))),
            _ => None,
        }
    }
}

fn space() -> (Host, Space) {
    let mut host = Host { subscribed: 0 };
    let mut space = Space::create(&mut host, SpaceOptions::default(), |_| {});
    space.register_interactable(InteractableId(10), Behavior::Capture);
    space.register_interactable(InteractableId(11), Behavior::NoPan);
    (host, space)
}

fn mouse(space: &mut Space, event: InputEvent<u32>, now_ms: u64) -> Vec<GestureEvent> {
    space.handle_input(&Frames, event, now_ms).into_vec()
}

#[test]
fn edge_autoscroll_scenario() {
    let (mut host, mut space) = space();
    let container = Rect::new(0.0, 0.0, 1000.0, 800.0);

    // Grab the frame's handle.
    let events = mouse(
        &mut space,
        InputEvent::MouseDown {
            position: Point::new(500.0, 400.0),
            buttons: Buttons::PRIMARY,
            target: Some(10),
        },
        0,
    );
    assert!(matches!(
        events.as_slice(),
        [GestureEvent::PressStart { .. }]
    ));
    space.begin_frame_drag(container);

    // Still well inside: nothing moves.
    assert_eq!(
        space.frame_drag_moved(Point::new(900.0, 400.0)),
        AutoscrollChange::Unchanged
    );
    assert!(!space.animation_frame());

    // Cross into the right-hand margin.
    assert_eq!(
        space.frame_drag_moved(Point::new(990.0, 400.0)),
        AutoscrollChange::Started(EdgeDirection::Right)
    );
    for _ in 0..5 {
        assert!(space.animation_frame());
    }
    assert_eq!(space.camera().left(), 20.0);
    assert_eq!(space.camera().top(), 0.0);

    // Slide down into the corner: the old direction is replaced, never doubled.
    assert_eq!(
        space.frame_drag_moved(Point::new(990.0, 795.0)),
        AutoscrollChange::Switched {
            from: EdgeDirection::Right,
            to: EdgeDirection::RightDown,
        }
    );
    space.animation_frame();
    assert_eq!(space.camera().left(), 24.0);
    assert_eq!(space.camera().top(), 4.0);

    // Back inside the margin stops it.
    assert_eq!(
        space.frame_drag_moved(Point::new(500.0, 400.0)),
        AutoscrollChange::Stopped(EdgeDirection::RightDown)
    );
    assert!(!space.animation_frame());
    assert_eq!(space.camera().left(), 24.0);

    space.end_frame_drag();
    // The handle is still held down, so tearing down cancels the press.
    let cancelled = space.destroy(&mut host).into_vec();
    assert_eq!(
        cancelled,
        [GestureEvent::PressCancel {
            target: Some(InteractableId(10))
        }]
    );
    assert_eq!(host.subscribed, 0);
    assert!(space.destroy(&mut host).is_empty());
}

#[test]
fn nested_text_boxes_do_not_pan() {
    let (_host, mut space) = space();
    mouse(
        &mut space,
        InputEvent::MouseDown {
            position: Point::new(10.0, 10.0),
            buttons: Buttons::PRIMARY,
            target: Some(11),
        },
        0,
    );
    assert_eq!(
        space.handle_input(
            &Frames,
            InputEvent::MouseMove {
                position: Point::new(200.0, 10.0),
                buttons: Buttons::PRIMARY,
                target: Some(11),
            },
            16,
        )
        .len(),
        0
    );
    assert_eq!(space.camera().left(), 0.0);
}

#[test]
fn children_of_a_handle_resolve_to_the_handle() {
    let (_host, mut space) = space();
    // Node 100 is a child of the handle (10).
    let events = mouse(
        &mut space,
        InputEvent::MouseDown {
            position: Point::new(10.0, 10.0),
            buttons: Buttons::PRIMARY,
            target: Some(100),
        },
        0,
    );
    assert!(matches!(
        events.as_slice(),
        [GestureEvent::PressStart {
            target: Some(InteractableId(10)),
            ..
        }]
    ));
}

#[test]
fn fling_glides_and_terminates() {
    let (_host, mut space) = space();
    let at = |x| Point::new(x, 300.0);
    mouse(
        &mut space,
        InputEvent::MouseDown {
            position: at(600.0),
            buttons: Buttons::PRIMARY,
            target: None,
        },
        0,
    );
    for (i, x) in [560.0, 520.0, 480.0].into_iter().enumerate() {
        let t = 16 * (u64::try_from(i).unwrap() + 1);
        mouse(
            &mut space,
            InputEvent::MouseMove {
                position: at(x),
                buttons: Buttons::PRIMARY,
                target: None,
            },
            t,
        );
    }
    assert_eq!(space.camera().left(), 120.0);
    mouse(&mut space, InputEvent::MouseUp { position: at(480.0) }, 50);

    let mut frames = 0;
    while space.animation_frame() {
        frames += 1;
        assert!(frames < 1_000, "inertia never settled");
    }
    assert!(frames > 0);
    assert!(space.camera().left() > 120.0);
}

#[test]
fn page_mode_wheel_zoom_uses_container_height() {
    let (_host, mut space) = space();
    space.handle_input(
        &Frames,
        InputEvent::Wheel {
            position: Point::new(500.0, 400.0),
            delta: Vec2::new(0.0, -0.25),
            mode: WheelDeltaMode::Page,
            modifiers: Modifiers::META,
        },
        0,
    );
    assert_eq!(space.camera().zoom_factor(), 1.25);
    // The pointer's virtual point stayed put.
    let p = space.camera().client_to_virtual_point(Point::new(500.0, 400.0));
    assert!((p.x - 500.0).abs() < 1e-9 && (p.y - 400.0).abs() < 1e-9);
}

#[test]
fn taps_on_the_background_are_reported() {
    let (_host, mut space) = space();
    mouse(
        &mut space,
        InputEvent::MouseDown {
            position: Point::new(300.0, 300.0),
            buttons: Buttons::PRIMARY,
            target: Some(5),
        },
        0,
    );
    assert_eq!(space.handle_input(&Frames, InputEvent::TouchCancel, 1).len(), 0);
    assert_eq!(space.gestures_mut().phase(), GesturePhase::Idle);

    mouse(
        &mut space,
        InputEvent::MouseDown {
            position: Point::new(300.0, 300.0),
            buttons: Buttons::PRIMARY,
            target: Some(5),
        },
        10,
    );
    let events = mouse(
        &mut space,
        InputEvent::MouseUp {
            position: Point::new(300.0, 300.0),
        },
        20,
    );
    match events.as_slice() {
        [GestureEvent::Tap { at }] => assert_eq!(at.space, Point::new(300.0, 300.0)),
        other => panic!("expected a tap, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn zoom_stays_positive_under_any_wheel(
        deltas in proptest::collection::vec(-5_000.0_f64..5_000.0, 1..40),
        ctrl in any::<bool>(),
    ) {
        let (_host, mut space) = space();
        let modifiers = if ctrl { Modifiers::CTRL } else { Modifiers::META };
        for dy in deltas {
            space.handle_input(
                &Frames,
                InputEvent::Wheel {
                    position: Point::new(250.0, 250.0),
                    delta: Vec2::new(0.0, dy),
                    mode: WheelDeltaMode::Pixel,
                    modifiers,
                },
                0,
            );
            prop_assert!(space.camera().zoom_factor() > 0.0);
            prop_assert!(space.camera().zoom_factor().is_finite());
        }
    }

    #[test]
    fn pinch_keeps_the_centroid_fixed(spread in 20.0_f64..400.0) {
        let (_host, mut space) = space();
        let c = Point::new(400.0, 300.0);
        let before = space.camera().client_to_virtual_point(c);
        let pair = |half: f64| -> sandpit_event_state::Touches {
            smallvec::smallvec![Point::new(c.x - half, c.y), Point::new(c.x + half, c.y)]
        };
        space.handle_input(&Frames, InputEvent::TouchStart { touches: pair(50.0), target: None }, 0);
        space.handle_input(&Frames, InputEvent::TouchMove { touches: pair(spread / 2.0) }, 16);
        let after = space.camera().client_to_virtual_point(c);
        prop_assert!((after.x - before.x).abs() < 1e-6);
        prop_assert!((after.y - before.y).abs() < 1e-6);
    }
}
