// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size, Vec2};
use sandpit_event_state::{
    Behavior, Buttons, ElementTree, InputEvent, InteractableId, InteractableRegistry, Modifiers,
    ResizeSource, ResizeSubscription, Space, SpaceOptions, WheelDeltaMode,
};
use sandpit_view2d::ViewportCamera;

struct Host;

impl ResizeSource for Host {
    fn subscribe(&mut self) -> ResizeSubscription {
        ResizeSubscription(1)
    }

    fn unsubscribe(&mut self, _subscription: ResizeSubscription) {}

    fn container_size(&self) -> Size {
        Size::new(1280.0, 800.0)
    }
}

/// A linear chain of `depth` nodes; only the root is interactable.
struct Chain {
    depth: u32,
}

impl ElementTree for Chain {
    type Node = u32;

    fn parent(&self, node: u32) -> Option<u32> {
        node.checked_sub(1)
    }

    fn interactable_id(&self, node: u32) -> Option<InteractableId> {
        (node == 0 && self.depth > 0).then_some(InteractableId(0))
    }
}

fn bench_wheel_zoom(c: &mut Criterion) {
    c.bench_function("camera/wheel_zoom", |b| {
        b.iter_batched(
            || Space::create(&mut Host, SpaceOptions::default(), |_| {}),
            |mut space| {
                for i in 0..64 {
                    let dy = if i % 2 == 0 { -3.0 } else { 2.0 };
                    space.handle_input(
                        &Chain { depth: 1 },
                        InputEvent::Wheel {
                            position: Point::new(640.0, 400.0),
                            delta: Vec2::new(0.0, dy),
                            mode: WheelDeltaMode::Pixel,
                            modifiers: Modifiers::CTRL,
                        },
                        i,
                    );
                }
                black_box(space.camera().zoom_factor())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_drag_and_fling(c: &mut Criterion) {
    c.bench_function("camera/drag_and_fling", |b| {
        b.iter_batched(
            || Space::create(&mut Host, SpaceOptions::default(), |_| {}),
            |mut space| {
                let tree = Chain { depth: 0 };
                space.handle_input(
                    &tree,
                    InputEvent::MouseDown {
                        position: Point::new(100.0, 100.0),
                        buttons: Buttons::PRIMARY,
                        target: None,
                    },
                    0,
                );
                for i in 1..=20_u64 {
                    space.handle_input(
                        &tree,
                        InputEvent::MouseMove {
                            position: Point::new(100.0 + 15.0 * i as f64, 100.0),
                            buttons: Buttons::PRIMARY,
                            target: None,
                        },
                        i * 8,
                    );
                }
                space.handle_input(
                    &tree,
                    InputEvent::MouseUp {
                        position: Point::new(400.0, 100.0),
                    },
                    168,
                );
                let mut frames = 0;
                while space.animation_frame() {
                    frames += 1;
                }
                black_box(frames)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("interactable/resolve");
    let mut registry = InteractableRegistry::new();
    registry.register(InteractableId(0), Behavior::Capture);
    for depth in [4_u32, 32, 256] {
        let tree = Chain { depth };
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| black_box(registry.resolve(&tree, black_box(depth))));
        });
    }
    group.finish();
}

fn bench_camera_step(c: &mut Criterion) {
    c.bench_function("camera/deceleration_to_rest", |b| {
        b.iter_batched(
            || {
                let mut camera = ViewportCamera::default();
                camera.update_container_size(1280.0, 800.0);
                camera
            },
            |mut camera| {
                camera.move_with_deceleration_in_client_space(-120.0, 45.0);
                while camera.step() {}
                black_box(camera.state())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_wheel_zoom,
    bench_drag_and_fling,
    bench_resolve,
    bench_camera_step
);
criterion_main!(benches);
