// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::bounds::ViewPortBounds;
use crate::persist::ViewportSnapshot;

/// Smallest zoom factor the camera will ever hold.
///
/// Any computation that would produce a zero, negative, or non-finite zoom
/// lands here instead.
pub const MIN_ZOOM_FACTOR: f64 = 1e-3;

/// Observer invoked once per logical camera update.
pub type UpdateObserver = Box<dyn FnMut(&ViewportState)>;

/// Tuning knobs for a [`ViewportCamera`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraOptions {
    /// Multiplier applied to the inertial velocity after every animation frame.
    ///
    /// Must be in `(0, 1)`; values outside are clamped when the animation starts.
    pub deceleration_factor: f64,
    /// Inertia stops once the velocity (client pixels per frame) drops below this.
    pub velocity_threshold: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            deceleration_factor: 0.92,
            velocity_threshold: 0.1,
        }
    }
}

/// Read-only view of the camera: the visible virtual rectangle plus the
/// physical size of the hosting element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    /// Virtual-space x coordinate shown at the container's left edge.
    pub left: f64,
    /// Virtual-space y coordinate shown at the container's top edge.
    pub top: f64,
    /// `2.0` is 200% (zoomed in), `0.5` is 50% (zoomed out).
    pub zoom_factor: f64,
    /// Container width in client pixels.
    pub container_width: f64,
    /// Container height in client pixels.
    pub container_height: f64,
}

impl ViewportState {
    /// Visible width in virtual-space units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.container_width / self.zoom_factor
    }

    /// Visible height in virtual-space units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.container_height / self.zoom_factor
    }

    /// Virtual-space x coordinate at the center of the container.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.left + self.width() / 2.0
    }

    /// Virtual-space y coordinate at the center of the container.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.top + self.height() / 2.0
    }

    /// The visible region of the virtual space.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width(),
            self.top + self.height(),
        )
    }

    /// Transform from virtual space into container space.
    ///
    /// Equivalent to the CSS `scale(zoom) translate(-left px, -top px)` with a
    /// top-left transform origin.
    #[must_use]
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom_factor) * Affine::translate((-self.left, -self.top))
    }
}

/// The camera over one canvas's virtual space.
///
/// Owns `left`, `top`, and the zoom factor. Every mutation goes through one of
/// the public operations, each of which clamps into the installed
/// [`ViewPortBounds`] and, if anything changed, bumps [`revision`] and calls
/// the update observer exactly once.
///
/// Inertia is frame driven: [`move_with_deceleration_in_client_space`] arms
/// the animation and the host calls [`step`] once per animation frame until
/// it returns `false`. Any direct move cancels it first.
///
/// [`revision`]: ViewportCamera::revision
/// [`move_with_deceleration_in_client_space`]: ViewportCamera::move_with_deceleration_in_client_space
/// [`step`]: ViewportCamera::step
pub struct ViewportCamera {
    left: f64,
    top: f64,
    zoom: f64,
    container: Size,
    bounds: ViewPortBounds,
    options: CameraOptions,
    velocity: Option<Vec2>,
    on_updated: Option<UpdateObserver>,
    revision: u64,
    destroyed: bool,
}

impl fmt::Debug for ViewportCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportCamera")
            .field("left", &self.left)
            .field("top", &self.top)
            .field("zoom", &self.zoom)
            .field("container", &self.container)
            .field("bounds", &self.bounds)
            .field("options", &self.options)
            .field("velocity", &self.velocity)
            .field("has_observer", &self.on_updated.is_some())
            .field("revision", &self.revision)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self::new(CameraOptions::default())
    }
}

impl ViewportCamera {
    /// Creates a camera at the origin, zoom `1.0`, with an empty container.
    #[must_use]
    pub fn new(options: CameraOptions) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            zoom: 1.0,
            container: Size::ZERO,
            bounds: ViewPortBounds::NONE,
            options,
            velocity: None,
            on_updated: None,
            revision: 0,
            destroyed: false,
        }
    }

    /// Installs the observer called after each logical update.
    pub fn set_on_updated(&mut self, observer: impl FnMut(&ViewportState) + 'static) {
        if self.destroyed {
            return;
        }
        self.on_updated = Some(Box::new(observer));
    }

    /// Removes the update observer.
    pub fn clear_on_updated(&mut self) {
        self.on_updated = None;
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ViewportState {
        ViewportState {
            left: self.left,
            top: self.top,
            zoom_factor: self.zoom,
            container_width: self.container.width,
            container_height: self.container.height,
        }
    }

    /// Virtual-space x at the container's left edge.
    #[must_use]
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Virtual-space y at the container's top edge.
    #[must_use]
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Current zoom factor, always strictly positive.
    #[must_use]
    pub fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    /// Current container size in client pixels.
    #[must_use]
    pub fn container_size(&self) -> Size {
        self.container
    }

    /// Installed bounds.
    #[must_use]
    pub fn bounds(&self) -> ViewPortBounds {
        self.bounds
    }

    /// Counter bumped once per state-changing operation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` after [`ViewportCamera::destroy`].
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns `true` while an inertial animation is armed.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.velocity.is_some()
    }

    /// Records a new physical container size and re-clamps.
    ///
    /// The visible virtual width/height follow from `size / zoom`. Negative
    /// or non-finite dimensions are treated as zero.
    pub fn update_container_size(&mut self, width: f64, height: f64) {
        if self.destroyed {
            return;
        }
        let before = self.state();
        self.container = Size::new(sanitize_extent(width), sanitize_extent(height));
        self.apply(self.left, self.top, self.zoom);
        self.finish(before);
    }

    /// Installs (or replaces) bounds and immediately clamps the current state.
    pub fn set_bounds(&mut self, bounds: ViewPortBounds) {
        if self.destroyed {
            return;
        }
        let before = self.state();
        self.bounds = bounds;
        self.apply(self.left, self.top, self.zoom);
        self.finish(before);
    }

    /// Translates by a delta in virtual-space units.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        if self.destroyed || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.cancel_animation();
        let before = self.state();
        self.apply(self.left + dx, self.top + dy, self.zoom);
        self.finish(before);
    }

    /// Translates and zooms using client-pixel deltas.
    ///
    /// The translation is divided by the current zoom. The zoom change is
    /// relative: the new zoom is `zoom * (1 + d_zoom)`. The virtual point under
    /// `pivot` (container-relative client pixels; defaults to the container
    /// center) stays visually fixed, unless bounds force otherwise.
    pub fn move_by_in_client_space(
        &mut self,
        dx: f64,
        dy: f64,
        d_zoom: f64,
        pivot: Option<Point>,
    ) {
        if self.destroyed || !dx.is_finite() || !dy.is_finite() || !d_zoom.is_finite() {
            return;
        }
        self.cancel_animation();
        let before = self.state();
        self.translate_and_zoom_client(Vec2::new(dx, dy), d_zoom, pivot);
        self.finish(before);
    }

    /// Arms an inertial glide with an initial velocity in client pixels per frame.
    ///
    /// Call [`ViewportCamera::step`] once per animation frame to advance it.
    /// Velocities below the configured threshold do nothing.
    pub fn move_with_deceleration_in_client_space(&mut self, velocity_x: f64, velocity_y: f64) {
        if self.destroyed {
            return;
        }
        self.cancel_animation();
        let velocity = Vec2::new(velocity_x, velocity_y);
        if !velocity.is_finite() || velocity.hypot() < self.options.velocity_threshold {
            return;
        }
        log::trace!("camera: starting deceleration at {velocity:?}");
        self.velocity = Some(velocity);
    }

    /// Advances the inertial animation by one frame.
    ///
    /// Returns `true` if another frame is needed.
    pub fn step(&mut self) -> bool {
        let Some(velocity) = self.velocity.take() else {
            return false;
        };
        if self.destroyed {
            return false;
        }
        let before = self.state();
        self.translate_and_zoom_client(velocity, 0.0, None);
        let moved = self.finish(before);

        let factor = self.options.deceleration_factor.clamp(0.0, 0.999);
        let next = velocity * factor;
        if moved && next.hypot() >= self.options.velocity_threshold {
            self.velocity = Some(next);
        } else {
            log::trace!("camera: deceleration settled");
        }
        self.velocity.is_some()
    }

    /// Stops any in-flight inertial animation.
    pub fn cancel_animation(&mut self) {
        self.velocity = None;
    }

    /// Centers the view on a virtual-space point at the given zoom.
    pub fn recenter(&mut self, x: f64, y: f64, zoom_factor: f64) {
        if self.destroyed || !x.is_finite() || !y.is_finite() {
            return;
        }
        self.cancel_animation();
        let before = self.state();
        let zoom = self.clamp_zoom(zoom_factor);
        let left = x - self.container.width / zoom / 2.0;
        let top = y - self.container.height / zoom / 2.0;
        self.apply(left, top, zoom);
        self.finish(before);
    }

    /// Moves the top-left corner directly, optionally changing the zoom.
    pub fn update_top_left(&mut self, left: f64, top: f64, zoom_factor: Option<f64>) {
        if self.destroyed || !left.is_finite() || !top.is_finite() {
            return;
        }
        self.cancel_animation();
        let before = self.state();
        let zoom = zoom_factor.unwrap_or(self.zoom);
        self.apply(left, top, zoom);
        self.finish(before);
    }

    /// Position to persist.
    #[must_use]
    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            left: self.left,
            top: self.top,
            zoom: self.zoom,
        }
    }

    /// Restores a persisted position (clamped like any other move).
    pub fn restore(&mut self, snapshot: ViewportSnapshot) {
        self.update_top_left(snapshot.left, snapshot.top, Some(snapshot.zoom));
    }

    /// Converts a container-relative client point into virtual space.
    #[must_use]
    pub fn client_to_virtual_point(&self, pt: Point) -> Point {
        Point::new(pt.x / self.zoom + self.left, pt.y / self.zoom + self.top)
    }

    /// Converts a virtual-space point into container-relative client pixels.
    #[must_use]
    pub fn virtual_to_client_point(&self, pt: Point) -> Point {
        Point::new((pt.x - self.left) * self.zoom, (pt.y - self.top) * self.zoom)
    }

    /// Converts a container-relative client rectangle into virtual space.
    #[must_use]
    pub fn client_to_virtual_rect(&self, rect: Rect) -> Rect {
        let p0 = self.client_to_virtual_point(Point::new(rect.x0, rect.y0));
        let p1 = self.client_to_virtual_point(Point::new(rect.x1, rect.y1));
        Rect::from_points(p0, p1)
    }

    /// The visible region of the virtual space.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        self.state().visible_rect()
    }

    /// Transform from virtual space into container space.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.state().transform()
    }

    /// Tears the camera down.
    ///
    /// Cancels inertia and drops the observer. Every later operation is a
    /// no-op, so late callbacks from the host cannot touch a dead camera.
    pub fn destroy(&mut self) {
        self.velocity = None;
        self.on_updated = None;
        self.destroyed = true;
    }

    fn translate_and_zoom_client(&mut self, delta: Vec2, d_zoom: f64, pivot: Option<Point>) {
        let zoom = self.zoom;
        let left = self.left + delta.x / zoom;
        let top = self.top + delta.y / zoom;
        let new_zoom = self.clamp_zoom(zoom * (1.0 + d_zoom));
        if new_zoom == zoom {
            self.apply(left, top, zoom);
            return;
        }
        let pivot = pivot.unwrap_or_else(|| {
            Point::new(self.container.width / 2.0, self.container.height / 2.0)
        });
        // Virtual point under the pivot before the zoom; keep it there after.
        let anchor_x = left + pivot.x / zoom;
        let anchor_y = top + pivot.y / zoom;
        self.apply(
            anchor_x - pivot.x / new_zoom,
            anchor_y - pivot.y / new_zoom,
            new_zoom,
        );
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        let zoom = if zoom.is_nan() { self.zoom } else { zoom };
        let zoom = self.bounds.zoom.clamp(zoom);
        if zoom.is_finite() {
            zoom.max(MIN_ZOOM_FACTOR)
        } else {
            self.zoom
        }
    }

    /// Writes a candidate state after clamping it into bounds.
    fn apply(&mut self, left: f64, top: f64, zoom: f64) {
        let zoom = self.clamp_zoom(zoom);
        let width = self.container.width / zoom;
        let height = self.container.height / zoom;
        let center_x = self
            .bounds
            .x
            .clamp_center_of_length(left + width / 2.0, width);
        let center_y = self
            .bounds
            .y
            .clamp_center_of_length(top + height / 2.0, height);
        self.left = center_x - width / 2.0;
        self.top = center_y - height / 2.0;
        self.zoom = zoom;
    }

    /// Notifies once if anything changed since `before`.
    fn finish(&mut self, before: ViewportState) -> bool {
        let after = self.state();
        if after == before {
            return false;
        }
        self.revision += 1;
        if let Some(observer) = self.on_updated.as_mut() {
            observer(&after);
        }
        true
    }
}

fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use kurbo::Point;

    use super::{MIN_ZOOM_FACTOR, ViewportCamera};
    use crate::bounds::{AxisBounds, ViewPortBounds};

    fn camera(width: f64, height: f64) -> ViewportCamera {
        let mut cam = ViewportCamera::default();
        cam.update_container_size(width, height);
        cam
    }

    #[test]
    fn visible_extent_follows_zoom() {
        let mut cam = camera(800.0, 600.0);
        cam.update_top_left(0.0, 0.0, Some(2.0));
        let state = cam.state();
        assert_eq!(state.width(), 400.0);
        assert_eq!(state.height(), 300.0);
    }

    #[test]
    fn client_deltas_are_divided_by_zoom() {
        let mut cam = camera(800.0, 600.0);
        cam.update_top_left(0.0, 0.0, Some(4.0));
        cam.move_by_in_client_space(40.0, -20.0, 0.0, None);
        assert_eq!(cam.left(), 10.0);
        assert_eq!(cam.top(), -5.0);
    }

    #[test]
    fn zoom_about_pivot_keeps_point_fixed() {
        let mut cam = camera(800.0, 600.0);
        cam.update_top_left(120.0, -40.0, Some(1.5));
        let pivot = Point::new(200.0, 450.0);
        let before = cam.client_to_virtual_point(pivot);

        cam.move_by_in_client_space(0.0, 0.0, 0.75, Some(pivot));
        let after = cam.client_to_virtual_point(pivot);

        assert!((after.x - before.x).abs() < 1e-9, "x drifted: {before:?} -> {after:?}");
        assert!((after.y - before.y).abs() < 1e-9, "y drifted: {before:?} -> {after:?}");
        assert!((cam.zoom_factor() - 1.5 * 1.75).abs() < 1e-12);
    }

    #[test]
    fn zoom_never_reaches_zero() {
        let mut cam = camera(800.0, 600.0);
        cam.move_by_in_client_space(0.0, 0.0, -1.0, None);
        assert_eq!(cam.zoom_factor(), MIN_ZOOM_FACTOR);
        cam.move_by_in_client_space(0.0, 0.0, -25.0, None);
        assert!(cam.zoom_factor() > 0.0);
    }

    #[test]
    fn bounds_clamp_left_edge() {
        let mut cam = camera(0.0, 0.0);
        cam.set_bounds(ViewPortBounds::NONE.with_x(AxisBounds::new(0.0, 1000.0)));
        cam.move_by(-5000.0, 0.0);
        assert_eq!(cam.left(), 0.0);
    }

    #[test]
    fn setting_bounds_clamps_current_state() {
        let mut cam = camera(100.0, 100.0);
        cam.update_top_left(5000.0, 5000.0, None);
        cam.set_bounds(
            ViewPortBounds::NONE
                .with_x(AxisBounds::new(0.0, 1000.0))
                .with_y(AxisBounds::new(0.0, 1000.0)),
        );
        assert_eq!(cam.left(), 900.0);
        assert_eq!(cam.top(), 900.0);
    }

    #[test]
    fn span_that_cannot_fit_is_centered() {
        let mut cam = camera(1000.0, 100.0);
        cam.set_bounds(ViewPortBounds::NONE.with_x(AxisBounds::new(0.0, 200.0)));
        // 1000 wide view of a 200 wide range, overflowing both ends.
        cam.recenter(120.0, 0.0, 1.0);
        assert_eq!(cam.state().center_x(), 100.0);
    }

    #[test]
    fn zoom_bounds_apply() {
        let mut cam = camera(800.0, 600.0);
        cam.set_bounds(ViewPortBounds::NONE.with_zoom(AxisBounds::new(0.5, 2.0)));
        cam.move_by_in_client_space(0.0, 0.0, 10.0, None);
        assert_eq!(cam.zoom_factor(), 2.0);
        cam.recenter(0.0, 0.0, 0.01);
        assert_eq!(cam.zoom_factor(), 0.5);
    }

    #[test]
    fn observer_fires_once_per_changing_operation() {
        let calls = Rc::new(Cell::new(0_u32));
        let mut cam = camera(800.0, 600.0);
        let seen = calls.clone();
        cam.set_on_updated(move |_| seen.set(seen.get() + 1));

        cam.move_by_in_client_space(10.0, 10.0, 0.5, Some(Point::new(3.0, 4.0)));
        assert_eq!(calls.get(), 1);

        // Same arguments that do not change anything: no notification.
        cam.move_by(0.0, 0.0);
        assert_eq!(calls.get(), 1);

        cam.recenter(0.0, 0.0, 1.0);
        assert_eq!(calls.get(), 2);
        assert_eq!(cam.revision(), 3);
    }

    #[test]
    fn recenter_is_idempotent() {
        let mut cam = camera(800.0, 600.0);
        cam.recenter(50.0, 75.0, 2.0);
        let first = cam.state();
        let revision = cam.revision();
        cam.recenter(50.0, 75.0, 2.0);
        assert_eq!(cam.state(), first);
        assert_eq!(cam.revision(), revision);
        assert_eq!(first.center_x(), 50.0);
        assert_eq!(first.center_y(), 75.0);
    }

    #[test]
    fn deceleration_settles() {
        let mut cam = camera(800.0, 600.0);
        cam.move_with_deceleration_in_client_space(500.0, -500.0);
        assert!(cam.is_animating());
        let mut frames = 0;
        while cam.step() {
            frames += 1;
            assert!(frames < 1_000, "deceleration did not settle");
        }
        assert!(!cam.is_animating());
        assert!(cam.left() > 0.0);
        assert!(cam.top() < 0.0);
    }

    #[test]
    fn direct_move_cancels_deceleration() {
        let mut cam = camera(800.0, 600.0);
        cam.move_with_deceleration_in_client_space(50.0, 0.0);
        cam.move_by(1.0, 1.0);
        assert!(!cam.is_animating());
        assert!(!cam.step());
    }

    #[test]
    fn deceleration_stops_against_bounds() {
        let mut cam = camera(100.0, 100.0);
        cam.set_bounds(
            ViewPortBounds::NONE
                .with_x(AxisBounds::new(0.0, 100.0))
                .with_y(AxisBounds::new(0.0, 100.0)),
        );
        cam.move_with_deceleration_in_client_space(30.0, 30.0);
        assert!(!cam.step(), "nothing can move, so the glide ends immediately");
    }

    #[test]
    fn destroyed_camera_ignores_everything() {
        let calls = Rc::new(Cell::new(0_u32));
        let mut cam = camera(800.0, 600.0);
        let seen = calls.clone();
        cam.set_on_updated(move |_| seen.set(seen.get() + 1));
        cam.move_with_deceleration_in_client_space(50.0, 0.0);

        cam.destroy();
        cam.move_by(10.0, 0.0);
        cam.update_container_size(10.0, 10.0);
        assert!(!cam.step());
        assert_eq!(cam.left(), 0.0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn transform_maps_virtual_into_container() {
        let mut cam = camera(800.0, 600.0);
        cam.update_top_left(100.0, 50.0, Some(2.0));
        let virt = Point::new(110.0, 60.0);
        let container = cam.transform() * virt;
        assert!((container.x - 20.0).abs() < 1e-9);
        assert!((container.y - 20.0).abs() < 1e-9);
        let back = cam.client_to_virtual_point(container);
        assert!((back.x - virt.x).abs() < 1e-9);
        assert!((back.y - virt.y).abs() < 1e-9);
    }
}
