// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Optional `[min, max]` limits along one axis.
///
/// Either end may be open. A range whose `min` is greater than its `max` is
/// not normalized; the camera treats it as "cannot fit" and centers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisBounds {
    /// Lower limit, if any.
    pub min: Option<f64>,
    /// Upper limit, if any.
    pub max: Option<f64>,
}

impl AxisBounds {
    /// No limits at all.
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    /// Both ends closed.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Only a lower limit.
    #[must_use]
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Only an upper limit.
    #[must_use]
    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Returns `true` when neither end is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Clamps a scalar into the range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if let Some(min) = self.min
            && value < min
        {
            return min;
        }
        if let Some(max) = self.max
            && value > max
        {
            return max;
        }
        value
    }

    /// Clamps the center of a span of `length` so the span stays in range.
    ///
    /// If both ends are set and the span is wider than the range, the center
    /// of the range is returned wherever the span currently sits. Otherwise
    /// the span is pushed back inside the violated end.
    #[must_use]
    pub fn clamp_center_of_length(&self, center: f64, length: f64) -> f64 {
        let half = length / 2.0;
        if let (Some(min), Some(max)) = (self.min, self.max)
            && length > max - min
        {
            return min + (max - min) / 2.0;
        }
        if let Some(min) = self.min
            && center - half < min
        {
            return min + half;
        }
        if let Some(max) = self.max
            && center + half > max
        {
            return max - half;
        }
        center
    }
}

/// Limits on what part of the virtual space the camera may show.
///
/// `x` and `y` constrain the visible rectangle in virtual-space units;
/// `zoom` constrains the zoom factor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewPortBounds {
    /// Horizontal limits of the visible region.
    pub x: AxisBounds,
    /// Vertical limits of the visible region.
    pub y: AxisBounds,
    /// Limits on the zoom factor.
    pub zoom: AxisBounds,
}

impl ViewPortBounds {
    /// Bounds that constrain nothing.
    pub const NONE: Self = Self {
        x: AxisBounds::UNBOUNDED,
        y: AxisBounds::UNBOUNDED,
        zoom: AxisBounds::UNBOUNDED,
    };

    /// Returns these bounds with `x` replaced.
    #[must_use]
    pub fn with_x(mut self, x: AxisBounds) -> Self {
        self.x = x;
        self
    }

    /// Returns these bounds with `y` replaced.
    #[must_use]
    pub fn with_y(mut self, y: AxisBounds) -> Self {
        self.y = y;
        self
    }

    /// Returns these bounds with `zoom` replaced.
    #[must_use]
    pub fn with_zoom(mut self, zoom: AxisBounds) -> Self {
        self.zoom = zoom;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::AxisBounds;

    #[test]
    fn clamp_respects_open_ends() {
        assert_eq!(AxisBounds::UNBOUNDED.clamp(-5.0), -5.0);
        assert_eq!(AxisBounds::at_least(0.0).clamp(-5.0), 0.0);
        assert_eq!(AxisBounds::at_most(10.0).clamp(50.0), 10.0);
        assert_eq!(AxisBounds::new(0.0, 10.0).clamp(5.0), 5.0);
    }

    #[test]
    fn span_wider_than_range_is_centered() {
        let b = AxisBounds::new(0.0, 100.0);
        assert_eq!(b.clamp_center_of_length(10.0, 400.0), 50.0);
    }

    #[test]
    fn span_wider_than_range_is_centered_from_one_side() {
        let b = AxisBounds::new(0.0, 200.0);
        // Only the right end is violated, but 1000 cannot fit in 200.
        assert_eq!(b.clamp_center_of_length(5_500.0, 1000.0), 100.0);
        assert_eq!(b.clamp_center_of_length(-5_500.0, 1000.0), 100.0);
    }

    #[test]
    fn span_pushed_back_inside_violated_end() {
        let b = AxisBounds::new(0.0, 1000.0);
        // Span of 200 centered at -4900 sticks out on the left only.
        assert_eq!(b.clamp_center_of_length(-4900.0, 200.0), 100.0);
        assert_eq!(b.clamp_center_of_length(990.0, 200.0), 900.0);
        assert_eq!(b.clamp_center_of_length(500.0, 200.0), 500.0);
    }

    #[test]
    fn one_sided_range_never_centers() {
        let b = AxisBounds::at_least(0.0);
        // Wider than anything, but there is no max to center against.
        assert_eq!(b.clamp_center_of_length(0.0, 400.0), 200.0);
    }
}
