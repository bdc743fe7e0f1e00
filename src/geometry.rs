//! Screen geometry
//!
//! Rectangles live in screen space with the origin at the bottom-left corner of
//! the reference screen and y growing upwards. Callers describe frames top-down
//! (origin top-left, y growing downwards), so every incoming frame is inverted
//! against the reference screen height before it reaches a render target.

use crate::attrs::FrameAttrs;

/// Rectangle in screen space (origin bottom-left, y-up)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle with no visible area.
    ///
    /// NaN sizes count as empty as well, they can only come from garbage input.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Grow outward by `stroke` on every side.
    ///
    /// This is the frame a render target must occupy so that a stroke of width
    /// `stroke` centered on the original edge is not clipped.
    pub fn grow_for_stroke(&self, stroke: f64) -> Self {
        Self {
            x: self.x - stroke,
            y: self.y - stroke,
            width: self.width + 2.0 * stroke,
            height: self.height + 2.0 * stroke,
        }
    }

    /// Inverse of [`Rect::grow_for_stroke`]
    pub fn shrink_for_stroke(&self, stroke: f64) -> Self {
        self.grow_for_stroke(-stroke)
    }

    /// Convert back to a top-left origin for backends that address the screen
    /// top-down.
    pub fn to_top_left(&self, screen_height: f64) -> Self {
        Self {
            y: screen_height - (self.y + self.height),
            ..*self
        }
    }
}

/// Invert a top-down frame into screen space.
pub fn to_screen_rect(frame: &FrameAttrs, screen_height: f64) -> Rect {
    Rect {
        x: frame.x,
        y: screen_height - (frame.y + frame.h),
        width: frame.w,
        height: frame.h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inversion_uses_bottom_edge() {
        let frame = FrameAttrs { x: 10.0, y: 20.0, w: 100.0, h: 50.0 };
        let rect = to_screen_rect(&frame, 800.0);
        assert_eq!(rect, Rect::new(10.0, 730.0, 100.0, 50.0));
    }

    #[test]
    fn test_inversion_round_trips_to_top_left() {
        let frame = FrameAttrs { x: 5.0, y: 40.0, w: 30.0, h: 60.0 };
        let rect = to_screen_rect(&frame, 1080.0);
        let back = rect.to_top_left(1080.0);
        assert_eq!(back, Rect::new(5.0, 40.0, 30.0, 60.0));
    }

    #[test]
    fn test_grow_for_stroke() {
        let rect = Rect::new(100.0, 200.0, 300.0, 400.0);
        assert_eq!(rect.grow_for_stroke(4.0), Rect::new(96.0, 196.0, 308.0, 408.0));
        assert_eq!(rect.grow_for_stroke(4.0).shrink_for_stroke(4.0), rect);
        assert_eq!(rect.grow_for_stroke(0.0), rect);
    }

    #[test]
    fn test_empty_rects() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_empty());
        assert!(Rect::new(0.0, 0.0, -3.0, 10.0).is_empty());
        assert!(Rect::new(0.0, 0.0, f64::NAN, 10.0).is_empty());
        assert!(!Rect::new(-5.0, -5.0, 1.0, 1.0).is_empty());
        // growing a zero-sized node still yields a visible window
        assert!(!Rect::default().grow_for_stroke(4.0).is_empty());
    }
}
