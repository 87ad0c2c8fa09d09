use super::{Size, Vec2};

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// The unit square `(0, 0)..(1, 1)`, used for full-range texture coordinates.
    #[inline]
    pub const fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    #[inline]
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.w, size.h)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x * 0.5, self.origin.y + self.size.y * 0.5)
    }

    #[inline]
    pub fn size_wh(self) -> Size {
        Size::from(self.size)
    }

    /// Corner decomposition for a 4-vertex triangle strip:
    /// top-left, top-right, bottom-left, bottom-right.
    #[inline]
    pub fn strip(self) -> [Vec2; 4] {
        let min = self.min();
        let max = self.max();
        [
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, max.y),
        ]
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Same area with non-negative width and height.
    #[inline]
    pub fn normalized(self) -> Self {
        let far = self.origin + self.size;
        let min = Vec2::new(self.origin.x.min(far.x), self.origin.y.min(far.y));
        Rect::from_origin_size(min, Vec2::new(self.size.x.abs(), self.size.y.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_keeps_positive_rect() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_flips_negative_extent() {
        assert_eq!(r(10.0, 10.0, -4.0, -3.0).normalized(), r(6.0, 7.0, 4.0, 3.0));
    }

    #[test]
    fn zero_extent_is_empty() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(!Rect::unit().is_empty());
    }

    // ── strip ─────────────────────────────────────────────────────────────

    #[test]
    fn strip_orders_corners_for_triangle_strip() {
        let s = r(2.0, 3.0, 10.0, 20.0).strip();
        assert_eq!(s[0], Vec2::new(2.0, 3.0));
        assert_eq!(s[1], Vec2::new(12.0, 3.0));
        assert_eq!(s[2], Vec2::new(2.0, 23.0));
        assert_eq!(s[3], Vec2::new(12.0, 23.0));
    }

    #[test]
    fn unit_strip_spans_zero_to_one() {
        let s = Rect::unit().strip();
        assert_eq!(s[0], Vec2::zero());
        assert_eq!(s[3], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn center_and_size() {
        let rect = r(0.0, 10.0, 4.0, 6.0);
        assert_eq!(rect.center(), Vec2::new(2.0, 13.0));
        assert_eq!(rect.size_wh(), Size::new(4.0, 6.0));
        assert_eq!(Rect::from_size(Size::new(4.0, 6.0)).max(), Vec2::new(4.0, 6.0));
    }
}
