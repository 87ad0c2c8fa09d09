use core::ops::{Div, Mul};

use super::Vec2;

/// Width/height pair in logical pixels (or texels for bitmaps).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

impl Size {
    #[inline]
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    #[inline]
    pub const fn one() -> Self {
        Self { w: 1.0, h: 1.0 }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

impl From<Vec2> for Size {
    #[inline]
    fn from(v: Vec2) -> Self {
        Size::new(v.x, v.y)
    }
}

impl Mul for Size {
    type Output = Size;
    #[inline]
    fn mul(self, rhs: Size) -> Size {
        Size::new(self.w * rhs.w, self.h * rhs.h)
    }
}

impl Mul<f32> for Size {
    type Output = Size;
    #[inline]
    fn mul(self, rhs: f32) -> Size {
        Size::new(self.w * rhs, self.h * rhs)
    }
}

impl Div for Size {
    type Output = Size;
    #[inline]
    fn div(self, rhs: Size) -> Size {
        Size::new(self.w / rhs.w, self.h / rhs.h)
    }
}

/// Divides a point component-wise by a size (e.g. pixels → texture repeats).
impl Div<Size> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn div(self, rhs: Size) -> Vec2 {
        Vec2::new(self.x / rhs.w, self.y / rhs.h)
    }
}
