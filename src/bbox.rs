/// Axis-aligned box in corner form.
///
/// Extents follow the inclusive pixel convention: a box from `x1 = 10` to
/// `x2 = 19` is ten pixels wide.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub(crate) x1: f32,
    pub(crate) y1: f32,
    pub(crate) x2: f32,
    pub(crate) y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from its center and full size.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        BoundingBox {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
    }

    #[inline]
    pub fn center_left(&self) -> f32 {
        (self.x1 + self.x2) * 0.5
    }

    #[inline]
    pub fn center_top(&self) -> f32 {
        (self.y1 + self.y2) * 0.5
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x1
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y1
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x2
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y2
    }

    #[inline]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1 + 1.0).max(0.0)
    }

    #[inline]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1 + 1.0).max(0.0)
    }

    #[inline]
    pub fn corners(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn iou(&self, other: &Self) -> f32 {
        let int_area = self.intersection(other).area();
        if int_area <= 0.0 {
            return 0.0;
        }

        int_area / (self.area() + other.area() - int_area)
    }

    #[inline]
    pub fn scale(&mut self, x_scale: f32, y_scale: f32) {
        self.x1 *= x_scale;
        self.x2 *= x_scale;
        self.y1 *= y_scale;
        self.y2 *= y_scale;
    }

    #[inline]
    pub fn scaled(&self, x_scale: f32, y_scale: f32) -> Self {
        Self {
            x1: self.x1 * x_scale,
            x2: self.x2 * x_scale,
            y1: self.y1 * y_scale,
            y2: self.y2 * y_scale,
        }
    }

    #[inline]
    pub fn map<F: Fn(f32) -> f32>(&self, map: F) -> Self {
        Self {
            x1: map(self.x1),
            y1: map(self.y1),
            x2: map(self.x2),
            y2: map(self.y2),
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}
