/// Axis-aligned box in projected meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl CropBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn half_extents(&self) -> (f64, f64) {
        (self.width() / 2.0, self.height() / 2.0)
    }

    pub fn intersects(&self, other: &CropBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Bounding box of a point set, `None` when empty.
    pub fn around(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = CropBox {
            min_x: first.0,
            max_x: first.0,
            min_y: first.1,
            max_y: first.1,
        };
        for &(x, y) in rest {
            bbox.min_x = bbox.min_x.min(x);
            bbox.max_x = bbox.max_x.max(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }
}

/// Visible box for a poster of the given `aspect` (width / height), centered
/// on the origin. The requested radius always spans the longer dimension; the
/// shorter one is cut inward to match the aspect.
pub fn crop_box(radius: f64, aspect: f64) -> CropBox {
    let (half_x, half_y) = if aspect >= 1.0 {
        (radius, radius / aspect)
    } else {
        (radius * aspect, radius)
    };
    CropBox {
        min_x: -half_x,
        max_x: half_x,
        min_y: -half_y,
        max_y: half_y,
    }
}
