// Phase 1: 座標系: 矩形・点・多角形（包含判定は半開区間の偶奇規則で統一）

use serde::Serialize;

/// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` in image pixels.
///
/// Construction normalizes the corners, so `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// `(x, y)` origin plus a size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Rect {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Same origin, width and height exchanged.
    pub fn flipped(&self) -> Self {
        Rect::from_origin_size(self.min_x, self.min_y, self.height(), self.width())
    }

    /// Inclusive integer pixel bounds clamped to a `width` x `height` raster,
    /// or `None` when nothing of the rectangle lies on the raster.
    pub fn clamped_pixels(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = f64::from(width - 1);
        let max_y = f64::from(height - 1);
        if self.max_x < 0.0 || self.max_y < 0.0 || self.min_x > max_x || self.min_y > max_y {
            return None;
        }
        Some((
            self.min_x.max(0.0).floor() as u32,
            self.min_y.max(0.0).floor() as u32,
            self.max_x.min(max_x).ceil().min(max_x) as u32,
            self.max_y.min(max_y).ceil().min(max_y) as u32,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Closed polygon; the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Even-odd point containment.
    ///
    /// An edge counts as crossed when `y` lies in `[y_lo, y_hi)` of the edge,
    /// and a crossing counts when `x` is strictly left of it. Every pixel
    /// operation (extract, scale, settle, paperize) goes through this test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.points.len();
        if n < 2 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > y) != (pj.y > y) {
                let x_cross = (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x;
                if x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        Some(rect)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        Polygon::new(
            self.points
                .iter()
                .map(|p| Point::new(p.x + dx, p.y + dy))
                .collect(),
        )
    }

    /// Scale every vertex about `center`.
    pub fn scaled_about(&self, center: Point, scale_x: f64, scale_y: f64) -> Polygon {
        Polygon::new(
            self.points
                .iter()
                .map(|p| {
                    Point::new(
                        center.x + (p.x - center.x) * scale_x,
                        center.y + (p.y - center.y) * scale_y,
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn test_contains_is_half_open() {
        let sq = square(0.0, 0.0, 10.0, 10.0);
        assert!(sq.contains(0.0, 0.0));
        assert!(sq.contains(9.0, 9.0));
        assert!(!sq.contains(10.0, 5.0));
        assert!(!sq.contains(5.0, 10.0));
        assert!(!sq.contains(-1.0, 5.0));
    }

    #[test]
    fn test_two_point_polygon_contains_nothing_off_line() {
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(!line.contains(5.0, 0.0));
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(10.0, 8.0, 2.0, 4.0);
        assert_eq!((r.min_x, r.min_y, r.max_x, r.max_y), (2.0, 4.0, 10.0, 8.0));
        assert_eq!(r.flipped().width(), 4.0);
    }

    #[test]
    fn test_clamped_pixels() {
        let r = Rect::new(-5.0, -5.0, 3.5, 100.0);
        assert_eq!(r.clamped_pixels(10, 10), Some((0, 0, 4, 9)));
        assert_eq!(Rect::new(20.0, 0.0, 30.0, 5.0).clamped_pixels(10, 10), None);
    }
}
