// Phase 5: 領域変換: 多角形による切り出し・拡縮・再配置
//
// 切り出しは Polygon::contains を整数画素座標で呼び出して被覆マスクを作る。
// 拡縮はマスクを引き継ぎ、貼り戻しはマスクの立つ画素だけを書く。

use tracing::debug;

use crate::error::MarchError;
use crate::raster::{Color, PixelBuffer, Point, Polygon, Rect, TRANSPARENT};

/// A polygon-bounded piece cut out of the sheet.
///
/// `pixels` covers the outline's bounding box; pixel `(0, 0)` sits at
/// `(origin_x, origin_y)` in sheet coordinates. Pixels outside the outline
/// are transparent and not covered.
#[derive(Debug, Clone, PartialEq)]
pub struct Excerpt {
    pub pixels: PixelBuffer,
    pub origin_x: i64,
    pub origin_y: i64,
    /// Outline in sheet coordinates.
    pub outline: Polygon,
    /// Row-major flags over `pixels`: the pixel belongs to the excerpt.
    coverage: Vec<bool>,
}

impl Excerpt {
    /// Bounding box in sheet coordinates (inclusive pixel bounds).
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            self.origin_x as f64,
            self.origin_y as f64,
            f64::from(self.pixels.width().saturating_sub(1)),
            f64::from(self.pixels.height().saturating_sub(1)),
        )
    }

    /// Pixel at sheet coordinate `(x, y)`, if the excerpt covers it.
    pub fn sample(&self, x: i64, y: i64) -> Option<Color> {
        self.pixels.try_get(x - self.origin_x, y - self.origin_y)
    }

    /// Whether sheet coordinate `(x, y)` belongs to the excerpt.
    pub fn covers(&self, x: i64, y: i64) -> bool {
        self.covers_local(x - self.origin_x, y - self.origin_y)
    }

    /// Number of pixels that belong to the excerpt.
    pub fn covered_count(&self) -> usize {
        self.coverage.iter().filter(|&&c| c).count()
    }

    fn covers_local(&self, lx: i64, ly: i64) -> bool {
        if !self.pixels.contains(lx, ly) {
            return false;
        }
        let index = ly as usize * self.pixels.width() as usize + lx as usize;
        self.coverage.get(index).copied().unwrap_or(false)
    }

    fn center(&self) -> Point {
        Point::new(
            self.origin_x as f64 + f64::from(self.pixels.width()) / 2.0,
            self.origin_y as f64 + f64::from(self.pixels.height()) / 2.0,
        )
    }
}

/// Cut the polygon out of `buffer`.
///
/// The excerpt receives the bounding-box pixels with everything outside the
/// polygon cleared to transparent. In `buffer`, the polygon interior is
/// overwritten with `hole_fill`, leaving a matching hole. Returns the
/// excerpt and its bounding box.
pub fn extract_excerpt(
    buffer: &mut PixelBuffer,
    polygon: &Polygon,
    hole_fill: Color,
) -> crate::error::Result<(Excerpt, Rect)> {
    let bounds = polygon
        .bounds()
        .filter(|_| polygon.len() >= 2)
        .ok_or_else(|| {
            MarchError::invalid_polygon(format!(
                "need at least 2 points to cut an excerpt, got {}",
                polygon.len()
            ))
        })?;

    let Some((x0, y0, x1, y1)) = bounds.clamped_pixels(buffer.width(), buffer.height()) else {
        let excerpt = Excerpt {
            pixels: PixelBuffer::new(0, 0),
            origin_x: bounds.min_x.floor() as i64,
            origin_y: bounds.min_y.floor() as i64,
            outline: polygon.clone(),
            coverage: Vec::new(),
        };
        return Ok((excerpt, bounds));
    };

    let clamped = Rect::new(f64::from(x0), f64::from(y0), f64::from(x1), f64::from(y1));
    let mut pixels = buffer.sub_buffer(&clamped);
    let mut coverage = vec![false; pixels.width() as usize * pixels.height() as usize];
    let mut lifted = 0usize;
    for y in y0..=y1 {
        for x in x0..=x1 {
            if polygon.contains(f64::from(x), f64::from(y)) {
                buffer.set(x, y, hole_fill);
                coverage[((y - y0) * pixels.width() + (x - x0)) as usize] = true;
                lifted += 1;
            } else {
                pixels.set(x - x0, y - y0, TRANSPARENT);
            }
        }
    }

    debug!(x0, y0, x1, y1, lifted, "excerpt extracted");
    let excerpt = Excerpt {
        pixels,
        origin_x: i64::from(x0),
        origin_y: i64::from(y0),
        outline: polygon.clone(),
        coverage,
    };
    Ok((excerpt, clamped))
}

/// Nearest-neighbour rescale of an excerpt about its bounding-box centre.
///
/// Each output pixel maps back through the inverse scale; it is filled and
/// covered only when that source pixel is covered by the unscaled excerpt,
/// so the result keeps the excerpt's silhouette. Scaling by `(1.0, 1.0)`
/// returns an identical excerpt.
pub fn scale_excerpt(
    excerpt: &Excerpt,
    scale_x: f64,
    scale_y: f64,
) -> crate::error::Result<Excerpt> {
    if !(scale_x.is_finite() && scale_y.is_finite() && scale_x > 0.0 && scale_y > 0.0) {
        return Err(MarchError::image(format!(
            "scale factors must be positive, got ({scale_x}, {scale_y})"
        )));
    }
    if scale_x == 1.0 && scale_y == 1.0 {
        return Ok(excerpt.clone());
    }

    let center = excerpt.center();
    let width = ((f64::from(excerpt.pixels.width()) * scale_x).round() as u32).max(1);
    let height = ((f64::from(excerpt.pixels.height()) * scale_y).round() as u32).max(1);
    let origin_x = (center.x - f64::from(width) / 2.0).floor() as i64;
    let origin_y = (center.y - f64::from(height) / 2.0).floor() as i64;

    let mut pixels = PixelBuffer::new(width, height);
    let mut coverage = vec![false; width as usize * height as usize];
    for ly in 0..height {
        let ty = (origin_y + i64::from(ly)) as f64;
        let src_y = (center.y + (ty + 0.5 - center.y) / scale_y).floor() as i64;
        for lx in 0..width {
            let tx = (origin_x + i64::from(lx)) as f64;
            let src_x = (center.x + (tx + 0.5 - center.x) / scale_x).floor() as i64;
            if !excerpt.covers(src_x, src_y) {
                continue;
            }
            if let Some(color) = excerpt.sample(src_x, src_y) {
                pixels.set(lx, ly, color);
                coverage[(ly * width + lx) as usize] = true;
            }
        }
    }

    debug!(scale_x, scale_y, width, height, "excerpt scaled");
    Ok(Excerpt {
        pixels,
        origin_x,
        origin_y,
        outline: excerpt.outline.scaled_about(center, scale_x, scale_y),
        coverage,
    })
}

/// Stamp the excerpt back into `buffer`, shifted by `(dx, dy)`.
///
/// Only covered pixels are written. Destinations outside the buffer are
/// dropped silently. Returns the number of pixels written.
pub fn settle(buffer: &mut PixelBuffer, excerpt: &Excerpt, dx: i64, dy: i64) -> usize {
    let mut written = 0;
    for ly in 0..excerpt.pixels.height() {
        let sy = excerpt.origin_y + i64::from(ly);
        for lx in 0..excerpt.pixels.width() {
            if !excerpt.covers_local(i64::from(lx), i64::from(ly)) {
                continue;
            }
            let sx = excerpt.origin_x + i64::from(lx);
            let (tx, ty) = (sx + dx, sy + dy);
            if buffer.contains(tx, ty) {
                buffer.set(tx as u32, ty as u32, excerpt.pixels.get(lx, ly));
                written += 1;
            }
        }
    }
    debug!(dx, dy, written, "excerpt settled");
    written
}

/// Fill the polygon interior with `fill`. Returns the number of pixels changed.
pub fn paperize(buffer: &mut PixelBuffer, polygon: &Polygon, fill: Color) -> usize {
    let Some((x0, y0, x1, y1)) = polygon
        .bounds()
        .and_then(|b| b.clamped_pixels(buffer.width(), buffer.height()))
    else {
        return 0;
    };
    let mut filled = 0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            if polygon.contains(f64::from(x), f64::from(y)) {
                buffer.set(x, y, fill);
                filled += 1;
            }
        }
    }
    filled
}
