// Phase 1: ピクセルバッファ: RGBA ラスタ + HSB 明度

use image::{DynamicImage, Rgba, RgbaImage};

use crate::raster::geometry::Rect;

/// One RGBA sample, 8 bits per channel.
pub type Color = Rgba<u8>;

/// Fully transparent pixel. Paper that has been removed becomes this.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Opaque white, used when flattening a sheet for print.
pub const WHITE: Color = Rgba([255, 255, 255, 255]);

/// HSB の明度 (brightness) を [0, 1] で返す。
///
/// `max(r, g, b) / 255`。アルファは無視するため、透明ピクセルの明度は 0。
pub fn brightness(color: Color) -> f32 {
    let [r, g, b, _] = color.0;
    f32::from(r.max(g).max(b)) / 255.0
}

/// 明度しきい値以上なら紙（背景）とみなす。
pub fn is_paper(color: Color, threshold: f32) -> bool {
    brightness(color) >= threshold
}

/// Addressable 2D raster of RGBA samples.
///
/// Access through [`get`](Self::get) / [`set`](Self::set) is bounds-checked
/// and panics on out-of-range coordinates: callers clamp first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Create a buffer where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, color),
        }
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: image.to_rgba8(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Full extent as a rectangle `(0, 0, width - 1, height - 1)`.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.width().saturating_sub(1)),
            f64::from(self.height().saturating_sub(1)),
        )
    }

    /// Whether a signed coordinate lies inside the buffer.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height())
    }

    /// Read one pixel.
    ///
    /// # Panics
    /// If `(x, y)` lies outside `[0, width) x [0, height)`.
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.assert_in_bounds(x, y);
        *self.image.get_pixel(x, y)
    }

    /// Write one pixel.
    ///
    /// # Panics
    /// If `(x, y)` lies outside `[0, width) x [0, height)`.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.assert_in_bounds(x, y);
        self.image.put_pixel(x, y, color);
    }

    pub fn try_get(&self, x: i64, y: i64) -> Option<Color> {
        if self.contains(x, y) {
            Some(*self.image.get_pixel(x as u32, y as u32))
        } else {
            None
        }
    }

    /// Raw RGBA bytes of one full-width row.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height(), "row {y} outside {}-row buffer", self.height());
        let stride = self.width() as usize * 4;
        let start = y as usize * stride;
        &self.image.as_raw()[start..start + stride]
    }

    /// Overwrite `count` full-width rows starting at `dst_y` with rows of `src`
    /// starting at `src_y`. Both buffers must share the same width.
    pub fn copy_rows_from(&mut self, src: &PixelBuffer, src_y: u32, dst_y: u32, count: u32) {
        assert_eq!(self.width(), src.width(), "row copy between different widths");
        assert!(src_y + count <= src.height() && dst_y + count <= self.height());
        let stride = self.width() as usize * 4;
        let len = count as usize * stride;
        let from = src_y as usize * stride;
        let to = dst_y as usize * stride;
        let dst: &mut [u8] = &mut self.image;
        dst[to..to + len].copy_from_slice(&src.image.as_raw()[from..from + len]);
    }

    /// Copy of the pixels inside `rect` (inclusive integer bounds).
    /// The rectangle is clamped to the buffer first.
    pub fn sub_buffer(&self, rect: &Rect) -> PixelBuffer {
        let Some((x0, y0, x1, y1)) = rect.clamped_pixels(self.width(), self.height()) else {
            return PixelBuffer::new(0, 0);
        };
        let view = image::imageops::crop_imm(&self.image, x0, y0, x1 - x0 + 1, y1 - y0 + 1);
        PixelBuffer::from_rgba_image(view.to_image())
    }

    /// Overwrite pixels with `src` placed at `(x, y)`. Pixels falling outside
    /// this buffer are dropped.
    pub fn blit(&mut self, src: &PixelBuffer, x: i64, y: i64) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                let dx = x + i64::from(sx);
                let dy = y + i64::from(sy);
                if self.contains(dx, dy) {
                    self.image.put_pixel(dx as u32, dy as u32, src.get(sx, sy));
                }
            }
        }
    }

    /// Source-over composite of `src` at `(x, y)`, clipped to this buffer.
    pub fn draw_over(&mut self, src: &PixelBuffer, x: i64, y: i64) {
        image::imageops::overlay(&mut self.image, &src.image, x, y);
    }

    /// Replace every pixel matching `predicate` with `color`.
    pub fn replace_where(&mut self, color: Color, predicate: impl Fn(Color) -> bool) -> usize {
        let mut replaced = 0;
        for pixel in self.image.pixels_mut() {
            if predicate(*pixel) {
                *pixel = color;
                replaced += 1;
            }
        }
        replaced
    }

    /// Return a buffer of at least `width` x `height`, keeping the current
    /// pixels at the origin and filling new area with transparency.
    pub fn grown_to(&self, width: u32, height: u32) -> PixelBuffer {
        if width <= self.width() && height <= self.height() {
            return self.clone();
        }
        let mut grown = PixelBuffer::new(width.max(self.width()), height.max(self.height()));
        grown.blit(self, 0, 0);
        grown
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    fn assert_in_bounds(&self, x: u32, y: u32) {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width(),
            self.height()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_is_max_channel() {
        assert_eq!(brightness(Rgba([255, 0, 0, 255])), 1.0);
        assert_eq!(brightness(Rgba([0, 0, 0, 255])), 0.0);
        assert!((brightness(Rgba([250, 250, 240, 255])) - 250.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_transparent_is_never_paper() {
        assert!(!is_paper(TRANSPARENT, 0.5));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_get_out_of_bounds_panics() {
        let buf = PixelBuffer::new(4, 4);
        let _ = buf.get(4, 0);
    }

    #[test]
    fn test_copy_rows_from() {
        let mut src = PixelBuffer::filled(3, 4, WHITE);
        src.set(1, 2, Rgba([1, 2, 3, 255]));
        let mut dst = PixelBuffer::new(3, 2);
        dst.copy_rows_from(&src, 2, 0, 1);
        assert_eq!(dst.get(1, 0), Rgba([1, 2, 3, 255]));
        assert_eq!(dst.get(0, 1), TRANSPARENT);
    }
}
