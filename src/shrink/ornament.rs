// Phase 6: 装飾の合成（テキスト・反復記号・セーニョ）と保存済みピースの先頭連結

use tracing::debug;

use crate::raster::PixelBuffer;

/// What an ornament raster depicts. Decides the history tag of the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrnamentKind {
    Text,
    RepeatSign,
    Segno,
}

/// A pre-rendered ornament waiting to be merged into the sheet.
#[derive(Debug, Clone)]
pub struct Ornament {
    pub kind: OrnamentKind,
    pub image: PixelBuffer,
    /// Top-left placement in sheet pixels.
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Ornament {
    pub fn new(kind: OrnamentKind, image: PixelBuffer, x: f64, y: f64) -> Self {
        Ornament {
            kind,
            image,
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }
}

/// Nearest-neighbour resize by independent factors.
pub fn scale_nearest(image: &PixelBuffer, scale_x: f64, scale_y: f64) -> PixelBuffer {
    let width = (f64::from(image.width()) * scale_x).max(0.0) as u32;
    let height = (f64::from(image.height()) * scale_y).max(0.0) as u32;
    let mut out = PixelBuffer::new(width, height);
    if scale_x <= 0.0 || scale_y <= 0.0 {
        return out;
    }
    for y in 0..height {
        let src_y = (f64::from(y) / scale_y) as u32;
        if src_y >= image.height() {
            continue;
        }
        for x in 0..width {
            let src_x = (f64::from(x) / scale_x) as u32;
            if src_x < image.width() {
                out.set(x, y, image.get(src_x, src_y));
            }
        }
    }
    out
}

/// Composite `ornament` over `sheet`, growing the sheet when the ornament
/// reaches past its right or bottom edge. Negative placements are clamped
/// to the sheet origin.
pub fn merge_ornament(sheet: &PixelBuffer, ornament: &Ornament) -> PixelBuffer {
    let stamp = if ornament.scale_x != 1.0 || ornament.scale_y != 1.0 {
        scale_nearest(&ornament.image, ornament.scale_x, ornament.scale_y)
    } else {
        ornament.image.clone()
    };

    let x = ornament.x.max(0.0).round() as u32;
    let y = ornament.y.max(0.0).round() as u32;
    let (width, height) = merged_extent(sheet, &stamp, x, y);
    let mut merged = sheet.grown_to(width, height);
    merged.draw_over(&stamp, i64::from(x), i64::from(y));

    debug!(
        kind = ?ornament.kind,
        x,
        y,
        width = stamp.width(),
        height = stamp.height(),
        "ornament merged"
    );
    merged
}

/// Canvas size needed to hold `stamp` at `(x, y)` over `sheet`.
fn merged_extent(sheet: &PixelBuffer, stamp: &PixelBuffer, x: u32, y: u32) -> (u32, u32) {
    (
        sheet.width().max(x.saturating_add(stamp.width())),
        sheet.height().max(y.saturating_add(stamp.height())),
    )
}

/// Stack `piece` above `current`: width is the wider of the two, height the sum.
pub fn prepend_piece(piece: &PixelBuffer, current: &PixelBuffer) -> PixelBuffer {
    let width = piece.width().max(current.width());
    let mut out = PixelBuffer::new(width, piece.height() + current.height());
    out.blit(piece, 0, 0);
    out.blit(current, 0, i64::from(piece.height()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::WHITE;
    use image::Rgba;

    #[test]
    fn test_scale_nearest_doubles() {
        let mut img = PixelBuffer::new(2, 1);
        img.set(1, 0, WHITE);
        let scaled = scale_nearest(&img, 2.0, 2.0);
        assert_eq!((scaled.width(), scaled.height()), (4, 2));
        assert_eq!(scaled.get(3, 1), WHITE);
        assert_eq!(scaled.get(1, 1), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_merged_extent_saturates() {
        let sheet = PixelBuffer::new(10, 10);
        let stamp = PixelBuffer::new(4, 3);
        assert_eq!(merged_extent(&sheet, &stamp, 2, 2), (10, 10));
        assert_eq!(merged_extent(&sheet, &stamp, 8, 9), (12, 12));
        assert_eq!(
            merged_extent(&sheet, &stamp, u32::MAX - 1, u32::MAX),
            (u32::MAX, u32::MAX)
        );
    }

    #[test]
    fn test_prepend_piece_stacks() {
        let piece = PixelBuffer::filled(3, 2, WHITE);
        let current = PixelBuffer::filled(5, 4, Rgba([9, 9, 9, 255]));
        let out = prepend_piece(&piece, &current);
        assert_eq!((out.width(), out.height()), (5, 6));
        assert_eq!(out.get(0, 0), WHITE);
        assert_eq!(out.get(4, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(out.get(4, 5), Rgba([9, 9, 9, 255]));
    }
}
