// Phase 8: ページ合成: 印刷可能領域の白いラスタに選択範囲を並べる

use image::Rgba;
use serde::Deserialize;
use tracing::debug;

use crate::print::paginator::{Orientation, Page};
use crate::raster::{PixelBuffer, Rect, WHITE};

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
const CUT_LINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            left: 18.0,
            right: 18.0,
            top: 18.0,
            bottom: 18.0,
        }
    }
}

/// Paper, orientation and margins of the output device.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDescription {
    pub orientation: Orientation,
    /// Portrait paper width in points.
    pub paper_width_pt: f64,
    /// Portrait paper height in points.
    pub paper_height_pt: f64,
    pub margins: Margins,
}

impl PageDescription {
    /// Paper size in points as laid out (landscape swaps the sides).
    pub fn paper_size_pt(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Portrait => (self.paper_width_pt, self.paper_height_pt),
            Orientation::Landscape => (self.paper_height_pt, self.paper_width_pt),
        }
    }

    pub fn printable_size_pt(&self) -> (f64, f64) {
        let (w, h) = self.paper_size_pt();
        (
            (w - self.margins.left - self.margins.right).max(0.0),
            (h - self.margins.top - self.margins.bottom).max(0.0),
        )
    }

    /// Printable area in pixels at `dpi`.
    pub fn printable_size_px(&self, dpi: f64) -> (u32, u32) {
        let (w, h) = self.printable_size_pt();
        (
            (w * dpi / POINTS_PER_INCH).floor() as u32,
            (h * dpi / POINTS_PER_INCH).floor() as u32,
        )
    }

    /// Room along the stacking axis, in pixels at `dpi`.
    pub fn available_extent(&self, dpi: f64) -> f64 {
        let (w, h) = self.printable_size_pt();
        let points = match self.orientation {
            Orientation::Portrait => h,
            Orientation::Landscape => w,
        };
        dpi * points / POINTS_PER_INCH
    }
}

/// Flatten fully transparent pixels to white before printing.
pub fn flatten_for_print(sheet: &mut PixelBuffer) -> usize {
    sheet.replace_where(WHITE, |c| c.0[3] == 0)
}

/// Render every page as a white printable-area raster with its selections
/// stacked along the page axis. Selections are clipped to the sheet and to
/// the page; with `cut_lines` each is outlined with a dashed line.
pub fn compose_pages(
    sheet: &PixelBuffer,
    pages: &[Page],
    description: &PageDescription,
    dpi: f64,
    cut_lines: bool,
) -> Vec<PixelBuffer> {
    let (width, height) = description.printable_size_px(dpi);
    let orientation = description.orientation;

    pages
        .iter()
        .map(|page| {
            let mut canvas = PixelBuffer::filled(width, height, WHITE);
            let mut cursor: f64 = 0.0;
            for rect in &page.selections {
                let (x, y) = match orientation {
                    Orientation::Portrait => (0, cursor.round() as i64),
                    Orientation::Landscape => (cursor.round() as i64, 0),
                };
                if let Some(clip) = clip_to_sheet(rect, sheet) {
                    let piece = sheet.sub_buffer(&clip);
                    canvas.draw_over(&piece, x, y);
                    if cut_lines {
                        draw_dashed_outline(&mut canvas, x, y, piece.width(), piece.height());
                    }
                }
                cursor += orientation.extent(rect);
            }
            debug!(page = page.index, selections = page.selections.len(), "page composed");
            canvas
        })
        .collect()
}

/// Clamp a selection to the sheet, keeping its origin when possible.
fn clip_to_sheet(rect: &Rect, sheet: &PixelBuffer) -> Option<Rect> {
    let sheet_w = f64::from(sheet.width());
    let sheet_h = f64::from(sheet.height());
    let x = rect.min_x.clamp(0.0, sheet_w);
    let y = rect.min_y.clamp(0.0, sheet_h);
    let w = rect.width().min(sheet_w - x);
    let h = rect.height().min(sheet_h - y);
    if w < 1.0 || h < 1.0 {
        return None;
    }
    // Inclusive pixel bounds for sub_buffer.
    Some(Rect::from_origin_size(x, y, w.floor() - 1.0, h.floor() - 1.0))
}

fn draw_dashed_outline(canvas: &mut PixelBuffer, x: i64, y: i64, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    let right = x + i64::from(width) - 1;
    let bottom = y + i64::from(height) - 1;
    let mut dot = |px: i64, py: i64| {
        if (px + py) % 2 == 0 && canvas.contains(px, py) {
            canvas.set(px as u32, py as u32, CUT_LINE);
        }
    };
    for px in x..=right {
        dot(px, y);
        dot(px, bottom);
    }
    for py in y..=bottom {
        dot(x, py);
        dot(right, py);
    }
}
