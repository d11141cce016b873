// Phase 3: 空白帯検出: 行ごとの暗画素数で「内容行」を判定し、空白行の連続を帯にまとめる

use serde::Serialize;
use tracing::{debug, info};

use crate::error::MarchError;
use crate::raster::{PixelBuffer, is_paper};

/// Half-open row range `[start_row, end_row)` spanning the full image width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub start_row: u32,
    pub end_row: u32,
}

impl Band {
    pub fn new(start_row: u32, end_row: u32) -> Self {
        Band { start_row, end_row }
    }

    pub fn height(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row)
    }
}

/// Tunables for [`detect_blank_bands`].
#[derive(Debug, Clone, PartialEq)]
pub struct BandScan {
    /// A row is content when it holds more dark pixels than this.
    pub dark_pixel_threshold: u32,
    /// Content runs shorter than this many rows are absorbed into the
    /// surrounding blank band. With the default of 1 no run is absorbed.
    pub dark_row_threshold: u32,
    /// Blank runs shorter than this are not reported.
    pub min_blank_rows: u32,
}

impl Default for BandScan {
    fn default() -> Self {
        BandScan {
            dark_pixel_threshold: 4,
            dark_row_threshold: 1,
            min_blank_rows: 2,
        }
    }
}

/// Result of a band scan: the blank bands found in a `height`-row image.
///
/// The bands that survive compaction are the complement, see
/// [`kept_bands`](Self::kept_bands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandLayout {
    pub height: u32,
    pub blank: Vec<Band>,
}

impl BandLayout {
    /// Content spans between the blank bands, in row order.
    pub fn kept_bands(&self) -> Vec<Band> {
        // Detected bands are ordered and disjoint by construction.
        kept_bands(&self.blank, self.height).unwrap_or_default()
    }
}

/// Classify every row and collect the blank bands, top to bottom.
pub fn detect_blank_bands(buffer: &PixelBuffer, threshold: f32, scan: &BandScan) -> BandLayout {
    debug!(
        width = buffer.width(),
        height = buffer.height(),
        threshold,
        "scanning rows for blank bands"
    );

    let mut content: Vec<bool> = (0..buffer.height())
        .map(|y| is_content_row(buffer, y, threshold, scan.dark_pixel_threshold))
        .collect();

    absorb_short_content_runs(&mut content, scan.dark_row_threshold);

    let mut blank = Vec::new();
    let mut y = 0usize;
    while y < content.len() {
        if content[y] {
            y += 1;
            continue;
        }
        let start = y;
        while y < content.len() && !content[y] {
            y += 1;
        }
        if (y - start) as u32 >= scan.min_blank_rows.max(1) {
            blank.push(Band::new(start as u32, y as u32));
        }
    }

    info!(blank_bands = blank.len(), "blank band detection complete");
    BandLayout {
        height: buffer.height(),
        blank,
    }
}

/// Complement of `blank` within `[0, height)`.
///
/// Fails with `InvalidBands` when the blank bands are unordered, overlap,
/// are inverted, or extend past `height`.
pub fn kept_bands(blank: &[Band], height: u32) -> crate::error::Result<Vec<Band>> {
    validate_bands(blank, height)?;

    let mut kept = Vec::with_capacity(blank.len() + 1);
    let mut cursor = 0;
    for band in blank {
        if band.start_row > cursor {
            kept.push(Band::new(cursor, band.start_row));
        }
        cursor = band.end_row;
    }
    if cursor < height {
        kept.push(Band::new(cursor, height));
    }
    Ok(kept)
}

/// Check that bands are ordered by `start_row`, disjoint, and inside `height`.
pub fn validate_bands(bands: &[Band], height: u32) -> crate::error::Result<()> {
    let mut previous_end = 0;
    for (i, band) in bands.iter().enumerate() {
        if band.start_row > band.end_row {
            return Err(MarchError::invalid_bands(format!(
                "band {i} is inverted: {}..{}",
                band.start_row, band.end_row
            )));
        }
        if band.end_row > height {
            return Err(MarchError::invalid_bands(format!(
                "band {i} ends at row {} past image height {height}",
                band.end_row
            )));
        }
        if i > 0 && band.start_row < previous_end {
            return Err(MarchError::invalid_bands(format!(
                "band {i} starting at row {} overlaps or precedes the previous band ending at {previous_end}",
                band.start_row
            )));
        }
        previous_end = band.end_row;
    }
    Ok(())
}

fn is_content_row(buffer: &PixelBuffer, y: u32, threshold: f32, dark_pixel_threshold: u32) -> bool {
    let mut dark = 0u32;
    for x in 0..buffer.width() {
        if !is_paper(buffer.get(x, y), threshold) {
            dark += 1;
            if dark > dark_pixel_threshold {
                return true;
            }
        }
    }
    false
}

fn absorb_short_content_runs(content: &mut [bool], min_run: u32) {
    if min_run <= 1 {
        return;
    }
    let mut y = 0;
    while y < content.len() {
        if !content[y] {
            y += 1;
            continue;
        }
        let start = y;
        while y < content.len() && content[y] {
            y += 1;
        }
        if ((y - start) as u32) < min_run {
            content[start..y].fill(false);
        }
    }
}
