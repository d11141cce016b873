// Phase 2: 紙領域検出: 中央 50x50 近傍から四方向へ暗い連続画素を探索

use tracing::{debug, info};

use crate::raster::{Color, PixelBuffer, Rect, is_paper};

/// Side of the central probe neighbourhood, in pixels.
pub const PROBE_SIZE: u32 = 50;

/// Tunables for [`detect_paper_bounds`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaperScan {
    /// Dark runs shorter than this (horizontal scans) are noise.
    pub horizontal_run: u32,
    /// Dark runs shorter than this (vertical scans) are noise.
    pub vertical_run: u32,
    /// Fraction of the nominal page extent the bounds must cover.
    pub coverage: f64,
    /// Nominal march width in pixels.
    pub nominal_width: f64,
    /// Nominal march height in pixels.
    pub nominal_height: f64,
}

impl Default for PaperScan {
    fn default() -> Self {
        PaperScan {
            horizontal_run: 20,
            vertical_run: 20,
            coverage: 0.9,
            nominal_width: 0.0,
            nominal_height: 0.0,
        }
    }
}

/// Find the rectangle of paper inside a pasted screenshot or scan.
///
/// Every paper-coloured pixel (brightness at or above `threshold`) of the
/// central probe is tried as a seed. From the seed, each of the four
/// directions is scanned independently to the image edge; the edge of the
/// paper is the first pixel of the first dark run of at least the run
/// threshold (shorter runs are noise and forgotten). A direction without
/// such a run reaches the image edge. The first candidate covering
/// `coverage` of the nominal extent in both axes wins; otherwise the last
/// candidate is used.
///
/// Images of at most [`PROBE_SIZE`] pixels in either axis, and images whose
/// probe holds no paper at all, yield the full image bounds.
pub fn detect_paper_bounds(buffer: &PixelBuffer, threshold: f32, scan: &PaperScan) -> Rect {
    let (width, height) = (buffer.width(), buffer.height());
    if width <= PROBE_SIZE || height <= PROBE_SIZE {
        debug!(width, height, "image within probe size, using full bounds");
        return buffer.bounds();
    }

    let half = PROBE_SIZE / 2;
    let (cx, cy) = (width / 2, height / 2);
    let min_width = scan.coverage * scan.nominal_width;
    let min_height = scan.coverage * scan.nominal_height;
    let mut candidate = None;

    for y in (cy - half)..(cy + half) {
        for x in (cx - half)..(cx + half) {
            if !is_paper(buffer.get(x, y), threshold) {
                continue;
            }

            let left = scan_edge(
                (0..=x).rev().map(|i| (i, buffer.get(i, y))),
                threshold,
                scan.horizontal_run,
            )
            .unwrap_or(0);
            let right = scan_edge(
                (x..width).map(|i| (i, buffer.get(i, y))),
                threshold,
                scan.horizontal_run,
            )
            .unwrap_or(width - 1);
            let top = scan_edge(
                (0..=y).rev().map(|j| (j, buffer.get(x, j))),
                threshold,
                scan.vertical_run,
            )
            .unwrap_or(0);
            let bottom = scan_edge(
                (y..height).map(|j| (j, buffer.get(x, j))),
                threshold,
                scan.vertical_run,
            )
            .unwrap_or(height - 1);

            let rect = Rect::new(
                f64::from(left),
                f64::from(top),
                f64::from(right),
                f64::from(bottom),
            );
            if rect.width() >= min_width && rect.height() >= min_height {
                info!(
                    seed_x = x,
                    seed_y = y,
                    min_x = left,
                    min_y = top,
                    max_x = right,
                    max_y = bottom,
                    "paper bounds detected"
                );
                return rect;
            }
            candidate = Some(rect);
        }
    }

    match candidate {
        Some(rect) => {
            debug!(?rect, "no candidate reached coverage, using last candidate");
            rect
        }
        None => {
            debug!("no paper in probe, using full bounds");
            buffer.bounds()
        }
    }
}

/// Walk `samples` outward and return the index where the first dark run of
/// at least `run_threshold` pixels begins. A dark run still open at the end
/// of the walk also counts.
fn scan_edge(
    samples: impl Iterator<Item = (u32, Color)>,
    threshold: f32,
    run_threshold: u32,
) -> Option<u32> {
    let mut run = 0u32;
    let mut edge = None;
    for (index, color) in samples {
        if is_paper(color, threshold) {
            if run > 0 && run < run_threshold {
                run = 0;
                edge = None;
            }
        } else {
            if run == 0 {
                edge = Some(index);
            }
            run += 1;
            if run >= run_threshold {
                break;
            }
        }
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const DARK: Color = Rgba([20, 20, 20, 255]);
    const PAPER: Color = Rgba([240, 240, 240, 255]);

    #[test]
    fn test_scan_edge_skips_short_runs() {
        // 3 dark pixels (noise), paper, then a long dark run from index 10
        let row: Vec<Color> = (0..40)
            .map(|i| if (2..5).contains(&i) || i >= 10 { DARK } else { PAPER })
            .collect();
        let edge = scan_edge(row.iter().copied().enumerate().map(|(i, c)| (i as u32, c)), 0.5, 20);
        assert_eq!(edge, Some(10));
    }

    #[test]
    fn test_scan_edge_without_dark_run() {
        let row = [PAPER; 30];
        let edge = scan_edge(row.iter().copied().enumerate().map(|(i, c)| (i as u32, c)), 0.5, 20);
        assert_eq!(edge, None);
    }
}
