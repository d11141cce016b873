// Phase 2: 紙領域検出・空白帯検出テスト

use image::Rgba;
use march_shrink::detect::bands::validate_bands;
use march_shrink::detect::{
    Band, BandScan, PaperScan, detect_blank_bands, detect_paper_bounds, kept_bands,
};
use march_shrink::raster::{Color, PixelBuffer, Rect};
use march_shrink::shrink::compact;

const PAPER: Color = Rgba([242, 242, 242, 255]); // brightness ~0.95
const INK: Color = Rgba([20, 20, 20, 255]);

fn fill_rows(buffer: &mut PixelBuffer, rows: std::ops::Range<u32>, color: Color) {
    for y in rows {
        for x in 0..buffer.width() {
            buffer.set(x, y, color);
        }
    }
}

// ============================================================
// 1. detect_paper_bounds
// ============================================================

/// 黒い背景の中に白い紙の矩形がある画像
fn framed_paper() -> PixelBuffer {
    let mut buffer = PixelBuffer::filled(400, 300, INK);
    for y in 40..260 {
        for x in 50..350 {
            buffer.set(x, y, PAPER);
        }
    }
    buffer
}

#[test]
fn test_paper_bounds_framed_sheet() {
    let buffer = framed_paper();
    let bounds = detect_paper_bounds(&buffer, 0.9, &PaperScan::default());
    // 境界は最初の暗い連続画素の先頭
    assert_eq!(bounds, Rect::new(49.0, 39.0, 350.0, 260.0));
}

#[test]
fn test_paper_bounds_is_stable() {
    let buffer = framed_paper();
    let scan = PaperScan::default();
    let first = detect_paper_bounds(&buffer, 0.9, &scan);
    let second = detect_paper_bounds(&buffer, 0.9, &scan);
    assert_eq!(first, second);
}

#[test]
fn test_paper_bounds_ignores_short_dark_runs() {
    let mut buffer = framed_paper();
    // 左側に幅5の細い線（ノイズ扱い）
    for y in 40..260 {
        for x in 100..105 {
            buffer.set(x, y, INK);
        }
    }
    let bounds = detect_paper_bounds(&buffer, 0.9, &PaperScan::default());
    assert_eq!(bounds.min_x, 49.0);
}

#[test]
fn test_paper_bounds_small_image_is_full_bounds() {
    let buffer = PixelBuffer::filled(50, 400, PAPER);
    let bounds = detect_paper_bounds(&buffer, 0.9, &PaperScan::default());
    assert_eq!(bounds, buffer.bounds());
}

#[test]
fn test_paper_bounds_without_paper_is_full_bounds() {
    let buffer = PixelBuffer::filled(200, 200, INK);
    let bounds = detect_paper_bounds(&buffer, 0.9, &PaperScan::default());
    assert_eq!(bounds, buffer.bounds());
}

#[test]
fn test_paper_bounds_all_paper_reaches_edges() {
    let buffer = PixelBuffer::filled(120, 90, PAPER);
    let bounds = detect_paper_bounds(&buffer, 0.9, &PaperScan::default());
    assert_eq!(bounds, Rect::new(0.0, 0.0, 119.0, 89.0));
}

// ============================================================
// 2. detect_blank_bands
// ============================================================

#[test]
fn test_single_content_block_scenario() {
    // 1000x1400、紙の明度0.95、閾値0.9、200〜400行目に全幅の暗いブロック
    let mut buffer = PixelBuffer::filled(1000, 1400, PAPER);
    fill_rows(&mut buffer, 200..400, INK);

    let layout = detect_blank_bands(&buffer, 0.9, &BandScan::default());
    assert_eq!(layout.blank, vec![Band::new(0, 200), Band::new(400, 1400)]);

    let kept = layout.kept_bands();
    assert_eq!(kept, vec![Band::new(200, 400)]);

    let compacted = compact(&buffer, &kept, 0.9).expect("compact");
    assert_eq!(compacted.width(), 1000);
    assert_eq!(compacted.height(), 200);
    for y in 0..200 {
        assert_eq!(compacted.row(y), buffer.row(y + 200), "row {} differs", y);
    }
}

#[test]
fn test_rows_with_few_dark_pixels_are_blank() {
    let mut buffer = PixelBuffer::filled(100, 20, PAPER);
    // 4画素以下は空白扱い
    for x in 0..4 {
        buffer.set(x, 10, INK);
    }
    let layout = detect_blank_bands(&buffer, 0.9, &BandScan::default());
    assert_eq!(layout.blank, vec![Band::new(0, 20)]);
    assert!(layout.kept_bands().is_empty());
}

#[test]
fn test_single_blank_row_is_not_a_band() {
    let mut buffer = PixelBuffer::filled(50, 10, INK);
    fill_rows(&mut buffer, 4..5, PAPER);
    let layout = detect_blank_bands(&buffer, 0.9, &BandScan::default());
    assert!(layout.blank.is_empty(), "min_blank_rows=2 should drop 1-row gaps");
}

#[test]
fn test_dark_row_threshold_absorbs_thin_lines() {
    let mut buffer = PixelBuffer::filled(50, 30, PAPER);
    fill_rows(&mut buffer, 10..12, INK);
    let scan = BandScan {
        dark_row_threshold: 3,
        ..BandScan::default()
    };
    let layout = detect_blank_bands(&buffer, 0.9, &scan);
    assert_eq!(layout.blank, vec![Band::new(0, 30)]);
}

#[test]
fn test_blank_bands_are_ordered_and_disjoint() {
    let mut buffer = PixelBuffer::filled(40, 100, PAPER);
    fill_rows(&mut buffer, 10..20, INK);
    fill_rows(&mut buffer, 50..55, INK);
    fill_rows(&mut buffer, 90..100, INK);
    let layout = detect_blank_bands(&buffer, 0.9, &BandScan::default());
    assert_eq!(
        layout.blank,
        vec![Band::new(0, 10), Band::new(20, 50), Band::new(55, 90)]
    );
    assert!(validate_bands(&layout.blank, 100).is_ok());
    assert_eq!(
        layout.kept_bands(),
        vec![Band::new(10, 20), Band::new(50, 55), Band::new(90, 100)]
    );
}

// ============================================================
// 3. kept_bands
// ============================================================

#[test]
fn test_kept_bands_without_blank_covers_everything() {
    assert_eq!(kept_bands(&[], 30).unwrap(), vec![Band::new(0, 30)]);
}

#[test]
fn test_kept_bands_rejects_overlap() {
    let blank = [Band::new(0, 10), Band::new(5, 20)];
    assert!(kept_bands(&blank, 30).is_err());
}
