// Phase 4: 帯の圧縮: 残す帯を上から連結し、紙色を透明化する

use tracing::{debug, info};

use crate::detect::bands::{Band, validate_bands};
use crate::raster::{PixelBuffer, TRANSPARENT, is_paper};

/// Build a new buffer from the kept bands of `buffer`, stacked in order.
///
/// The output keeps the input width; its height is the sum of the band
/// heights. After copying, every pixel at or above `paper_threshold`
/// brightness becomes transparent. Compacting the result again with a band
/// list covering all of it returns an identical buffer.
///
/// Fails with `InvalidBands` when `kept` is unordered, overlapping,
/// inverted, or extends past the buffer.
pub fn compact(
    buffer: &PixelBuffer,
    kept: &[Band],
    paper_threshold: f32,
) -> crate::error::Result<PixelBuffer> {
    validate_bands(kept, buffer.height())?;

    let height: u32 = kept.iter().map(Band::height).sum();
    let mut out = PixelBuffer::new(buffer.width(), height);

    let mut dst_y = 0;
    for band in kept {
        let rows = band.height();
        if rows == 0 {
            continue;
        }
        out.copy_rows_from(buffer, band.start_row, dst_y, rows);
        dst_y += rows;
    }

    let removed = remove_paper(&mut out, paper_threshold);
    info!(
        bands = kept.len(),
        from_height = buffer.height(),
        to_height = height,
        "compacted"
    );
    debug!(removed, "paper pixels made transparent");
    Ok(out)
}

/// Turn every pixel at or above the paper threshold transparent.
/// Returns the number of pixels changed.
pub fn remove_paper(buffer: &mut PixelBuffer, paper_threshold: f32) -> usize {
    buffer.replace_where(TRANSPARENT, |c| is_paper(c, paper_threshold))
}
