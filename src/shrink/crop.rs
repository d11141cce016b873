// Phase 4: 切り抜き: 紙の矩形を切り出し、マーチ幅へ拡縮する

use image::imageops::{self, FilterType};
use tracing::{debug, info};

use crate::error::MarchError;
use crate::raster::{PixelBuffer, Rect};

/// Cut `paper` out of `source` and resample it so its width equals
/// `march_width`, keeping the aspect ratio.
pub fn crop_to_march(
    source: &PixelBuffer,
    paper: &Rect,
    march_width: u32,
) -> crate::error::Result<PixelBuffer> {
    if march_width == 0 {
        return Err(MarchError::config("march width must be positive"));
    }

    let cut = source.sub_buffer(paper);
    if cut.is_empty() {
        return Err(MarchError::image(format!(
            "paper rectangle {:?} does not overlap the {}x{} image",
            paper,
            source.width(),
            source.height()
        )));
    }

    if cut.width() == march_width {
        debug!(width = march_width, "paper already at march width");
        return Ok(cut);
    }

    let scale = f64::from(march_width) / f64::from(cut.width());
    let height = ((f64::from(cut.height()) * scale).round() as u32).max(1);
    let resized = imageops::resize(cut.as_rgba_image(), march_width, height, FilterType::Triangle);

    info!(
        from_width = cut.width(),
        from_height = cut.height(),
        to_width = march_width,
        to_height = height,
        "cropped to march width"
    );
    Ok(PixelBuffer::from_rgba_image(resized))
}
