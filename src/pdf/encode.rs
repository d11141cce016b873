// Phase 9: ページ画像のエンコード: RGBA -> RGB -> DCTDecode(JPEG) または FlateDecode(zlib)

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::MarchError;
use crate::raster::PixelBuffer;

/// ページ画像の圧縮方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Jpeg,
    Flate,
}

impl ImageEncoding {
    /// PDFの /Filter 名。
    pub fn filter_name(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "DCTDecode",
            ImageEncoding::Flate => "FlateDecode",
        }
    }
}

/// An encoded page image ready to become an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
}

/// Encode one composed page. Alpha is dropped; composed pages are opaque.
///
/// # Arguments
/// * `page`     - Composed page raster
/// * `encoding` - Compression to apply
/// * `quality`  - JPEG quality (1-100), ignored for Flate
pub fn encode_page(
    page: &PixelBuffer,
    encoding: ImageEncoding,
    quality: u8,
) -> crate::error::Result<EncodedPage> {
    if page.is_empty() {
        return Err(MarchError::encode("cannot encode an empty page"));
    }
    let rgb = DynamicImage::ImageRgba8(page.as_rgba_image().clone()).to_rgb8();

    let data = match encoding {
        ImageEncoding::Jpeg => {
            if !(1..=100).contains(&quality) {
                return Err(MarchError::encode(format!(
                    "JPEG quality must be 1-100, got {}",
                    quality
                )));
            }
            let mut buf = Cursor::new(Vec::new());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder)?;
            buf.into_inner()
        }
        ImageEncoding::Flate => flate_encode(rgb.as_raw())?,
    };

    Ok(EncodedPage {
        data,
        width: page.width(),
        height: page.height(),
        encoding,
    })
}

/// zlibで圧縮
fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| MarchError::encode(format!("Flate encode error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| MarchError::encode(format!("Flate encode error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::WHITE;

    #[test]
    fn jpeg_output_starts_with_soi_marker() {
        let page = PixelBuffer::filled(16, 8, WHITE);
        let encoded = encode_page(&page, ImageEncoding::Jpeg, 85).unwrap();
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (16, 8));
    }

    #[test]
    fn flate_output_inflates_to_rgb() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let page = PixelBuffer::filled(4, 3, WHITE);
        let encoded = encode_page(&page, ImageEncoding::Flate, 85).unwrap();
        let mut raw = Vec::new();
        ZlibDecoder::new(&encoded.data[..])
            .read_to_end(&mut raw)
            .unwrap();
        assert_eq!(raw.len(), 4 * 3 * 3);
        assert!(raw.iter().all(|&b| b == 255));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let page = PixelBuffer::filled(2, 2, WHITE);
        assert!(encode_page(&page, ImageEncoding::Jpeg, 0).is_err());
    }

    #[test]
    fn rejects_empty_page() {
        let page = PixelBuffer::new(0, 0);
        assert!(encode_page(&page, ImageEncoding::Flate, 85).is_err());
    }
}
