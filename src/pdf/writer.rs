// Phase 9: 印刷PDF出力: ページ画像XObject、余白位置への配置、コンテンツストリーム組立

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

use crate::error::MarchError;
use crate::pdf::encode::{EncodedPage, ImageEncoding, encode_page};
use crate::print::{POINTS_PER_INCH, PageDescription, PageSink};
use crate::raster::PixelBuffer;

/// 合成済みページを1ページ1画像としてPDFに書き出す。
pub struct MarchPdfWriter {
    doc: Document,
    pages_id: lopdf::ObjectId,
    kids: Vec<Object>,
    description: PageDescription,
    dpi: f64,
    encoding: ImageEncoding,
    quality: u8,
}

impl MarchPdfWriter {
    /// # Arguments
    /// * `description` - 用紙・向き・余白
    /// * `dpi`         - ページ画像の解像度（画素 -> pt 換算に使う）
    /// * `encoding`    - ページ画像の圧縮方式
    /// * `quality`     - JPEG品質 (1-100)
    pub fn new(description: PageDescription, dpi: f64, encoding: ImageEncoding, quality: u8) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            description,
            dpi,
            encoding,
            quality,
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// ページ画像をエンコードして追加する。
    pub fn add_page(&mut self, page: &PixelBuffer) -> crate::error::Result<()> {
        let encoded = encode_page(page, self.encoding, self.quality)?;
        self.add_encoded_page(&encoded)
    }

    /// エンコード済みページ画像を追加する。
    ///
    /// 画像は左上余白の位置に `dpi` から換算した実寸で置く。
    pub fn add_encoded_page(&mut self, encoded: &EncodedPage) -> crate::error::Result<()> {
        if self.dpi <= 0.0 {
            return Err(MarchError::pdf_write(format!("invalid dpi {}", self.dpi)));
        }
        let (paper_w, paper_h) = self.description.paper_size_pt();
        let margins = self.description.margins;
        let image_w = f64::from(encoded.width) * POINTS_PER_INCH / self.dpi;
        let image_h = f64::from(encoded.height) * POINTS_PER_INCH / self.dpi;
        let x = margins.left;
        let y = paper_h - margins.top - image_h;

        let image_id = self.doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => encoded.width as i64,
                "Height" => encoded.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => encoded.encoding.filter_name(),
            },
            encoded.data.clone(),
        )));

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => dictionary! {
                "Page" => image_id,
            },
        });

        let content_bytes = build_image_content_stream("Page", image_w, image_h, x, y);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content_bytes)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(paper_w as f32),
                Object::Real(paper_h as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());

        // Pagesノードを更新
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids.clone(),
                "Count" => self.kids.len() as i64,
            }),
        );

        debug!(
            page = self.kids.len() - 1,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.data.len(),
            "page image added"
        );
        Ok(())
    }

    /// PDFドキュメントをバイト列として出力する。
    pub fn to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        let mut buf = Vec::new();
        // lopdf の save_to は &mut self を取るため複製してから書き出す
        self.doc.clone().save_to(&mut buf)?;
        Ok(buf)
    }

    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl PageSink for MarchPdfWriter {
    fn commit(&mut self, _index: usize, page: &PixelBuffer) -> crate::error::Result<()> {
        self.add_page(page)
    }
}

/// 画像1枚を描画するコンテンツストリーム:
/// `q <w> 0 0 <h> <x> <y> cm /<name> Do Q`
pub fn build_image_content_stream(name: &str, width: f64, height: f64, x: f64, y: f64) -> Vec<u8> {
    format!("q {width:.3} 0 0 {height:.3} {x:.3} {y:.3} cm /{name} Do Q").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_stream_places_image_at_offset() {
        let bytes = build_image_content_stream("Page", 100.0, 50.0, 18.0, 20.5);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "q 100.000 0 0 50.000 18.000 20.500 cm /Page Do Q"
        );
    }
}
