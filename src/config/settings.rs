use std::path::Path;

use serde::Deserialize;

use crate::detect::{BandScan, PaperScan};
use crate::pdf::ImageEncoding;
use crate::print::{Margins, Orientation, PageDescription};

const CM_PER_INCH: f64 = 2.54;

/// 印刷の向き。`Auto` は選択範囲から決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationSetting {
    #[default]
    Auto,
    Portrait,
    Landscape,
}

impl OrientationSetting {
    /// 固定指定ならその向き、`Auto` なら `preferred` を使う。
    pub fn resolve(self, preferred: Orientation) -> Orientation {
        match self {
            OrientationSetting::Auto => preferred,
            OrientationSetting::Portrait => Orientation::Portrait,
            OrientationSetting::Landscape => Orientation::Landscape,
        }
    }
}

/// 用紙サイズ（縦置き、pt）と余白。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub width_pt: f64,
    pub height_pt: f64,
    pub margins: Margins,
    pub orientation: OrientationSetting,
}

impl Default for PageSettings {
    fn default() -> Self {
        // A4
        PageSettings {
            width_pt: 595.276,
            height_pt: 841.89,
            margins: Margins::default(),
            orientation: OrientationSetting::Auto,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paper_threshold: f32,
    pub screen_dpi: f64,
    pub march_width_cm: f64,
    pub march_height_cm: f64,
    pub run_threshold: u32,
    pub coverage: f64,
    pub dark_pixel_threshold: u32,
    pub dark_row_threshold: u32,
    pub min_blank_rows: u32,
    pub page: PageSettings,
    pub image_encoding: ImageEncoding,
    pub jpeg_quality: u8,
    pub cut_lines: bool,
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            paper_threshold: 0.98,
            screen_dpi: 96.0,
            march_width_cm: 19.0,
            march_height_cm: 14.2,
            run_threshold: 20,
            coverage: 0.9,
            dark_pixel_threshold: 4,
            dark_row_threshold: 1,
            min_blank_rows: 2,
            page: PageSettings::default(),
            image_encoding: ImageEncoding::Jpeg,
            jpeg_quality: 85,
            cut_lines: true,
            parallel_workers: 0,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::MarchError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// 値の範囲を検査する。
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.paper_threshold) {
            return Err(crate::error::MarchError::config(format!(
                "paper_threshold must be within 0.0-1.0, got {}",
                self.paper_threshold
            )));
        }
        if self.screen_dpi <= 0.0 || self.march_width_cm <= 0.0 || self.march_height_cm <= 0.0 {
            return Err(crate::error::MarchError::config(
                "screen_dpi and march size must be positive",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(crate::error::MarchError::config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// マーチ寸法（画素）。`dpi / 2.54 * cm`
    pub fn march_size_px(&self) -> (f64, f64) {
        let per_cm = self.screen_dpi / CM_PER_INCH;
        (self.march_width_cm * per_cm, self.march_height_cm * per_cm)
    }

    pub fn paper_scan(&self) -> PaperScan {
        let (nominal_width, nominal_height) = self.march_size_px();
        PaperScan {
            horizontal_run: self.run_threshold,
            vertical_run: self.run_threshold,
            coverage: self.coverage,
            nominal_width,
            nominal_height,
        }
    }

    pub fn band_scan(&self) -> BandScan {
        BandScan {
            dark_pixel_threshold: self.dark_pixel_threshold,
            dark_row_threshold: self.dark_row_threshold,
            min_blank_rows: self.min_blank_rows,
        }
    }

    pub fn page_description(&self, orientation: Orientation) -> PageDescription {
        PageDescription {
            orientation,
            paper_width_pt: self.page.width_pt,
            paper_height_pt: self.page.height_pt,
            margins: self.page.margins,
        }
    }
}
