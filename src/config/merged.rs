use super::job::Job;
use super::settings::{OrientationSetting, Settings};
use crate::pdf::ImageEncoding;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: Settings,
    pub paper_threshold: f32,
    pub orientation: OrientationSetting,
    pub jpeg_quality: u8,
    pub image_encoding: ImageEncoding,
    pub crop: bool,
    pub compact: bool,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            settings: settings.clone(),
            paper_threshold: job.paper_threshold.unwrap_or(settings.paper_threshold),
            orientation: job.orientation.unwrap_or(settings.page.orientation),
            jpeg_quality: job.jpeg_quality.unwrap_or(settings.jpeg_quality),
            image_encoding: job.image_encoding.unwrap_or(settings.image_encoding),
            crop: job.crop,
            compact: job.compact,
        }
    }

    /// ジョブ上書きを反映した設定。
    pub fn effective_settings(&self) -> Settings {
        let mut settings = self.settings.clone();
        settings.paper_threshold = self.paper_threshold;
        settings.page.orientation = self.orientation;
        settings.jpeg_quality = self.jpeg_quality;
        settings.image_encoding = self.image_encoding;
        settings
    }
}
