use serde::Deserialize;

use crate::config::settings::OrientationSetting;
use crate::pdf::ImageEncoding;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// 1件の変換ジョブ: 楽譜画像 -> マーチ用PDF
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    pub paper_threshold: Option<f32>,
    pub orientation: Option<OrientationSetting>,
    pub jpeg_quality: Option<u8>,
    pub image_encoding: Option<ImageEncoding>,
    /// 紙の矩形を検出してマーチ幅へ切り出す
    #[serde(default = "default_true")]
    pub crop: bool,
    /// 空白帯を除去して詰める
    #[serde(default = "default_true")]
    pub compact: bool,
    /// レイアウトをJSONで書き出すパス
    pub report: Option<String>,
}

fn default_true() -> bool {
    true
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::MarchError::config(format!("Failed to parse job YAML: {e}"))
        })
    }
}
