// Phase 12: ジョブ単位: 画像読込 -> 切り出し -> 空白帯検出 -> 圧縮 -> ページ割り付け -> 並列エンコード -> PDF出力

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::settings::Settings;
use crate::error::MarchError;
use crate::pdf::{EncodedPage, MarchPdfWriter, encode_page};
use crate::print::{Orientation, Page};
use crate::raster::PixelBuffer;
use crate::session::EditingSession;

/// Configuration for a single job.
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub report_path: Option<PathBuf>,
    /// Settings with the job's overrides applied.
    pub settings: Settings,
    pub crop: bool,
    pub compact: bool,
}

/// Result of processing a single job.
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub pages_written: usize,
    /// Height of the compacted sheet in pixels.
    pub sheet_height: u32,
}

/// JSONレイアウトレポート
#[derive(Debug, Serialize)]
pub struct LayoutReport<'a> {
    pub input: String,
    pub output: String,
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub orientation: Option<Orientation>,
    pub pages: &'a [Page],
}

/// Run a single image through the march pipeline.
///
/// Phase A: 画像読込と紙領域の切り出し（逐次）
/// Phase B: 空白帯の除去とページ割り付け（逐次）
/// Phase C: ページ画像のエンコード（rayon並列）
/// Phase D: PDF組立と出力（逐次）
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    // --- Phase A ---
    let image = image::open(&config.input_path)?;
    let sheet = PixelBuffer::from_dynamic(&image);

    let mut session = EditingSession::new(config.settings.clone());
    session.paste(sheet)?;
    if config.crop {
        session.crop()?;
    } else {
        session.detect_bands()?;
    }

    // --- Phase B ---
    if config.compact {
        session.compact()?;
    }
    session.prepare_print()?;
    session.paginate()?;
    let pages = session.compose()?;

    let (sheet_width, sheet_height) = session
        .current_buffer()
        .map(|b| (b.width(), b.height()))
        .unwrap_or_default();
    info!(
        input = %config.input_path.display(),
        sheet_width,
        sheet_height,
        pages = pages.len(),
        "sheet laid out"
    );

    // --- Phase C ---
    let settings = session.settings();
    let encoded = encode_pages(
        &pages,
        settings.parallel_workers,
        |page| encode_page(page, settings.image_encoding, settings.jpeg_quality),
    )?;

    // --- Phase D ---
    let description = session
        .page_description()
        .ok_or_else(|| MarchError::config("no page layout was produced"))?;
    let mut writer = MarchPdfWriter::new(
        description,
        settings.screen_dpi,
        settings.image_encoding,
        settings.jpeg_quality,
    );
    for page in &encoded {
        writer.add_encoded_page(page)?;
    }
    writer.save(&config.output_path)?;

    if let Some(report_path) = &config.report_path {
        let report = LayoutReport {
            input: config.input_path.display().to_string(),
            output: config.output_path.display().to_string(),
            sheet_width,
            sheet_height,
            orientation: session.orientation(),
            pages: session.pages(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, json)?;
    }

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        pages_written: writer.page_count(),
        sheet_height,
    })
}

/// ページを並列にエンコードする。`workers` が0ならrayonの既定プールを使う。
fn encode_pages<F>(
    pages: &[PixelBuffer],
    workers: usize,
    encode: F,
) -> crate::error::Result<Vec<EncodedPage>>
where
    F: Fn(&PixelBuffer) -> crate::error::Result<EncodedPage> + Sync,
{
    let run = || -> crate::error::Result<Vec<EncodedPage>> {
        pages.par_iter().map(&encode).collect()
    };
    if workers == 0 {
        return run();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| MarchError::config(format!("Failed to build worker pool: {e}")))?;
    pool.install(run)
}
