// Phase 12: パイプライン統合テスト（画像ファイル -> PDF）

use std::path::Path;

use image::{Rgba, RgbaImage};
use lopdf::Document;
use march_shrink::config::settings::{OrientationSetting, PageSettings, Settings};
use march_shrink::pdf::ImageEncoding;
use march_shrink::pipeline::job_runner::{JobConfig, run_job};
use march_shrink::pipeline::orchestrator::run_all_jobs;
use march_shrink::print::Margins;

fn settings() -> Settings {
    Settings {
        screen_dpi: 254.0,
        march_width_cm: 1.0,
        march_height_cm: 0.5,
        page: PageSettings {
            width_pt: 72.0,
            height_pt: 144.0,
            margins: Margins {
                left: 0.0,
                right: 0.0,
                top: 0.0,
                bottom: 0.0,
            },
            orientation: OrientationSetting::Auto,
        },
        ..Settings::default()
    }
}

/// 白地に2本のインク帯を描いた楽譜画像を書き出す
fn write_score(path: &Path, height: u32) {
    let mut image = RgbaImage::from_pixel(100, height, Rgba([255, 255, 255, 255]));
    for y in (20..30).chain(60..80) {
        for x in 0..20 {
            image.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    image.save(path).expect("write PNG");
}

fn job(dir: &Path, name: &str) -> JobConfig {
    JobConfig {
        input_path: dir.join(format!("{name}.png")),
        output_path: dir.join(format!("{name}.pdf")),
        report_path: None,
        settings: settings(),
        crop: true,
        compact: true,
    }
}

// ============================================================
// 1. run_job
// ============================================================

#[test]
fn test_run_job_writes_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_score(&dir.path().join("score.png"), 120);

    let config = job(dir.path(), "score");
    let result = run_job(&config).expect("job should succeed");
    assert_eq!(result.pages_written, 1);
    assert_eq!(result.sheet_height, 30);

    let doc = Document::load(&config.output_path).expect("output should be a PDF");
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_run_job_without_compaction_keeps_height() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_score(&dir.path().join("score.png"), 120);

    let mut config = job(dir.path(), "score");
    config.compact = false;
    let result = run_job(&config).expect("job should succeed");
    assert_eq!(result.sheet_height, 120);
}

#[test]
fn test_run_job_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_score(&dir.path().join("score.png"), 120);

    let mut config = job(dir.path(), "score");
    config.report_path = Some(dir.path().join("layout.json"));
    config.settings.image_encoding = ImageEncoding::Flate;
    config.settings.parallel_workers = 2;
    run_job(&config).expect("job should succeed");

    let json = std::fs::read_to_string(dir.path().join("layout.json")).expect("report");
    let report: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(report["sheet_width"], 100);
    assert_eq!(report["sheet_height"], 30);
    assert_eq!(report["pages"].as_array().map(Vec::len), Some(1));
    assert!(report["orientation"].is_string());
}

#[test]
fn test_run_job_missing_input_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = job(dir.path(), "missing");
    assert!(run_job(&config).is_err());
    assert!(!config.output_path.exists());
}

// ============================================================
// 2. run_all_jobs
// ============================================================

#[test]
fn test_failed_job_does_not_stop_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_score(&dir.path().join("good.png"), 120);

    let jobs = vec![job(dir.path(), "missing"), job(dir.path(), "good")];
    let results = run_all_jobs(&jobs);
    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert!(dir.path().join("good.pdf").exists());
}
