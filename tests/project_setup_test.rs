// Phase 0: プロジェクト基盤テスト

#[test]
fn test_cargo_dependencies_present() {
    let manifest = std::fs::read_to_string("Cargo.toml").expect("Cargo.toml should exist");

    // [dependencies] セクション内のキー名として存在するか確認
    // 行頭が依存名で始まるパターンでマッチし、部分文字列の偽陽性を防ぐ
    let required_deps = [
        "thiserror",
        "serde ", // "serde_yml" と区別するためスペース付き
        "serde_yml",
        "serde_json",
        "lopdf",
        "image",
        "rayon",
        "tracing",
        "tracing-subscriber",
        "flate2",
    ];

    for dep in required_deps {
        let dep_trimmed = dep.trim();
        let found = manifest.lines().any(|line| {
            let trimmed = line.trim();
            trimmed.starts_with(dep_trimmed)
                && trimmed[dep_trimmed.len()..].starts_with([' ', '=', '.'])
        });
        assert!(
            found,
            "Cargo.toml should contain dependency: {}",
            dep_trimmed
        );
    }
}

#[test]
fn test_all_module_files_exist() {
    let module_paths = [
        "src/lib.rs",
        "src/main.rs",
        "src/error.rs",
        "src/history.rs",
        "src/session.rs",
        "src/config/mod.rs",
        "src/config/settings.rs",
        "src/config/job.rs",
        "src/config/merged.rs",
        "src/raster/mod.rs",
        "src/raster/buffer.rs",
        "src/raster/geometry.rs",
        "src/detect/mod.rs",
        "src/detect/paper.rs",
        "src/detect/bands.rs",
        "src/shrink/mod.rs",
        "src/shrink/compactor.rs",
        "src/shrink/crop.rs",
        "src/shrink/ornament.rs",
        "src/region/mod.rs",
        "src/region/selection.rs",
        "src/region/transform.rs",
        "src/print/mod.rs",
        "src/print/selector.rs",
        "src/print/paginator.rs",
        "src/print/page.rs",
        "src/print/sink.rs",
        "src/pdf/mod.rs",
        "src/pdf/encode.rs",
        "src/pdf/writer.rs",
        "src/pipeline/mod.rs",
        "src/pipeline/job_runner.rs",
        "src/pipeline/orchestrator.rs",
    ];

    for path in module_paths {
        assert!(
            std::path::Path::new(path).exists(),
            "Module file should exist: {}",
            path
        );
    }
}
