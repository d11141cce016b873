// Phase 10: 編集履歴（取り消し処理表）テスト

use march_shrink::history::{ActionTag, EditHistory, Followup};
use march_shrink::raster::{PixelBuffer, WHITE};

fn sheet(width: u32) -> PixelBuffer {
    PixelBuffer::filled(width, 4, WHITE)
}

// ============================================================
// 1. スナップショット
// ============================================================

#[test]
fn test_begin_action_snapshots_only_for_capturing_tags() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::AddRefArea, Some(&sheet(1)));
    assert!(history.snapshot().is_none());

    history.begin_action(ActionTag::Shrink, Some(&sheet(2)));
    assert_eq!(history.snapshot().map(PixelBuffer::width), Some(2));
    assert_eq!(
        history.actions(),
        &[ActionTag::AddRefArea, ActionTag::Shrink]
    );
}

#[test]
fn test_only_latest_snapshot_is_kept() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::PieceCrop, Some(&sheet(1)));
    history.begin_action(ActionTag::Shrink, Some(&sheet(2)));

    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.restored.map(|b| b.width()), Some(2));
}

// ============================================================
// 2. タグごとの取り消し
// ============================================================

#[test]
fn test_undo_merge_restores_and_clears() {
    for tag in [ActionTag::RepSignMerge, ActionTag::SegnoMerge, ActionTag::EnterText] {
        let mut history = EditHistory::new();
        history.record(ActionTag::AddRefArea);
        history.begin_action(tag, Some(&sheet(3)));

        let outcome = history.undo_last().expect("undo");
        assert_eq!(outcome.tag, tag);
        assert!(outcome.restored.is_some());
        assert!(outcome.cleared);
        assert_eq!(outcome.followup, Followup::None);
        assert!(history.is_empty());
    }
}

#[test]
fn test_undo_escape_tags_are_no_ops() {
    for tag in [
        ActionTag::EscapeTextEntry,
        ActionTag::EscapeSegnoSeg,
        ActionTag::EscapeReps,
        ActionTag::EscapeRepLr,
        ActionTag::UngroupRepViews,
        ActionTag::EscapeRefactoring,
    ] {
        let mut history = EditHistory::new();
        history.begin_action(ActionTag::Shrink, Some(&sheet(1)));
        history.record(tag);

        let outcome = history.undo_last().expect("undo");
        assert!(outcome.restored.is_none(), "{:?} should not restore", tag);
        assert!(!outcome.discard_bands);
        assert!(!outcome.cleared);
        assert_eq!(outcome.followup, Followup::None);
        // 末尾だけが取り除かれる
        assert_eq!(history.actions(), &[ActionTag::Shrink]);
    }
}

#[test]
fn test_undo_import_clears_list() {
    let mut history = EditHistory::new();
    history.record(ActionTag::ImageImport);
    history.record(ActionTag::ImageImport);
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.followup, Followup::UndoImport);
    assert!(outcome.restored.is_none());
    assert!(history.is_empty());
}

#[test]
fn test_undo_crop_discards_bands_and_redetects_paper() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::PieceCrop, Some(&sheet(5)));
    let outcome = history.undo_last().expect("undo");
    assert!(outcome.discard_bands);
    assert!(outcome.cleared);
    assert_eq!(outcome.restored.map(|b| b.width()), Some(5));
    assert_eq!(outcome.followup, Followup::DetectPaperBounds);
}

#[test]
fn test_undo_shrink_restores_and_redetects_bands() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::Shrink, Some(&sheet(5)));
    let outcome = history.undo_last().expect("undo");
    assert!(outcome.restored.is_some());
    assert!(outcome.cleared);
    assert_eq!(outcome.followup, Followup::DetectBands);
}

#[test]
fn test_undo_escape_shrink_redetects_without_restore() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::PieceCrop, Some(&sheet(5)));
    history.record(ActionTag::EscapeShrink);
    let outcome = history.undo_last().expect("undo");
    assert!(outcome.restored.is_none());
    assert_eq!(outcome.followup, Followup::DetectBands);
    assert_eq!(history.actions(), &[ActionTag::PieceCrop]);
}

#[test]
fn test_undo_delete_shrink_area_restores_band() {
    let mut history = EditHistory::new();
    history.record(ActionTag::DeleteShrinkArea);
    history.record(ActionTag::DeleteShrinkArea);
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.followup, Followup::RestoreRemovedBand);
    assert_eq!(history.actions().len(), 1);
}

#[test]
fn test_undo_region_tags() {
    let mut history = EditHistory::new();
    history.capture(&sheet(7));
    history.record(ActionTag::ScaleRefArea);
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.restored.map(|b| b.width()), Some(7));
    assert_eq!(outcome.followup, Followup::ResetSelection);
    assert!(outcome.cleared);

    for tag in [ActionTag::AddRefArea, ActionTag::CompleteRefSel] {
        let mut history = EditHistory::new();
        history.record(tag);
        let outcome = history.undo_last().expect("undo");
        assert!(outcome.restored.is_none());
        assert_eq!(outcome.followup, Followup::ResetSelection);
    }

    for tag in [ActionTag::SettleRefArea, ActionTag::DeleteSelectedArea] {
        let mut history = EditHistory::new();
        history.capture(&sheet(2));
        history.record(tag);
        let outcome = history.undo_last().expect("undo");
        assert!(outcome.restored.is_some());
        assert!(outcome.discard_bands);
        assert!(outcome.cleared);
    }
}

#[test]
fn test_undo_save_march_repaginates() {
    let mut history = EditHistory::new();
    history.record(ActionTag::SaveMarch);
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.followup, Followup::Repaginate);
    assert!(!outcome.cleared);
}

#[test]
fn test_undo_prepend_and_ornament_visibility() {
    let mut history = EditHistory::new();
    history.begin_action(ActionTag::ShrunkPiecePrepend, Some(&sheet(4)));
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.followup, Followup::UndoPrepend);
    assert!(outcome.restored.is_some());
    assert!(outcome.cleared);

    let mut history = EditHistory::new();
    history.record(ActionTag::RepsSetVisible);
    let outcome = history.undo_last().expect("undo");
    assert_eq!(outcome.followup, Followup::CancelOrnament);
    assert!(outcome.restored.is_none());
}
