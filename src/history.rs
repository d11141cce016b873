// Phase 10: 編集履歴: 直前の1枚だけを保持するスナップショットと、タグごとの取り消し処理表

use tracing::debug;

use crate::raster::PixelBuffer;

/// 編集操作のタグ。取り消し時の処理はタグごとに決まる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTag {
    /// Image pasted into the session.
    ImageImport,
    PieceCrop,
    DetectBands,
    EscapeShrink,
    /// Compaction confirmed.
    Shrink,
    /// A detected blank band removed from the list.
    DeleteShrinkArea,
    /// Region selection started.
    AddRefArea,
    /// Region selection closed.
    CompleteRefSel,
    ScaleRefArea,
    SettleRefArea,
    DeleteSelectedArea,
    EscapeRefactoring,
    RepSignMerge,
    SegnoMerge,
    EnterText,
    EscapeTextEntry,
    EscapeSegnoSeg,
    EscapeReps,
    EscapeRepLr,
    UngroupRepViews,
    RepsSetVisible,
    /// Print layout produced.
    SaveMarch,
    ShrunkPiecePrepend,
}

impl ActionTag {
    /// Whether [`EditHistory::begin_action`] snapshots the buffer for this tag.
    ///
    /// Region lifting snapshots separately (see `EditingSession::lift_region`),
    /// so `ScaleRefArea` and `SettleRefArea` restore the pre-lift buffer.
    pub fn captures_snapshot(&self) -> bool {
        matches!(
            self,
            ActionTag::PieceCrop
                | ActionTag::Shrink
                | ActionTag::DeleteSelectedArea
                | ActionTag::RepSignMerge
                | ActionTag::SegnoMerge
                | ActionTag::EnterText
                | ActionTag::ShrunkPiecePrepend
        )
    }
}

/// Work the session must do after an undo, beyond restoring a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    None,
    /// Run blank-band detection again on the current buffer.
    DetectBands,
    /// Run paper-bounds detection again on the source piece.
    DetectPaperBounds,
    /// Put the last removed blank band back at its index.
    RestoreRemovedBand,
    /// Drop the region selection.
    ResetSelection,
    /// Return to the previously stored piece, or to no image.
    UndoImport,
    /// Put the prepended piece back into the store.
    UndoPrepend,
    /// Paginate again.
    Repaginate,
    /// Abandon a pending ornament placement.
    CancelOrnament,
}

/// What [`EditHistory::undo_last`] decided for the most recent action.
#[derive(Debug, Clone)]
pub struct UndoOutcome {
    pub tag: ActionTag,
    /// Buffer to make current again, when the tag restores one.
    pub restored: Option<PixelBuffer>,
    /// Blank bands must be discarded.
    pub discard_bands: bool,
    pub followup: Followup,
    /// The action list was emptied by this undo.
    pub cleared: bool,
}

/// 取り消し用の編集履歴。
///
/// 復元用スナップショットは1枠だけで、新しい取得で上書きされる。
/// スナップショットは常に深いコピーで、現在のバッファと共有しない。
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    snapshot: Option<PixelBuffer>,
    actions: Vec<ActionTag>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `buffer` when the tag calls for it, then record the tag.
    pub fn begin_action(&mut self, tag: ActionTag, buffer: Option<&PixelBuffer>) {
        if tag.captures_snapshot()
            && let Some(buffer) = buffer
        {
            self.capture(buffer);
        }
        self.record(tag);
    }

    /// Replace the recovery snapshot with a copy of `buffer`.
    pub fn capture(&mut self, buffer: &PixelBuffer) {
        self.snapshot = Some(buffer.clone());
    }

    pub fn record(&mut self, tag: ActionTag) {
        debug!(?tag, depth = self.actions.len() + 1, "action recorded");
        self.actions.push(tag);
    }

    pub fn last(&self) -> Option<ActionTag> {
        self.actions.last().copied()
    }

    pub fn actions(&self) -> &[ActionTag] {
        &self.actions
    }

    pub fn snapshot(&self) -> Option<&PixelBuffer> {
        self.snapshot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// 直前の操作を取り消す。
    ///
    /// 戻り値はセッションが行うべき処理。いくつかのタグは操作リスト全体を
    /// 消去する。消去しなかった場合だけ末尾の操作を取り除く。
    /// スナップショットは復元後も残る。
    pub fn undo_last(&mut self) -> Option<UndoOutcome> {
        let tag = self.last()?;

        let mut restore = false;
        let mut discard_bands = false;
        let mut clear = false;
        let followup = match tag {
            ActionTag::RepSignMerge | ActionTag::SegnoMerge | ActionTag::EnterText => {
                restore = true;
                clear = true;
                Followup::None
            }
            ActionTag::EscapeTextEntry
            | ActionTag::EscapeSegnoSeg
            | ActionTag::EscapeReps
            | ActionTag::EscapeRepLr
            | ActionTag::UngroupRepViews
            | ActionTag::EscapeRefactoring => Followup::None,
            ActionTag::ImageImport => {
                clear = true;
                Followup::UndoImport
            }
            ActionTag::PieceCrop => {
                discard_bands = true;
                clear = true;
                restore = true;
                Followup::DetectPaperBounds
            }
            ActionTag::DetectBands => {
                discard_bands = true;
                Followup::None
            }
            ActionTag::EscapeShrink => Followup::DetectBands,
            ActionTag::Shrink => {
                restore = true;
                clear = true;
                Followup::DetectBands
            }
            ActionTag::DeleteShrinkArea => Followup::RestoreRemovedBand,
            ActionTag::ScaleRefArea => {
                restore = true;
                clear = true;
                Followup::ResetSelection
            }
            ActionTag::AddRefArea | ActionTag::CompleteRefSel => Followup::ResetSelection,
            ActionTag::DeleteSelectedArea | ActionTag::SettleRefArea => {
                discard_bands = true;
                restore = true;
                clear = true;
                Followup::None
            }
            ActionTag::SaveMarch => Followup::Repaginate,
            ActionTag::ShrunkPiecePrepend => {
                restore = true;
                clear = true;
                Followup::UndoPrepend
            }
            ActionTag::RepsSetVisible => Followup::CancelOrnament,
        };

        let restored = if restore { self.snapshot.clone() } else { None };
        if clear {
            self.actions.clear();
        } else {
            self.actions.pop();
        }

        debug!(
            ?tag,
            restored = restored.is_some(),
            discard_bands,
            cleared = clear,
            ?followup,
            "undo"
        );
        Some(UndoOutcome {
            tag,
            restored,
            discard_bands,
            followup,
            cleared: clear,
        })
    }
}
