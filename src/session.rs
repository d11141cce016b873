// Phase 11: 編集セッション: 画像・検出結果・選択範囲・履歴をまとめて所有し、操作を順に適用する

use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::detect::{Band, detect_blank_bands, detect_paper_bounds, kept_bands};
use crate::error::MarchError;
use crate::history::{ActionTag, EditHistory, Followup};
use crate::print::{
    Orientation, Page, PageDescription, PageSink, PrintSelection, PrintSelector, compose_pages,
    flatten_for_print, paginate, preferred_orientation,
};
use crate::raster::{PixelBuffer, Point, Polygon, Rect, TRANSPARENT};
use crate::region::{RegionSelection, SelectionPhase, paperize};
use crate::shrink::{Ornament, OrnamentKind, compact, crop_to_march, merge_ornament, prepend_piece};

/// 作業段階。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShrinkPhase {
    /// Nothing pasted yet.
    #[default]
    InitPaste,
    Paste,
    /// Paper bounds detected, waiting for the crop.
    InitCrop,
    /// Paper bounds adjusted by hand.
    Crop,
    /// Cropped; blank bands detected and editable.
    Shrink,
    InitRefact,
    /// Compacted; regions and ornaments can be edited.
    Refact,
    /// Print layout prepared.
    Save,
}

/// The editing state of one music sheet.
///
/// Every mutating operation goes through here so that the history sees it.
/// Operations that fail leave the buffer untouched.
#[derive(Debug)]
pub struct EditingSession {
    settings: Settings,
    phase: ShrinkPhase,
    buffer: Option<PixelBuffer>,
    /// The pasted image as it came in, before cropping.
    source: Option<PixelBuffer>,
    paper_bounds: Option<Rect>,
    blank_bands: Vec<Band>,
    removed_band: Option<(usize, Band)>,
    region: RegionSelection,
    pending_ornament: Option<Ornament>,
    stored_pieces: Vec<PixelBuffer>,
    removed_piece: Option<(usize, PixelBuffer)>,
    print: Option<PrintSelector>,
    orientation: Option<Orientation>,
    pages: Vec<Page>,
    history: EditHistory,
}

impl EditingSession {
    pub fn new(settings: Settings) -> Self {
        EditingSession {
            settings,
            phase: ShrinkPhase::InitPaste,
            buffer: None,
            source: None,
            paper_bounds: None,
            blank_bands: Vec::new(),
            removed_band: None,
            region: RegionSelection::new(),
            pending_ornament: None,
            stored_pieces: Vec::new(),
            removed_piece: None,
            print: None,
            orientation: None,
            pages: Vec::new(),
            history: EditHistory::new(),
        }
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> ShrinkPhase {
        self.phase
    }

    /// The buffer to display.
    pub fn current_buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn paper_bounds(&self) -> Option<Rect> {
        self.paper_bounds
    }

    pub fn blank_bands(&self) -> &[Band] {
        &self.blank_bands
    }

    pub fn region(&self) -> &RegionSelection {
        &self.region
    }

    pub fn pending_ornament(&self) -> Option<&Ornament> {
        self.pending_ornament.as_ref()
    }

    pub fn stored_pieces(&self) -> &[PixelBuffer] {
        &self.stored_pieces
    }

    pub fn print_selector(&self) -> Option<&PrintSelector> {
        self.print.as_ref()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    // ============================================================
    // Paste / crop
    // ============================================================

    /// 画像を貼り付ける。既存の画像は保存済みピースへ退避する。
    pub fn paste(&mut self, image: PixelBuffer) -> crate::error::Result<Rect> {
        if image.is_empty() {
            return Err(MarchError::image("pasted image is empty"));
        }
        if let Some(previous) = self.buffer.take() {
            debug!(stored = self.stored_pieces.len() + 1, "previous sheet stored");
            self.stored_pieces.push(previous);
        }
        info!(width = image.width(), height = image.height(), "image pasted");
        self.source = Some(image.clone());
        self.buffer = Some(image);
        self.reset_derived_state();
        self.history.record(ActionTag::ImageImport);
        self.phase = ShrinkPhase::Paste;
        let bounds = self.redetect_paper_bounds()?;
        self.phase = ShrinkPhase::InitCrop;
        Ok(bounds)
    }

    /// 紙の矩形を手動で置き換える（画像内にクランプ）。
    pub fn adjust_paper_bounds(&mut self, bounds: Rect) -> crate::error::Result<Rect> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| MarchError::no_image("paper bounds need a pasted image"))?;
        let full = source.bounds();
        let clamped = Rect::new(
            bounds.min_x.clamp(full.min_x, full.max_x),
            bounds.min_y.clamp(full.min_y, full.max_y),
            bounds.max_x.clamp(full.min_x, full.max_x),
            bounds.max_y.clamp(full.min_y, full.max_y),
        );
        self.paper_bounds = Some(clamped);
        self.phase = ShrinkPhase::Crop;
        Ok(clamped)
    }

    /// 紙の矩形で切り出してマーチ幅へ揃え、空白帯を検出する。
    pub fn crop(&mut self) -> crate::error::Result<()> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| MarchError::no_image("crop needs a pasted image"))?;
        let bounds = self
            .paper_bounds
            .ok_or_else(|| MarchError::no_image("crop needs paper bounds"))?;
        let (march_width, _) = self.settings.march_size_px();
        let cropped = crop_to_march(source, &bounds, march_width.round().max(1.0) as u32)?;

        self.history.begin_action(ActionTag::PieceCrop, self.buffer.as_ref());
        self.buffer = Some(cropped);
        self.run_band_detection()?;
        self.phase = ShrinkPhase::Shrink;
        Ok(())
    }

    // ============================================================
    // Blank bands / compaction
    // ============================================================

    /// 紙色の閾値を変更する（0.0〜1.0）。
    pub fn set_paper_threshold(&mut self, threshold: f32) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MarchError::config(format!(
                "paper threshold must be within 0.0-1.0, got {threshold}"
            )));
        }
        debug!(threshold, "paper threshold set");
        self.settings.paper_threshold = threshold;
        Ok(())
    }

    /// Detect blank bands on the current buffer again.
    pub fn detect_bands(&mut self) -> crate::error::Result<&[Band]> {
        self.run_band_detection()?;
        self.history.record(ActionTag::DetectBands);
        Ok(&self.blank_bands)
    }

    /// Take a detected blank band off the list so its rows are kept.
    pub fn remove_blank_band(&mut self, index: usize) -> Option<Band> {
        if index >= self.blank_bands.len() {
            return None;
        }
        let band = self.blank_bands.remove(index);
        self.removed_band = Some((index, band));
        self.history.record(ActionTag::DeleteShrinkArea);
        Some(band)
    }

    /// Discard all blank bands.
    pub fn escape_shrink(&mut self) {
        self.blank_bands.clear();
        self.history.record(ActionTag::EscapeShrink);
    }

    /// 空白帯を除いた帯を上から詰めて新しいシートにする。
    pub fn compact(&mut self) -> crate::error::Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("compaction needs an image"))?;
        let kept = kept_bands(&self.blank_bands, buffer.height())?;
        let compacted = compact(buffer, &kept, self.settings.paper_threshold)?;

        self.history.begin_action(ActionTag::Shrink, self.buffer.as_ref());
        self.buffer = Some(compacted);
        self.blank_bands.clear();
        self.removed_band = None;
        self.phase = ShrinkPhase::Refact;
        Ok(())
    }

    // ============================================================
    // Region editing
    // ============================================================

    pub fn begin_region(&mut self, start: Point) -> crate::error::Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("region selection needs an image"))?;
        self.region.begin(start, buffer.width(), buffer.height());
        self.history.record(ActionTag::AddRefArea);
        self.phase = ShrinkPhase::InitRefact;
        Ok(())
    }

    pub fn add_region_point(&mut self, point: Point, axis_lock: bool) -> bool {
        self.region.add_point(point, axis_lock)
    }

    /// Close the outline. Too few points discard the selection silently.
    pub fn complete_region(&mut self) -> Option<Polygon> {
        match self.region.complete() {
            Ok(polygon) => {
                self.history.record(ActionTag::CompleteRefSel);
                self.phase = ShrinkPhase::Refact;
                Some(polygon)
            }
            Err(e) => {
                debug!(error = %e, "region selection discarded");
                None
            }
        }
    }

    /// 選択範囲を切り取って持ち上げる。直前の操作が拡縮なら
    /// スナップショットを取り直さない。
    pub fn lift_region(&mut self) -> crate::error::Result<()> {
        if self.region.lifted().is_some() {
            return Ok(());
        }
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| MarchError::no_image("lifting needs an image"))?;
        if self.history.last() != Some(ActionTag::ScaleRefArea) {
            self.history.capture(buffer);
        }
        self.region.lift(buffer, TRANSPARENT)
    }

    pub fn drag_region(&mut self, dx: f64, dy: f64) -> crate::error::Result<()> {
        self.lift_region()?;
        self.region.drag_to(dx, dy)
    }

    pub fn scale_region(&mut self, scale_x: f64, scale_y: f64) -> crate::error::Result<()> {
        if scale_x <= 0.0 || scale_y <= 0.0 {
            return Err(MarchError::invalid_polygon(format!(
                "scale must be positive, got ({scale_x}, {scale_y})"
            )));
        }
        self.lift_region()?;
        self.region.scale(scale_x, scale_y)?;
        self.history.record(ActionTag::ScaleRefArea);
        Ok(())
    }

    /// 持ち上げた抜粋をドラッグ位置に貼り戻す。戻り値は書き込んだ画素数。
    pub fn settle_region(&mut self) -> crate::error::Result<usize> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| MarchError::no_image("settling needs an image"))?;
        let written = self.region.settle(buffer)?;
        self.history.record(ActionTag::SettleRefArea);
        info!(written, "region settled");
        Ok(written)
    }

    /// 選択範囲の内側を紙色（透明）で塗りつぶし、空白帯を再検出する。
    pub fn delete_region(&mut self) -> crate::error::Result<usize> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| MarchError::no_image("deleting needs an image"))?;
        let cleared = match self.region.phase() {
            // The lift already left a hole and captured the snapshot.
            SelectionPhase::Transforming(_) => {
                self.history.record(ActionTag::DeleteSelectedArea);
                0
            }
            SelectionPhase::Drawn(polygon) => {
                let polygon = polygon.clone();
                self.history
                    .begin_action(ActionTag::DeleteSelectedArea, Some(&*buffer));
                paperize(buffer, &polygon, TRANSPARENT)
            }
            _ => return Err(MarchError::invalid_polygon("no completed selection to delete")),
        };
        self.region.reset();
        self.run_band_detection()?;
        debug!(cleared, "selected area deleted");
        Ok(cleared)
    }

    /// 範囲編集を中止する。持ち上げ中の抜粋は元の位置へ戻す。
    pub fn escape_region(&mut self) {
        if let (Some(lifted), Some(buffer)) = (self.region.lifted(), self.buffer.as_mut()) {
            crate::region::settle(buffer, &lifted.original, 0, 0);
        }
        self.region.reset();
        self.history.record(ActionTag::EscapeRefactoring);
    }

    // ============================================================
    // Ornaments / stored pieces
    // ============================================================

    /// 装飾を配置待ちにする。
    pub fn place_ornament(&mut self, ornament: Ornament) {
        self.pending_ornament = Some(ornament);
        self.history.record(ActionTag::RepsSetVisible);
    }

    /// 配置待ちの装飾をシートへ合成する。
    pub fn merge_pending_ornament(&mut self) -> crate::error::Result<()> {
        let ornament = self
            .pending_ornament
            .take()
            .ok_or_else(|| MarchError::image("no ornament is being placed"))?;
        self.merge_ornament(ornament)
    }

    pub fn merge_ornament(&mut self, ornament: Ornament) -> crate::error::Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("ornaments need an image"))?;
        let merged = merge_ornament(buffer, &ornament);
        let tag = match ornament.kind {
            OrnamentKind::Text => ActionTag::EnterText,
            OrnamentKind::RepeatSign => ActionTag::RepSignMerge,
            OrnamentKind::Segno => ActionTag::SegnoMerge,
        };
        self.history.begin_action(tag, self.buffer.as_ref());
        self.buffer = Some(merged);
        Ok(())
    }

    /// 配置待ちの装飾を破棄する。
    pub fn escape_ornament(&mut self) {
        let Some(ornament) = self.pending_ornament.take() else {
            return;
        };
        let tag = match ornament.kind {
            OrnamentKind::Text => ActionTag::EscapeTextEntry,
            OrnamentKind::RepeatSign => ActionTag::EscapeReps,
            OrnamentKind::Segno => ActionTag::EscapeSegnoSeg,
        };
        self.history.record(tag);
    }

    /// 保存済みピースを現在のシートの上に連結する。
    pub fn prepend_piece(&mut self, index: usize) -> crate::error::Result<()> {
        if index >= self.stored_pieces.len() {
            return Err(MarchError::image(format!(
                "no stored piece at index {index} ({} stored)",
                self.stored_pieces.len()
            )));
        }
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("prepending needs an image"))?;
        let piece = &self.stored_pieces[index];
        let joined = prepend_piece(piece, buffer);

        self.history
            .begin_action(ActionTag::ShrunkPiecePrepend, self.buffer.as_ref());
        let piece = self.stored_pieces.remove(index);
        self.removed_piece = Some((index, piece));
        self.buffer = Some(joined);
        Ok(())
    }

    // ============================================================
    // Print
    // ============================================================

    /// 透明画素を白にし、マーチ寸法の選択範囲で敷き詰める。
    pub fn prepare_print(&mut self) -> crate::error::Result<&PrintSelector> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| MarchError::no_image("printing needs an image"))?;
        let flattened = flatten_for_print(buffer);
        let (march_width, march_height) = self.settings.march_size_px();
        let selector = PrintSelector::tile(buffer.width(), buffer.height(), march_width, march_height);
        debug!(flattened, selections = selector.len(), "print prepared");
        self.phase = ShrinkPhase::Save;
        Ok(self.print.insert(selector))
    }

    /// 印刷選択範囲の原点を移動する（シート内にクランプ）。
    pub fn move_print_selection(&mut self, index: usize, x: f64, y: f64) -> bool {
        self.print
            .as_mut()
            .is_some_and(|selector| selector.move_to(index, x, y))
    }

    /// Pointer release on a print selection. A release without drag or
    /// context menu flips the selection; the list is reflowed either way.
    pub fn release_print_selection(
        &mut self,
        index: usize,
        dragged: bool,
        context_menu: bool,
    ) -> bool {
        self.print
            .as_mut()
            .is_some_and(|selector| selector.release(index, dragged, context_menu))
    }

    pub fn delete_print_selection(&mut self, index: usize) -> Option<PrintSelection> {
        let removed = self.print.as_mut()?.delete(index);
        if removed.is_some() {
            debug!(index, "print selection deleted");
        }
        removed
    }

    /// Split the print selections into pages and record the layout.
    pub fn paginate(&mut self) -> crate::error::Result<&[Page]> {
        self.layout_pages()?;
        self.history.record(ActionTag::SaveMarch);
        Ok(&self.pages)
    }

    /// Page description for the chosen orientation.
    pub fn page_description(&self) -> Option<PageDescription> {
        self.orientation
            .map(|orientation| self.settings.page_description(orientation))
    }

    /// ページ画像を合成する。
    pub fn compose(&self) -> crate::error::Result<Vec<PixelBuffer>> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("composing needs an image"))?;
        let description = self
            .page_description()
            .ok_or_else(|| MarchError::config("paginate before composing pages"))?;
        Ok(compose_pages(
            buffer,
            &self.pages,
            &description,
            self.settings.screen_dpi,
            self.settings.cut_lines,
        ))
    }

    /// 合成したページを順に出力先へ渡す。戻り値はページ数。
    pub fn export(&self, sink: &mut dyn PageSink) -> crate::error::Result<usize> {
        let pages = self.compose()?;
        for (index, page) in pages.iter().enumerate() {
            sink.commit(index, page)?;
        }
        info!(pages = pages.len(), "pages exported");
        Ok(pages.len())
    }

    // ============================================================
    // Undo
    // ============================================================

    /// 直前の操作を取り消す。取り消した操作のタグを返す。
    pub fn undo(&mut self) -> crate::error::Result<Option<ActionTag>> {
        let Some(outcome) = self.history.undo_last() else {
            return Ok(None);
        };

        if outcome.discard_bands {
            self.blank_bands.clear();
        }
        if let Some(restored) = outcome.restored {
            self.buffer = Some(restored);
        }

        match outcome.followup {
            Followup::None => {}
            Followup::DetectBands => {
                self.run_band_detection()?;
            }
            Followup::DetectPaperBounds => {
                self.redetect_paper_bounds()?;
                self.phase = ShrinkPhase::InitCrop;
            }
            Followup::RestoreRemovedBand => {
                if let Some((index, band)) = self.removed_band.take() {
                    let index = index.min(self.blank_bands.len());
                    self.blank_bands.insert(index, band);
                }
            }
            Followup::ResetSelection => self.region.reset(),
            Followup::UndoImport => self.undo_import()?,
            Followup::UndoPrepend => {
                if let Some((index, piece)) = self.removed_piece.take() {
                    let index = index.min(self.stored_pieces.len());
                    self.stored_pieces.insert(index, piece);
                }
            }
            Followup::Repaginate => {
                if self.print.is_some() {
                    self.layout_pages()?;
                }
            }
            Followup::CancelOrnament => self.pending_ornament = None,
        }

        info!(tag = ?outcome.tag, cleared = outcome.cleared, "undone");
        Ok(Some(outcome.tag))
    }

    // ============================================================
    // Internals
    // ============================================================

    fn undo_import(&mut self) -> crate::error::Result<()> {
        self.reset_derived_state();
        match self.stored_pieces.pop() {
            Some(previous) => {
                self.source = Some(previous.clone());
                self.buffer = Some(previous);
                self.redetect_paper_bounds()?;
                self.phase = ShrinkPhase::InitCrop;
            }
            None => {
                self.source = None;
                self.buffer = None;
                self.paper_bounds = None;
                self.phase = ShrinkPhase::InitPaste;
            }
        }
        Ok(())
    }

    fn redetect_paper_bounds(&mut self) -> crate::error::Result<Rect> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| MarchError::no_image("paper detection needs a pasted image"))?;
        debug!(width = source.width(), height = source.height(), "paper scan started");
        let bounds = detect_paper_bounds(
            source,
            self.settings.paper_threshold,
            &self.settings.paper_scan(),
        );
        info!(?bounds, "paper bounds detected");
        self.paper_bounds = Some(bounds);
        Ok(bounds)
    }

    fn run_band_detection(&mut self) -> crate::error::Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| MarchError::no_image("band detection needs an image"))?;
        debug!(height = buffer.height(), "band scan started");
        let layout = detect_blank_bands(
            buffer,
            self.settings.paper_threshold,
            &self.settings.band_scan(),
        );
        info!(blank_bands = layout.blank.len(), "blank bands detected");
        self.blank_bands = layout.blank;
        self.removed_band = None;
        Ok(())
    }

    fn layout_pages(&mut self) -> crate::error::Result<()> {
        let selector = self
            .print
            .as_ref()
            .ok_or_else(|| MarchError::config("prepare the print layout before paginating"))?;
        let rects = selector.rects();
        if rects.is_empty() {
            warn!("no print selections");
        }
        let orientation = self
            .settings
            .page
            .orientation
            .resolve(preferred_orientation(&rects));
        let description = self.settings.page_description(orientation);
        let extent = description.available_extent(self.settings.screen_dpi);
        self.pages = paginate(&rects, orientation, extent);
        self.orientation = Some(orientation);
        Ok(())
    }

    fn reset_derived_state(&mut self) {
        self.paper_bounds = None;
        self.blank_bands.clear();
        self.removed_band = None;
        self.region.reset();
        self.pending_ornament = None;
        self.print = None;
        self.orientation = None;
        self.pages.clear();
    }
}
