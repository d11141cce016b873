// Phase 7: 印刷選択範囲: マーチ寸法の矩形でシートを上から敷き詰め、移動・反転・削除を扱う

use serde::Serialize;

use crate::raster::Rect;

/// One march-sized slice of the sheet queued for printing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrintSelection {
    pub rect: Rect,
    /// Width and height swapped relative to the march format.
    pub flipped: bool,
}

impl PrintSelection {
    pub fn new(rect: Rect) -> Self {
        PrintSelection {
            rect,
            flipped: false,
        }
    }

    /// Exchange width and height, keeping the origin.
    pub fn flip_sides(&mut self) {
        self.rect = self.rect.flipped();
        self.flipped = !self.flipped;
    }
}

/// 印刷対象の選択範囲リスト。座標はすべてシート画素。
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSelector {
    selections: Vec<PrintSelection>,
    sheet_width: f64,
    sheet_height: f64,
}

impl PrintSelector {
    /// シート全体を上から順にマーチ寸法の矩形で覆う。
    ///
    /// 最大 `floor(sheet_height / march_height) + 1` 個。累積高さが
    /// シートの高さに達した時点で打ち切る。
    pub fn tile(sheet_width: u32, sheet_height: u32, march_width: f64, march_height: f64) -> Self {
        let sheet_height_f = f64::from(sheet_height);
        let mut selections = Vec::new();
        if march_height > 0.0 {
            let count = (sheet_height_f / march_height) as usize + 1;
            let mut y = 0.0;
            for _ in 0..count {
                if y >= sheet_height_f {
                    break;
                }
                selections.push(PrintSelection::new(Rect::from_origin_size(
                    0.0,
                    y,
                    march_width,
                    march_height,
                )));
                y += march_height;
            }
        }
        PrintSelector {
            selections,
            sheet_width: f64::from(sheet_width),
            sheet_height: sheet_height_f,
        }
    }

    pub fn selections(&self) -> &[PrintSelection] {
        &self.selections
    }

    /// Selection rectangles in order, as handed to the paginator.
    pub fn rects(&self) -> Vec<Rect> {
        self.selections.iter().map(|s| s.rect).collect()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// 選択範囲の原点を移動する（シート内にクランプ）。
    pub fn move_to(&mut self, index: usize, x: f64, y: f64) -> bool {
        let max_x = (self.sheet_width - 1.0).max(0.0);
        let max_y = (self.sheet_height - 1.0).max(0.0);
        let Some(selection) = self.selections.get_mut(index) else {
            return false;
        };
        let rect = selection.rect;
        selection.rect = Rect::from_origin_size(
            x.clamp(0.0, max_x),
            y.clamp(0.0, max_y),
            rect.width(),
            rect.height(),
        );
        true
    }

    /// ポインタ解放時の処理。
    ///
    /// ドラッグもコンテキストメニューもなかった解放は縦横を入れ替える。
    /// その後、前後の選択範囲との位置関係を整える。
    pub fn release(&mut self, index: usize, dragged: bool, context_menu: bool) -> bool {
        let Some(selection) = self.selections.get_mut(index) else {
            return false;
        };
        if !dragged && !context_menu {
            selection.flip_sides();
        }
        self.reflow(index);
        true
    }

    /// 前の選択範囲と重なる場合はその直下へ押し下げ、後続の選択範囲は
    /// 隙間がなくなるよう一律にずらす。
    pub fn reflow(&mut self, index: usize) {
        if index >= self.selections.len() {
            return;
        }
        if index > 0 {
            let previous_bottom = self.selections[index - 1].rect.max_y;
            let rect = self.selections[index].rect;
            if previous_bottom > rect.min_y {
                self.selections[index].rect = rect.translated(0.0, previous_bottom - rect.min_y);
            }
        }
        if index + 1 < self.selections.len() {
            let gap = self.selections[index + 1].rect.min_y - self.selections[index].rect.max_y;
            for follower in &mut self.selections[index + 1..] {
                follower.rect = follower.rect.translated(0.0, -gap);
            }
        }
    }

    pub fn delete(&mut self, index: usize) -> Option<PrintSelection> {
        if index < self.selections.len() {
            Some(self.selections.remove(index))
        } else {
            None
        }
    }
}
