// Phase 7: ページ割り付け: 選択範囲を順番通りに貪欲法でページへ詰める

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::raster::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Length of `rect` along the page's stacking axis: height for
    /// portrait pages, width for landscape pages.
    pub fn extent(&self, rect: &Rect) -> f64 {
        match self {
            Orientation::Portrait => rect.height(),
            Orientation::Landscape => rect.width(),
        }
    }
}

/// One output page and the selections placed on it, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub index: usize,
    pub selections: Vec<Rect>,
}

/// Split `selections` into consecutive pages.
///
/// Selections are taken in order. A selection that would push the current
/// page's cumulative extent past `available_extent` starts a new page. A
/// selection longer than `available_extent` on its own still gets a page;
/// selections are never split or dropped. No selections yield no pages.
pub fn paginate(selections: &[Rect], orientation: Orientation, available_extent: f64) -> Vec<Page> {
    let mut pages: Vec<Page> = Vec::new();
    let mut used = 0.0;

    for rect in selections {
        let extent = orientation.extent(rect);
        let fits = pages
            .last()
            .is_some_and(|page| page.selections.is_empty() || used + extent <= available_extent);
        if !fits {
            pages.push(Page {
                index: pages.len(),
                selections: Vec::new(),
            });
            used = 0.0;
        }
        if let Some(page) = pages.last_mut() {
            page.selections.push(*rect);
        }
        used += extent;
    }

    debug!(
        selections = selections.len(),
        pages = pages.len(),
        ?orientation,
        available_extent,
        "paginated"
    );
    pages
}

/// Portrait when the stacked selection heights exceed the widest right
/// edge, landscape otherwise.
pub fn preferred_orientation(selections: &[Rect]) -> Orientation {
    let total_height: f64 = selections.iter().map(Rect::height).sum();
    let widest = selections.iter().map(|r| r.max_x).fold(0.0, f64::max);
    if total_height > widest {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    }
}
