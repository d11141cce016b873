// Phase 5: 選択範囲の状態遷移: Idle -> Drawing -> Drawn -> Transforming -> (settle) -> Idle

use tracing::debug;

use crate::error::MarchError;
use crate::raster::{Color, PixelBuffer, Point, Polygon};
use crate::region::transform::{Excerpt, extract_excerpt, scale_excerpt, settle};

/// An excerpt lifted off the sheet and being dragged or scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Lifted {
    /// Excerpt as cut, before any scaling.
    pub original: Excerpt,
    /// Excerpt as it will be settled (scaled copy of `original`).
    pub current: Excerpt,
    /// Accumulated drag offset in sheet pixels.
    pub offset: (f64, f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionPhase {
    #[default]
    Idle,
    /// Freehand outline being drawn.
    Drawing(Vec<Point>),
    /// Closed outline, nothing lifted yet.
    Drawn(Polygon),
    /// Excerpt lifted; dragging and scaling happen here.
    Transforming(Box<Lifted>),
}

/// Freehand region selection over a sheet of `width` x `height` pixels.
#[derive(Debug, Clone, Default)]
pub struct RegionSelection {
    phase: SelectionPhase,
    width: u32,
    height: u32,
}

impl RegionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SelectionPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, SelectionPhase::Idle)
    }

    /// Outline of a completed or lifted selection.
    pub fn polygon(&self) -> Option<&Polygon> {
        match &self.phase {
            SelectionPhase::Drawn(polygon) => Some(polygon),
            SelectionPhase::Transforming(lifted) => Some(&lifted.current.outline),
            _ => None,
        }
    }

    /// Drop any previous outline and start drawing at `start`.
    pub fn begin(&mut self, start: Point, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let start = self.clamp(start);
        self.phase = SelectionPhase::Drawing(vec![start]);
    }

    /// Append a vertex, clamped to the sheet. With `axis_lock` the vertex
    /// keeps the previous vertex's y. Returns false outside the drawing phase.
    pub fn add_point(&mut self, point: Point, axis_lock: bool) -> bool {
        let mut point = self.clamp(point);
        let SelectionPhase::Drawing(points) = &mut self.phase else {
            return false;
        };
        if axis_lock && let Some(last) = points.last() {
            point.y = last.y;
        }
        points.push(point);
        true
    }

    /// Close the outline. Fewer than two points discard the selection and
    /// return `InvalidPolygon`.
    pub fn complete(&mut self) -> crate::error::Result<Polygon> {
        let points = match std::mem::take(&mut self.phase) {
            SelectionPhase::Drawing(points) => points,
            other => {
                self.phase = other;
                return Err(MarchError::invalid_polygon("no selection is being drawn"));
            }
        };
        if points.len() < 2 {
            debug!(points = points.len(), "selection discarded");
            return Err(MarchError::invalid_polygon(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }
        let polygon = Polygon::new(points);
        self.phase = SelectionPhase::Drawn(polygon.clone());
        Ok(polygon)
    }

    /// Cut the drawn outline out of `buffer`, leaving `hole_fill` behind.
    /// Lifting an already lifted selection does nothing.
    pub fn lift(&mut self, buffer: &mut PixelBuffer, hole_fill: Color) -> crate::error::Result<()> {
        match &self.phase {
            SelectionPhase::Transforming(_) => Ok(()),
            SelectionPhase::Drawn(polygon) => {
                let (excerpt, _) = extract_excerpt(buffer, polygon, hole_fill)?;
                self.phase = SelectionPhase::Transforming(Box::new(Lifted {
                    current: excerpt.clone(),
                    original: excerpt,
                    offset: (0.0, 0.0),
                }));
                Ok(())
            }
            _ => Err(MarchError::invalid_polygon("no completed selection to lift")),
        }
    }

    pub fn lifted(&self) -> Option<&Lifted> {
        match &self.phase {
            SelectionPhase::Transforming(lifted) => Some(lifted),
            _ => None,
        }
    }

    /// Set the total drag offset since the lift.
    pub fn drag_to(&mut self, dx: f64, dy: f64) -> crate::error::Result<()> {
        let lifted = self.lifted_mut()?;
        lifted.offset = (dx, dy);
        Ok(())
    }

    /// Rescale the lifted excerpt from its unscaled original.
    pub fn scale(&mut self, scale_x: f64, scale_y: f64) -> crate::error::Result<()> {
        let lifted = self.lifted_mut()?;
        lifted.current = scale_excerpt(&lifted.original, scale_x, scale_y)?;
        Ok(())
    }

    /// Stamp the lifted excerpt into `buffer` at its drag offset and return
    /// to idle. Returns the number of pixels written.
    pub fn settle(&mut self, buffer: &mut PixelBuffer) -> crate::error::Result<usize> {
        let lifted = self.lifted_mut()?;
        let (dx, dy) = (lifted.offset.0.round() as i64, lifted.offset.1.round() as i64);
        let written = settle(buffer, &lifted.current, dx, dy);
        self.reset();
        Ok(written)
    }

    pub fn reset(&mut self) {
        self.phase = SelectionPhase::Idle;
    }

    fn lifted_mut(&mut self) -> crate::error::Result<&mut Lifted> {
        match &mut self.phase {
            SelectionPhase::Transforming(lifted) => Ok(lifted),
            _ => Err(MarchError::invalid_polygon("no lifted selection")),
        }
    }

    fn clamp(&self, point: Point) -> Point {
        let max_x = f64::from(self.width.saturating_sub(1));
        let max_y = f64::from(self.height.saturating_sub(1));
        Point::new(point.x.clamp(0.0, max_x), point.y.clamp(0.0, max_y))
    }
}
