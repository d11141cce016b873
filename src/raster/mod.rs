pub mod buffer;
pub mod geometry;

pub use buffer::{Color, PixelBuffer, TRANSPARENT, WHITE, brightness, is_paper};
pub use geometry::{Point, Polygon, Rect};
