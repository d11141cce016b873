pub mod selection;
pub mod transform;

pub use selection::{Lifted, RegionSelection, SelectionPhase};
pub use transform::{Excerpt, extract_excerpt, paperize, scale_excerpt, settle};
