pub mod compactor;
pub mod crop;
pub mod ornament;

pub use compactor::{compact, remove_paper};
pub use crop::crop_to_march;
pub use ornament::{Ornament, OrnamentKind, merge_ornament, prepend_piece};
