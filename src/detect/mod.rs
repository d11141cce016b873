pub mod bands;
pub mod paper;

pub use bands::{Band, BandLayout, BandScan, detect_blank_bands, kept_bands};
pub use paper::{PaperScan, detect_paper_bounds};
