pub mod encode;
pub mod writer;

pub use encode::{EncodedPage, ImageEncoding, encode_page};
pub use writer::MarchPdfWriter;
