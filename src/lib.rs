pub mod config;
pub mod detect;
pub mod error;
pub mod history;
pub mod pdf;
pub mod pipeline;
pub mod print;
pub mod raster;
pub mod region;
pub mod session;
pub mod shrink;
