use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Invalid bands: {0}")]
    InvalidBands(String),

    #[error("No image loaded: {0}")]
    NoImage(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`MarchError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl MarchError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an image error.
    image => ImageError,
    /// Create an invalid polygon error.
    invalid_polygon => InvalidPolygon,
    /// Create an invalid bands error.
    invalid_bands => InvalidBands,
    /// Create a missing-image error.
    no_image => NoImage,
    /// Create an encode error.
    encode => EncodeError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
}

impl From<lopdf::Error> for MarchError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfWriteError(e.to_string())
    }
}

impl From<serde_json::Error> for MarchError {
    fn from(e: serde_json::Error) -> Self {
        Self::EncodeError(e.to_string())
    }
}

impl From<serde_yml::Error> for MarchError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for MarchError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarchError>;
