use limpet_image::ImageError;

/// An error type for the tracking module.
#[derive(thiserror::Error, Debug)]
pub enum TrackingError {
    /// Error when the initial region has a non positive width or height.
    #[error("Invalid region of size ({0}, {1})")]
    InvalidRegion(i64, i64),

    /// Error when the initial region does not lie fully inside the frame.
    #[error("Region at ({0}, {1}) with size ({2}, {3}) exceeds the frame extent ({4}, {5})")]
    RegionOutOfBounds(i64, i64, i64, i64, usize, usize),

    /// Error when a frame does not match the size seen at initialization.
    #[error("Frame size {0} does not match the tracking session size {1}")]
    FrameSizeMismatch(limpet_image::ImageSize, limpet_image::ImageSize),

    /// Error when an underlying image operation fails.
    #[error(transparent)]
    Image(#[from] ImageError),
}
