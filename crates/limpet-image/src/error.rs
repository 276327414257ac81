/// An error type for the image module.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images are expected to share a size but do not.
    #[error("Image size mismatch ({0}x{1} != {2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel coordinate is outside the image.
    #[error("Pixel index ({0}, {1}) out of bounds for image of size ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel index is outside the image channels.
    #[error("Channel index ({0}) out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a sub-region does not fit inside the image.
    #[error("Region at ({0}, {1}) with size ({2}, {3}) exceeds the image extent ({4}, {5})")]
    RegionOutOfBounds(usize, usize, usize, usize, usize, usize),

    /// Error when casting a pixel value to another type fails.
    #[error("Failed to cast image data")]
    CastError,
}
