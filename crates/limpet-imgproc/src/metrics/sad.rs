use limpet_image::{Image, ImageError};

/// Compute the sum of absolute differences (SAD) between two images.
///
/// The SAD is defined as:
///
/// $ SAD(a, b) = \sum_{i=1}^{N} |a_i - b_i| $
///
/// where `a` and `b` are the two images and `N` is the number of pixels.
/// Unlike a mean based metric the result scales with the patch area, which
/// makes it directly comparable against area scaled thresholds.
///
/// # Arguments
///
/// * `image1` - The first input image with shape (H, W, C).
/// * `image2` - The second input image with shape (H, W, C).
///
/// # Returns
///
/// The SAD between the two images.
///
/// # Example
///
/// ```
/// use limpet_image::{Image, ImageSize};
/// use limpet_imgproc::metrics::sad;
///
/// let image1 = Image::<f32, 1>::new(
///   ImageSize {
///    width: 2,
///    height: 3,
///   },
///   vec![0f32, 1f32, 2f32, 3f32, 4f32, 5f32],
/// )
/// .unwrap();
///
/// let image2 = Image::<f32, 1>::new(
///   ImageSize {
///     width: 2,
///     height: 3,
///   },
///   vec![5f32, 4f32, 3f32, 2f32, 1f32, 0f32],
/// )
/// .unwrap();
///
/// let sad = sad(&image1, &image2).unwrap();
/// assert_eq!(sad, 18.0);
/// ```
pub fn sad<const C: usize>(
    image1: &Image<f32, C>,
    image2: &Image<f32, C>,
) -> Result<f32, ImageError> {
    if image1.size() != image2.size() {
        return Err(ImageError::InvalidImageSize(
            image1.width(),
            image1.height(),
            image2.width(),
            image2.height(),
        ));
    }

    let cost = image1
        .as_slice()
        .iter()
        .zip(image2.as_slice().iter())
        .fold(0f32, |acc, (&a, &b)| acc + (a - b).abs());

    Ok(cost)
}
