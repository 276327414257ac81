use limpet_image::{Image, ImageError, ImageSize};

/// Create a 1d Hann kernel.
///
/// The kernel tapers from zero at both ends to one at the center.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn hann_kernel_1d(kernel_size: usize) -> Vec<f32> {
    if kernel_size <= 1 {
        return vec![1.0; kernel_size];
    }

    let denom = (kernel_size - 1) as f32;
    (0..kernel_size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
        .collect()
}

/// Create a 2d Hann window as the outer product of two 1d Hann kernels.
///
/// The window attenuates pixels towards the patch borders and is used to
/// suppress background contribution at patch edges.
///
/// # Arguments
///
/// * `size` - The size of the window in pixels.
///
/// # Returns
///
/// A single channel image holding the window weights in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use limpet_image::ImageSize;
/// use limpet_imgproc::window::hann_window;
///
/// let window = hann_window(ImageSize { width: 3, height: 3 }).unwrap();
///
/// assert_eq!(window.get_pixel(1, 1, 0).unwrap(), &1.0);
/// assert_eq!(window.get_pixel(0, 0, 0).unwrap(), &0.0);
/// ```
pub fn hann_window(size: ImageSize) -> Result<Image<f32, 1>, ImageError> {
    let kernel_x = hann_kernel_1d(size.width);
    let kernel_y = hann_kernel_1d(size.height);

    let mut data = Vec::with_capacity(size.width * size.height);
    for wy in &kernel_y {
        for wx in &kernel_x {
            data.push(wy * wx);
        }
    }

    Image::new(size, data)
}

/// Weight an image in place with a single channel window.
///
/// Each pixel is multiplied by the window weight at the same position; the
/// weight is broadcast across channels.
///
/// # Arguments
///
/// * `image` - The image to weight in place.
/// * `window` - The window weights, same size as the image.
///
/// # Errors
///
/// Returns an error if the image and window sizes do not match.
pub fn apply_window<const C: usize>(
    image: &mut Image<f32, C>,
    window: &Image<f32, 1>,
) -> Result<(), ImageError> {
    if image.size() != window.size() {
        return Err(ImageError::InvalidImageSize(
            image.width(),
            image.height(),
            window.width(),
            window.height(),
        ));
    }

    image
        .as_slice_mut()
        .chunks_exact_mut(C)
        .zip(window.as_slice().iter())
        .for_each(|(pixel, &w)| {
            pixel.iter_mut().for_each(|p| *p *= w);
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use limpet_image::{Image, ImageError, ImageSize};

    #[test]
    fn test_hann_kernel_1d() {
        let kernel = super::hann_kernel_1d(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];

        for (k, e) in kernel.iter().zip(expected.iter()) {
            assert_relative_eq!(*k, *e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_hann_kernel_degenerate() {
        assert_eq!(super::hann_kernel_1d(1), vec![1.0]);
        assert!(super::hann_kernel_1d(0).is_empty());
    }

    #[test]
    fn test_hann_window_borders() -> Result<(), ImageError> {
        let window = super::hann_window(ImageSize {
            width: 5,
            height: 3,
        })?;

        // zero all along the border, peak at the center
        for x in 0..5 {
            assert_eq!(window.get_pixel(x, 0, 0)?, &0.0);
            assert_eq!(window.get_pixel(x, 2, 0)?, &0.0);
        }
        assert_eq!(window.get_pixel(0, 1, 0)?, &0.0);
        assert_eq!(window.get_pixel(4, 1, 0)?, &0.0);
        assert_eq!(window.get_pixel(2, 1, 0)?, &1.0);

        Ok(())
    }

    #[test]
    fn test_apply_window() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let mut image = Image::<f32, 2>::new(size, vec![2.0, 4.0, 2.0, 4.0, 2.0, 4.0])?;
        let window = Image::<f32, 1>::new(size, vec![0.0, 0.5, 1.0])?;

        super::apply_window(&mut image, &window)?;

        assert_eq!(image.as_slice(), &[0.0, 0.0, 1.0, 2.0, 2.0, 4.0]);

        Ok(())
    }

    #[test]
    fn test_apply_window_size_mismatch() -> Result<(), ImageError> {
        let mut image = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            1.0,
        )?;
        let window = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 3,
            },
            1.0,
        )?;

        let res = super::apply_window(&mut image, &window);
        assert!(matches!(res, Err(ImageError::InvalidImageSize(..))));

        Ok(())
    }
}
