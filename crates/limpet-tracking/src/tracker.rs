//! This module implements the windowed brute-force patch tracker.
//! It locates a learned template within a bounded neighborhood of its last
//! known position and adaptively refreshes the template on strong matches.

use limpet_image::{Image, ImageSize};
use limpet_imgproc::crop::crop_image;
use limpet_imgproc::metrics::sad;
use limpet_imgproc::window::{apply_window, hann_window};
use log::debug;

use crate::error::TrackingError;

/// Default exponential moving average blend factor for template updates.
pub const DEFAULT_LEARN_RATE: f32 = 0.1;

// Coarse to fine offset steps, evaluated per axis in this order.
const SEARCH_STEPS: [isize; 3] = [4, 2, 1];

/// A rectangular region in frame coordinates, defined by two corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// The x-coordinate of the top-left corner.
    pub x1: f32,
    /// The y-coordinate of the top-left corner.
    pub y1: f32,
    /// The x-coordinate of the bottom-right corner.
    pub x2: f32,
    /// The y-coordinate of the bottom-right corner.
    pub y2: f32,
}

impl Rect {
    /// Create a new rectangle from its corner coordinates.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// Quality band of a match cost returned by [`PatchTracker::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackQuality {
    /// The match is strong, position moved and the template was refreshed.
    Locked,
    /// The match is acceptable, position moved but the template was kept.
    Held,
    /// The match is too weak, the tracker state was left untouched.
    Lost,
}

/// A single-target tracker matching a window-weighted template against
/// candidate patches around its last known position.
///
/// The tracker owns its appearance model and mutates it in place; one
/// instance processes frames strictly sequentially.
pub struct PatchTracker<const C: usize> {
    pos: (usize, usize),
    size: ImageSize,
    frame_size: ImageSize,
    confidence_threshold: f32,
    window: Image<f32, 1>,
    template: Image<f32, C>,
    scratch: Image<f32, C>,
}

impl<const C: usize> PatchTracker<C> {
    /// Create a tracker from an initial frame and a region of interest.
    ///
    /// The region corners are rounded to integer pixels. The acceptance
    /// threshold scales with the region area so that cost comparisons stay
    /// area normalized.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidRegion`] if the rounded region has a
    /// non positive width or height, and
    /// [`TrackingError::RegionOutOfBounds`] if it does not lie fully inside
    /// the frame.
    pub fn new(frame: &Image<f32, C>, rect: Rect) -> Result<Self, TrackingError> {
        let x = rect.x1.round() as i64;
        let y = rect.y1.round() as i64;
        let w = (rect.x2 - rect.x1).round() as i64;
        let h = (rect.y2 - rect.y1).round() as i64;

        if w <= 0 || h <= 0 {
            return Err(TrackingError::InvalidRegion(w, h));
        }

        if x < 0 || y < 0 || x + w > frame.width() as i64 || y + h > frame.height() as i64 {
            return Err(TrackingError::RegionOutOfBounds(
                x,
                y,
                w,
                h,
                frame.width(),
                frame.height(),
            ));
        }

        let size = ImageSize {
            width: w as usize,
            height: h as usize,
        };
        let confidence_threshold = (w * h) as f32 / 1.5;

        let window = hann_window(size)?;
        let mut template = Image::from_size_val(size, 0.0)?;
        crop_image(frame, &mut template, x as usize, y as usize)?;
        apply_window(&mut template, &window)?;

        let scratch = Image::from_size_val(size, 0.0)?;

        Ok(Self {
            pos: (x as usize, y as usize),
            size,
            frame_size: frame.size(),
            confidence_threshold,
            window,
            template,
            scratch,
        })
    }

    /// Search the new frame for the template and refresh the tracker state.
    ///
    /// Uses the default learn rate of [`DEFAULT_LEARN_RATE`], see
    /// [`PatchTracker::update_with_rate`].
    pub fn update(&mut self, frame: &Image<f32, C>) -> Result<f32, TrackingError> {
        self.update_with_rate(frame, DEFAULT_LEARN_RATE)
    }

    /// Search the new frame for the template and refresh the tracker state.
    ///
    /// Runs a greedy per-axis search over integer offsets at decreasing
    /// steps of 4, 2 and 1 pixels, seeded by the cost at the current
    /// position. The returned match cost is the sum of absolute differences
    /// between the template and the window-weighted candidate patch; lower
    /// is better. Costs above twice the confidence threshold leave the
    /// tracker untouched, costs at or below the threshold additionally
    /// blend the matched patch into the template. Use
    /// [`PatchTracker::classify`] to map the cost to a quality band.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::FrameSizeMismatch`] if the frame size
    /// differs from the frame seen at initialization.
    pub fn update_with_rate(
        &mut self,
        frame: &Image<f32, C>,
        learn_rate: f32,
    ) -> Result<f32, TrackingError> {
        if frame.size() != self.frame_size {
            return Err(TrackingError::FrameSizeMismatch(
                frame.size(),
                self.frame_size,
            ));
        }

        // the zero offset seeds the search
        let mut best_dx = 0isize;
        let mut best_dy = 0isize;
        let mut best_cost = self.patch_cost(frame, self.pos.0, self.pos.1)?;

        for step in SEARCH_STEPS {
            for sign in [-1isize, 1] {
                let dx = best_dx + sign * step;
                if let Some((x, y)) = self.candidate_origin(dx, best_dy) {
                    let cost = self.patch_cost(frame, x, y)?;
                    if cost < best_cost {
                        best_cost = cost;
                        best_dx = dx;
                    }
                }
            }
            for sign in [-1isize, 1] {
                let dy = best_dy + sign * step;
                if let Some((x, y)) = self.candidate_origin(best_dx, dy) {
                    let cost = self.patch_cost(frame, x, y)?;
                    if cost < best_cost {
                        best_cost = cost;
                        best_dy = dy;
                    }
                }
            }
        }

        if best_cost > self.confidence_threshold * 2.0 {
            debug!(
                "target lost: cost {} above {}",
                best_cost,
                self.confidence_threshold * 2.0
            );
            return Ok(best_cost);
        }

        let x = (self.pos.0 as isize + best_dx) as usize;
        let y = (self.pos.1 as isize + best_dy) as usize;
        self.pos = (x, y);

        if best_cost <= self.confidence_threshold {
            // refresh the template from the matched patch, bounded by the
            // learn rate so a single frame cannot replace the model
            crop_image(frame, &mut self.scratch, x, y)?;
            apply_window(&mut self.scratch, &self.window)?;
            self.template
                .as_slice_mut()
                .iter_mut()
                .zip(self.scratch.as_slice().iter())
                .for_each(|(t, &p)| *t = *t * (1.0 - learn_rate) + p * learn_rate);
            debug!("template refreshed at ({}, {}) with cost {}", x, y, best_cost);
        }

        Ok(best_cost)
    }

    /// Map a match cost returned by update to its quality band.
    pub fn classify(&self, cost: f32) -> TrackQuality {
        if cost > self.confidence_threshold * 2.0 {
            TrackQuality::Lost
        } else if cost > self.confidence_threshold {
            TrackQuality::Held
        } else {
            TrackQuality::Locked
        }
    }

    /// The current top-left corner of the tracked window.
    pub fn position(&self) -> (usize, usize) {
        self.pos
    }

    /// The fixed size of the tracked window.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The area scaled cost threshold gating acceptance and learning.
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// The current window-weighted appearance model.
    pub fn template(&self) -> &Image<f32, C> {
        &self.template
    }

    // Translate an offset into a patch origin, rejecting offsets whose
    // window would leave the frame.
    fn candidate_origin(&self, dx: isize, dy: isize) -> Option<(usize, usize)> {
        let x = self.pos.0 as isize + dx;
        let y = self.pos.1 as isize + dy;
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x + self.size.width > self.frame_size.width
            || y + self.size.height > self.frame_size.height
        {
            return None;
        }
        Some((x, y))
    }

    fn patch_cost(
        &mut self,
        frame: &Image<f32, C>,
        x: usize,
        y: usize,
    ) -> Result<f32, TrackingError> {
        crop_image(frame, &mut self.scratch, x, y)?;
        apply_window(&mut self.scratch, &self.window)?;
        Ok(sad(&self.template, &self.scratch)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use limpet_image::{Image, ImageSize};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const FRAME_SIZE: ImageSize = ImageSize {
        width: 100,
        height: 100,
    };

    fn uniform_frame(val: f32) -> Image<f32, 1> {
        Image::from_size_val(FRAME_SIZE, val).unwrap()
    }

    // vertical stripes, constant along y
    fn stripe_value(x: usize) -> f32 {
        ((x % 5) * 50) as f32
    }

    fn striped_frame() -> Image<f32, 1> {
        let data = (0..FRAME_SIZE.height)
            .flat_map(|_| (0..FRAME_SIZE.width).map(stripe_value))
            .collect();
        Image::new(FRAME_SIZE, data).unwrap()
    }

    #[test]
    fn init_rejects_degenerate_region() {
        let frame = uniform_frame(0.0);
        let res = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 10.0, 20.0));
        assert!(matches!(res, Err(TrackingError::InvalidRegion(0, 10))));
    }

    #[test]
    fn init_rejects_region_outside_frame() {
        let frame = uniform_frame(0.0);
        let res = PatchTracker::new(&frame, Rect::new(95.0, 10.0, 105.0, 20.0));
        assert!(matches!(res, Err(TrackingError::RegionOutOfBounds(..))));
    }

    #[test]
    fn init_accepts_corner_region() -> Result<(), TrackingError> {
        let frame = uniform_frame(0.0);
        let tracker = PatchTracker::new(&frame, Rect::new(0.0, 0.0, 10.0, 10.0))?;
        assert_eq!(tracker.position(), (0, 0));
        assert_eq!(tracker.size().width, 10);
        assert_eq!(tracker.size().height, 10);
        Ok(())
    }

    #[test]
    fn init_threshold_scales_with_area() -> Result<(), TrackingError> {
        let frame = uniform_frame(0.0);
        let tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        assert_relative_eq!(tracker.confidence_threshold(), 100.0 / 1.5);
        Ok(())
    }

    #[test]
    fn update_rejects_frame_size_mismatch() -> Result<(), TrackingError> {
        let frame = uniform_frame(0.0);
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;

        let other = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 50,
                height: 50,
            },
            0.0,
        )
        .unwrap();
        let res = tracker.update(&other);
        assert!(matches!(res, Err(TrackingError::FrameSizeMismatch(..))));
        Ok(())
    }

    #[test]
    fn zero_motion_is_idempotent() -> Result<(), TrackingError> {
        let frame = uniform_frame(128.0);
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let template_before = tracker.template().clone();

        let cost = tracker.update(&frame)?;

        assert_eq!(cost, 0.0);
        assert_eq!(tracker.position(), (10, 10));
        assert_eq!(tracker.classify(cost), TrackQuality::Locked);

        // blending the identical patch leaves the template effectively unchanged
        for (t, e) in tracker
            .template()
            .as_slice()
            .iter()
            .zip(template_before.as_slice().iter())
        {
            assert_relative_eq!(*t, *e, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn locked_band_refreshes_template() -> Result<(), TrackingError> {
        let frame = uniform_frame(128.0);
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;

        // a uniform +1 intensity shift costs sum(window) ~ 20.25, well below
        // the threshold of 66.67
        let brighter = uniform_frame(129.0);
        let cost = tracker.update(&brighter)?;

        assert!(cost <= tracker.confidence_threshold());
        assert_eq!(tracker.classify(cost), TrackQuality::Locked);
        assert_eq!(tracker.position(), (10, 10));

        // template moved a tenth of the way towards the brighter patch
        let window = limpet_imgproc::window::hann_window(tracker.size()).unwrap();
        for (t, w) in tracker
            .template()
            .as_slice()
            .iter()
            .zip(window.as_slice().iter())
        {
            assert_relative_eq!(*t, w * 128.1, epsilon = 1e-3);
        }
        Ok(())
    }

    #[test]
    fn held_band_keeps_template_bit_identical() -> Result<(), TrackingError> {
        let frame = uniform_frame(128.0);
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let template_before = tracker.template().clone();

        // +5 intensity costs ~101.25, between the threshold and twice the
        // threshold: accepted but never learned
        let drifted = uniform_frame(133.0);
        for _ in 0..5 {
            let cost = tracker.update(&drifted)?;
            assert!(cost > tracker.confidence_threshold());
            assert!(cost <= tracker.confidence_threshold() * 2.0);
            assert_eq!(tracker.classify(cost), TrackQuality::Held);
        }

        assert_eq!(tracker.position(), (10, 10));
        assert_eq!(
            tracker.template().as_slice(),
            template_before.as_slice(),
            "template must stay bit identical across held frames"
        );
        Ok(())
    }

    #[test]
    fn lost_band_leaves_state_untouched() -> Result<(), TrackingError> {
        let frame = uniform_frame(128.0);
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let template_before = tracker.template().clone();

        // +10 intensity costs ~202.5, above twice the threshold
        let mismatched = uniform_frame(138.0);
        let cost = tracker.update(&mismatched)?;

        assert!(cost > tracker.confidence_threshold() * 2.0);
        assert_eq!(tracker.classify(cost), TrackQuality::Lost);
        assert_eq!(tracker.position(), (10, 10));
        assert_eq!(tracker.template().as_slice(), template_before.as_slice());
        Ok(())
    }

    #[test]
    fn gating_boundaries() -> Result<(), TrackingError> {
        // a uniform +delta shift costs delta * sum(window) with
        // sum(window) ~ 20.25 for a 10x10 patch; the thresholds sit at
        // 66.67 and 133.33
        let frame = uniform_frame(128.0);

        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let cost = tracker.update(&uniform_frame(134.6))?;
        assert_eq!(tracker.classify(cost), TrackQuality::Lost);

        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let cost = tracker.update(&uniform_frame(134.5))?;
        assert_eq!(tracker.classify(cost), TrackQuality::Held);

        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 20.0, 20.0))?;
        let cost = tracker.update(&uniform_frame(131.2))?;
        assert_eq!(tracker.classify(cost), TrackQuality::Locked);
        Ok(())
    }

    #[test]
    fn search_recovers_diagonal_shift() -> Result<(), TrackingError> {
        let frame = striped_frame();
        let mut tracker = PatchTracker::new(&frame, Rect::new(30.0, 30.0, 40.0, 40.0))?;

        // move the target by (+4, -2) and fill the rest with noise far from
        // the stripe pattern
        let mut rng = StdRng::seed_from_u64(42);
        let mut data = Vec::with_capacity(FRAME_SIZE.width * FRAME_SIZE.height);
        for _ in 0..FRAME_SIZE.width * FRAME_SIZE.height {
            data.push(rng.random_range(0.0..255.0));
        }
        let mut shifted = Image::<f32, 1>::new(FRAME_SIZE, data).unwrap();
        for y in 28..38 {
            for x in 34..44 {
                shifted.as_slice_mut()[y * FRAME_SIZE.width + x] = stripe_value(x - 4);
            }
        }

        let cost = tracker.update(&shifted)?;

        assert_eq!(cost, 0.0);
        assert_eq!(tracker.position(), (34, 28));
        Ok(())
    }

    #[test]
    fn search_never_worsens_the_baseline() -> Result<(), TrackingError> {
        let frame = striped_frame();
        let mut tracker = PatchTracker::new(&frame, Rect::new(30.0, 30.0, 40.0, 40.0))?;

        let mut rng = StdRng::seed_from_u64(7);
        let data = (0..FRAME_SIZE.width * FRAME_SIZE.height)
            .map(|_| rng.random_range(0.0..255.0))
            .collect();
        let noise = Image::<f32, 1>::new(FRAME_SIZE, data).unwrap();

        // baseline cost at the zero offset, computed independently
        let (x, y) = tracker.position();
        let mut patch = Image::<f32, 1>::from_size_val(tracker.size(), 0.0).unwrap();
        limpet_imgproc::crop::crop_image(&noise, &mut patch, x, y).unwrap();
        let window = limpet_imgproc::window::hann_window(tracker.size()).unwrap();
        limpet_imgproc::window::apply_window(&mut patch, &window).unwrap();
        let baseline = limpet_imgproc::metrics::sad(tracker.template(), &patch).unwrap();

        let cost = tracker.update(&noise)?;
        assert!(cost <= baseline);
        Ok(())
    }

    #[test]
    fn update_is_deterministic() -> Result<(), TrackingError> {
        let frame = striped_frame();

        let mut rng = StdRng::seed_from_u64(3);
        let data = (0..FRAME_SIZE.width * FRAME_SIZE.height)
            .map(|_| rng.random_range(0.0..255.0))
            .collect::<Vec<f32>>();
        let noise = Image::<f32, 1>::new(FRAME_SIZE, data).unwrap();

        let rect = Rect::new(30.0, 30.0, 40.0, 40.0);
        let mut tracker_a = PatchTracker::new(&frame, rect)?;
        let mut tracker_b = PatchTracker::new(&frame, rect)?;

        let cost_a = tracker_a.update(&noise)?;
        let cost_b = tracker_b.update(&noise)?;

        assert_eq!(cost_a, cost_b);
        assert_eq!(tracker_a.position(), tracker_b.position());
        assert_eq!(
            tracker_a.template().as_slice(),
            tracker_b.template().as_slice()
        );
        Ok(())
    }

    #[test]
    fn search_skips_offsets_outside_the_frame() -> Result<(), TrackingError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        let frame = Image::<f32, 1>::from_size_val(size, 64.0).unwrap();
        let mut tracker = PatchTracker::new(&frame, Rect::new(0.0, 0.0, 10.0, 10.0))?;

        // every negative offset leaves the frame and must be rejected
        let cost = tracker.update(&frame)?;
        assert_eq!(cost, 0.0);
        assert_eq!(tracker.position(), (0, 0));
        Ok(())
    }

    #[test]
    fn tracks_multi_channel_frames() -> Result<(), TrackingError> {
        let size = ImageSize {
            width: 50,
            height: 50,
        };
        let frame = Image::<f32, 2>::from_size_val(size, 128.0).unwrap();
        let mut tracker = PatchTracker::new(&frame, Rect::new(10.0, 10.0, 22.0, 22.0))?;

        let cost = tracker.update(&frame)?;
        assert_eq!(cost, 0.0);
        assert_eq!(tracker.position(), (10, 10));
        Ok(())
    }
}
