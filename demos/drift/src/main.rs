use argh::FromArgs;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use limpet::image::{ops, Image, ImageSize};
use limpet::tracking::{PatchTracker, Rect, TrackQuality, TrackerRegistry};

const FRAME_SIZE: ImageSize = ImageSize {
    width: 320,
    height: 240,
};
const TARGET_SIZE: usize = 24;

#[derive(FromArgs)]
/// Track a synthetic drifting target and log the per-frame match cost
struct Args {
    /// the number of frames to generate
    #[argh(option, short = 'n', default = "120")]
    frames: usize,

    /// the seed for the background noise
    #[argh(option, short = 's', default = "42")]
    seed: u64,

    /// the template learn rate
    #[argh(option, short = 'r', default = "0.1")]
    learn_rate: f32,
}

/// A lazy source of 8-bit frames showing a textured square drifting over a
/// static noisy background.
struct SyntheticDrift {
    background: Vec<u8>,
    tick: usize,
}

impl SyntheticDrift {
    fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let background = (0..FRAME_SIZE.width * FRAME_SIZE.height)
            .map(|_| rng.random_range(0..80u8))
            .collect();
        Self {
            background,
            tick: 0,
        }
    }

    /// Top-left corner of the target at a given tick.
    fn target_at(tick: usize) -> (usize, usize) {
        (40 + tick, 40 + tick / 2)
    }

    fn checker(px: usize, py: usize) -> u8 {
        if (px / 4 + py / 4) % 2 == 0 {
            220
        } else {
            120
        }
    }
}

impl Iterator for SyntheticDrift {
    type Item = Image<u8, 1>;

    fn next(&mut self) -> Option<Self::Item> {
        let (tx, ty) = Self::target_at(self.tick);
        if tx + TARGET_SIZE > FRAME_SIZE.width || ty + TARGET_SIZE > FRAME_SIZE.height {
            return None;
        }

        let mut data = self.background.clone();
        for py in 0..TARGET_SIZE {
            for px in 0..TARGET_SIZE {
                data[(ty + py) * FRAME_SIZE.width + tx + px] = Self::checker(px, py);
            }
        }
        self.tick += 1;

        Some(Image::new(FRAME_SIZE, data).expect("frame buffer matches the frame size"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();
    env_logger::init();

    let mut source = SyntheticDrift::new(args.seed);

    // preallocate the working frame
    let mut frame_f32 = Image::<f32, 1>::from_size_val(FRAME_SIZE, 0.0)?;

    // initialize the tracker on the first frame, at the known target position
    let first = source.next().ok_or("the frame source produced no frames")?;
    ops::cast_and_scale(&first, &mut frame_f32, 1.0)?;

    let (tx, ty) = SyntheticDrift::target_at(0);
    let rect = Rect::new(
        tx as f32,
        ty as f32,
        (tx + TARGET_SIZE) as f32,
        (ty + TARGET_SIZE) as f32,
    );

    let mut registry = TrackerRegistry::new();
    let id = registry.add(PatchTracker::new(&frame_f32, rect)?);

    let mut lost_frames = 0usize;
    let mut frames_seen = 0usize;

    for frame in source.take(args.frames) {
        ops::cast_and_scale(&frame, &mut frame_f32, 1.0)?;

        let costs = registry.update_all_with_rate(&frame_f32, args.learn_rate)?;
        let cost = costs[&id];

        let tracker = registry.get(id).ok_or("tracker disappeared")?;
        let quality = tracker.classify(cost);
        if quality == TrackQuality::Lost {
            lost_frames += 1;
        }

        info!(
            "frame {}: cost {:.1} ({:?}) position {:?}",
            frames_seen,
            cost,
            quality,
            tracker.position()
        );
        frames_seen += 1;
    }

    println!(
        "tracked {} frames, lost on {} of them",
        frames_seen, lost_frames
    );

    Ok(())
}
