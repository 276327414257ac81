#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//! Limpet-tracking provides a single-target patch tracker built on windowed
//! brute-force template matching, plus a registry to drive several
//! independent trackers from one frame loop.

/// Error types for the tracking module.
pub mod error;

/// caller-owned collection of active trackers.
pub mod registry;

/// the patch tracker itself.
pub mod tracker;

pub use error::TrackingError;
pub use registry::TrackerRegistry;
pub use tracker::{PatchTracker, Rect, TrackQuality, DEFAULT_LEARN_RATE};
