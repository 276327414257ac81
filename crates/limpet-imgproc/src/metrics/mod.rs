//! Patch matching cost metrics.
//!
//! This module provides functions for quantitatively comparing patches,
//! used as matching costs in the tracking search.

mod sad;

pub use sad::sad;
