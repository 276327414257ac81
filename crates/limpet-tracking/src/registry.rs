//! An explicit registry of active trackers, owned by the caller and driven
//! from the frame consumption loop.

use std::collections::HashMap;

use limpet_image::Image;

use crate::error::TrackingError;
use crate::tracker::PatchTracker;

/// A collection of independent patch trackers keyed by id.
///
/// Trackers are updated strictly sequentially; there is no shared state
/// between them.
#[derive(Default)]
pub struct TrackerRegistry<const C: usize> {
    last_tracker_id: usize,
    trackers: HashMap<usize, PatchTracker<C>>,
}

impl<const C: usize> TrackerRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            last_tracker_id: 0,
            trackers: HashMap::new(),
        }
    }

    /// Add a tracker and return its id.
    pub fn add(&mut self, tracker: PatchTracker<C>) -> usize {
        let id = self.last_tracker_id;
        self.trackers.insert(id, tracker);
        self.last_tracker_id += 1;
        id
    }

    /// Removes trackers by their ids.
    pub fn remove_id(&mut self, ids: &[usize]) {
        for id in ids {
            self.trackers.remove(id);
        }
    }

    /// Get a tracker by its id.
    pub fn get(&self, id: usize) -> Option<&PatchTracker<C>> {
        self.trackers.get(&id)
    }

    /// The number of registered trackers.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Whether the registry holds no trackers.
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Update every registered tracker with the new frame.
    ///
    /// Returns the match cost per tracker id; see
    /// [`PatchTracker::update`] for the cost semantics.
    pub fn update_all(
        &mut self,
        frame: &Image<f32, C>,
    ) -> Result<HashMap<usize, f32>, TrackingError> {
        self.update_all_with_rate(frame, crate::tracker::DEFAULT_LEARN_RATE)
    }

    /// Update every registered tracker with the new frame and learn rate.
    pub fn update_all_with_rate(
        &mut self,
        frame: &Image<f32, C>,
        learn_rate: f32,
    ) -> Result<HashMap<usize, f32>, TrackingError> {
        let mut costs = HashMap::with_capacity(self.trackers.len());
        for (id, tracker) in self.trackers.iter_mut() {
            costs.insert(*id, tracker.update_with_rate(frame, learn_rate)?);
        }
        Ok(costs)
    }
}
