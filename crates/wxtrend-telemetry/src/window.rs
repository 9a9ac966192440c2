//! Fixed-capacity sliding window of observations.

use std::collections::VecDeque;

use crate::observation::Observation;

/// Default number of observations retained
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// FIFO buffer of the most recent observations, oldest first.
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    samples: VecDeque<Observation>,
    capacity: usize,
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl ObservationWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an observation, evicting from the front until `len <= capacity`.
    pub fn append(&mut self, obs: Observation) {
        self.samples.push_back(obs);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Independent copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
