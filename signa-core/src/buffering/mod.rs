//! Frame buffering primitives.
//!
//! - [`frame`]: the frame record flowing into the pipeline.
//! - [`segment`]: bounded, owned groups of frames handed to providers.
//! - [`LikelihoodWindow`]: fixed-capacity sliding window over per-frame
//!   likelihoods, backed by `ringbuf::HeapRb` with overwrite-on-full.

pub mod frame;
pub mod segment;

use ringbuf::{
    traits::{Consumer, Observer, RingBuffer},
    HeapRb,
};

/// Sliding window of the most recent `capacity` likelihood values.
///
/// Pushing into a full window evicts the oldest value, so the window length
/// never exceeds its capacity.
pub struct LikelihoodWindow {
    rb: HeapRb<f32>,
}

impl LikelihoodWindow {
    /// # Panics
    /// Panics if `capacity == 0`. Callers validate this up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            rb: HeapRb::new(capacity),
        }
    }

    /// Append a value, evicting the oldest one when full.
    pub fn push(&mut self, value: f32) {
        let _ = self.rb.push_overwrite(value);
    }

    /// Arithmetic mean of the buffered values. `0.0` when empty.
    pub fn mean(&self) -> f32 {
        let len = self.rb.occupied_len();
        if len == 0 {
            return 0.0;
        }
        let sum: f32 = self.rb.iter().sum();
        sum / len as f32
    }

    pub fn len(&self) -> usize {
        self.rb.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rb.capacity().get()
    }

    pub fn clear(&mut self) {
        Consumer::clear(&mut self.rb);
    }
}

impl std::fmt::Debug for LikelihoodWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikelihoodWindow")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
