//! Fixed-capacity circular buffers for node-local feedback.
//!
//! Feedback paths inside a node (the delay's echo loop) live in a ring owned
//! by that node, never as an edge in the graph. The ring is allocated once and
//! is addressed by index from then on.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Multi-channel ring buffer sharing one write cursor.
///
/// All channels advance together, so a read `delay` samples behind the cursor
/// returns the sample written exactly `delay` calls to [`advance`](Self::advance) ago.
///
/// # Example
///
/// ```rust
/// use audiokit_core::DelayRing;
///
/// let mut ring = DelayRing::new(1, 8);
/// ring.write(0, 1.0);
/// ring.advance();
/// ring.advance();
/// assert_eq!(ring.read(0, 2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayRing {
    data: Vec<f32>,
    capacity: usize,
    channels: usize,
    write: usize,
}

impl DelayRing {
    /// Allocates a silent ring. `capacity` is raised to at least 2.
    pub fn new(channels: usize, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            data: vec![0.0; channels * capacity],
            capacity,
            channels,
            write: 0,
        }
    }

    /// Slots per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Longest readable delay in samples (`capacity - 1`).
    pub fn max_delay(&self) -> usize {
        self.capacity - 1
    }

    /// Reads the sample written `delay` advances ago on `channel`.
    ///
    /// `delay` is clamped to `1..=max_delay()`.
    #[inline]
    pub fn read(&self, channel: usize, delay: usize) -> f32 {
        let delay = delay.clamp(1, self.max_delay());
        let index = (self.write + self.capacity - delay) % self.capacity;
        self.data[channel * self.capacity + index]
    }

    /// Writes `value` at the cursor of `channel`.
    #[inline]
    pub fn write(&mut self, channel: usize, value: f32) {
        self.data[channel * self.capacity + self.write] = value;
    }

    /// Moves the shared write cursor one slot forward, wrapping at capacity.
    #[inline]
    pub fn advance(&mut self) {
        self.write = (self.write + 1) % self.capacity;
    }

    /// Silences every slot and rewinds the cursor.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_sample_from_delay_advances_ago() {
        let mut ring = DelayRing::new(2, 5);
        for n in 0..12 {
            ring.write(0, n as f32);
            ring.write(1, -(n as f32));
            ring.advance();
        }
        // Last written value was 11 one advance ago.
        assert_eq!(ring.read(0, 1), 11.0);
        assert_eq!(ring.read(0, 4), 8.0);
        assert_eq!(ring.read(1, 3), -9.0);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut ring = DelayRing::new(1, 4);
        for n in 0..4 {
            ring.write(0, n as f32);
            ring.advance();
        }
        assert_eq!(ring.read(0, 100), ring.read(0, 3));
        assert_eq!(ring.read(0, 0), ring.read(0, 1));
    }

    #[test]
    fn clear_silences() {
        let mut ring = DelayRing::new(1, 4);
        ring.write(0, 1.0);
        ring.advance();
        ring.clear();
        assert_eq!(ring.read(0, 1), 0.0);
    }

    #[test]
    fn tiny_capacity_is_raised() {
        let ring = DelayRing::new(1, 0);
        assert_eq!(ring.capacity(), 2);
        assert_eq!(ring.max_delay(), 1);
    }
}
