//! Single-producer, single-consumer sample ring.
//!
//! Samples are stored as `f32` bit patterns in atomics so the ring needs no
//! `unsafe`. The pump thread writes; the device callback reads.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

pub struct SampleRing {
    slots: Box<[AtomicU32]>,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
    mask: usize,
}

impl SampleRing {
    /// Capacity is rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            slots: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples ready to read.
    pub fn available(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.available()
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Producer side. Returns the samples accepted.
    pub fn write(&self, samples: &[f32]) -> usize {
        let write = self.write_pos.load(Ordering::Relaxed);
        let read = self.read_pos.load(Ordering::Acquire);
        let count = samples
            .len()
            .min(self.capacity() - write.wrapping_sub(read));

        for (offset, sample) in samples[..count].iter().enumerate() {
            self.slots[write.wrapping_add(offset) & self.mask].store(sample.to_bits(), Ordering::Relaxed);
        }
        self.write_pos
            .store(write.wrapping_add(count), Ordering::Release);
        count
    }

    /// Consumer side. Returns the samples copied into `output`.
    pub fn read(&self, output: &mut [f32]) -> usize {
        let read = self.read_pos.load(Ordering::Relaxed);
        let write = self.write_pos.load(Ordering::Acquire);
        let count = output.len().min(write.wrapping_sub(read));

        for (offset, sample) in output[..count].iter_mut().enumerate() {
            *sample = f32::from_bits(self.slots[read.wrapping_add(offset) & self.mask].load(Ordering::Relaxed));
        }
        self.read_pos
            .store(read.wrapping_add(count), Ordering::Release);
        count
    }

    /// Drop everything not yet read. Consumer side only.
    pub fn clear(&self) {
        let write = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(write, Ordering::Release);
    }
}

pub type SharedSampleRing = Arc<SampleRing>;

pub fn shared_sample_ring(capacity: usize) -> SharedSampleRing {
    Arc::new(SampleRing::new(capacity))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_up() {
        assert_eq!(SampleRing::new(1000).capacity(), 1024);
        assert_eq!(SampleRing::new(0).capacity(), 1);
    }

    #[test]
    fn test_write_then_read() {
        let ring = SampleRing::new(16);
        assert_eq!(ring.write(&[0.5, -0.25, 1.0]), 3);
        assert_eq!(ring.available(), 3);

        let mut out = [0.0f32; 8];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(&out[..3], &[0.5, -0.25, 1.0]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_rejects_extra() {
        let ring = SampleRing::new(4);
        assert_eq!(ring.write(&[1.0; 6]), 4);
        assert_eq!(ring.free(), 0);
        assert_eq!(ring.write(&[2.0]), 0);

        let mut one = [0.0f32; 1];
        ring.read(&mut one);
        assert_eq!(ring.write(&[2.0, 3.0]), 1);
    }

    #[test]
    fn test_wraps_around() {
        let ring = SampleRing::new(8);
        ring.write(&[1.0; 6]);
        let mut out = [0.0f32; 4];
        ring.read(&mut out);
        assert_eq!(ring.write(&[2.0; 5]), 5);

        let mut rest = [0.0f32; 7];
        assert_eq!(ring.read(&mut rest), 7);
        assert_eq!(rest, [1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_clear() {
        let ring = SampleRing::new(8);
        ring.write(&[1.0; 5]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.free(), 8);
    }

    #[test]
    fn test_threads_preserve_order() {
        use std::thread;

        const TOTAL: usize = 20_000;
        let ring = shared_sample_ring(256);
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            let mut next = 0usize;
            while next < TOTAL {
                let end = (next + 64).min(TOTAL);
                let chunk: Vec<f32> = (next..end).map(|i| i as f32).collect();
                let written = producer_ring.write(&chunk);
                next += written;
                if written == 0 {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0usize;
        let mut out = [0.0f32; 100];
        while expected < TOTAL {
            let read = ring.read(&mut out);
            for sample in &out[..read] {
                assert_eq!(*sample, expected as f32);
                expected += 1;
            }
            if read == 0 {
                thread::yield_now();
            }
        }
        producer.join().ok();
    }
}
