use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

/// Audio fragments of the current utterance, in arrival order.
///
/// The lock is held only to push or to swap the fragment list out, never
/// across an await. A fragment appended while a drain is concatenating lands
/// in the fresh accumulation.
#[derive(Default)]
pub struct FrameBuffer {
    fragments: Mutex<Vec<Bytes>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, fragment: Bytes) {
        if fragment.is_empty() {
            return;
        }
        self.fragments.lock().push(fragment);
    }

    /// Take everything buffered so far as one contiguous byte string.
    /// Returns an empty `Bytes` when nothing was buffered.
    pub fn drain_all(&self) -> Bytes {
        let fragments = std::mem::take(&mut *self.fragments.lock());
        match fragments.len() {
            0 => Bytes::new(),
            1 => fragments.into_iter().next().unwrap_or_default(),
            _ => {
                let total = fragments.iter().map(Bytes::len).sum();
                let mut joined = BytesMut::with_capacity(total);
                for fragment in &fragments {
                    joined.extend_from_slice(fragment);
                }
                joined.freeze()
            }
        }
    }

    pub fn buffered_bytes(&self) -> usize {
        self.fragments.lock().iter().map(Bytes::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn drain_concatenates_in_arrival_order() {
        let buffer = FrameBuffer::new();
        buffer.append(Bytes::from_static(b"\x01\x02"));
        buffer.append(Bytes::from_static(b"\x03\x04"));

        assert_eq!(buffer.drain_all(), Bytes::from_static(b"\x01\x02\x03\x04"));
    }

    #[test]
    fn second_drain_is_empty() {
        let buffer = FrameBuffer::new();
        buffer.append(Bytes::from_static(b"abc"));
        let _ = buffer.drain_all();

        assert!(buffer.drain_all().is_empty());
        assert_eq!(buffer.buffered_bytes(), 0);
    }

    #[test]
    fn drain_of_fresh_buffer_is_empty() {
        assert!(FrameBuffer::new().drain_all().is_empty());
    }

    #[test]
    fn single_fragment_is_returned_as_is() {
        let buffer = FrameBuffer::new();
        buffer.append(Bytes::from_static(b"only"));
        assert_eq!(buffer.drain_all(), Bytes::from_static(b"only"));
    }

    #[test]
    fn empty_fragments_are_ignored() {
        let buffer = FrameBuffer::new();
        buffer.append(Bytes::new());
        assert_eq!(buffer.buffered_bytes(), 0);
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn appends_after_drain_start_a_new_utterance() {
        let buffer = FrameBuffer::new();
        buffer.append(Bytes::from_static(b"first"));
        let first = buffer.drain_all();
        buffer.append(Bytes::from_static(b"second"));

        assert_eq!(first, Bytes::from_static(b"first"));
        assert_eq!(buffer.buffered_bytes(), 6);
        assert_eq!(buffer.drain_all(), Bytes::from_static(b"second"));
    }

    #[test]
    fn many_fragments_keep_exact_bytes() {
        let buffer = FrameBuffer::new();
        let mut expected = Vec::new();
        for i in 0u8..200 {
            let fragment = vec![i; usize::from(i % 7) + 1];
            expected.extend_from_slice(&fragment);
            buffer.append(Bytes::from(fragment));
        }
        assert_eq!(buffer.drain_all().as_ref(), expected.as_slice());
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        let buffer = Arc::new(FrameBuffer::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        buffer.append(Bytes::from(vec![t as u8; 2]));
                    }
                })
            })
            .collect();

        let mut drained = 0;
        for _ in 0..10 {
            drained += buffer.drain_all().len();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drained += buffer.drain_all().len();

        assert_eq!(drained, 4 * 250 * 2);
    }
}
