use bytes::{Buf, BytesMut};

/// Input bytes received but not yet consumed by the codec.
///
/// New chunks go to the tail; the driver trims exactly the number of bytes the
/// codec reports as consumed from the front after every call. Growth is not
/// bounded here: the streaming adapters always offer everything pending before
/// asking for more input.
#[derive(Debug, Default)]
pub struct Accumulator {
    pending: BytesMut,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// The full pending sequence, in arrival order.
    #[inline]
    pub fn current(&self) -> &[u8] {
        &self.pending
    }

    /// Drop the first `n` bytes.
    ///
    /// # Panics
    /// If `n` exceeds the pending length. A codec reporting more consumed
    /// bytes than it was offered is a bug in the codec adapter.
    pub fn consume(&mut self, n: usize) {
        assert!(
            n <= self.pending.len(),
            "consumed {} bytes but only {} were pending",
            n,
            self.pending.len()
        );
        self.pending.advance(n);
    }

    /// Discard everything pending.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
