/// Accumulates raw inbound PCM bytes for the turn currently being spoken.
///
/// Chunks arrive in connection order, so appending is the only write
/// operation. The buffer is drained as a whole by [`take_all`](Self::take_all)
/// at every turn boundary; it is never partially consumed.
#[derive(Debug, Default)]
pub struct AudioFrameBuffer {
    bytes: Vec<u8>,
}

impl AudioFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the end of the buffer.
    #[inline]
    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Return the current contents and leave the buffer empty.
    pub fn take_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
