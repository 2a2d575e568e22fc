//! Sliding history window for QIC-122 decompression.
//!
//! The window is a fixed 2048-byte ring with a single write index. Rather
//! than streaming every byte straight to the output, the window is flushed
//! into the output buffer whenever the write index wraps to zero and once
//! more at end of stream; the flush appends bytes in ring order from index
//! zero up to the write position, which reproduces emission order exactly.
//! Back-references index backwards from the write position modulo the
//! window size, so bytes emitted before the last flush remain addressable.

/// Size of the QIC-122 history window in bytes.
pub const WINDOW_SIZE: usize = 2048;

/// A 2048-byte circular history window.
#[derive(Debug)]
pub struct HistoryWindow {
    buffer: [u8; WINDOW_SIZE],
    position: usize,
}

impl HistoryWindow {
    /// Create a zero-filled window.
    pub fn new() -> Self {
        Self {
            buffer: [0; WINDOW_SIZE],
            position: 0,
        }
    }

    /// Append the window contents up to the write position to `out` and
    /// reset the write position. The ring contents stay addressable for
    /// back-references.
    pub fn flush_into(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.buffer[..self.position]);
        self.position = 0;
    }

    /// Emit a literal byte.
    pub fn push_literal(&mut self, byte: u8, out: &mut Vec<u8>) {
        if self.position == WINDOW_SIZE {
            self.flush_into(out);
        }
        self.buffer[self.position] = byte;
        self.position += 1;
    }

    /// Emit a back-reference: copy `length` bytes starting `offset` bytes
    /// behind the write position, one at a time so that self-overlapping
    /// runs repeat the freshly written bytes.
    pub fn copy_back(&mut self, offset: usize, mut length: usize, out: &mut Vec<u8>) {
        while length > 0 {
            length -= 1;
            if self.position == WINDOW_SIZE {
                self.flush_into(out);
            }

            let index = if self.position >= offset {
                self.position - offset
            } else {
                self.position + WINDOW_SIZE - offset
            };
            self.buffer[self.position] = self.buffer[index % WINDOW_SIZE];
            self.position += 1;
        }
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new()
    }
}
