//! Multichannel sample buffers and block views.

use crate::compat::Vec;

/// Non-interleaved multichannel `f32` buffer.
///
/// Every channel has the same length. Resizing reuses existing allocations
/// where possible, so a buffer sized once during preparation can be reused
/// from the audio thread without allocating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    len: usize,
}

impl AudioBuffer {
    /// Create a zeroed buffer.
    pub fn new(channels: usize, len: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| alloc::vec![0.0; len]).collect(),
            len,
        }
    }

    /// Build a buffer from per-channel sample vectors.
    ///
    /// Channels shorter than the longest one are zero-padded.
    pub fn from_channels(mut channels: Vec<Vec<f32>>) -> Self {
        let len = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(len, 0.0);
        }
        Self { channels, len }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Resize to `channels` × `len`, zeroing all content.
    pub fn set_size(&mut self, channels: usize, len: usize) {
        self.channels.resize_with(channels, Vec::new);
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(len, 0.0);
        }
        self.len = len;
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Zero `len` samples starting at `start` on every channel.
    ///
    /// The range is clamped to the buffer length.
    pub fn clear_range(&mut self, start: usize, len: usize) {
        let start = start.min(self.len);
        let end = start.saturating_add(len).min(self.len);
        for channel in &mut self.channels {
            channel[start..end].fill(0.0);
        }
    }

    /// View `len` samples starting at `start` as a writable block.
    pub fn block_mut(&mut self, start: usize, len: usize) -> BlockMut<'_> {
        BlockMut::new(self, start, len)
    }

    /// View the whole buffer as a writable block.
    pub fn as_block_mut(&mut self) -> BlockMut<'_> {
        let len = self.len;
        BlockMut::new(self, 0, len)
    }
}

/// A writable window `[start, start + len)` over every channel of an
/// [`AudioBuffer`].
///
/// This is what sources fill and what the audio callback hands to the
/// look-ahead cache.
#[derive(Debug)]
pub struct BlockMut<'a> {
    buffer: &'a mut AudioBuffer,
    start: usize,
    len: usize,
}

impl<'a> BlockMut<'a> {
    /// The window is clamped to the buffer length.
    pub fn new(buffer: &'a mut AudioBuffer, start: usize, len: usize) -> Self {
        let start = start.min(buffer.len());
        let len = len.min(buffer.len() - start);
        Self { buffer, start, len }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    /// Samples per channel in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the window inside the underlying buffer.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.buffer.channel(index)[self.start..self.start + self.len]
    }

    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        let (start, end) = (self.start, self.start + self.len);
        &mut self.buffer.channel_mut(index)[start..end]
    }

    /// Zero the whole window.
    pub fn clear(&mut self) {
        self.buffer.clear_range(self.start, self.len);
    }

    /// Zero `len` samples at window-relative `offset`.
    pub fn clear_range(&mut self, offset: usize, len: usize) {
        let offset = offset.min(self.len);
        let len = len.min(self.len - offset);
        self.buffer.clear_range(self.start + offset, len);
    }

    /// Narrow to a sub-window at window-relative `offset`.
    pub fn sub_block(&mut self, offset: usize, len: usize) -> BlockMut<'_> {
        let offset = offset.min(self.len);
        let len = len.min(self.len - offset);
        BlockMut {
            buffer: &mut *self.buffer,
            start: self.start + offset,
            len,
        }
    }
}
