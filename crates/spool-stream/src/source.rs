//! Seekable audio sources.
//!
//! A [`PositionableSource`] produces fixed-channel-count blocks from an
//! internal read position. It may be slow (disk-backed decoding) and is not
//! assumed to be thread-safe, so the look-ahead cache only touches it from
//! the background refill while holding its source lock.

use crate::error::Result;
use spool_core::{AudioBuffer, BlockMut};

/// Sequential, seekable producer of multichannel audio.
///
/// Positions are absolute sample indices. A looping source accepts positions
/// past its length and wraps them itself; callers never pre-wrap.
pub trait PositionableSource: Send {
    /// Called before streaming starts or when the host configuration changes.
    fn prepare(&mut self, _block_size_hint: usize, _sample_rate: f64) {}

    /// Drop any resources acquired in [`prepare`](Self::prepare).
    fn release(&mut self) {}

    /// Fill every channel of `block` and advance the read position by
    /// `block.len()`.
    ///
    /// Channels the source does not have are zeroed, as are samples past the
    /// end of a non-looping source.
    fn read(&mut self, block: &mut BlockMut<'_>) -> Result<()>;

    /// Move the read position.
    fn seek(&mut self, position: i64) -> Result<()>;

    /// Current read position.
    fn position(&self) -> i64;

    /// Length in samples; `<= 0` when unknown or unbounded.
    fn total_length(&self) -> i64;

    fn is_looping(&self) -> bool;

    /// Sources that cannot loop ignore this.
    fn set_looping(&mut self, _looping: bool) {}
}

impl<S: PositionableSource + ?Sized> PositionableSource for Box<S> {
    fn prepare(&mut self, block_size_hint: usize, sample_rate: f64) {
        (**self).prepare(block_size_hint, sample_rate)
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn read(&mut self, block: &mut BlockMut<'_>) -> Result<()> {
        (**self).read(block)
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        (**self).seek(position)
    }

    fn position(&self) -> i64 {
        (**self).position()
    }

    fn total_length(&self) -> i64 {
        (**self).total_length()
    }

    fn is_looping(&self) -> bool {
        (**self).is_looping()
    }

    fn set_looping(&mut self, looping: bool) {
        (**self).set_looping(looping)
    }
}

/// In-memory source over a preloaded [`AudioBuffer`].
///
/// Useful for short material that is already decoded, and as a
/// deterministic source in tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: AudioBuffer,
    position: i64,
    looping: bool,
    sample_rate: Option<f64>,
}

impl MemorySource {
    pub fn new(data: AudioBuffer) -> Self {
        Self {
            data,
            position: 0,
            looping: false,
            sample_rate: None,
        }
    }

    /// Mono source from a sample vector.
    pub fn mono(samples: Vec<f32>) -> Self {
        Self::new(AudioBuffer::from_channels(vec![samples]))
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn num_channels(&self) -> usize {
        self.data.num_channels()
    }

    /// Sample rate passed to the last [`prepare`](PositionableSource::prepare).
    pub fn prepared_sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Source index for an absolute position and how many samples can be
    /// copied contiguously from there, or `None` for silence.
    fn locate(&self, position: i64, wanted: usize) -> (Option<usize>, usize) {
        let total = self.data.len();
        if total == 0 {
            return (None, wanted);
        }

        if self.looping {
            let index = position.rem_euclid(total as i64) as usize;
            return (Some(index), wanted.min(total - index));
        }

        if position < 0 {
            let silent = usize::try_from(position.unsigned_abs()).unwrap_or(usize::MAX);
            (None, wanted.min(silent))
        } else if (position as u64) < total as u64 {
            let index = position as usize;
            (Some(index), wanted.min(total - index))
        } else {
            (None, wanted)
        }
    }
}

impl PositionableSource for MemorySource {
    fn prepare(&mut self, _block_size_hint: usize, sample_rate: f64) {
        self.sample_rate = Some(sample_rate);
    }

    fn release(&mut self) {
        self.sample_rate = None;
    }

    fn read(&mut self, block: &mut BlockMut<'_>) -> Result<()> {
        let len = block.len();
        let mut written = 0;

        while written < len {
            let position = self.position + written as i64;
            let (index, run) = self.locate(position, len - written);

            for ch in 0..block.num_channels() {
                let out = &mut block.channel_mut(ch)[written..written + run];
                match index {
                    Some(i) if ch < self.data.num_channels() => {
                        out.copy_from_slice(&self.data.channel(ch)[i..i + run]);
                    }
                    _ => out.fill(0.0),
                }
            }

            written += run;
        }

        self.position += len as i64;
        Ok(())
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn total_length(&self) -> i64 {
        self.data.len() as i64
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}
