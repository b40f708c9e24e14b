//! Wraparound addressing for fixed-capacity sample caches.
//!
//! An absolute (never pre-wrapped) sample range is mapped onto physical
//! indices `position mod capacity`. A range that crosses the physical end is
//! split into two contiguous segments. Writers and readers of a cache use the
//! same split so they agree on where every sample lives.

/// A contiguous run of physical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    /// Physical index of the first sample.
    pub offset: usize,
    /// Number of samples.
    pub len: usize,
}

impl Segment {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// One or two physical segments covering an absolute range, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrappedRange {
    pub first: Segment,
    pub second: Option<Segment>,
}

impl WrappedRange {
    /// Total samples covered by both segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.first.len + self.second.map_or(0, |s| s.len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn wraps(&self) -> bool {
        self.second.is_some()
    }

    /// Segments paired with their offset relative to the start of the range.
    ///
    /// Yields `(relative_offset, segment)`; allocation-free.
    pub fn segments(&self) -> impl Iterator<Item = (usize, Segment)> {
        let first = self.first;
        let second = self.second.map(|s| (first.len, s));
        core::iter::once((0, first))
            .filter(|(_, s)| s.len > 0)
            .chain(second)
    }
}

/// Physical index of an absolute position.
///
/// Negative positions wrap with Euclidean remainder. Returns 0 for a zero
/// capacity.
#[inline]
pub fn physical_index(position: i64, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    position.rem_euclid(capacity as i64) as usize
}

/// Map the absolute range `[start, start + len)` onto a buffer of `capacity`.
///
/// `len` is clamped to `capacity`; a zero capacity yields an empty range.
pub fn split(start: i64, len: usize, capacity: usize) -> WrappedRange {
    if capacity == 0 || len == 0 {
        return WrappedRange::default();
    }

    let len = len.min(capacity);
    let offset = physical_index(start, capacity);
    let until_end = capacity - offset;

    if len <= until_end {
        WrappedRange {
            first: Segment { offset, len },
            second: None,
        }
    } else {
        WrappedRange {
            first: Segment {
                offset,
                len: until_end,
            },
            second: Some(Segment {
                offset: 0,
                len: len - until_end,
            }),
        }
    }
}
