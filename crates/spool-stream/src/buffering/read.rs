//! Audio-thread read path.

use super::shared_state::SharedStreamState;
use spool_core::BlockMut;

/// Copy the next `block.len()` samples from the cache and advance the cursor.
///
/// Uncached samples become silence. The range lock is held for the copy so
/// a concurrent refill cannot reuse the slots being read; the copy is
/// bounded by the block length.
pub(crate) fn read_block(shared: &SharedStreamState, block: &mut BlockMut<'_>) {
    let n = block.len();
    let mut range = shared.range.lock();
    let storage = shared.storage.load();

    let (from, to) = range.block_intersection(n);
    if from >= to || storage.capacity() == 0 {
        block.clear();
        if n > 0 {
            shared.metrics.record_total_miss();
        }
    } else {
        block.clear_range(0, from);
        block.clear_range(to, n - to);

        let start = range.next_read_pos + from as i64;
        let mut hit = block.sub_block(from, to - from);
        let cached = storage.num_channels().min(hit.num_channels());
        for ch in 0..cached {
            storage.read(ch, start, hit.channel_mut(ch));
        }
        for ch in cached..hit.num_channels() {
            hit.channel_mut(ch).fill(0.0);
        }

        if from > 0 || to < n {
            shared.metrics.record_partial_miss();
        }
    }

    range.next_read_pos = range.next_read_pos.saturating_add(n as i64);
    shared.metrics.record_block();
}
