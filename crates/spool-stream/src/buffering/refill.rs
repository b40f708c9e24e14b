//! Background refill policy.
//!
//! Each invocation reads at most one chunk from the source. The valid range
//! is narrowed before any slot is overwritten and widened only after the
//! write completes, so the audio thread never sees a slot mid-write.

use super::cache::{CacheStorage, RangeState};
use super::config::BufferConfig;
use super::shared_state::{SharedStreamState, SourceSlot};
use crate::butler::ASAP;
use crate::error::{Error, Result};

/// Source flags sampled at the start of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceStatus {
    pub looping: bool,
    pub total_length: i64,
}

/// Work decided for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefillPlan {
    Idle,
    /// Read `[start, end)` then publish `[commit_start, end)`.
    Read {
        start: i64,
        end: i64,
        commit_start: i64,
    },
}

/// Result of [`plan_refill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Planned {
    pub plan: RefillPlan,
    /// Previously valid content was thrown away.
    pub discarded: bool,
}

/// Distance between two absolute positions, safe across overflow.
#[inline]
fn drift(a: i64, b: i64) -> u64 {
    a.wrapping_sub(b).unsigned_abs()
}

/// Decide the next chunk and apply the pre-I/O range change.
///
/// Must be called with the range lock held. On return `range` already
/// excludes every slot the planned read will overwrite.
pub(crate) fn plan_refill(
    range: &mut RangeState,
    status: SourceStatus,
    capacity: usize,
    config: &BufferConfig,
) -> Planned {
    if capacity == 0 {
        return Planned {
            plan: RefillPlan::Idle,
            discarded: false,
        };
    }

    let mut discarded = false;
    if range.was_looping != status.looping {
        range.was_looping = status.looping;
        discarded = !range.is_empty();
        range.invalidate();
    }

    let new_start = range.next_read_pos.max(0);
    let window = capacity.saturating_sub(config.guard_samples) as i64;
    let mut new_end = new_start.saturating_add(window);
    if !status.looping && status.total_length > 0 {
        new_end = new_end.min(status.total_length).max(new_start);
    }
    let max_chunk = config.max_chunk_samples as i64;

    if !range.contains(new_start) {
        discarded |= !range.is_empty();
        range.invalidate();

        let end = new_end.min(new_start.saturating_add(max_chunk));
        let plan = if end > new_start {
            RefillPlan::Read {
                start: new_start,
                end,
                commit_start: new_start,
            }
        } else {
            RefillPlan::Idle
        };
        return Planned { plan, discarded };
    }

    let threshold = config.drift_threshold as u64;
    if drift(new_start, range.valid_start) <= threshold && drift(new_end, range.valid_end) <= threshold {
        return Planned {
            plan: RefillPlan::Idle,
            discarded,
        };
    }

    range.valid_start = new_start;
    range.valid_end = range.valid_end.min(new_end);

    let start = range.valid_end;
    let end = new_end.min(start.saturating_add(max_chunk));
    let plan = if end > start {
        RefillPlan::Read {
            start,
            end,
            commit_start: new_start,
        }
    } else {
        RefillPlan::Idle
    };
    Planned { plan, discarded }
}

/// Run one refill invocation. Returns the delay before the next one.
pub(crate) fn refill_next_chunk(shared: &SharedStreamState) -> u32 {
    let idle = shared.config.idle_poll_ms;

    // Mirrored under the source lock so a concurrent `with_source` cannot
    // be overwritten by a stale sample.
    let status = {
        let slot = shared.source.lock();
        let status = SourceStatus {
            looping: slot.source.is_looping(),
            total_length: slot.source.total_length(),
        };
        shared.mirror_source_flags(status.looping, status.total_length);
        status
    };

    let (storage, planned) = {
        let mut range = shared.range.lock();
        let storage = shared.storage.load_full();
        let planned = plan_refill(&mut range, status, storage.capacity(), &shared.config);
        (storage, planned)
    };

    if planned.discarded {
        shared.metrics.record_discard();
        tracing::debug!("Discarded cached audio (seek or loop change)");
    }

    let RefillPlan::Read {
        start,
        end,
        commit_start,
    } = planned.plan
    else {
        return idle;
    };

    let result = {
        let mut slot = shared.source.lock();
        read_section(&mut slot, &storage, start, end)
    };

    match result {
        Ok(()) => {
            {
                let mut range = shared.range.lock();
                // Looping changed during the read: the chunk is stale
                if range.was_looping != status.looping {
                    return ASAP;
                }
                range.valid_start = commit_start;
                range.valid_end = end;
            }
            shared.metrics.record_refill((end - start) as u64);
            shared.ready.notify();
            tracing::trace!(start, end, "Refilled");
            ASAP
        }
        Err(e) => {
            shared.metrics.record_source_error();
            tracing::warn!("Source read failed at {}: {}", start, e);
            idle
        }
    }
}

/// Read `[start, end)` from the source into storage, one scratch buffer at
/// a time.
fn read_section(slot: &mut SourceSlot, storage: &CacheStorage, start: i64, end: i64) -> Result<()> {
    let SourceSlot { source, scratch } = slot;
    let step = scratch.len();
    if step == 0 {
        return Err(Error::Source(
            "refill scratch buffer is not prepared".into(),
        ));
    }

    let mut position = start;
    while position < end {
        let len = ((end - position) as usize).min(step);
        if source.position() != position {
            source.seek(position)?;
        }
        source.read(&mut scratch.block_mut(0, len))?;

        for ch in 0..storage.num_channels().min(scratch.num_channels()) {
            storage.write(ch, position, &scratch.channel(ch)[..len]);
        }
        position += len as i64;
    }
    Ok(())
}
