//! Core primitives for look-ahead audio streaming.
//!
//! - [`AudioBuffer`] / [`BlockMut`]: non-interleaved multichannel buffers
//!   and the writable block views sources and audio callbacks exchange
//! - [`wrap`]: absolute-position to physical-index mapping for fixed
//!   capacity caches
//! - [`clock`] (`"std"`): wrap-safe millisecond counter for bounded waits
//!
//! Buffers and wraparound addressing are `no_std` + `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub(crate) mod compat;

mod buffer;
pub use buffer::{AudioBuffer, BlockMut};

pub mod wrap;
pub use wrap::{Segment, WrappedRange};

#[cfg(feature = "std")]
pub mod clock;
