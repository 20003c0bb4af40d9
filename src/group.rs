//! Batched scans over a group of control bytes.
//!
//! On x86 targets with SSE2 a group is matched with one `pcmpeqb` +
//! `pmovmskb` pair. Everywhere else a scalar loop produces the same masks.

use crate::{
    bitmask::BitMask,
    control::{EMPTY, SENTINEL},
};

/// Number of control bytes scanned together.
pub(crate) const GROUP_WIDTH: usize = 16;

/// Copy of `GROUP_WIDTH` consecutive control bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Group([u8; GROUP_WIDTH]);

impl Group {
    /// Reads the group starting at `offset`.
    ///
    /// A read that would run past the end of `ctrl` yields a group made only of
    /// `SENTINEL` bytes, which matches no query.
    #[inline]
    pub(crate) fn load(ctrl: &[u8], offset: usize) -> Self {
        let end = offset.saturating_add(GROUP_WIDTH);
        let bytes = ctrl
            .get(offset..end)
            .and_then(|window| <[u8; GROUP_WIDTH]>::try_from(window).ok())
            .unwrap_or([SENTINEL; GROUP_WIDTH]);
        Self(bytes)
    }

    /// Lanes whose control byte equals `byte`.
    #[inline]
    pub(crate) fn match_byte(self, byte: u8) -> BitMask {
        imp::match_byte(&self.0, byte)
    }

    /// Lanes that have never held an entry.
    #[inline]
    pub(crate) fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }

    /// Lanes with the top bit set: empty, deleted, and padding.
    #[inline]
    pub(crate) fn match_empty_or_deleted(self) -> BitMask {
        imp::match_high_bit(&self.0)
    }

    /// Lanes holding a live entry.
    #[inline]
    pub(crate) fn match_full(self) -> BitMask {
        self.match_empty_or_deleted().invert()
    }
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
use sse2 as imp;

#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2")))]
use scalar as imp;

/// Portable implementation, one comparison per lane.
#[cfg_attr(
    all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"),
    allow(dead_code)
)]
mod scalar {
    use super::GROUP_WIDTH;
    use crate::bitmask::{BitMask, BitMaskWord};

    /// Sets bit `lane` for every byte accepted by `pred`.
    #[inline]
    #[allow(clippy::arithmetic_side_effects)]
    fn collect(bytes: &[u8; GROUP_WIDTH], pred: impl Fn(u8) -> bool) -> BitMask {
        let mut mask: BitMaskWord = 0;
        for (lane, &byte) in bytes.iter().enumerate() {
            if pred(byte) {
                mask |= 1 << lane;
            }
        }
        BitMask(mask)
    }

    /// Lanes equal to `needle`.
    pub(super) fn match_byte(bytes: &[u8; GROUP_WIDTH], needle: u8) -> BitMask {
        collect(bytes, |byte| byte == needle)
    }

    /// Lanes with the top bit set.
    pub(super) fn match_high_bit(bytes: &[u8; GROUP_WIDTH]) -> BitMask {
        collect(bytes, |byte| byte & 0x80 != 0)
    }
}

/// SSE2 implementation.
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
mod sse2 {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };

    use super::GROUP_WIDTH;
    use crate::bitmask::{BitMask, BitMaskWord};

    /// Loads the 16 bytes into a vector register.
    #[inline]
    #[allow(clippy::cast_ptr_alignment)]
    fn load(bytes: &[u8; GROUP_WIDTH]) -> __m128i {
        // SAFETY: `bytes` is exactly 16 readable bytes and `_mm_loadu_si128`
        // has no alignment requirement. SSE2 is enabled for this target.
        unsafe { _mm_loadu_si128(bytes.as_ptr().cast::<__m128i>()) }
    }

    /// Packs the top bit of every lane into a mask.
    #[inline]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn movemask(vector: __m128i) -> BitMask {
        // SAFETY: SSE2 is enabled for this target.
        let bits = unsafe { _mm_movemask_epi8(vector) };
        BitMask(bits as BitMaskWord)
    }

    /// Lanes equal to `needle`, compared in one instruction.
    pub(super) fn match_byte(bytes: &[u8; GROUP_WIDTH], needle: u8) -> BitMask {
        let needle = i8::from_ne_bytes([needle]);
        // SAFETY: SSE2 is enabled for this target.
        let cmp = unsafe { _mm_cmpeq_epi8(load(bytes), _mm_set1_epi8(needle)) };
        movemask(cmp)
    }

    /// Lanes with the top bit set; `pmovmskb` reads exactly that bit.
    pub(super) fn match_high_bit(bytes: &[u8; GROUP_WIDTH]) -> BitMask {
        movemask(load(bytes))
    }
}
