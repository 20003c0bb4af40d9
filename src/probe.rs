//! Probing policies.
//!
//! A policy maps the step number of a probe to a group offset from the home
//! group. The table uses the same policy instance for insertion, lookup and
//! rehashing, so every chain written by one operation is walked identically by
//! the others.

use std::fmt::Debug;

/// Sequence of group offsets walked from the home group.
///
/// Implementations must visit every group exactly once within the first
/// `group_count` steps whenever `group_count` is a power of two; the table
/// relies on this to find a free slot and to bound every probe loop.
pub trait ProbePolicy: Debug + Clone + Default {
    /// Offset, in groups, of the `step`-th probe relative to the home group.
    fn offset(&self, step: usize) -> usize;
}

/// Linear group-stride probing with wraparound: home, home + 1, home + 2, ...
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearProbe;

impl ProbePolicy for LinearProbe {
    #[inline]
    fn offset(&self, step: usize) -> usize {
        step
    }
}

/// Triangular probing: home, home + 1, home + 3, home + 6, ...
///
/// Spreads out chains that collide on their home group. Covers every group of
/// a power-of-two table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangularProbe;

impl ProbePolicy for TriangularProbe {
    #[inline]
    fn offset(&self, step: usize) -> usize {
        // step * (step + 1) / 2, wrapping; only the low bits matter after masking.
        let next = step.wrapping_add(1);
        if step.is_multiple_of(2) { (step / 2).wrapping_mul(next) } else { step.wrapping_mul(next / 2) }
    }
}

/// Group indices visited by one probe, bounded to `group_count` steps.
#[derive(Debug, Clone)]
pub(crate) struct ProbeSeq<'a, P> {
    /// Policy producing the offsets.
    policy: &'a P,
    /// Group the probe starts from.
    home: usize,
    /// `group_count - 1`; group counts are powers of two.
    group_mask: usize,
    /// Next step to produce.
    step: usize,
    /// Number of steps to produce in total.
    steps: usize,
}

impl<'a, P: ProbePolicy> ProbeSeq<'a, P> {
    /// Starts a probe from `start`, which is reduced to a group index.
    pub(crate) fn new(policy: &'a P, start: usize, group_count: usize) -> Self {
        let group_mask = group_count.saturating_sub(1);
        Self { policy, home: start & group_mask, group_mask, step: 0, steps: group_count }
    }
}

impl<P: ProbePolicy> Iterator for ProbeSeq<'_, P> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.step >= self.steps {
            return None;
        }
        let group = self.home.wrapping_add(self.policy.offset(self.step)) & self.group_mask;
        self.step = self.step.saturating_add(1);
        Some(group)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps.saturating_sub(self.step);
        (remaining, Some(remaining))
    }
}

impl<P: ProbePolicy> ExactSizeIterator for ProbeSeq<'_, P> {}
