//! Per-lane match results of a group scan.

/// Bits of a `BitMask`, one per group lane.
pub(crate) type BitMaskWord = u16;

/// Scalar mask where bit `i` is set iff lane `i` of a group matched a query.
///
/// Lives for a single probe step: produced by a `Group` match and consumed
/// immediately by the probe loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitMask(pub(crate) BitMaskWord);

impl BitMask {
    /// Mask with every lane set.
    pub(crate) const FULL: Self = Self(BitMaskWord::MAX);

    /// Returns true if at least one lane matched.
    #[inline]
    pub(crate) const fn any_bit_set(self) -> bool {
        self.0 != 0
    }

    /// Number of zero bits below the lowest set bit.
    #[inline]
    pub(crate) const fn trailing_zeros(self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Lane of the first match in scan order.
    #[inline]
    pub(crate) const fn lowest_set_bit(self) -> Option<usize> {
        if self.0 == 0 { None } else { Some(self.trailing_zeros() as usize) }
    }

    /// Flips every lane.
    #[inline]
    #[must_use]
    pub(crate) const fn invert(self) -> Self {
        Self(!self.0)
    }

    /// Keeps only the lanes also set in `other`.
    #[inline]
    #[must_use]
    pub(crate) const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Clears the lowest set bit.
    #[inline]
    #[must_use]
    pub(crate) const fn remove_lowest_bit(self) -> Self {
        Self(self.0 & self.0.wrapping_sub(1))
    }
}

impl IntoIterator for BitMask {
    type Item = usize;
    type IntoIter = BitMaskIter;

    #[inline]
    fn into_iter(self) -> BitMaskIter {
        BitMaskIter(self)
    }
}

/// Yields the set lanes of a `BitMask` in ascending order.
#[derive(Debug, Clone)]
pub(crate) struct BitMaskIter(BitMask);

impl Iterator for BitMaskIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let bit = self.0.lowest_set_bit()?;
        self.0 = self.0.remove_lowest_bit();
        Some(bit)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.0.0.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitMaskIter {}
