//! Tag masks: the bitmask representation of virtual desktops.
//!
//! Each bit position in a [`TagMask`] represents one virtual desktop
//! ("tag"). A window's tag mask ANDed with a monitor's active tag set
//! determines whether the window is shown. The number of tags is fixed at
//! build time by [`TAG_COUNT`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};

/// The number of virtual desktops per monitor.
pub const TAG_COUNT: u32 = 9;

/// A bitmask over the [`TAG_COUNT`] virtual desktops.
///
/// The empty mask is legal for a window (the window is simply never
/// shown), but a monitor's active tag set must never rest at zero; the
/// monitor operations in [`core::monitor`](super::monitor) fall back to
/// the first tag instead.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagMask(u32);

impl TagMask {
    /// The mask with every tag bit set.
    pub const ALL: TagMask = TagMask((1 << TAG_COUNT) - 1);

    /// The empty mask.
    pub const fn empty() -> Self {
        TagMask(0)
    }

    /// The mask with only tag `idx` set.
    ///
    /// Indices at or beyond [`TAG_COUNT`] wrap around.
    pub fn single(idx: u32) -> Self {
        TagMask(1 << (idx % TAG_COUNT))
    }

    /// Builds a mask from raw bits, discarding bits beyond [`TAG_COUNT`].
    pub fn from_bits(bits: u32) -> Self {
        TagMask(bits) & Self::ALL
    }

    /// The raw bit representation.
    #[inline(always)]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Tests whether no tag is set.
    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Tests whether exactly one tag is set.
    #[inline(always)]
    pub fn is_single(self) -> bool {
        self.0.count_ones() == 1
    }

    /// Tests whether any tag is shared with `other`.
    #[inline(always)]
    pub fn intersects(self, other: TagMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Tests whether tag `idx` is set.
    pub fn contains(self, idx: u32) -> bool {
        self.intersects(Self::single(idx))
    }

    /// The position of the lowest set tag, or `None` if empty.
    pub fn lowest_index(self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.0.trailing_zeros())
        }
    }

    /// An iterator over the positions of all set tags, lowest first.
    pub fn indices(self) -> impl Iterator<Item = u32> {
        (0..TAG_COUNT).filter(move |i| self.contains(*i))
    }
}

impl BitAnd for TagMask {
    type Output = TagMask;

    fn bitand(self, rhs: TagMask) -> TagMask {
        TagMask(self.0 & rhs.0)
    }
}

impl BitOr for TagMask {
    type Output = TagMask;

    fn bitor(self, rhs: TagMask) -> TagMask {
        TagMask(self.0 | rhs.0)
    }
}

impl BitXor for TagMask {
    type Output = TagMask;

    fn bitxor(self, rhs: TagMask) -> TagMask {
        TagMask((self.0 ^ rhs.0) & Self::ALL.0)
    }
}

impl fmt::Debug for TagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagMask[")?;
        for (n, i) in self.indices().enumerate() {
            if n > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", i + 1)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_wraps_at_tag_count() {
        assert_eq!(TagMask::single(0).bits(), 0b1);
        assert_eq!(TagMask::single(TAG_COUNT), TagMask::single(0));
    }

    #[test]
    fn from_bits_discards_overflow() {
        let m = TagMask::from_bits(u32::MAX);
        assert_eq!(m, TagMask::ALL);
    }

    #[test]
    fn lowest_index_picks_lowest() {
        let m = TagMask::single(3) | TagMask::single(7);
        assert_eq!(m.lowest_index(), Some(3));
        assert!(!m.is_single());
        assert_eq!(TagMask::empty().lowest_index(), None);
    }

    #[test]
    fn xor_is_symmetric_difference() {
        let a = TagMask::single(1) | TagMask::single(2);
        let b = TagMask::single(2) | TagMask::single(3);

        let c = a ^ b;
        assert!(c.contains(1));
        assert!(!c.contains(2));
        assert!(c.contains(3));
    }
}
