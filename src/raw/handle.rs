use core::num::NonZero;

/// Stable index of a slot inside an [`Arena`](super::arena::Arena).
///
/// Stored as `NonZero<u32>` holding `index + 1`, so `Option<Handle>` is the
/// same size as `Handle` (niche optimization). Child links and the B+-tree
/// leaf chain are plain `Handle`s; no node ever holds a reference into
/// another node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<u32>);

impl Handle {
    pub(crate) const MAX: usize = (u32::MAX - 1) as usize;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` cannot be zero and, given the bound above, cannot wrap.
        Self(NonZero::new((index + 1) as u32).unwrap())
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}
