use super::Node;
use crate::art::PFX_ROUTES_TBL;

//------------ Node local LPM -----------------------------------------------

// The internal prefix table is a complete binary tree, so the candidate
// prefixes covering an index are exactly its root-to-idx path. That path
// is precomputed per index; one 256-bit AND against the prefix bitset and
// the top set bit of the result is the longest match within this node.

impl<V> Node<V> {
    // The longest prefix in this node covering idx, as (base index, value).
    #[inline]
    pub(crate) fn lpm_get(&self, idx: u8) -> Option<(u8, &V)> {
        let top = self
            .prefixes
            .bitset()
            .intersection_top(&PFX_ROUTES_TBL[idx as usize])?;
        Some((top, self.prefixes.must_get(top)))
    }

    // Does any prefix in this node cover idx?
    #[inline]
    pub(crate) fn lpm_test(&self, idx: u8) -> bool {
        self.prefixes
            .bitset()
            .intersects_any(&PFX_ROUTES_TBL[idx as usize])
    }
}
