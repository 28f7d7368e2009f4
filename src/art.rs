use crate::bitset256::BitSet256;

//------------ ART base index algebra ---------------------------------------

// An 8-bit prefix (octet, pfx_len) maps to a number, its base index. The
// internal prefix table of a node is a complete binary tree of height 8,
// laid out as a heap over these indexes: the parent of idx is idx >> 1,
// index 1 is the default route of the node.
//
// base index        1   2   3   4  ..  255  256 ..  511
// prefix            0/0 0/1 128/1 0/2 ..   254/7 0/8 .. 255/8
//
// Indexes [1, 255] hold the prefixes with pfx_len 0..=7 and fit the 256-bit
// prefix table. Indexes [256, 511] are the host routes (pfx_len 8); they
// are the child slots of a node and are addressed by their octet directly.
// Index 0 is never used, it signals absence.

// Maps (octet, pfx_len) to the base index, pfx_len 0..=8.
pub(crate) const fn pfx_to_idx(octet: u8, pfx_len: u8) -> u16 {
    assert!(pfx_len <= 8, "prefix length exceeds the stride");
    (octet as u16 >> (8 - pfx_len)) + (1 << pfx_len)
}

// The base index within the internal prefix table of a node, pfx_len 0..=7.
#[inline]
pub(crate) const fn pfx_to_idx256(octet: u8, pfx_len: u8) -> u8 {
    debug_assert!(pfx_len < 8);
    pfx_to_idx(octet, pfx_len) as u8
}

// The host route for an octet, folded into [128, 255]. The backtracking
// chain of the folded index is exactly the chain of all indexes covering
// the octet, which is all node-local LPM needs.
#[inline]
pub(crate) const fn octet_to_idx(octet: u8) -> u8 {
    ((octet as u16 + 256) >> 1) as u8
}

// Inverts pfx_to_idx. Fails fast on idx 0 and idx > 511.
pub(crate) const fn idx_to_pfx(idx: u16) -> (u8, u8) {
    assert!(idx > 0 && idx < 512, "invalid base index");
    let pfx_len = 15 - idx.leading_zeros() as u8;
    let octet = ((idx as u32 - (1 << pfx_len)) << (8 - pfx_len)) as u8;
    (octet, pfx_len)
}

#[inline]
pub(crate) const fn idx_to_pfx256(idx: u8) -> (u8, u8) {
    idx_to_pfx(idx as u16)
}

// The first and last octet covered by the prefix behind idx, idx in
// [1, 255].
pub(crate) const fn idx_to_range(idx: u8) -> (u8, u8) {
    let (octet, pfx_len) = idx_to_pfx256(idx);
    (octet, octet | (0xFF >> pfx_len))
}

// Total bit length of a prefix stored at (depth, idx).
#[inline]
pub(crate) const fn pfx_bits(depth: usize, idx: u8) -> u8 {
    ((depth as u8) << 3) + 7 - idx.leading_zeros() as u8
}

// The netmask for the last meaningful octet of a prefix, bits 0..=8.
pub(crate) const fn net_mask(bits: u8) -> u8 {
    assert!(bits <= 8, "netmask bits exceed the stride");
    (0xFF00_u16 >> bits) as u8
}

//------------ Allotment tables ---------------------------------------------

// Two tables of 256 bitsets each, const evaluated from the allotment
// recurrence and immutable for the lifetime of the process.
//
// PFX_ROUTES_TBL[idx] is the backtracking bitset: the root-to-idx path in
// the complete binary tree, i.e. all indexes whose prefix covers (or
// equals) the prefix behind idx. ANDed against the prefix table of a node
// it turns node-local LPM into a single 256-bit intersection.
pub(crate) static PFX_ROUTES_TBL: [BitSet256; 256] = {
    let mut tbl = [BitSet256::new(); 256];
    let mut idx = 1_usize;
    while idx < 256 {
        let mut words = [0_u64; 4];
        let mut i = idx;
        while i > 0 {
            words[i >> 6] |= 1 << (i & 63);
            i >>= 1;
        }
        tbl[idx] = BitSet256::from_words(words);
        idx += 1;
    }
    tbl
};

// HOST_ROUTES_TBL[idx] is the forward allotment: the set of host routes
// (child octets) covered by the prefix behind idx. Used by the overlap
// tests to intersect a prefix against the child table of a node.
pub(crate) static HOST_ROUTES_TBL: [BitSet256; 256] = {
    let mut tbl = [BitSet256::new(); 256];
    let mut idx = 1_usize;
    while idx < 256 {
        let (first, last) = idx_to_range(idx as u8);
        let (first, last) = (first as usize, last as usize);
        let mut words = [0_u64; 4];
        let mut octet = first;
        while octet <= last {
            words[octet >> 6] |= 1 << (octet & 63);
            octet += 1;
        }
        tbl[idx] = BitSet256::from_words(words);
        idx += 1;
    }
    tbl
};
