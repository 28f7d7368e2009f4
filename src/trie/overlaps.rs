use super::{Child, Node};
use crate::art::{octet_to_idx, pfx_to_idx256, HOST_ROUTES_TBL, PFX_ROUTES_TBL};
use crate::bitset256::BitSet256;
use crate::stride::{
    addr_into_path, max_depth_and_last_bits, prefixes_overlap,
};

use inetnum::addr::Prefix;

//------------ Overlap tests ------------------------------------------------

impl<V> Node<V> {
    // Does anything in the trie below this node overlap pfx? Forward test
    // only: the prefix routes covering the path are checked on the way
    // down, no backtracking needed.
    pub(crate) fn overlaps_prefix_at_depth(
        &self,
        pfx: &Prefix,
        depth: usize,
    ) -> bool {
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, count, _) = addr_into_path(pfx.addr());

        let mut node = self;
        for depth in depth..count {
            if depth == max_depth {
                return node.overlaps_idx(pfx_to_idx256(path[depth], last_bits));
            }

            let octet = path[depth];

            // any route in this node covering the path so far?
            if !node.prefixes.is_empty()
                && node.lpm_test(octet_to_idx(octet))
            {
                return true;
            }

            match node.children.get(octet) {
                None => return false,
                Some(Child::Node(kid)) => node = kid,
                Some(Child::Leaf(leaf)) => {
                    return prefixes_overlap(&leaf.prefix, pfx)
                }
                // a fringe covers its whole subtree, and pfx runs through it
                Some(Child::Fringe(_)) => return true,
            }
        }
        unreachable!()
    }

    // Does the prefix behind idx overlap anything in this node: a route
    // covering it, a route covered by it, or a child slot within its
    // octet range.
    fn overlaps_idx(&self, idx: u8) -> bool {
        if self.lpm_test(idx) {
            return true;
        }

        let mut buf = [0_u8; 256];
        for &route in self.prefixes.bitset().as_slice(&mut buf) {
            if PFX_ROUTES_TBL[route as usize].test(idx) {
                return true;
            }
        }

        HOST_ROUTES_TBL[idx as usize].intersects_any(self.children.bitset())
    }

    // Structural overlap of two tries, same depth on both sides.
    pub(crate) fn overlaps(&self, other: &Self, depth: usize) -> bool {
        let self_pfx_count = self.prefixes.len();
        let other_pfx_count = other.prefixes.len();

        // routes against routes
        if self_pfx_count > 0
            && other_pfx_count > 0
            && self.overlaps_routes(other)
        {
            return true;
        }

        // routes against the other side's children, both ways
        if self_pfx_count > 0
            && !other.children.is_empty()
            && self.overlaps_children_in(other)
        {
            return true;
        }
        if other_pfx_count > 0
            && !self.children.is_empty()
            && other.overlaps_children_in(self)
        {
            return true;
        }

        // children with the same octet on both sides
        if !self.children.bitset().intersects_any(other.children.bitset()) {
            return false;
        }
        self.overlaps_same_children(other, depth)
    }

    fn overlaps_routes(&self, other: &Self) -> bool {
        // identical indexes overlap trivially
        if self
            .prefixes
            .bitset()
            .intersects_any(other.prefixes.bitset())
        {
            return true;
        }

        // otherwise one side must hold a route covering a route of the
        // other side
        let mut buf = [0_u8; 256];
        for &idx in self.prefixes.bitset().as_slice(&mut buf) {
            if other.lpm_test(idx) {
                return true;
            }
        }
        for &idx in other.prefixes.bitset().as_slice(&mut buf) {
            if self.lpm_test(idx) {
                return true;
            }
        }
        false
    }

    // Do the routes of self cover any child octet of other? Projects all
    // routes onto their covered host routes and intersects once.
    fn overlaps_children_in(&self, other: &Self) -> bool {
        let mut host_routes = BitSet256::new();
        let mut buf = [0_u8; 256];
        for &idx in self.prefixes.bitset().as_slice(&mut buf) {
            host_routes.in_place_union(&HOST_ROUTES_TBL[idx as usize]);
        }
        host_routes.intersects_any(other.children.bitset())
    }

    fn overlaps_same_children(&self, other: &Self, depth: usize) -> bool {
        let common = self
            .children
            .bitset()
            .intersection(other.children.bitset());
        let mut buf = [0_u8; 256];
        for &octet in common.as_slice(&mut buf) {
            if overlaps_two_children(
                self.children.must_get(octet),
                other.children.must_get(octet),
                depth + 1,
            ) {
                return true;
            }
        }
        false
    }
}

// The 3x3 combinations of two occupied child slots with the same octet.
// A fringe overlaps everything that shares its slot.
fn overlaps_two_children<V>(
    a: &Child<V>,
    b: &Child<V>,
    depth: usize,
) -> bool {
    match (a, b) {
        (Child::Node(a), Child::Node(b)) => a.overlaps(b, depth),
        (Child::Node(node), Child::Leaf(leaf))
        | (Child::Leaf(leaf), Child::Node(node)) => {
            node.overlaps_prefix_at_depth(&leaf.prefix, depth)
        }
        (Child::Leaf(a), Child::Leaf(b)) => {
            prefixes_overlap(&a.prefix, &b.prefix)
        }
        (Child::Fringe(_), _) | (_, Child::Fringe(_)) => true,
    }
}
