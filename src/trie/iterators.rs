use std::cmp::Ordering;

use inetnum::addr::Prefix;

use super::{Child, Node};
use crate::art::{idx_to_pfx256, HOST_ROUTES_TBL, PFX_ROUTES_TBL};
use crate::stride::{cidr_for_fringe, cidr_from_path, StridePath};

//------------ Ordered subtree walks ----------------------------------------

// CIDR sort order for two base indexes: by octet, then shorter prefix
// first. Prefix tables are bitsets in index order, which is breadth-first
// over the binary tree, so an explicit rank sort is needed before merging
// them with the child slots.
fn cmp_index_rank(a: u8, b: u8) -> Ordering {
    idx_to_pfx256(a).cmp(&idx_to_pfx256(b))
}

impl<V> Node<V> {
    // Collect every prefix at or below this node in CIDR sort order. The
    // internal prefixes and the child slots are merged by octet while
    // walking; a prefix sorts before the children it covers.
    pub(crate) fn all_rec_sorted<'a>(
        &'a self,
        path: StridePath,
        depth: usize,
        is4: bool,
        out: &mut Vec<(Prefix, &'a V)>,
    ) {
        let mut idx_buf = [0_u8; 256];
        let idx_count = self.prefixes.bitset().as_slice(&mut idx_buf).len();
        idx_buf[..idx_count].sort_unstable_by(|a, b| cmp_index_rank(*a, *b));

        let mut octet_buf = [0_u8; 256];
        let child_octets = self.children.bitset().as_slice(&mut octet_buf);

        let mut child_cursor = 0;
        for &idx in &idx_buf[..idx_count] {
            let (pfx_octet, _) = idx_to_pfx256(idx);

            // all children strictly before this prefix's octet
            while child_cursor < child_octets.len()
                && child_octets[child_cursor] < pfx_octet
            {
                self.append_child(
                    child_octets[child_cursor],
                    path,
                    depth,
                    is4,
                    out,
                );
                child_cursor += 1;
            }

            out.push((
                cidr_from_path(path, depth, is4, idx),
                self.prefixes.must_get(idx),
            ));
        }

        for &octet in &child_octets[child_cursor..] {
            self.append_child(octet, path, depth, is4, out);
        }
    }

    fn append_child<'a>(
        &'a self,
        octet: u8,
        mut path: StridePath,
        depth: usize,
        is4: bool,
        out: &mut Vec<(Prefix, &'a V)>,
    ) {
        match self.children.must_get(octet) {
            Child::Node(node) => {
                path[depth] = octet;
                node.all_rec_sorted(path, depth + 1, is4, out);
            }
            Child::Leaf(leaf) => out.push((leaf.prefix, &leaf.value)),
            Child::Fringe(fringe) => out.push((
                cidr_for_fringe(path, depth, is4, octet),
                &fringe.value,
            )),
        }
    }

    // Collect the entries of this node strictly covered by the prefix
    // behind idx, plus the full subtrees of the child slots within its
    // octet range, in CIDR sort order.
    pub(crate) fn each_subnet<'a>(
        &'a self,
        path: StridePath,
        depth: usize,
        is4: bool,
        idx: u8,
        out: &mut Vec<(Prefix, &'a V)>,
    ) {
        let mut route_buf = [0_u8; 256];
        let mut idx_buf = [0_u8; 256];
        let mut idx_count = 0;
        for &route in self.prefixes.bitset().as_slice(&mut route_buf) {
            // covered by idx, the prefix itself excluded
            if route != idx && PFX_ROUTES_TBL[route as usize].test(idx) {
                idx_buf[idx_count] = route;
                idx_count += 1;
            }
        }
        idx_buf[..idx_count].sort_unstable_by(|a, b| cmp_index_rank(*a, *b));

        let mut octet_buf = [0_u8; 256];
        let mut covered = HOST_ROUTES_TBL[idx as usize];
        covered.in_place_intersection(self.children.bitset());
        let child_octets = covered.as_slice(&mut octet_buf);

        let mut child_cursor = 0;
        for &route in &idx_buf[..idx_count] {
            let (pfx_octet, _) = idx_to_pfx256(route);

            while child_cursor < child_octets.len()
                && child_octets[child_cursor] < pfx_octet
            {
                self.append_child(
                    child_octets[child_cursor],
                    path,
                    depth,
                    is4,
                    out,
                );
                child_cursor += 1;
            }

            out.push((
                cidr_from_path(path, depth, is4, route),
                self.prefixes.must_get(route),
            ));
        }

        for &octet in &child_octets[child_cursor..] {
            self.append_child(octet, path, depth, is4, out);
        }
    }
}
