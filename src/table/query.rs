use std::net::IpAddr;

use inetnum::addr::Prefix;

use super::Table;
use crate::art::{octet_to_idx, pfx_to_idx256, PFX_ROUTES_TBL};
use crate::stride::{
    addr_into_path, canonical, cidr_for_fringe, cidr_from_path,
    max_depth_and_last_bits, prefix_contains, prefix_covers, MAX_TREE_DEPTH,
};
use crate::trie::{Child, Node};

//------------ Queries ------------------------------------------------------

impl<V> Table<V> {
    /// Is the address covered by any prefix in the table?
    ///
    /// Cheaper than [`lookup`](Self::lookup): any covering route
    /// encountered on the way down ends the search, no backtracking and
    /// no prefix reconstruction.
    pub fn contains(&self, addr: IpAddr) -> bool {
        let (path, count, is4) = addr_into_path(addr);
        let mut node = self.root(is4);

        for depth in 0..count {
            let octet = path[depth];

            if !node.prefixes.is_empty() && node.lpm_test(octet_to_idx(octet))
            {
                return true;
            }

            match node.children.get(octet) {
                None => return false,
                Some(Child::Node(kid)) => node = kid,
                Some(Child::Leaf(leaf)) => {
                    return prefix_contains(&leaf.prefix, &path[..count])
                }
                Some(Child::Fringe(_)) => return true,
            }
        }
        false
    }

    /// Longest-prefix match for an address: the most specific covering
    /// prefix and its value.
    pub fn lookup(&self, addr: IpAddr) -> Option<(Prefix, &V)> {
        let (path, count, is4) = addr_into_path(addr);
        let mut node = self.root(is4);

        // the path of visited nodes, for backtracking
        let mut stack: [Option<&Node<V>>; MAX_TREE_DEPTH] =
            [None; MAX_TREE_DEPTH];

        let mut depth = 0;
        'descend: while depth < count {
            stack[depth] = Some(node);
            let octet = path[depth];

            match node.children.get(octet) {
                None => break 'descend,
                Some(Child::Node(kid)) => {
                    node = kid;
                    depth += 1;
                }
                Some(Child::Leaf(leaf)) => {
                    // a compressed path below: hit or miss right here
                    if prefix_contains(&leaf.prefix, &path[..count]) {
                        return Some((leaf.prefix, &leaf.value));
                    }
                    break 'descend;
                }
                Some(Child::Fringe(fringe)) => {
                    // the fringe is the default route of everything below
                    return Some((
                        cidr_for_fringe(path, depth, is4, octet),
                        &fringe.value,
                    ));
                }
            }
        }

        // unwind: node-local LPM at every visited level
        for depth in (0..=depth.min(count - 1)).rev() {
            let Some(node) = stack[depth] else { continue };
            if node.prefixes.is_empty() {
                continue;
            }
            if let Some((top, value)) = node.lpm_get(octet_to_idx(path[depth]))
            {
                return Some((cidr_from_path(path, depth, is4, top), value));
            }
        }
        None
    }

    /// Longest-prefix match for a prefix: the most specific prefix in the
    /// table that covers (or equals) the query, and its value.
    pub fn lookup_prefix_lpm(&self, pfx: &Prefix) -> Option<(Prefix, &V)> {
        let pfx = canonical(*pfx);
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, count, is4) = addr_into_path(pfx.addr());
        let mut node = self.root(is4);

        let mut stack: [Option<&Node<V>>; MAX_TREE_DEPTH] =
            [None; MAX_TREE_DEPTH];

        let mut depth = 0;
        'descend: while depth < count {
            stack[depth] = Some(node);

            // the last stride of the query gets its restricted node-local
            // search in the unwind below
            if depth == max_depth {
                break 'descend;
            }
            let octet = path[depth];

            match node.children.get(octet) {
                None => break 'descend,
                Some(Child::Node(kid)) => {
                    node = kid;
                    depth += 1;
                }
                Some(Child::Leaf(leaf)) => {
                    if prefix_covers(&leaf.prefix, &pfx) {
                        return Some((leaf.prefix, &leaf.value));
                    }
                    break 'descend;
                }
                Some(Child::Fringe(fringe)) => {
                    if ((depth + 1) << 3) as u8 <= bits {
                        return Some((
                            cidr_for_fringe(path, depth, is4, octet),
                            &fringe.value,
                        ));
                    }
                    break 'descend;
                }
            }
        }

        for depth in (0..=depth.min(count - 1)).rev() {
            let Some(node) = stack[depth] else { continue };
            if node.prefixes.is_empty() {
                continue;
            }
            // only the last stride limits the search to the query's own
            // index, above it all host routes on the path count
            let idx = if depth == max_depth {
                pfx_to_idx256(path[depth], last_bits)
            } else {
                octet_to_idx(path[depth])
            };
            if let Some((top, value)) = node.lpm_get(idx) {
                return Some((cidr_from_path(path, depth, is4, top), value));
            }
        }
        None
    }

    /// Like [`lookup_prefix_lpm`](Self::lookup_prefix_lpm), without
    /// reporting which prefix matched.
    pub fn lookup_prefix(&self, pfx: &Prefix) -> Option<&V> {
        self.lookup_prefix_lpm(pfx).map(|(_, value)| value)
    }

    /// All prefixes in the table strictly covering `pfx`, longest first.
    pub fn supernets<'a>(
        &'a self,
        pfx: &Prefix,
    ) -> impl Iterator<Item = (Prefix, &'a V)> + 'a {
        let pfx = canonical(*pfx);
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, count, is4) = addr_into_path(pfx.addr());
        let mut node = self.root(is4);

        let mut stack: [Option<&Node<V>>; MAX_TREE_DEPTH] =
            [None; MAX_TREE_DEPTH];
        let mut out: Vec<(Prefix, &V)> = vec![];

        let mut depth = 0;
        'descend: while depth < count {
            stack[depth] = Some(node);
            if depth == max_depth {
                break 'descend;
            }
            let octet = path[depth];

            match node.children.get(octet) {
                None => break 'descend,
                Some(Child::Node(kid)) => {
                    node = kid;
                    depth += 1;
                }
                Some(Child::Leaf(leaf)) => {
                    if prefix_covers(&leaf.prefix, &pfx) && leaf.prefix != pfx
                    {
                        out.push((leaf.prefix, &leaf.value));
                    }
                    break 'descend;
                }
                Some(Child::Fringe(fringe)) => {
                    if (((depth + 1) << 3) as u8) < bits {
                        out.push((
                            cidr_for_fringe(path, depth, is4, octet),
                            &fringe.value,
                        ));
                    }
                    break 'descend;
                }
            }
        }

        for depth in (0..=depth.min(count - 1)).rev() {
            let Some(node) = stack[depth] else { continue };
            if node.prefixes.is_empty() {
                continue;
            }
            let idx = if depth == max_depth {
                pfx_to_idx256(path[depth], last_bits)
            } else {
                octet_to_idx(path[depth])
            };
            // every set bit on the backtracking chain is a covering
            // prefix; walk them from longest to shortest
            let mut chain = node
                .prefixes
                .bitset()
                .intersection(&PFX_ROUTES_TBL[idx as usize]);
            if depth == max_depth {
                // strictly covering: the query itself does not count
                chain.clear(idx);
            }
            while let Some(top) = chain.last_set() {
                out.push((
                    cidr_from_path(path, depth, is4, top),
                    node.prefixes.must_get(top),
                ));
                chain.clear(top);
            }
        }
        out.into_iter()
    }

    /// All prefixes in the table strictly covered by `pfx`, in natural
    /// CIDR sort order.
    pub fn subnets<'a>(
        &'a self,
        pfx: &Prefix,
    ) -> impl Iterator<Item = (Prefix, &'a V)> + 'a {
        let pfx = canonical(*pfx);
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, count, is4) = addr_into_path(pfx.addr());
        let mut node = self.root(is4);

        let mut out: Vec<(Prefix, &V)> = vec![];

        let mut depth = 0;
        while depth < count {
            if depth == max_depth {
                node.each_subnet(
                    path,
                    depth,
                    is4,
                    pfx_to_idx256(path[depth], last_bits),
                    &mut out,
                );
                break;
            }
            let octet = path[depth];

            match node.children.get(octet) {
                None => break,
                Some(Child::Node(kid)) => {
                    node = kid;
                    depth += 1;
                }
                Some(Child::Leaf(leaf)) => {
                    if prefix_covers(&pfx, &leaf.prefix) && leaf.prefix != pfx
                    {
                        out.push((leaf.prefix, &leaf.value));
                    }
                    break;
                }
                Some(Child::Fringe(fringe)) => {
                    let fringe_pfx = cidr_for_fringe(path, depth, is4, octet);
                    if prefix_covers(&pfx, &fringe_pfx) && fringe_pfx != pfx {
                        out.push((fringe_pfx, &fringe.value));
                    }
                    break;
                }
            }
        }
        out.into_iter()
    }

    /// Does any prefix in the table overlap `pfx`?
    pub fn overlaps_prefix(&self, pfx: &Prefix) -> bool {
        let pfx = canonical(*pfx);
        self.root(pfx.is_v4()).overlaps_prefix_at_depth(&pfx, 0)
    }

    /// Do the two tables share any overlapping prefixes?
    pub fn overlaps(&self, other: &Self) -> bool {
        self.root4.overlaps(&other.root4, 0)
            || self.root6.overlaps(&other.root6, 0)
    }
}
