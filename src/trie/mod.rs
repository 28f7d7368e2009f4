use std::mem;
use std::sync::Arc;

use inetnum::addr::Prefix;
use log::trace;

use crate::art::pfx_to_idx256;
use crate::sparse_array::Array256;
use crate::stride::{
    addr_into_path, cidr_for_fringe, cidr_from_path, is_fringe,
    max_depth_and_last_bits, StridePath,
};

pub(crate) mod iterators;
pub(crate) mod lpm;
pub(crate) mod overlaps;
pub(crate) mod union;

//------------ Node ---------------------------------------------------------

// One 8-bit stride of the trie. The internal prefix table holds the
// prefixes ending within this stride (indexed by their base index, slot 0
// unused), the child table holds one slot per octet.
//
// The derived Clone is flat: it copies the two compressed arrays but keeps
// pointing at the same sub-nodes. That is exactly the copy-on-write step
// of the persistent operations, see Arc::make_mut below.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node<V> {
    pub(crate) prefixes: Array256<V>,
    pub(crate) children: Array256<Child<V>>,
}

// A child slot is either a real sub-node one level down, or a path
// compressed remainder. A Leaf carries a prefix that extends beyond the
// fringe of this slot, with no siblings below. A Fringe is an octet
// aligned prefix that would be index 1, the subtree default, of the next
// level; the dedicated variant saves allocating a node for that single
// entry. The empty case is absence in the child bitset, not a variant.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Child<V> {
    Node(Arc<Node<V>>),
    Leaf(LeafNode<V>),
    Fringe(FringeNode<V>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LeafNode<V> {
    pub(crate) prefix: Prefix,
    pub(crate) value: V,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FringeNode<V> {
    pub(crate) value: V,
}

impl<V> Node<V> {
    pub(crate) fn new() -> Self {
        Node {
            prefixes: Array256::new(),
            children: Array256::new(),
        }
    }

    // Exact-match descent, no allocations.
    pub(crate) fn get_at_depth(&self, pfx: &Prefix, depth: usize) -> Option<&V> {
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, _, _) = addr_into_path(pfx.addr());

        let mut node = self;
        let mut depth = depth;
        loop {
            if depth == max_depth {
                return node.prefixes.get(pfx_to_idx256(path[depth], last_bits));
            }
            match node.children.get(path[depth])? {
                Child::Node(kid) => {
                    node = kid;
                    depth += 1;
                }
                Child::Leaf(leaf) => {
                    return (leaf.prefix == *pfx).then_some(&leaf.value)
                }
                Child::Fringe(fringe) => {
                    return is_fringe(depth, bits).then_some(&fringe.value)
                }
            }
        }
    }
}

impl<V: Clone> Node<V> {
    // Insert pfx/value somewhere below this node. Returns whether the
    // exact prefix was present before (its value has been replaced then).
    pub(crate) fn insert_at_depth(
        &mut self,
        pfx: Prefix,
        value: V,
        depth: usize,
    ) -> bool {
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, _, _) = addr_into_path(pfx.addr());

        // the prefix ends in this node's internal table
        if depth == max_depth {
            return self
                .prefixes
                .insert_at(pfx_to_idx256(path[depth], last_bits), value);
        }

        let octet = path[depth];

        // reached the end of the trie path: compress
        if !self.children.contains(octet) {
            return if is_fringe(depth, bits) {
                self.children
                    .insert_at(octet, Child::Fringe(FringeNode { value }))
            } else {
                self.children
                    .insert_at(octet, Child::Leaf(LeafNode { prefix: pfx, value }))
            };
        }

        match self.children.must_get_mut(octet) {
            Child::Node(node) => {
                return Arc::make_mut(node).insert_at_depth(pfx, value, depth + 1)
            }
            Child::Leaf(leaf) if leaf.prefix == pfx => {
                leaf.value = value;
                return true;
            }
            Child::Fringe(fringe) if is_fringe(depth, bits) => {
                fringe.value = value;
                return true;
            }
            child => {
                // a diverging leaf or fringe sits in the slot: displace it
                // one level down into a fresh interior node
                trace!("displace compressed child at depth {}", depth);
                let mut interior = Node::new();
                match mem::replace(child, Child::Node(Arc::new(Node::new()))) {
                    Child::Leaf(leaf) => {
                        interior.insert_at_depth(leaf.prefix, leaf.value, depth + 1);
                    }
                    Child::Fringe(fringe) => {
                        // the fringe becomes the subtree default one level down
                        interior.prefixes.insert_at(1, fringe.value);
                    }
                    Child::Node(_) => unreachable!(),
                }
                let exists = interior.insert_at_depth(pfx, value, depth + 1);
                *child = Child::Node(Arc::new(interior));
                exists
            }
        }
    }

    // Remove pfx below this node, returning its value. Re-compresses the
    // touched path while the recursion unwinds.
    pub(crate) fn remove_at_depth(
        &mut self,
        pfx: &Prefix,
        path: &StridePath,
        depth: usize,
    ) -> Option<V> {
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);

        if depth == max_depth {
            return self
                .prefixes
                .delete_at(pfx_to_idx256(path[depth], last_bits));
        }

        let octet = path[depth];
        match self.children.get(octet)? {
            Child::Leaf(leaf) if leaf.prefix != *pfx => None,
            Child::Fringe(_) if !is_fringe(depth, bits) => None,
            Child::Node(_) => {
                let value = {
                    let Some(Child::Node(node)) = self.children.get_mut(octet)
                    else {
                        unreachable!()
                    };
                    Arc::make_mut(node).remove_at_depth(pfx, path, depth + 1)?
                };
                self.purge_and_compress(octet, path, depth, pfx.is_v4());
                Some(value)
            }
            _ => match self.children.delete_at(octet) {
                Some(Child::Leaf(leaf)) => Some(leaf.value),
                Some(Child::Fringe(fringe)) => Some(fringe.value),
                _ => unreachable!(),
            },
        }
    }

    // After a removal below children[octet]: drop the sub-node if it went
    // empty, or fold a single remaining entry back into this node's child
    // slot as a leaf or fringe.
    fn purge_and_compress(
        &mut self,
        octet: u8,
        path: &StridePath,
        depth: usize,
        is4: bool,
    ) {
        let (pfx_count, child_count) = match self.children.get(octet) {
            Some(Child::Node(node)) => {
                (node.prefixes.len(), node.children.len())
            }
            _ => return,
        };

        match (pfx_count, child_count) {
            (0, 0) => {
                trace!("prune empty node at depth {}", depth + 1);
                self.children.delete_at(octet);
            }
            (1, 0) => {
                // the last prefix of the sub-node comes back up as a leaf
                // or fringe
                let Some(Child::Node(node)) = self.children.delete_at(octet)
                else {
                    unreachable!()
                };
                let mut node = Arc::unwrap_or_clone(node);
                let Some(idx) = node.prefixes.bitset().first_set() else {
                    unreachable!()
                };
                let Some(value) = node.prefixes.delete_at(idx) else {
                    unreachable!()
                };
                let mut path = *path;
                path[depth] = octet;
                let pfx = cidr_from_path(path, depth + 1, is4, idx);
                trace!("compress {} back to depth {}", pfx, depth);
                self.insert_at_depth(pfx, value, depth);
            }
            (0, 1) => {
                // a single compressed child below can be hoisted one level
                // up; a sub-node below stays where it is
                let kid_octet = match self.children.get(octet) {
                    Some(Child::Node(node)) => {
                        let Some(kid_octet) = node.children.bitset().first_set()
                        else {
                            unreachable!()
                        };
                        match node.children.must_get(kid_octet) {
                            Child::Node(_) => return,
                            _ => kid_octet,
                        }
                    }
                    _ => return,
                };
                let Some(Child::Node(node)) = self.children.delete_at(octet)
                else {
                    unreachable!()
                };
                let mut node = Arc::unwrap_or_clone(node);
                match node.children.delete_at(kid_octet) {
                    Some(Child::Leaf(leaf)) => {
                        trace!("hoist leaf {} to depth {}", leaf.prefix, depth);
                        self.insert_at_depth(leaf.prefix, leaf.value, depth);
                    }
                    Some(Child::Fringe(fringe)) => {
                        let mut path = *path;
                        path[depth] = octet;
                        let pfx =
                            cidr_for_fringe(path, depth + 1, is4, kid_octet);
                        trace!("hoist fringe {} to depth {}", pfx, depth);
                        self.insert_at_depth(pfx, fringe.value, depth);
                    }
                    _ => unreachable!(),
                }
            }
            _ => {}
        }
    }

    // Single-pass update/insert for pfx below this node. The callback sees
    // the present value, if any; its result replaces it. Returns the new
    // value and whether the prefix was present before.
    pub(crate) fn update_at_depth<F>(
        &mut self,
        pfx: Prefix,
        f: F,
        depth: usize,
    ) -> (&V, bool)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let bits = pfx.len();
        let (max_depth, last_bits) = max_depth_and_last_bits(bits);
        let (path, _, _) = addr_into_path(pfx.addr());

        if depth == max_depth {
            let idx = pfx_to_idx256(path[depth], last_bits);
            let (value, was_present) =
                self.prefixes.modify_at(idx, |prev| Some(f(prev.as_ref())));
            let Some(value) = value else { unreachable!() };
            return (value, was_present);
        }

        let octet = path[depth];

        if !self.children.contains(octet) {
            let value = f(None);
            if is_fringe(depth, bits) {
                self.children
                    .insert_at(octet, Child::Fringe(FringeNode { value }));
                let Some(Child::Fringe(fringe)) = self.children.get(octet)
                else {
                    unreachable!()
                };
                return (&fringe.value, false);
            }
            self.children
                .insert_at(octet, Child::Leaf(LeafNode { prefix: pfx, value }));
            let Some(Child::Leaf(leaf)) = self.children.get(octet) else {
                unreachable!()
            };
            return (&leaf.value, false);
        }

        enum Action {
            Node,
            LeafMatch,
            FringeMatch,
            Promote,
        }

        let action = match self.children.get(octet) {
            Some(Child::Node(_)) => Action::Node,
            Some(Child::Leaf(leaf)) if leaf.prefix == pfx => Action::LeafMatch,
            Some(Child::Fringe(_)) if is_fringe(depth, bits) => Action::FringeMatch,
            _ => Action::Promote,
        };

        match action {
            Action::Node => {
                let Child::Node(node) = self.children.must_get_mut(octet) else {
                    unreachable!()
                };
                Arc::make_mut(node).update_at_depth(pfx, f, depth + 1)
            }
            Action::LeafMatch => {
                let Child::Leaf(leaf) = self.children.must_get_mut(octet) else {
                    unreachable!()
                };
                leaf.value = f(Some(&leaf.value));
                (&leaf.value, true)
            }
            Action::FringeMatch => {
                let Child::Fringe(fringe) = self.children.must_get_mut(octet) else {
                    unreachable!()
                };
                fringe.value = f(Some(&fringe.value));
                (&fringe.value, true)
            }
            Action::Promote => {
                let child = self.children.must_get_mut(octet);
                let mut interior = Node::new();
                match mem::replace(child, Child::Node(Arc::new(Node::new()))) {
                    Child::Leaf(leaf) => {
                        interior.insert_at_depth(leaf.prefix, leaf.value, depth + 1);
                    }
                    Child::Fringe(fringe) => {
                        interior.prefixes.insert_at(1, fringe.value);
                    }
                    Child::Node(_) => unreachable!(),
                }
                *child = Child::Node(Arc::new(interior));
                let Child::Node(node) = child else { unreachable!() };
                Arc::make_mut(node).update_at_depth(pfx, f, depth + 1)
            }
        }
    }
}
