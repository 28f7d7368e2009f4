use std::mem;
use std::sync::Arc;

use super::{Child, Node};

//------------ Union --------------------------------------------------------

impl<V: Clone> Node<V> {
    // Merge other into self, with other's values winning on collision.
    // Returns the number of prefixes that existed on both sides, so the
    // table can keep its size exact.
    //
    // Sub-trees copied over from other are shared, not deep-copied: the
    // child Arc is cloned and any later write through self copies the
    // touched nodes first.
    pub(crate) fn union_rec(&mut self, other: &Self, depth: usize) -> usize {
        // prefix collisions in this stride, in one intersection
        let mut duplicates = self
            .prefixes
            .bitset()
            .intersection_cardinality(other.prefixes.bitset());

        for (idx, value) in other.prefixes.iter() {
            self.prefixes.insert_at(idx, value.clone());
        }

        for (octet, other_child) in other.children.iter() {
            let Some(self_child) = self.children.get_mut(octet) else {
                self.children.insert_at(octet, other_child.clone());
                continue;
            };

            duplicates += match (self_child, other_child) {
                // self holds a sub-node: push other's slot into it
                (Child::Node(node), Child::Node(other_node)) => {
                    Arc::make_mut(node).union_rec(other_node, depth + 1)
                }
                (Child::Node(node), Child::Leaf(leaf)) => {
                    usize::from(Arc::make_mut(node).insert_at_depth(
                        leaf.prefix,
                        leaf.value.clone(),
                        depth + 1,
                    ))
                }
                (Child::Node(node), Child::Fringe(fringe)) => {
                    // other's fringe is the subtree default of self's node
                    usize::from(
                        Arc::make_mut(node)
                            .prefixes
                            .insert_at(1, fringe.value.clone()),
                    )
                }

                // identical path compressions collapse to an overwrite
                (Child::Leaf(self_leaf), Child::Leaf(leaf))
                    if self_leaf.prefix == leaf.prefix =>
                {
                    self_leaf.value = leaf.value.clone();
                    1
                }
                (Child::Fringe(self_fringe), Child::Fringe(fringe)) => {
                    self_fringe.value = fringe.value.clone();
                    1
                }

                // self holds a diverging leaf or fringe: displace it into
                // a fresh interior node, then merge other's slot into that
                (self_child, other_child) => {
                    let mut interior = Node::new();
                    match mem::replace(
                        self_child,
                        Child::Node(Arc::new(Node::new())),
                    ) {
                        Child::Leaf(leaf) => {
                            interior.insert_at_depth(
                                leaf.prefix,
                                leaf.value,
                                depth + 1,
                            );
                        }
                        Child::Fringe(fringe) => {
                            interior.prefixes.insert_at(1, fringe.value);
                        }
                        Child::Node(_) => unreachable!(),
                    }
                    let duplicates = match other_child {
                        Child::Node(other_node) => {
                            interior.union_rec(other_node, depth + 1)
                        }
                        Child::Leaf(leaf) => {
                            usize::from(interior.insert_at_depth(
                                leaf.prefix,
                                leaf.value.clone(),
                                depth + 1,
                            ))
                        }
                        Child::Fringe(fringe) => {
                            usize::from(
                                interior
                                    .prefixes
                                    .insert_at(1, fringe.value.clone()),
                            )
                        }
                    };
                    *self_child = Child::Node(Arc::new(interior));
                    duplicates
                }
            };
        }

        duplicates
    }
}
