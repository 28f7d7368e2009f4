use std::str::FromStr;
use std::sync::Arc;

use inetnum::addr::Prefix;

use super::Table;
use crate::trie::Child;

fn pfx(s: &str) -> Prefix {
    Prefix::from_str(s).unwrap()
}

#[test]
fn octet_aligned_prefixes_are_fringes() {
    let mut table = Table::<u32>::new();

    table.insert(&pfx("10.0.0.0/8"), 1);
    assert!(matches!(
        table.root4.children.get(10),
        Some(Child::Fringe(_))
    ));

    // a /32 is path compressed as a leaf right at the root as long as
    // nothing else shares its path
    table.insert(&pfx("10.1.2.3/32"), 2);
    assert!(matches!(table.root4.children.get(10), Some(Child::Node(_))));

    // the fringe value moved into the sub-node as its default route
    assert_eq!(table.get(&pfx("10.0.0.0/8")), Some(&1));
    assert_eq!(table.get(&pfx("10.1.2.3/32")), Some(&2));
}

#[test]
fn single_prefix_is_a_leaf_not_a_subnode() {
    let mut table = Table::<u32>::new();

    // a lone /16 stays path compressed at the root; it only turns into
    // the fringe of a real depth-1 node once a sibling forces that node
    table.insert(&pfx("192.168.0.0/16"), 1);
    assert!(matches!(
        table.root4.children.get(192),
        Some(Child::Leaf(_))
    ));

    table.insert(&pfx("192.169.0.0/16"), 2);
    let Some(Child::Node(node)) = table.root4.children.get(192) else {
        panic!("expected a sub-node below 192");
    };
    assert!(matches!(node.children.get(168), Some(Child::Fringe(_))));
    assert!(matches!(node.children.get(169), Some(Child::Fringe(_))));

    assert_eq!(table.get(&pfx("192.168.0.0/16")), Some(&1));
    assert_eq!(table.get(&pfx("192.169.0.0/16")), Some(&2));
}

#[test]
fn second_leaf_displaces_the_first() {
    let mut table = Table::<u32>::new();

    table.insert(&pfx("192.168.1.0/24"), 1);
    assert!(matches!(
        table.root4.children.get(192),
        Some(Child::Leaf(_))
    ));

    table.insert(&pfx("192.168.2.0/24"), 2);
    let Some(Child::Node(node)) = table.root4.children.get(192) else {
        panic!("expected a sub-node below 192");
    };
    // both /24s are fringes two levels down
    let Some(Child::Node(node)) = node.children.get(168) else {
        panic!("expected a sub-node below 192.168");
    };
    assert!(matches!(node.children.get(1), Some(Child::Fringe(_))));
    assert!(matches!(node.children.get(2), Some(Child::Fringe(_))));
}

#[test]
fn remove_restores_the_previous_shape() {
    let mut table = Table::<u32>::new();
    table.insert(&pfx("10.0.0.0/8"), 1);
    table.insert(&pfx("192.168.1.0/24"), 2);
    table.insert(&pfx("2001:db8::/32"), 3);

    let snapshot = table.clone();

    // a displacing insert followed by its removal compresses back
    table.insert(&pfx("192.168.2.0/24"), 4);
    assert_eq!(table.remove(&pfx("192.168.2.0/24")), Some(4));
    assert_eq!(table, snapshot);

    // same for an insert on a fresh path
    table.insert(&pfx("2001:db8:1::/48"), 5);
    assert_eq!(table.remove(&pfx("2001:db8:1::/48")), Some(5));
    assert_eq!(table, snapshot);

    // idempotent insert leaves the tree alone as well
    assert!(table.insert(&pfx("10.0.0.0/8"), 1));
    assert_eq!(table, snapshot);
}

#[test]
fn persist_shares_untouched_subtrees() {
    let mut table = Table::<u32>::new();
    table.insert(&pfx("10.1.0.0/16"), 1);
    table.insert(&pfx("10.2.0.0/16"), 2);
    table.insert(&pfx("172.16.0.0/12"), 3);
    table.insert(&pfx("172.16.1.0/24"), 4);

    let (persisted, exists) = table.insert_persist(&pfx("10.3.1.0/24"), 5);
    assert!(!exists);

    // the untouched branch below 172 is the very same allocation
    let Some(Child::Node(before)) = table.root4.children.get(172) else {
        panic!("expected a sub-node below 172");
    };
    let Some(Child::Node(after)) = persisted.root4.children.get(172) else {
        panic!("expected a sub-node below 172");
    };
    assert!(Arc::ptr_eq(before, after));

    // the branch below 10 was copied on write
    let Some(Child::Node(before)) = table.root4.children.get(10) else {
        panic!("expected a sub-node below 10");
    };
    let Some(Child::Node(after)) = persisted.root4.children.get(10) else {
        panic!("expected a sub-node below 10");
    };
    assert!(!Arc::ptr_eq(before, after));

    // and the receiver is untouched
    assert_eq!(table.len(), 4);
    assert_eq!(persisted.len(), 5);
    assert_eq!(table.get(&pfx("10.3.1.0/24")), None);
    assert_eq!(persisted.get(&pfx("10.3.1.0/24")), Some(&5));
}
