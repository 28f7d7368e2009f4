use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use inetnum::addr::Prefix;

use crate::art::{idx_to_pfx256, net_mask, pfx_bits};

//------------ Stride paths -------------------------------------------------

// Addresses are consumed one octet per trie level. A stride path is the
// octet array of an address, padded to the v6 length so that all the path
// juggling below is family agnostic; the octet count tells where the
// address really ends.

pub(crate) type StridePath = [u8; 16];

// Trie depth never exceeds the v6 octet count.
pub(crate) const MAX_TREE_DEPTH: usize = 16;

pub(crate) fn addr_into_path(addr: IpAddr) -> (StridePath, usize, bool) {
    match addr {
        IpAddr::V4(addr) => {
            let mut path = [0; 16];
            path[..4].copy_from_slice(&addr.octets());
            (path, 4, true)
        }
        IpAddr::V6(addr) => (addr.octets(), 16, false),
    }
}

// The node depth a prefix terminates at and the number of prefix bits
// within that last stride.
//
// max_depth is bits >> 3, so a /0 terminates in the root (index 1), a /9
// at depth 1, and the octet aligned prefixes /8, /16, .. /128 get
// max_depth == depth + 1 with zero last bits: those never live in an
// internal prefix table, they are the fringes of the level above.
#[inline]
pub(crate) fn max_depth_and_last_bits(bits: u8) -> (usize, u8) {
    ((bits >> 3) as usize, bits & 7)
}

// Is a prefix with this bit count the fringe of a node at this depth?
#[inline]
pub(crate) fn is_fringe(depth: usize, bits: u8) -> bool {
    let (max_depth, last_bits) = max_depth_and_last_bits(bits);
    depth + 1 == max_depth && last_bits == 0
}

fn mask_path(path: &mut StridePath, bits: u8) {
    let full = (bits >> 3) as usize;
    if full < 16 {
        path[full] &= net_mask(bits & 7);
        for byte in &mut path[full + 1..] {
            *byte = 0;
        }
    }
}

fn prefix_from_parts(path: &StridePath, bits: u8, is4: bool) -> Prefix {
    let addr: IpAddr = if is4 {
        Ipv4Addr::new(path[0], path[1], path[2], path[3]).into()
    } else {
        Ipv6Addr::from(*path).into()
    };
    // the host bits are cleared and bits fits the family, so this
    // can't fail for any path we assemble ourselves
    Prefix::new(addr, bits)
        .unwrap_or_else(|err| panic!("can't convert to a prefix: {:?}", err))
}

// The prefix with its host bits cleared. Every prefix is normalized
// through this before it reaches the trie.
pub(crate) fn canonical(pfx: Prefix) -> Prefix {
    let (mut path, _, is4) = addr_into_path(pfx.addr());
    mask_path(&mut path, pfx.len());
    prefix_from_parts(&path, pfx.len(), is4)
}

// Rebuild the prefix for an internal table entry from the path leading to
// its node, the depth of that node and the base index within it.
pub(crate) fn cidr_from_path(
    mut path: StridePath,
    depth: usize,
    is4: bool,
    idx: u8,
) -> Prefix {
    let (octet, _) = idx_to_pfx256(idx);
    path[depth] = octet;
    let bits = pfx_bits(depth, idx);
    mask_path(&mut path, bits);
    prefix_from_parts(&path, bits, is4)
}

// The prefix a fringe in the child slot (depth, last_octet) stands for:
// the whole subtree below that slot.
pub(crate) fn cidr_for_fringe(
    mut path: StridePath,
    depth: usize,
    is4: bool,
    last_octet: u8,
) -> Prefix {
    path[depth] = last_octet;
    let bits = ((depth + 1) << 3) as u8;
    mask_path(&mut path, bits);
    prefix_from_parts(&path, bits, is4)
}

//------------ Containment --------------------------------------------------

// Byte-wise containment of an address (given as its stride path) in a
// prefix of the same family.
pub(crate) fn prefix_contains(pfx: &Prefix, path: &[u8]) -> bool {
    let (pfx_path, _, _) = addr_into_path(pfx.addr());
    let bits = pfx.len();
    let full = (bits >> 3) as usize;
    let rem = bits & 7;
    if pfx_path[..full] != path[..full] {
        return false;
    }
    rem == 0 || (pfx_path[full] ^ path[full]) & net_mask(rem) == 0
}

pub(crate) fn prefix_covers(a: &Prefix, b: &Prefix) -> bool {
    if a.len() > b.len() || a.is_v4() != b.is_v4() {
        return false;
    }
    let (path, count, _) = addr_into_path(b.addr());
    prefix_contains(a, &path[..count])
}

pub(crate) fn prefixes_overlap(a: &Prefix, b: &Prefix) -> bool {
    prefix_covers(a, b) || prefix_covers(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pfx(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    #[test]
    fn depth_and_last_bits() {
        assert_eq!(max_depth_and_last_bits(0), (0, 0));
        assert_eq!(max_depth_and_last_bits(7), (0, 7));
        assert_eq!(max_depth_and_last_bits(8), (1, 0));
        assert_eq!(max_depth_and_last_bits(17), (2, 1));
        assert_eq!(max_depth_and_last_bits(32), (4, 0));
        assert_eq!(max_depth_and_last_bits(128), (16, 0));
    }

    #[test]
    fn fringe_positions() {
        // a /0 is never a fringe
        assert!(!is_fringe(0, 0));
        assert!(is_fringe(0, 8));
        assert!(!is_fringe(0, 9));
        assert!(!is_fringe(0, 16));
        assert!(is_fringe(1, 16));
        assert!(is_fringe(3, 32));
        assert!(is_fringe(15, 128));
    }

    #[test]
    fn canonical_masks_host_bits() {
        let relaxed = Prefix::new_relaxed(
            std::net::Ipv4Addr::new(192, 168, 17, 212).into(),
            12,
        )
        .unwrap();
        assert_eq!(canonical(relaxed), pfx("192.160.0.0/12"));

        let relaxed = Prefix::new_relaxed(
            std::net::Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1).into(),
            32,
        )
        .unwrap();
        assert_eq!(canonical(relaxed), pfx("2001:db8::/32"));
    }

    #[test]
    fn prefix_reconstruction() {
        let (path, _, is4) = addr_into_path("10.1.2.3".parse().unwrap());
        // idx 1 at the root is the default route
        assert_eq!(cidr_from_path(path, 0, is4, 1), pfx("0.0.0.0/0"));
        // idx 41 spans the octets 72..=79 (72/5)
        assert_eq!(cidr_from_path(path, 1, is4, 41), pfx("10.72.0.0/13"));
        assert_eq!(cidr_for_fringe(path, 0, is4, 10), pfx("10.0.0.0/8"));
        assert_eq!(
            cidr_for_fringe(path, 3, is4, 42),
            pfx("10.1.2.42/32")
        );
    }

    #[test]
    fn containment() {
        let (path, count, _) = addr_into_path("10.1.255.255".parse().unwrap());
        assert!(prefix_contains(&pfx("10.0.0.0/8"), &path[..count]));
        assert!(prefix_contains(&pfx("10.1.254.0/23"), &path[..count]));
        assert!(!prefix_contains(&pfx("10.1.254.0/24"), &path[..count]));
        assert!(!prefix_contains(&pfx("11.0.0.0/8"), &path[..count]));

        assert!(prefix_covers(&pfx("10.0.0.0/8"), &pfx("10.1.0.0/16")));
        assert!(!prefix_covers(&pfx("10.1.0.0/16"), &pfx("10.0.0.0/8")));
        assert!(prefix_covers(&pfx("0.0.0.0/0"), &pfx("10.0.0.0/8")));
        assert!(!prefix_covers(&pfx("::/0"), &pfx("10.0.0.0/8")));

        assert!(prefixes_overlap(&pfx("10.0.0.0/8"), &pfx("10.1.0.0/16")));
        assert!(prefixes_overlap(&pfx("10.1.0.0/16"), &pfx("10.0.0.0/8")));
        assert!(!prefixes_overlap(&pfx("10.0.0.0/8"), &pfx("11.0.0.0/8")));
    }
}
