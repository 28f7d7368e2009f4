use std::error::Error;
use std::str::FromStr;

use bart_store::{Prefix, Table};

fn pfx(s: &str) -> Prefix {
    Prefix::from_str(s).unwrap()
}

#[test]
fn supernets_longest_first() -> Result<(), Box<dyn Error>> {
    let mut table = Table::<u32>::new();
    for (i, p) in [
        "0.0.0.0/0",
        "10.0.0.0/8",
        "10.0.0.0/9",
        "10.0.0.0/16",
        "10.0.0.0/20",
        "10.0.0.0/24",
        "10.0.1.0/24",
        "11.0.0.0/8",
    ]
    .iter()
    .enumerate()
    {
        table.insert(&pfx(p), i as u32);
    }

    let found: Vec<Prefix> =
        table.supernets(&pfx("10.0.0.0/24")).map(|(p, _)| p).collect();
    assert_eq!(
        found,
        vec![
            pfx("10.0.0.0/20"),
            pfx("10.0.0.0/16"),
            pfx("10.0.0.0/9"),
            pfx("10.0.0.0/8"),
            pfx("0.0.0.0/0"),
        ]
    );

    // a sibling has no supernets among the more specific entries
    let found: Vec<Prefix> =
        table.supernets(&pfx("11.1.0.0/16")).map(|(p, _)| p).collect();
    assert_eq!(found, vec![pfx("11.0.0.0/8"), pfx("0.0.0.0/0")]);

    // the query itself is never part of the result
    let found: Vec<Prefix> =
        table.supernets(&pfx("0.0.0.0/0")).map(|(p, _)| p).collect();
    assert!(found.is_empty());
    Ok(())
}

#[test]
fn supernets_values_follow_prefixes() -> Result<(), Box<dyn Error>> {
    let mut table = Table::<&str>::new();
    table.insert(&pfx("10.0.0.0/8"), "eight");
    table.insert(&pfx("10.1.0.0/16"), "sixteen");

    let found: Vec<(Prefix, &str)> = table
        .supernets(&pfx("10.1.2.0/24"))
        .map(|(p, v)| (p, *v))
        .collect();
    assert_eq!(
        found,
        vec![(pfx("10.1.0.0/16"), "sixteen"), (pfx("10.0.0.0/8"), "eight")]
    );

    // compressed leaves covering the query count as well
    let mut table = Table::<&str>::new();
    table.insert(&pfx("10.1.0.0/16"), "leaf");
    let found: Vec<(Prefix, &str)> = table
        .supernets(&pfx("10.1.2.0/24"))
        .map(|(p, v)| (p, *v))
        .collect();
    assert_eq!(found, vec![(pfx("10.1.0.0/16"), "leaf")]);
    Ok(())
}

#[test]
fn supernets_v6() -> Result<(), Box<dyn Error>> {
    let mut table = Table::<u32>::new();
    table.insert(&pfx("::/0"), 0);
    table.insert(&pfx("2001:db8::/32"), 1);
    table.insert(&pfx("2001:db8::/48"), 2);

    let found: Vec<Prefix> = table
        .supernets(&pfx("2001:db8::1/128"))
        .map(|(p, _)| p)
        .collect();
    assert_eq!(
        found,
        vec![pfx("2001:db8::/48"), pfx("2001:db8::/32"), pfx("::/0")]
    );
    Ok(())
}
