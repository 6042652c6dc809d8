use crate::LOOPBACK_ADDRESS;
use crate::locator::{first_lan_ipv4, get_local_address};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// **VALUE**: Verifies a loopback-only host falls back to `127.0.0.1`.
///
/// **WHY THIS MATTERS**: On a machine with no network the status must still
/// show a usable URL instead of an empty host.
///
/// **BUG THIS CATCHES**: Would catch the loopback filter being dropped, or the
/// fallback being removed.
#[test]
fn given_only_loopback_addresses_when_picking_then_returns_none() {
    // GIVEN: Only loopback interfaces, v4 and v6
    let addresses = vec![
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(Ipv6Addr::LOCALHOST),
    ];

    // WHEN: Picking a LAN address
    let picked = first_lan_ipv4(addresses);

    // THEN: Nothing qualifies, so the caller falls back to loopback
    assert_eq!(picked, None);
}

/// **VALUE**: Verifies IPv6 addresses are skipped and order is preserved.
///
/// **WHY THIS MATTERS**: The URL shown to the operator is typed into a phone;
/// it has to be the first usable IPv4 address.
///
/// **BUG THIS CATCHES**: Would catch returning an IPv6 address or the last
/// match instead of the first.
#[test]
fn given_mixed_addresses_when_picking_then_returns_first_lan_ipv4() {
    // GIVEN: Loopback, an IPv6 address, then two LAN IPv4 addresses
    let addresses = vec![
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6("fe80::1".parse().unwrap()),
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
    ];

    // WHEN/THEN: The first non-loopback IPv4 wins
    assert_eq!(
        first_lan_ipv4(addresses),
        Some(Ipv4Addr::new(192, 168, 1, 20))
    );
}

/// **VALUE**: Verifies the real lookup always yields a parseable IPv4 address.
///
/// **WHY THIS MATTERS**: The lookup runs on every successful bind; it must
/// never panic or return garbage, whatever interfaces this host has.
///
/// **BUG THIS CATCHES**: Would catch returning an empty string or an IPv6
/// literal.
#[test]
fn given_this_host_when_getting_local_address_then_returns_ipv4() {
    let address = get_local_address();

    let parsed: Ipv4Addr = address
        .parse()
        .unwrap_or_else(|_| panic!("not an IPv4 address: {address}"));
    assert!(
        !parsed.is_loopback() || address == LOOPBACK_ADDRESS,
        "loopback results must be exactly {LOOPBACK_ADDRESS}"
    );
}
