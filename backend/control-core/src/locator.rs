//! Best-effort lookup of the address other devices on the LAN can reach us at.
//!
//! Only ever used to build the URL shown to the operator. The listener itself
//! binds every interface regardless of what this returns.

use crate::LOOPBACK_ADDRESS;

use std::net::{IpAddr, Ipv4Addr};

use log::{debug, trace};

/// Return the first non-loopback IPv4 address of this host, dotted decimal.
///
/// Falls back to `127.0.0.1` when no such address exists or the interface
/// query fails. Never errors.
pub fn get_local_address() -> String {
    let addresses = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .inspect(|iface| trace!("Interface {} has address {}", iface.name, iface.ip()))
            .map(|iface| iface.ip())
            .collect::<Vec<_>>(),
        Err(e) => {
            debug!("Interface enumeration failed, using loopback: {e}");
            Vec::new()
        }
    };

    match first_lan_ipv4(addresses) {
        Some(ip) => ip.to_string(),
        None => {
            debug!("No non-loopback IPv4 address found, using {LOOPBACK_ADDRESS}");
            LOOPBACK_ADDRESS.to_string()
        }
    }
}

/// Pick the first IPv4 address that is not loopback, in enumeration order.
pub(crate) fn first_lan_ipv4<I>(addresses: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addresses.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        _ => None,
    })
}
