//! Next-free-address allocation.
//!
//! Picks the numerically smallest free host address in a subnet, given the
//! addresses and sub-ranges already claimed by other peers. The scan is pure:
//! identical inputs always yield the same address.

use super::cidr::{addr_to_u128, net_edges, u128_to_addr};
use ipnet::IpNet;
use std::collections::HashSet;
use std::net::IpAddr;

/// Errors raised by the allocator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("no address available in {subnet}")]
    NoAddressAvailable { subnet: IpNet },
}

/// First and last allocatable address of `subnet`, as integers.
///
/// The network address itself is never handed out, and neither is the IPv4
/// broadcast address once the subnet is large enough to have one (/30 or
/// wider). Returns `None` for subnets with no allocatable address at all.
pub fn usable_range(subnet: &IpNet) -> Option<(u128, u128)> {
    let (base, broadcast) = net_edges(subnet);
    let first = base.checked_add(1)?;
    let last = match subnet {
        IpNet::V4(v4) if v4.prefix_len() <= 30 => broadcast - 1,
        _ => broadcast,
    };
    (first <= last).then_some((first, last))
}

/// Pick the next free address in `subnet`.
///
/// Addresses in `taken_addresses` are skipped one at a time; a candidate that
/// falls inside one of `taken_subnets` moves the cursor past the end of that
/// subnet in a single step. Entries of the other address family are ignored.
pub fn pick_next_address(
    subnet: &IpNet,
    taken_addresses: &[IpAddr],
    taken_subnets: &[IpNet],
) -> Result<IpAddr, AllocationError> {
    let exhausted = || AllocationError::NoAddressAvailable { subnet: *subnet };
    let family = subnet.addr();

    let taken: HashSet<u128> = taken_addresses
        .iter()
        .filter(|addr| addr.is_ipv4() == family.is_ipv4())
        .map(|addr| addr_to_u128(*addr))
        .collect();
    let blocks: Vec<(u128, u128)> = taken_subnets
        .iter()
        .filter(|net| net.addr().is_ipv4() == family.is_ipv4())
        .map(net_edges)
        .collect();

    let (mut cursor, last) = usable_range(subnet).ok_or_else(exhausted)?;
    while cursor <= last {
        if taken.contains(&cursor) {
            cursor = cursor.checked_add(1).ok_or_else(exhausted)?;
            continue;
        }

        if let Some(&(_, block_last)) = blocks
            .iter()
            .find(|(lo, hi)| (*lo..=*hi).contains(&cursor))
        {
            cursor = block_last.checked_add(1).ok_or_else(exhausted)?;
            continue;
        }

        let addr = u128_to_addr(cursor, family).ok_or_else(exhausted)?;
        log::debug!("Picked address {} in {}", addr, subnet);
        return Ok(addr);
    }

    Err(exhausted())
}
