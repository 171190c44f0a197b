//! CIDR parsing and address arithmetic helpers.
//!
//! Every address is handled through `ipnet::IpNet`; a bare address is read as
//! a host route (`/32` for IPv4, `/128` for IPv6).

use ipnet::IpNet;
use std::net::IpAddr;

/// Errors raised while parsing an address or CIDR string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrError {
    #[error("address is empty")]
    Empty,

    #[error("address contains multiple entries: {0}")]
    MultipleEntries(String),

    #[error("invalid address or CIDR: {0}")]
    Invalid(String),

    #[error("network has no prefix length: {0}")]
    MissingPrefix(String),
}

/// Parse a CIDR, or a bare address as a host route.
///
/// The returned network keeps the address as written, so `10.20.30.1/24`
/// yields `addr() == 10.20.30.1` and `network() == 10.20.30.0`.
pub fn parse_cidr(raw: &str) -> Result<IpNet, CidrError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CidrError::Empty);
    }
    if raw.contains(',') {
        return Err(CidrError::MultipleEntries(raw.to_string()));
    }
    if raw.contains('/') {
        return raw
            .parse::<IpNet>()
            .map_err(|_| CidrError::Invalid(raw.to_string()));
    }
    let addr = raw
        .parse::<IpAddr>()
        .map_err(|_| CidrError::Invalid(raw.to_string()))?;
    IpNet::new(addr, host_prefix_len(addr)).map_err(|_| CidrError::Invalid(raw.to_string()))
}

/// Parse a subnet, which must carry an explicit `/prefix`.
///
/// Unlike [`parse_cidr`], a bare address is rejected rather than widened to a
/// host route.
pub fn parse_subnet(raw: &str) -> Result<IpNet, CidrError> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && !trimmed.contains('/') {
        return Err(CidrError::MissingPrefix(trimmed.to_string()));
    }
    parse_cidr(trimmed)
}

/// Prefix length of a single-host route for the family of `addr`
pub fn host_prefix_len(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Numeric value of an address, widened to 128 bits
pub fn addr_to_u128(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Inverse of [`addr_to_u128`] for the family of `like`.
///
/// Returns `None` if `value` does not fit that family.
pub fn u128_to_addr(value: u128, like: IpAddr) -> Option<IpAddr> {
    match like {
        IpAddr::V4(_) => u32::try_from(value)
            .ok()
            .map(|v| IpAddr::V4(v.into())),
        IpAddr::V6(_) => Some(IpAddr::V6(value.into())),
    }
}

/// First and last address of a network, as integers
pub fn net_edges(net: &IpNet) -> (u128, u128) {
    (addr_to_u128(net.network()), addr_to_u128(net.broadcast()))
}

/// True if the two networks share at least one address
pub fn nets_overlap(a: &IpNet, b: &IpNet) -> bool {
    if a.addr().is_ipv4() != b.addr().is_ipv4() {
        return false;
    }
    let (a_first, a_last) = net_edges(a);
    let (b_first, b_last) = net_edges(b);
    a_first <= b_last && b_first <= a_last
}
