//! Process-wide defaults for new VLANs and standalone peers.

/// UDP port WireGuard listens on unless told otherwise
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

/// Server address and VLAN subnet for `init`
pub const DEFAULT_NETWORK: &str = "10.20.30.1/24";

/// Keep-alive interval, in seconds, written into new VLANs
pub const DEFAULT_KEEP_ALIVE: u32 = 25;

/// Peer name of the server for `init`
pub const DEFAULT_SERVER_NAME: &str = "wg-vlan";

/// Interface name used when the document does not set one
pub const DEFAULT_INTERFACE_NAME: &str = "wg0";

/// Address of a standalone peer for `generate`
pub const DEFAULT_PEER_ADDRESS: &str = "10.22.6.1/24";
