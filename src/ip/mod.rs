//! IP address handling.
//!
//! CIDR parsing helpers and the deterministic next-free-address allocator
//! used when clients are added to a VLAN.

pub mod allocator;
pub mod cidr;

// Re-export commonly used types
pub use allocator::{pick_next_address, AllocationError};
pub use cidr::{parse_cidr, parse_subnet, CidrError};
