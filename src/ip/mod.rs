//! IP address allocation and management module.
//!
//! This module hands out /24 subnets per segment and records which device
//! received which host address.

pub mod allocator;
pub mod registry;

// Re-export commonly used types
pub use allocator::{AddressAllocator, Subnet, DEFAULT_BASE, HOSTS_PER_SUBNET};
pub use registry::AddressPlan;
