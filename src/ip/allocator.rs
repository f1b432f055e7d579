//! Subnet allocation.
//!
//! The allocator walks the third octet of a private /16 from a configured
//! starting block upwards, handing out one /24 per request. Issue order is
//! part of the contract: the n-th call to [`AddressAllocator::allocate_subnet`]
//! always returns the n-th block after the base, so an identical sequence of
//! segments always yields an identical address plan.

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::error::{Result, TopologyError};
use crate::topology::types::DeviceId;

/// Usable host addresses in a /24 (.1 through .254).
pub const HOSTS_PER_SUBNET: usize = 254;

/// Highest third-octet value the cursor may issue.
const LAST_SUBNET_OCTET: u8 = 254;

/// Default base block, 10.1.1.0/24.
pub const DEFAULT_BASE: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 0);

/// A /24 block and the host addresses handed out inside it so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subnet {
    network: Ipv4Addr,
    hosts: Vec<Ipv4Addr>,
}

impl Subnet {
    fn new(network: Ipv4Addr) -> Self {
        Self {
            network,
            hosts: Vec::new(),
        }
    }

    /// Network address (host octet zero).
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        24
    }

    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::new(255, 255, 255, 0)
    }

    /// Addresses assigned so far, in assignment order.
    pub fn hosts(&self) -> &[Ipv4Addr] {
        &self.hosts
    }

    /// Host addresses still free.
    pub fn available(&self) -> usize {
        HOSTS_PER_SUBNET - self.hosts.len()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let [a, b, c, _] = addr.octets();
        let [na, nb, nc, _] = self.network.octets();
        (a, b, c) == (na, nb, nc)
    }

    fn host(&self, index: usize) -> Ipv4Addr {
        let [a, b, c, _] = self.network.octets();
        Ipv4Addr::new(a, b, c, (index + 1) as u8)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len())
    }
}

/// Hands out non-overlapping /24 subnets in strictly increasing order.
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    base: Ipv4Addr,
    /// Third octet of the next block; past 254 means exhausted.
    cursor: u16,
    issued: usize,
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE)
    }
}

impl AddressAllocator {
    /// Create an allocator whose first block is `base`'s /24.
    ///
    /// The host octet of `base` is ignored. A base whose third octet is 0
    /// or 255 lies outside the cursor range and yields no subnets at all.
    pub fn new(base: Ipv4Addr) -> Self {
        let [a, b, c, _] = base.octets();
        let base = Ipv4Addr::new(a, b, c, 0);
        let cursor = if c == 0 { u16::from(LAST_SUBNET_OCTET) + 1 } else { u16::from(c) };
        Self {
            base,
            cursor,
            issued: 0,
        }
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    /// Number of subnets issued so far.
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Subnets still available before exhaustion.
    pub fn remaining(&self) -> usize {
        (u16::from(LAST_SUBNET_OCTET) + 1).saturating_sub(self.cursor) as usize
    }

    /// Network address the next call to `allocate_subnet` would return.
    pub fn peek_next(&self) -> Option<Ipv4Addr> {
        if self.cursor > u16::from(LAST_SUBNET_OCTET) {
            return None;
        }
        let [a, b, _, _] = self.base.octets();
        Some(Ipv4Addr::new(a, b, self.cursor as u8, 0))
    }

    /// Return the next unused /24 block and advance the cursor.
    pub fn allocate_subnet(&mut self) -> Result<Subnet> {
        let network = self.peek_next().ok_or(TopologyError::AddressSpaceExhausted {
            base: self.base,
            issued: self.issued,
        })?;
        self.cursor += 1;
        self.issued += 1;
        log::debug!("Allocated subnet {}/24 ({} issued)", network, self.issued);
        Ok(Subnet::new(network))
    }

    /// Assign host addresses to `devices` in order, continuing after the
    /// addresses already taken in `subnet`.
    ///
    /// A fresh subnet starts at its first usable address (.1). If the
    /// devices do not fit, the subnet is left untouched.
    pub fn assign(
        &self,
        subnet: &mut Subnet,
        devices: &[DeviceId],
    ) -> Result<Vec<(DeviceId, Ipv4Addr)>> {
        if devices.len() > subnet.available() {
            return Err(TopologyError::SubnetOverflow {
                network: subnet.network,
                requested: devices.len(),
                available: subnet.available(),
            });
        }

        let mut assigned = Vec::with_capacity(devices.len());
        for &device in devices {
            let addr = subnet.host(subnet.hosts.len());
            subnet.hosts.push(addr);
            assigned.push((device, addr));
        }
        Ok(assigned)
    }
}
