//! Address plan registry.
//!
//! Tracks which device owns which address so collaborators can resolve
//! either direction without walking the topology.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::topology::types::DeviceId;

/// Device to address mapping for a whole topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPlan {
    by_device: BTreeMap<DeviceId, Ipv4Addr>,
    by_address: BTreeMap<Ipv4Addr, DeviceId>,
}

impl AddressPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address for a device.
    ///
    /// Returns the device already holding `addr`, if any, and leaves the plan
    /// unchanged in that case.
    pub fn register(&mut self, device: DeviceId, addr: Ipv4Addr) -> Result<(), DeviceId> {
        if let Some(&owner) = self.by_address.get(&addr) {
            if owner != device {
                return Err(owner);
            }
            return Ok(());
        }
        self.by_device.insert(device, addr);
        self.by_address.insert(addr, device);
        Ok(())
    }

    pub fn address_of(&self, device: DeviceId) -> Option<Ipv4Addr> {
        self.by_device.get(&device).copied()
    }

    /// Device that owns `addr`.
    pub fn device_at(&self, addr: Ipv4Addr) -> Option<DeviceId> {
        self.by_address.get(&addr).copied()
    }

    pub fn is_assigned(&self, addr: Ipv4Addr) -> bool {
        self.by_address.contains_key(&addr)
    }

    pub fn len(&self) -> usize {
        self.by_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }

    /// All assignments ordered by device id.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, Ipv4Addr)> + '_ {
        self.by_device.iter().map(|(&device, &addr)| (device, addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut plan = AddressPlan::new();
        plan.register(DeviceId(2), Ipv4Addr::new(10, 1, 1, 1)).unwrap();
        plan.register(DeviceId(0), Ipv4Addr::new(10, 1, 1, 2)).unwrap();

        assert_eq!(plan.address_of(DeviceId(2)), Some(Ipv4Addr::new(10, 1, 1, 1)));
        assert_eq!(plan.device_at(Ipv4Addr::new(10, 1, 1, 2)), Some(DeviceId(0)));
        assert!(plan.is_assigned(Ipv4Addr::new(10, 1, 1, 1)));
        assert!(!plan.is_assigned(Ipv4Addr::new(10, 1, 1, 3)));

        let ordered: Vec<_> = plan.iter().map(|(d, _)| d).collect();
        assert_eq!(ordered, vec![DeviceId(0), DeviceId(2)]);
    }

    #[test]
    fn test_conflicting_address_rejected() {
        let mut plan = AddressPlan::new();
        let addr = Ipv4Addr::new(10, 1, 1, 1);
        plan.register(DeviceId(1), addr).unwrap();

        assert_eq!(plan.register(DeviceId(1), addr), Ok(()));
        assert_eq!(plan.register(DeviceId(4), addr), Err(DeviceId(1)));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.address_of(DeviceId(4)), None);
    }
}
