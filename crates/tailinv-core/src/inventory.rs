// ── Tag-based inventory grouping ──
//
// Single pass over the device listing: one host per selected device,
// addressed by its first Tailscale IP, and one `tag_<name>` group per tag
// the device carries. Pure and stateless; the same input always yields
// the same `InventoryResult`.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::CoreError;
use crate::model::{ANSIBLE_HOST, Device, DeviceTag, InventoryResult, InventorySink, TagFilter};

/// Turns a device listing into hosts and tag groups.
#[derive(Debug, Clone, Default)]
pub struct InventoryBuilder {
    filter: TagFilter,
}

impl InventoryBuilder {
    pub fn new(filter: TagFilter) -> Self {
        Self { filter }
    }

    /// Build a fresh [`InventoryResult`] from `devices`.
    ///
    /// Fails with [`CoreError::PreconditionViolation`] if a selected device
    /// has no address.
    pub fn build(&self, devices: &[Device]) -> Result<InventoryResult, CoreError> {
        let mut inventory = InventoryResult::default();
        self.build_into(devices, &mut inventory)?;
        Ok(inventory)
    }

    /// Feed `devices` into an arbitrary sink.
    ///
    /// Every selected device is validated before the sink sees any call,
    /// so a failing run leaves the sink untouched. Returns the number of
    /// distinct hosts emitted; a repeated hostname counts once.
    pub fn build_into<S: InventorySink + ?Sized>(
        &self,
        devices: &[Device],
        sink: &mut S,
    ) -> Result<usize, CoreError> {
        let selected = devices
            .iter()
            .filter(|device| self.filter.matches(&device.tags))
            .map(|device| {
                let address = device
                    .primary_address()
                    .ok_or_else(|| no_address(device))?;
                Ok((device, address))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        for &(device, address) in &selected {
            trace!(host = %device.hostname, address, "adding host");
            sink.add_host(&device.hostname);
            sink.set_variable(&device.hostname, ANSIBLE_HOST, address);

            for tag in device.tags.iter().map(DeviceTag::new) {
                let group = tag.group_name();
                sink.add_group(&group);
                sink.add_child(&group, &device.hostname);
            }
        }

        let hosts = selected
            .iter()
            .map(|(device, _)| device.hostname.as_str())
            .collect::<HashSet<_>>()
            .len();
        debug!(
            total = devices.len(),
            selected = selected.len(),
            hosts,
            "inventory built"
        );
        Ok(hosts)
    }
}

fn no_address(device: &Device) -> CoreError {
    let device = if device.id.is_empty() {
        device.hostname.clone()
    } else {
        format!("{} (id {})", device.hostname, device.id)
    };
    CoreError::PreconditionViolation {
        device,
        reason: "device has no addresses".into(),
    }
}
