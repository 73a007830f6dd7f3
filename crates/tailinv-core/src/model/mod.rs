// ── Domain model ──
//
// Tag handling and the inventory structure. Devices themselves are the
// API wire type, re-exported from `tailinv-api`.

pub mod inventory;
pub mod tag;

pub use inventory::{ANSIBLE_HOST, HostVars, InventoryResult, InventorySink};
pub use tag::{DeviceTag, GROUP_PREFIX, TAG_PREFIX, TagFilter};
pub use tailinv_api::{Device, Token};
