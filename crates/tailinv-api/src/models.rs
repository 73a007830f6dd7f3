// Tailscale API wire types
//
// Only the fields the inventory needs are typed. Everything else the API
// returns for a device is kept verbatim in `raw` so callers can surface it
// without this crate tracking every addition to the API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response body of `GET /tailnet/{tailnet}/devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// A node registered in a tailnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Legacy device ID. Absent on some API responses.
    #[serde(default)]
    pub id: String,

    /// Machine hostname as reported by the node.
    pub hostname: String,

    /// Tailscale IPs; the first one is the address of record.
    #[serde(default)]
    pub addresses: Vec<String>,

    /// ACL tags in their prefixed form (`tag:web`). Omitted by the API
    /// when the device is untagged.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Every other field of the device record (`name`, `os`, `user`, ...).
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

impl Device {
    /// The address of record, if the device has any address at all.
    pub fn primary_address(&self) -> Option<&str> {
        self.addresses.first().map(String::as_str)
    }

    /// Look up a string field the typed model does not carry.
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }
}
