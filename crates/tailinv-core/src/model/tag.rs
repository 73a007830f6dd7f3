//! Tailscale tag types and tag ↔ inventory group mapping.
//!
//! The API carries ACL tags with a fixed prefix. The inventory strips it
//! and uses a different one for group names:
//!
//! | API tag     | Bare name | Inventory group |
//! |-------------|-----------|-----------------|
//! | `tag:web`   | `web`     | `tag_web`       |
//! | `tag:prod`  | `prod`    | `tag_prod`      |

use std::fmt;

use indexmap::IndexSet;

/// Prefix Tailscale puts on every ACL tag.
pub const TAG_PREFIX: &str = "tag:";

/// Prefix of inventory group names derived from tags.
pub const GROUP_PREFIX: &str = "tag_";

/// A device tag as received from the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceTag(String);

impl DeviceTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as received, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare tag name. A tag without the `tag:` prefix is its own name.
    pub fn name(&self) -> &str {
        self.0.strip_prefix(TAG_PREFIX).unwrap_or(&self.0)
    }

    /// The inventory group this tag maps to: `tag_<name>`.
    pub fn group_name(&self) -> String {
        format!("{GROUP_PREFIX}{}", self.name())
    }
}

impl fmt::Display for DeviceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of bare tag names selecting which devices enter the inventory.
///
/// An empty filter selects every device. Otherwise a device is selected
/// when ANY of its tags is in the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    names: IndexSet<String>,
}

impl TagFilter {
    /// Build a filter from bare (`web`) or prefixed (`tag:web`) names.
    /// Blank entries are ignored.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = tags
            .into_iter()
            .map(|t| {
                let t = t.as_ref().trim();
                t.strip_prefix(TAG_PREFIX).unwrap_or(t).to_owned()
            })
            .filter(|t| !t.is_empty())
            .collect();
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a device carrying `device_tags` (prefixed, as received)
    /// passes the filter.
    pub fn matches<S: AsRef<str>>(&self, device_tags: &[S]) -> bool {
        self.is_empty()
            || device_tags.iter().any(|tag| {
                AsRef::<str>::as_ref(tag)
                    .strip_prefix(TAG_PREFIX)
                    .is_some_and(|name| self.names.contains(name))
            })
    }
}
