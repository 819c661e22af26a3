//! Externally-registered commands.
//!
//! Enumerating them (and resolving machine/user duplicates) belongs to the
//! native side; this module only defines the boundary and turns whatever it
//! returns into a grouped, separator-delimited default order.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::plugin::{ExternalPlugin, Plugin};

/// One command as reported by discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredCommand {
    pub id: Uuid,
    pub description: String,
    pub group_id: u32,
    pub group_position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Source of externally-registered commands. Failures are returned as-is to
/// the caller; nothing here retries.
pub trait CommandDiscovery {
    fn discover(&self) -> Result<Vec<DiscoveredCommand>, String>;
}

/// Sort by group then position, with a separator between different groups.
pub fn group_discovered(mut entries: Vec<DiscoveredCommand>) -> Vec<Plugin> {
    entries.sort_by_key(|e| (e.group_id, e.group_position));

    let mut plugins = Vec::with_capacity(entries.len());
    let mut current_group = None;
    for entry in entries {
        if current_group.is_some_and(|g| g != entry.group_id) {
            plugins.push(Plugin::Separator);
        }
        current_group = Some(entry.group_id);
        plugins.push(Plugin::External(ExternalPlugin {
            id: entry.id,
            description: entry.description,
            icon: entry.icon,
        }));
    }
    plugins
}

/// Run discovery and group the result.
pub fn discover_plugins(source: &dyn CommandDiscovery) -> Result<Vec<Plugin>, String> {
    let entries = source.discover().inspect_err(|e| {
        warn!("external command discovery failed: {e}");
    })?;
    debug!(count = entries.len(), "discovered external commands");
    Ok(group_discovered(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{plugin_ids, SEPARATOR_ID};

    fn entry(n: u128, group_id: u32, group_position: u32) -> DiscoveredCommand {
        DiscoveredCommand {
            id: Uuid::from_u128(n),
            description: format!("ext {n}"),
            group_id,
            group_position,
            icon: None,
        }
    }

    struct Fixed(Result<Vec<DiscoveredCommand>, String>);

    impl CommandDiscovery for Fixed {
        fn discover(&self) -> Result<Vec<DiscoveredCommand>, String> {
            self.0.clone()
        }
    }

    #[test]
    fn sorts_and_separates_groups() {
        let plugins = group_discovered(vec![
            entry(3, 2, 0),
            entry(2, 1, 5),
            entry(1, 1, 1),
            entry(4, 3, 0),
        ]);
        assert_eq!(
            plugin_ids(&plugins),
            vec![
                Uuid::from_u128(1),
                Uuid::from_u128(2),
                SEPARATOR_ID,
                Uuid::from_u128(3),
                SEPARATOR_ID,
                Uuid::from_u128(4),
            ]
        );
    }

    #[test]
    fn single_group_has_no_separator() {
        let plugins = group_discovered(vec![entry(1, 7, 2), entry(2, 7, 1)]);
        assert_eq!(
            plugin_ids(&plugins),
            vec![Uuid::from_u128(2), Uuid::from_u128(1)]
        );
    }

    #[test]
    fn empty_discovery() {
        assert!(group_discovered(Vec::new()).is_empty());
    }

    #[test]
    fn keeps_icon_and_description() {
        let mut e = entry(1, 0, 0);
        e.icon = Some("C:\\icons\\tool.ico".into());
        let plugins = group_discovered(vec![e]);
        assert_eq!(plugins[0].description(), "ext 1");
        assert_eq!(plugins[0].icon(), Some("C:\\icons\\tool.ico"));
    }

    #[test]
    fn failures_pass_through_unmodified() {
        let source = Fixed(Err("native component exited with code 3".into()));
        assert_eq!(
            discover_plugins(&source).unwrap_err(),
            "native component exited with code 3"
        );
    }

    #[test]
    fn successful_discovery_is_grouped() {
        let source = Fixed(Ok(vec![entry(2, 1, 0), entry(1, 0, 0)]));
        let plugins = discover_plugins(&source).unwrap();
        assert_eq!(plugins.len(), 3);
        assert!(plugins[1].is_separator());
    }

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000005",
            "description": "Copy as Markdown",
            "groupId": 2,
            "groupPosition": 1
        }"#;
        let e: DiscoveredCommand = serde_json::from_str(json).unwrap();
        assert_eq!(e.group_id, 2);
        assert_eq!(e.icon, None);
    }
}
