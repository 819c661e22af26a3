//! Display-order resolution for the menus and the settings UI.
//!
//! The user's persisted order is projected onto the commands that exist
//! right now, then commands the user has never seen are appended, grouped the
//! way the default order groups them. Resolution is a pure function of its
//! inputs and never fails: missing inputs are treated as empty.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::plugin::{Plugin, SEPARATOR_ID};

/// Where a display order applies. Each context persists its own order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayContext {
    MainMenu,
    Submenu,
    Ui,
}

impl DisplayContext {
    pub const ALL: [DisplayContext; 3] = [
        DisplayContext::MainMenu,
        DisplayContext::Submenu,
        DisplayContext::Ui,
    ];
}

impl std::str::FromStr for DisplayContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main-menu" => Ok(DisplayContext::MainMenu),
            "submenu" => Ok(DisplayContext::Submenu),
            "ui" => Ok(DisplayContext::Ui),
            other => Err(format!(
                "unknown display context \"{other}\" (expected main-menu, submenu or ui)"
            )),
        }
    }
}

/// Merge a persisted display order with the commands currently available.
///
/// - `available`: every command that exists now (separators are ignored).
/// - `default_order`: baseline order with separators between groups. Also
///   used in place of `user_order` when the user never customized anything.
/// - `user_order`: persisted identifiers; stale ones are dropped and repeated
///   commands keep their first position. Separators stay where the user put
///   them, except one that would only have bordered dropped entries.
/// - `known`: identifiers the user has already seen. When absent, only the
///   projection of the user order is returned.
///
/// Commands that are neither placed by the user order nor known are appended
/// after a separator, following `default_order` (or identifier order when
/// there is no default order). A separator from the default order is only
/// carried over right after an appended command, so new commands keep their
/// grouping without producing empty groups.
pub fn resolve_display_order(
    available: &[Plugin],
    default_order: Option<&[Plugin]>,
    user_order: Option<&[Uuid]>,
    known: Option<&HashSet<Uuid>>,
) -> Vec<Plugin> {
    let mut by_id: HashMap<Uuid, &Plugin> = HashMap::new();
    for plugin in available
        .iter()
        .chain(default_order.into_iter().flatten())
        .filter(|p| !p.is_separator())
    {
        by_id.entry(plugin.id()).or_insert(plugin);
    }

    let seed: Vec<Uuid> = match (user_order, default_order) {
        (Some(order), _) => order.to_vec(),
        (None, Some(default)) => default.iter().map(Plugin::id).collect(),
        (None, None) => Vec::new(),
    };

    let mut resolved: Vec<Plugin> = Vec::with_capacity(by_id.len());
    let mut placed: HashSet<Uuid> = HashSet::new();
    let mut stale = 0usize;
    // State of the group since the last separator: whether anything in it was
    // kept, and whether anything in it was dropped.
    let mut group_kept = false;
    let mut group_dropped = false;
    for id in seed {
        if id == SEPARATOR_ID {
            // A group emptied by dropped entries loses its separator too.
            if !(group_dropped && !group_kept) {
                resolved.push(Plugin::Separator);
            }
            group_kept = false;
            group_dropped = false;
            continue;
        }
        match by_id.get(&id) {
            Some(plugin) if placed.insert(id) => {
                resolved.push((*plugin).clone());
                group_kept = true;
            }
            Some(_) => group_dropped = true,
            None => {
                stale += 1;
                group_dropped = true;
            }
        }
    }
    if group_dropped && !group_kept && resolved.last().is_some_and(Plugin::is_separator) {
        resolved.pop();
    }

    let Some(known) = known else {
        debug!(
            resolved = resolved.len(),
            stale, "resolved display order without known set"
        );
        return resolved;
    };

    let unknown: BTreeSet<Uuid> = by_id
        .keys()
        .filter(|id| !known.contains(*id) && !placed.contains(*id))
        .copied()
        .collect();

    if unknown.is_empty() {
        debug!(resolved = resolved.len(), stale, "no unknown commands");
        return resolved;
    }

    let projected = resolved.len();
    if resolved.last().is_some_and(|p| !p.is_separator()) {
        resolved.push(Plugin::Separator);
    }

    let mut appended: HashSet<Uuid> = HashSet::new();
    if let Some(default) = default_order {
        let mut previous_was_unknown = false;
        for plugin in default {
            if plugin.is_separator() {
                if previous_was_unknown {
                    resolved.push(Plugin::Separator);
                    previous_was_unknown = false;
                }
            } else if unknown.contains(&plugin.id()) && appended.insert(plugin.id()) {
                resolved.push(plugin.clone());
                previous_was_unknown = true;
            }
        }
    }

    // Unknown commands the default order doesn't mention (or every unknown
    // command, without a default order) go last, by identifier.
    let leftovers: Vec<Uuid> = unknown
        .iter()
        .filter(|id| !appended.contains(*id))
        .copied()
        .collect();
    if !leftovers.is_empty() {
        if resolved.last().is_some_and(|p| !p.is_separator()) && !appended.is_empty() {
            resolved.push(Plugin::Separator);
        }
        resolved.extend(leftovers.iter().filter_map(|id| by_id.get(id)).map(|p| (*p).clone()));
    }

    // Only separators added here are trimmed; the user's own stay.
    while resolved.len() > projected && resolved.last().is_some_and(Plugin::is_separator) {
        resolved.pop();
    }
    debug!(
        resolved = resolved.len(),
        stale,
        unknown = unknown.len(),
        "resolved display order"
    );
    resolved
}

/// Known set after the user has been shown `resolved`.
pub fn fold_known(known: &HashSet<Uuid>, resolved: &[Plugin]) -> HashSet<Uuid> {
    known
        .iter()
        .copied()
        .chain(resolved.iter().filter(|p| !p.is_separator()).map(Plugin::id))
        .collect()
}
