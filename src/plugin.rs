//! Commands ("plugins") shown in the path-copy menus.
//!
//! A plugin is built in, registered externally, defined by the user as a
//! pipeline, or a separator. Whatever the variant, identity is the plugin's
//! 128-bit identifier: equality, ordering and hashing look at nothing else,
//! so display-order set algebra keeps working when a plugin's description or
//! pipeline changes.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::pipeline::{Pipeline, PipelineError};
use crate::version::{Version, APP_VERSION, PIPELINE_MIN_VERSION};

/// Well-known identifier of the separator pseudo-plugin.
pub const SEPARATOR_ID: Uuid = Uuid::from_u128(0x7f42_9150_5d45_4b3c_8a1e_2e10_d0b8_f1aa);

/// How the pipeline editor was last used on a user-defined command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Simple,
    Expert,
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuiltinPlugin {
    pub id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A command registered by another program, queried through the native component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExternalPlugin {
    pub id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A command the user composed from pipeline steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelinePlugin {
    pub id: Uuid,
    pub description: String,
    pub pipeline: Pipeline,
    /// Editor mode last used on this command, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_mode: Option<EditMode>,
    /// Defined machine-wide rather than for the current user.
    #[serde(default)]
    pub global: bool,
    pub required_version: Version,
}

impl PipelinePlugin {
    pub fn new(id: Uuid, description: impl Into<String>, pipeline: Pipeline) -> Self {
        let required_version = pipeline.required_version();
        Self {
            id,
            description: description.into(),
            pipeline,
            edit_mode: None,
            global: false,
            required_version,
        }
    }

    /// Build from a persisted pipeline string. A `declared` version (recorded
    /// when the command was saved) can only raise the required version.
    pub fn from_encoded(
        id: Uuid,
        description: impl Into<String>,
        encoded: &str,
        declared: Option<Version>,
    ) -> Result<Self, PipelineError> {
        let mut plugin = Self::new(id, description, Pipeline::decode(encoded)?);
        if let Some(declared) = declared {
            plugin.required_version = plugin.required_version.max(declared);
        }
        Ok(plugin)
    }

    pub fn encoded_pipeline(&self) -> Result<String, PipelineError> {
        self.pipeline.encode()
    }

    /// Replace the pipeline, recomputing the required version.
    pub fn set_pipeline(&mut self, pipeline: Pipeline) {
        self.required_version = pipeline.required_version();
        self.pipeline = pipeline;
    }

    pub fn is_compatible_with(&self, app_version: Version) -> bool {
        self.required_version <= app_version
    }

    /// Whether the running application can use this command. Incompatible
    /// commands stay listed but are flagged in the UI.
    pub fn is_compatible(&self) -> bool {
        self.is_compatible_with(APP_VERSION)
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Plugin {
    Builtin(BuiltinPlugin),
    External(ExternalPlugin),
    Pipeline(PipelinePlugin),
    Separator,
}

impl Plugin {
    pub fn id(&self) -> Uuid {
        match self {
            Plugin::Builtin(p) => p.id,
            Plugin::External(p) => p.id,
            Plugin::Pipeline(p) => p.id,
            Plugin::Separator => SEPARATOR_ID,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Plugin::Separator)
    }

    pub fn description(&self) -> &str {
        match self {
            Plugin::Builtin(p) => &p.description,
            Plugin::External(p) => &p.description,
            Plugin::Pipeline(p) => &p.description,
            Plugin::Separator => "",
        }
    }

    pub fn icon(&self) -> Option<&str> {
        match self {
            Plugin::Builtin(p) => p.icon.as_deref(),
            Plugin::External(p) => p.icon.as_deref(),
            Plugin::Pipeline(_) | Plugin::Separator => None,
        }
    }

    pub fn required_version(&self) -> Version {
        match self {
            Plugin::Pipeline(p) => p.required_version,
            _ => PIPELINE_MIN_VERSION,
        }
    }

    /// Only user-defined pipelines can be incompatible.
    pub fn is_compatible(&self) -> bool {
        match self {
            Plugin::Pipeline(p) => p.is_compatible(),
            _ => true,
        }
    }

    pub fn as_pipeline(&self) -> Option<&PipelinePlugin> {
        match self {
            Plugin::Pipeline(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for Plugin {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Plugin {}

impl Hash for Plugin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for Plugin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Plugin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

/// Identifiers of `plugins`, in order. Separators keep their well-known id
/// so the result can be persisted as a display order.
pub fn plugin_ids(plugins: &[Plugin]) -> Vec<Uuid> {
    plugins.iter().map(Plugin::id).collect()
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

// Placeholder identifiers: the native shell component has not published its
// registered command GUIDs yet. They are well-formed v4 ids and must be
// replaced, not renumbered, once the registered values are known, since
// saved display orders reference them.
const BUILTINS: &[(u128, &str)] = &[
    (0x331a_1e5b_39a3_4d4c_9d93_0ab9_94e0_1b20, "Short name"),
    (0x2e9c_0b9f_4f0c_4d6e_8b4b_1c3f_8a1d_6a01, "Long name"),
    (0x6c4a_2b1e_0d3f_4a5b_9c8d_7e6f_5a4b_3c02, "Short folder"),
    (0x8d2f_6e1a_3b4c_4d5e_8f9a_0b1c_2d3e_4f03, "Long folder"),
    (0x1a2b_3c4d_5e6f_4a7b_8c9d_0e1f_2a3b_4c04, "Short path"),
    (0x9f8e_7d6c_5b4a_4392_8170_6f5e_4d3c_2b05, "Long path"),
    (0x4b5c_6d7e_8f90_4a1b_9c2d_3e4f_5a6b_7c06, "Short UNC path"),
    (0x5c6d_7e8f_9a0b_4c1d_8e2f_3a4b_5c6d_7e07, "Long UNC path"),
    (0x7e8f_9a0b_1c2d_4e3f_8a4b_5c6d_7e8f_9a08, "Short UNC folder"),
    (0x0b1c_2d3e_4f5a_4b6c_9d7e_8f9a_0b1c_2d09, "Long UNC folder"),
    (0x3e4f_5a6b_7c8d_4e9f_8a0b_1c2d_3e4f_5a10, "Internet path"),
    (0x6b7c_8d9e_0f1a_4b2c_9d3e_4f5a_6b7c_8d11, "Samba path"),
    (0x8d9e_0f1a_2b3c_4d4e_8f5a_6b7c_8d9e_0f12, "Unix path"),
    (0x2c3d_4e5f_6a7b_4c8d_9e0f_1a2b_3c4d_5e13, "Cygwin path"),
    (0x4e5f_6a7b_8c9d_4e0f_8a1b_2c3d_4e5f_6a14, "WSL path"),
    (0x6a7b_8c9d_0e1f_4a2b_9c3d_4e5f_6a7b_8c15, "MSYS path"),
];

/// Group boundaries in [`BUILTINS`]: a separator goes before each listed index.
const BUILTIN_GROUP_STARTS: &[usize] = &[4, 6, 10, 12];

lazy_static::lazy_static! {
    static ref DEFAULT_BUILTIN_ORDER: Vec<Plugin> = build_default_builtin_order();
}

fn build_default_builtin_order() -> Vec<Plugin> {
    let mut order = Vec::with_capacity(BUILTINS.len() + BUILTIN_GROUP_STARTS.len());
    for (i, (id, description)) in BUILTINS.iter().enumerate() {
        if BUILTIN_GROUP_STARTS.contains(&i) {
            order.push(Plugin::Separator);
        }
        order.push(Plugin::Builtin(BuiltinPlugin {
            id: Uuid::from_u128(*id),
            description: (*description).to_string(),
            icon: None,
        }));
    }
    order
}

/// Every built-in command, without separators.
pub fn builtin_plugins() -> Vec<Plugin> {
    DEFAULT_BUILTIN_ORDER
        .iter()
        .filter(|p| !p.is_separator())
        .cloned()
        .collect()
}

/// Built-in commands in their default display order, grouped by separators.
pub fn default_display_order() -> Vec<Plugin> {
    DEFAULT_BUILTIN_ORDER.clone()
}
