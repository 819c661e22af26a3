use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::display_order::{fold_known, DisplayContext};
use crate::export::{ExportError, PipelineRecord};
use crate::plugin::{builtin_plugins, plugin_ids, EditMode, PipelinePlugin, Plugin};

/// Overrides the settings directory; used by tests and portable installs.
pub const CONFIG_DIR_ENV: &str = "PATHCOPY_CONFIG_DIR";

pub const SETTINGS_FILE: &str = "settings.json";

/// Get the config directory.
///
/// - `$PATHCOPY_CONFIG_DIR` when set and non-empty
/// - otherwise `{platform config dir}/pathcopy/`
///   (`%APPDATA%`, `~/Library/Application Support`, `$XDG_CONFIG_HOME`)
///
/// Falls back to `~/.pathcopy/` if the platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|d| d.join("pathcopy"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".pathcopy")
        })
}

/// Read a JSON file, returning Default if missing or corrupt. Failures on a
/// file that exists are logged so a reset is never silent.
pub fn load_json_file<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return T::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Write a JSON file atomically (temp file + rename), owner-only on Unix.
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", path.display()))?;
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!("{filename}.tmp.{}", std::process::id()));

    std::fs::write(&temp, &json).map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })
}

pub fn load_json_config<T: DeserializeOwned + Default>(filename: &str) -> T {
    load_json_file(&config_dir().join(filename))
}

pub fn save_json_config<T: Serialize>(filename: &str, value: &T) -> Result<(), String> {
    save_json_file(&config_dir().join(filename), value)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Persisted settings of the path-copy extension.
///
/// Display orders are `None` until the user first reorders that list; the
/// resolver then seeds from the default order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub main_menu_order: Option<Vec<Uuid>>,
    #[serde(default)]
    pub submenu_order: Option<Vec<Uuid>>,
    #[serde(default)]
    pub ui_order: Option<Vec<Uuid>>,
    /// Every plugin the user has been shown. `None` on first run.
    #[serde(default)]
    pub known_plugins: Option<Vec<Uuid>>,
    #[serde(default)]
    pub pipeline_plugins: Vec<PipelineRecord>,
    #[serde(default)]
    pub default_edit_mode: EditMode,
}

impl Settings {
    /// Strict read of a settings file; unlike [`load_settings`] a missing or
    /// corrupt file is an error.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
        if !value.is_object() {
            return Err(format!("{} does not hold a settings object", path.display()));
        }
        serde_json::from_value(value)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }

    pub fn display_order(&self, context: DisplayContext) -> Option<&[Uuid]> {
        match context {
            DisplayContext::MainMenu => self.main_menu_order.as_deref(),
            DisplayContext::Submenu => self.submenu_order.as_deref(),
            DisplayContext::Ui => self.ui_order.as_deref(),
        }
    }

    pub fn set_display_order(&mut self, context: DisplayContext, order: &[Plugin]) {
        let ids = Some(plugin_ids(order));
        match context {
            DisplayContext::MainMenu => self.main_menu_order = ids,
            DisplayContext::Submenu => self.submenu_order = ids,
            DisplayContext::Ui => self.ui_order = ids,
        }
    }

    pub fn known_set(&self) -> Option<HashSet<Uuid>> {
        self.known_plugins
            .as_ref()
            .map(|ids| ids.iter().copied().collect())
    }

    /// Record that the user has now seen everything in `resolved`.
    pub fn acknowledge(&mut self, resolved: &[Plugin]) {
        let known = fold_known(&self.known_set().unwrap_or_default(), resolved);
        let mut ids: Vec<Uuid> = known.into_iter().collect();
        ids.sort();
        self.known_plugins = Some(ids);
    }

    /// Decode stored pipeline commands. Entries that fail are returned
    /// separately so the UI can report them without losing the rest.
    pub fn user_plugins(&self) -> (Vec<PipelinePlugin>, Vec<ExportError>) {
        let mut plugins = Vec::with_capacity(self.pipeline_plugins.len());
        let mut failures = Vec::new();
        for record in &self.pipeline_plugins {
            match record.to_plugin() {
                Ok(p) => plugins.push(p),
                Err(e) => {
                    warn!("skipping stored command {}: {e}", record.id);
                    failures.push(e);
                }
            }
        }
        (plugins, failures)
    }

    /// Built-in commands followed by every stored pipeline command that
    /// decodes. Commands needing a newer release are included so they keep
    /// their place; callers flag them through [`Plugin::is_compatible`].
    pub fn available_plugins(&self) -> (Vec<Plugin>, Vec<ExportError>) {
        let (user, failures) = self.user_plugins();
        let mut available = builtin_plugins();
        available.extend(user.into_iter().map(Plugin::Pipeline));
        (available, failures)
    }

    /// Add a pipeline command, replacing any stored one with the same id.
    pub fn upsert_pipeline_plugin(&mut self, plugin: &PipelinePlugin) -> Result<(), ExportError> {
        let record = PipelineRecord::from_plugin(plugin)?;
        match self.pipeline_plugins.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.pipeline_plugins.push(record),
        }
        Ok(())
    }

    /// Returns false when no command had that id.
    pub fn remove_pipeline_plugin(&mut self, id: Uuid) -> bool {
        let before = self.pipeline_plugins.len();
        self.pipeline_plugins.retain(|r| r.id != id);
        self.pipeline_plugins.len() != before
    }
}

pub fn load_settings() -> Settings {
    load_json_config(SETTINGS_FILE)
}

pub fn save_settings(settings: &Settings) -> Result<(), String> {
    save_json_config(SETTINGS_FILE, settings)
}
