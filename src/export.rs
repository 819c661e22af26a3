//! Import/export of user pipeline commands.
//!
//! An export file is a JSON document listing pipeline commands with their
//! metadata. Three revisions exist; later ones add fields:
//!
//! | Revision | Extension     | Adds              |
//! |----------|---------------|-------------------|
//! | V1       | `.pipelines`  | -                 |
//! | V2       | `.pipelines2` | `requiredVersion` |
//! | V3       | `.pipelines3` | `editMode`        |
//!
//! Writers omit whatever their revision lacks. Reading goes by field
//! presence, so any codec reads any revision.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::pipeline::PipelineError;
use crate::plugin::{EditMode, PipelinePlugin};
use crate::version::Version;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export file extension: {0:?}")]
    UnknownExtension(String),
    #[error("invalid export document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pipeline of command {id} is unusable: {source}")]
    Pipeline {
        id: Uuid,
        #[source]
        source: PipelineError,
    },
    #[error("command {id} declares invalid required version {value:?}: {reason}")]
    Version {
        id: Uuid,
        value: String,
        reason: String,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportRevision {
    V1,
    V2,
    V3,
}

impl ExportRevision {
    pub const ALL: [ExportRevision; 3] = [Self::V1, Self::V2, Self::V3];
    pub const LATEST: ExportRevision = Self::V3;

    pub fn extension(self) -> &'static str {
        match self {
            Self::V1 => "pipelines",
            Self::V2 => "pipelines2",
            Self::V3 => "pipelines3",
        }
    }

    /// Match a file extension, with or without the leading dot, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL
            .into_iter()
            .find(|rev| rev.extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or(ExportError::UnknownExtension(ext))
    }

    fn has_required_version(self) -> bool {
        self >= Self::V2
    }

    fn has_edit_mode(self) -> bool {
        self >= Self::V3
    }
}

/// One pipeline command as stored on disk, in exports and in settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRecord {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub global: bool,
    pub encoded_elements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_mode: Option<EditMode>,
}

impl PipelineRecord {
    pub fn from_plugin(plugin: &PipelinePlugin) -> Result<Self, ExportError> {
        let encoded_elements = plugin
            .encoded_pipeline()
            .map_err(|source| ExportError::Pipeline {
                id: plugin.id,
                source,
            })?;
        Ok(Self {
            id: plugin.id,
            description: plugin.description.clone(),
            global: plugin.global,
            encoded_elements,
            required_version: Some(plugin.required_version.to_string()),
            edit_mode: plugin.edit_mode,
        })
    }

    pub fn to_plugin(&self) -> Result<PipelinePlugin, ExportError> {
        let declared = self
            .required_version
            .as_deref()
            .map(|value| {
                value.parse::<Version>().map_err(|reason| ExportError::Version {
                    id: self.id,
                    value: value.to_string(),
                    reason,
                })
            })
            .transpose()?;
        let mut plugin = PipelinePlugin::from_encoded(
            self.id,
            self.description.clone(),
            &self.encoded_elements,
            declared,
        )
        .map_err(|source| ExportError::Pipeline {
            id: self.id,
            source,
        })?;
        plugin.global = self.global;
        plugin.edit_mode = self.edit_mode;
        Ok(plugin)
    }

    fn restricted_to(mut self, revision: ExportRevision) -> Self {
        if !revision.has_required_version() {
            self.required_version = None;
        }
        if !revision.has_edit_mode() {
            self.edit_mode = None;
        }
        self
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExportDocument {
    #[serde(default)]
    pipelines: Vec<PipelineRecord>,
}

/// Reader/writer for one export revision. Obtain through [`codec_for`].
#[derive(Debug)]
pub struct ExportCodec {
    revision: ExportRevision,
}

impl ExportCodec {
    pub fn revision(&self) -> ExportRevision {
        self.revision
    }

    pub fn write(&self, plugins: &[PipelinePlugin]) -> Result<String, ExportError> {
        let pipelines = plugins
            .iter()
            .map(|p| PipelineRecord::from_plugin(p).map(|r| r.restricted_to(self.revision)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::to_string_pretty(&ExportDocument { pipelines })?)
    }

    /// Read a document of any revision. Fails on the first entry whose
    /// pipeline or declared version is unusable.
    pub fn read(&self, json: &str) -> Result<Vec<PipelinePlugin>, ExportError> {
        let doc: ExportDocument = serde_json::from_str(json)?;
        doc.pipelines.iter().map(PipelineRecord::to_plugin).collect()
    }
}

/// Shared codec for `revision`, built on first use.
pub fn codec_for(revision: ExportRevision) -> Arc<ExportCodec> {
    static CACHE: OnceLock<parking_lot::Mutex<HashMap<ExportRevision, Arc<ExportCodec>>>> =
        OnceLock::new();
    let cache = CACHE.get_or_init(|| parking_lot::Mutex::new(HashMap::new()));

    let mut guard = cache.lock();
    guard
        .entry(revision)
        .or_insert_with(|| {
            debug!(?revision, "building export codec");
            Arc::new(ExportCodec { revision })
        })
        .clone()
}

/// Write `plugins` to `path`, picking the revision from its extension.
pub fn export_to_file(
    path: &Path,
    plugins: &[PipelinePlugin],
) -> Result<ExportRevision, ExportError> {
    let revision = ExportRevision::from_path(path)?;
    let json = codec_for(revision).write(plugins)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        context: format!("failed to write {}", path.display()),
        source,
    })?;
    info!(
        path = %path.display(),
        ?revision,
        count = plugins.len(),
        "exported pipeline commands"
    );
    Ok(revision)
}

pub fn import_from_file(path: &Path) -> Result<Vec<PipelinePlugin>, ExportError> {
    let revision = ExportRevision::from_path(path)?;
    let json = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        context: format!("failed to read {}", path.display()),
        source,
    })?;
    let plugins = codec_for(revision).read(&json)?;
    info!(
        path = %path.display(),
        ?revision,
        count = plugins.len(),
        "imported pipeline commands"
    );
    Ok(plugins)
}
