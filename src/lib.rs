//! Settings core of the path-copy shell extension: user-defined command
//! pipelines, their persisted encoding, and the order commands appear in.

pub mod config;
pub mod discovery;
pub mod display_order;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod plugin;
pub mod preview;
pub mod version;

pub use display_order::{fold_known, resolve_display_order, DisplayContext};
pub use pipeline::{Pipeline, PipelineError, Step};
pub use plugin::{Plugin, SEPARATOR_ID};
pub use version::{Version, APP_VERSION, PIPELINE_MIN_VERSION};
