//! Command-line access to pipeline encoding and display-order resolution,
//! for inspecting settings files and scripting command definitions.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

use pathcopy_lib::config::Settings;
use pathcopy_lib::plugin::default_display_order;
use pathcopy_lib::{logging, resolve_display_order, DisplayContext, Pipeline, Plugin, Version};

#[derive(Parser)]
#[command(name = "pipeline_tool", version, about = "Path Copy pipeline tool")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "PATHCOPY_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Decode a pipeline string and print its steps as JSON
    Decode {
        /// Encoded pipeline (or - for stdin)
        encoded: String,
    },
    /// Encode a JSON list of steps into a pipeline string
    Encode {
        /// JSON array of steps (or - for stdin)
        json: String,
    },
    /// Print the resolved display order for a settings file
    Resolve {
        #[arg(long)]
        settings: PathBuf,
        /// main-menu, submenu or ui
        #[arg(long, default_value = "submenu")]
        context: DisplayContext,
        /// Print JSON instead of one line per command
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedPipeline {
    required_version: Version,
    steps: Pipeline,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedEntry {
    id: uuid::Uuid,
    description: String,
    separator: bool,
    compatible: bool,
}

fn read_arg(value: &str) -> anyhow::Result<String> {
    if value != "-" {
        return Ok(value.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

fn decode(encoded: &str) -> anyhow::Result<()> {
    let pipeline = Pipeline::decode(encoded)?;
    let issues = pipeline
        .validate()
        .into_iter()
        .map(|(i, issue)| format!("step {i}: {issue}"))
        .collect();
    let out = DecodedPipeline {
        required_version: pipeline.required_version(),
        steps: pipeline,
        issues,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn encode(json: &str) -> anyhow::Result<()> {
    let pipeline: Pipeline = serde_json::from_str(json).context("invalid step list")?;
    println!("{}", pipeline.encode()?);
    Ok(())
}

fn resolve(settings_path: &Path, context: DisplayContext, json: bool) -> anyhow::Result<()> {
    let settings = Settings::from_file(settings_path).map_err(anyhow::Error::msg)?;

    let (available, failures) = settings.available_plugins();
    for failure in &failures {
        warn!("{failure}");
    }

    let default_order = default_display_order();
    let known = settings.known_set();
    let resolved = resolve_display_order(
        &available,
        Some(default_order.as_slice()),
        settings.display_order(context),
        known.as_ref(),
    );

    if json {
        let entries: Vec<ResolvedEntry> = resolved
            .iter()
            .map(|p| ResolvedEntry {
                id: p.id(),
                description: p.description().to_string(),
                separator: p.is_separator(),
                compatible: p.is_compatible(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for plugin in &resolved {
        match plugin {
            Plugin::Separator => println!("----------"),
            p if p.is_compatible() => println!("{}  {}", p.id(), p.description()),
            p => println!("{}  {} (requires {})", p.id(), p.description(), p.required_version()),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logging::init_logging(&cli.log) {
        eprintln!("{e}");
    }

    match cli.cmd {
        Cmd::Decode { encoded } => decode(&read_arg(&encoded)?),
        Cmd::Encode { json } => encode(&read_arg(&json)?),
        Cmd::Resolve {
            settings,
            context,
            json,
        } => {
            if !settings.exists() {
                bail!("settings file {} does not exist", settings.display());
            }
            resolve(&settings, context, json)
        }
    }
}
