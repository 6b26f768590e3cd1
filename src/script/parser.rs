// src/script/parser.rs - Sectioned plot script reader
use std::path::Path;
use thiserror::Error;
use tokio::fs;

use super::{PlotScript, Section};

pub const END_OPTIONS: &str = "::END_OPTIONS::";
pub const END_DEFINITIONS: &str = "::END_DEFINITIONS::";
const SENTINEL_PREFIX: &str = "::END_";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read plot script '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read and parse a plot script from disk.
pub async fn parse(path: impl AsRef<Path>) -> Result<PlotScript, ScriptError> {
    let path = path.as_ref();
    tracing::info!("Reading plot script: {}", path.display());
    let content = fs::read_to_string(path).await.map_err(|source| ScriptError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let script = parse_str(&content);
    tracing::info!(
        options = script.options.len(),
        definitions = script.definitions.len(),
        commands = script.remaining_len(),
        executable = script.command_count(),
        "Parsed plot script {}",
        path.display()
    );
    Ok(script)
}

/// Split script text into its three sections.
///
/// Lines are trimmed and blank lines dropped. A recognised sentinel moves to
/// the section it names; any other `::END_` line keeps the current section
/// and is itself discarded.
pub fn parse_str(content: &str) -> PlotScript {
    let mut options = Vec::new();
    let mut definitions = Vec::new();
    let mut commands = Vec::new();
    let mut section = Section::Options;

    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with(SENTINEL_PREFIX) {
            match sentinel_target(line) {
                Some(next) => section = next,
                None => tracing::warn!("Ignoring unknown section marker '{}'", line),
            }
            continue;
        }
        match section {
            Section::Options => options.push(line.to_string()),
            Section::Definitions => definitions.push(line.to_string()),
            Section::Commands => commands.push(line.to_string()),
        }
    }

    PlotScript::new(options, definitions, commands)
}

fn sentinel_target(line: &str) -> Option<Section> {
    match line {
        END_OPTIONS => Some(Section::Definitions),
        END_DEFINITIONS => Some(Section::Commands),
        _ => None,
    }
}
