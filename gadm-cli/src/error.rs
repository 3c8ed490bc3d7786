//! Error types emitted by the `gadm` CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use gadm_data::FetchError;
use gadm_data::source::SourceBuildError;
use thiserror::Error;

/// Errors emitted by the `gadm` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The HTTP archive source could not be constructed.
    #[error(transparent)]
    BuildSource(#[from] SourceBuildError),
    /// Fetching the map failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Serialising the dataset summary failed.
    #[error("failed to serialise dataset summary: {0}")]
    SerialiseSummary(#[source] serde_json::Error),
    /// The output file could not be created.
    #[error("failed to create output file {path:?}: {source}")]
    CreateOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing the summary failed.
    #[error("failed to write dataset summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
