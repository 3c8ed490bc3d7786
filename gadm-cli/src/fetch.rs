//! `fetch` command implementation.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use gadm_core::{
    CountryCode, DatasetVersion, GeoArchiveReader, MapFormat, MapFormats, MapRequest,
    SpatialDataset,
};
use gadm_data::archive::ArchiveExtractor;
use gadm_data::source::{ArchiveSource, HttpArchiveSourceConfig};
use gadm_data::{FetchError, MapFetcher};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COUNTRY, ARG_FORMAT, ARG_LAYER, ARG_OUTPUT, ARG_SCRATCH_DIR, ARG_TIMEOUT_SECS,
    ARG_USER_AGENT, ARG_VERSION, CliError, ENV_COUNTRY,
};

/// CLI arguments for the `fetch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Download a GADM archive for one country, extract it into a \
                 private scratch directory and read one administrative level. \
                 Level 0 is the national boundary. Values can come from CLI \
                 flags, configuration files, or GADM_-prefixed environment \
                 variables.",
    about = "Fetch one administrative level of a country"
)]
#[ortho_config(prefix = "GADM")]
pub(crate) struct FetchArgs {
    /// ISO 3166-1 alpha-3 country code, e.g. AFG.
    #[arg(long = ARG_COUNTRY, value_name = "ISO3")]
    #[serde(default)]
    pub(crate) country: Option<String>,
    /// Dataset version tag (default: gadm3.6).
    #[arg(long = ARG_VERSION, value_name = "tag")]
    #[ortho_config(cli_long = "dataset-version")]
    #[serde(default)]
    pub(crate) version: Option<String>,
    /// Source format; repeat or comma-separate for both (default: gpkg).
    #[arg(long = ARG_FORMAT, value_name = "gpkg|shp", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) format: Vec<MapFormat>,
    /// Zero-based administrative level (default: 0).
    #[arg(long = ARG_LAYER, value_name = "n")]
    #[serde(default)]
    pub(crate) layer: Option<usize>,
    /// Write the JSON summary here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// User agent sent to the archive host.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Overall download timeout in seconds (default: none).
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Directory for per-call work directories (default: system temp).
    #[arg(long = ARG_SCRATCH_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) scratch_dir: Option<Utf8PathBuf>,
}

impl FetchArgs {
    pub(crate) fn into_config(self) -> Result<FetchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FetchConfig::try_from(merged)
    }
}

/// Resolved `fetch` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchConfig {
    /// What to fetch.
    pub(crate) request: MapRequest,
    /// Summary destination; stdout when absent.
    pub(crate) output: Option<Utf8PathBuf>,
    /// HTTP user agent override.
    pub(crate) user_agent: Option<String>,
    /// Overall download timeout.
    pub(crate) timeout: Option<Duration>,
    /// Root for per-call work directories.
    pub(crate) scratch_dir: Option<Utf8PathBuf>,
}

impl FetchConfig {
    pub(crate) fn source_config(&self) -> HttpArchiveSourceConfig {
        let mut config = HttpArchiveSourceConfig::default();
        if let Some(agent) = &self.user_agent {
            config = config.with_user_agent(agent.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

impl TryFrom<FetchArgs> for FetchConfig {
    type Error = CliError;

    fn try_from(args: FetchArgs) -> Result<Self, Self::Error> {
        let country = args
            .country
            .map(CountryCode::new)
            .filter(|code| !code.is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_COUNTRY,
                env: ENV_COUNTRY,
            })?;
        let formats = if args.format.is_empty() {
            MapFormats::only(MapFormat::GeoPackage)
        } else {
            args.format.into_iter().collect()
        };
        let version = args.version.map(DatasetVersion::new).unwrap_or_default();
        let request = MapRequest::new(country)
            .with_version(version)
            .with_formats(formats)
            .with_layer(args.layer.unwrap_or(0));

        Ok(Self {
            request,
            output: args.output,
            user_agent: args.user_agent,
            timeout: args.timeout_secs.map(Duration::from_secs),
            scratch_dir: args.scratch_dir,
        })
    }
}

/// Compact description of a fetched layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DatasetSummary {
    pub(crate) layer: String,
    pub(crate) srs: Option<String>,
    pub(crate) features: usize,
    /// `[min_x, min_y, max_x, max_y]`.
    pub(crate) bounds: Option<[f64; 4]>,
    pub(crate) properties: Vec<String>,
}

impl From<&SpatialDataset> for DatasetSummary {
    fn from(dataset: &SpatialDataset) -> Self {
        Self {
            layer: dataset.layer.clone(),
            srs: dataset.srs.clone(),
            features: dataset.len(),
            bounds: dataset.bounds().map(|rect| {
                let (min, max) = (rect.min(), rect.max());
                [min.x, min.y, max.x, max.y]
            }),
            properties: dataset
                .property_names()
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Anything able to answer a [`MapRequest`].
pub(crate) trait MapSource {
    fn fetch(&self, request: &MapRequest) -> Result<SpatialDataset, FetchError>;
}

impl<S, X, R> MapSource for MapFetcher<S, X, R>
where
    S: ArchiveSource,
    X: ArchiveExtractor,
    R: GeoArchiveReader,
{
    fn fetch(&self, request: &MapRequest) -> Result<SpatialDataset, FetchError> {
        Self::fetch(self, request)
    }
}

/// Builds the fetcher for one invocation.
pub(crate) trait FetcherBuilder {
    fn build(&self, config: &FetchConfig) -> Result<Box<dyn MapSource>, CliError>;
}

pub(crate) struct HttpFetcherBuilder;

impl FetcherBuilder for HttpFetcherBuilder {
    fn build(&self, config: &FetchConfig) -> Result<Box<dyn MapSource>, CliError> {
        let fetcher = MapFetcher::http(config.source_config())?;
        Ok(match &config.scratch_dir {
            Some(dir) => Box::new(fetcher.with_scratch_root(dir.clone())),
            None => Box::new(fetcher),
        })
    }
}

pub(crate) fn run_fetch(args: FetchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_fetch_with(args, &HttpFetcherBuilder, &mut stdout)
}

pub(crate) fn run_fetch_with(
    args: FetchArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_fetch(&config, builder, writer)
}

pub(crate) fn execute_fetch(
    config: &FetchConfig,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let fetcher = builder.build(config)?;
    let dataset = fetcher.fetch(&config.request)?;
    let summary = DatasetSummary::from(&dataset);
    match &config.output {
        Some(path) => {
            let mut file =
                gadm_fs::create_utf8_file(path).map_err(|source| CliError::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
            write_summary(&mut file, &summary)?;
            info!("wrote summary of {} to {path}", summary.layer);
            Ok(())
        }
        None => write_summary(writer, &summary),
    }
}

fn write_summary(writer: &mut dyn Write, summary: &DatasetSummary) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(summary).map_err(CliError::SerialiseSummary)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSummary)?;
    writer.write_all(b"\n").map_err(CliError::WriteSummary)?;
    Ok(())
}
