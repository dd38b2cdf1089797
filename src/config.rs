//! Explicit configuration for fetch and run workflows.
//!
//! All paths, source identifiers, and the credential location are carried
//! in configuration structs passed into the fetch and pipeline components;
//! nothing is discovered from ambient global state at the point of use.
//! Values resolve with command-line flags taking precedence over the
//! optional `b2t.toml` configuration file, which in turn overrides the
//! built-in defaults.

use crate::cli::{FetchArgs, RunArgs};
use crate::dirs::{UserDirs, default_credentials_path};
use crate::error::{B2tError, Result};
use crate::manifest::DataManifest;
use crate::source::dryad::DRYAD_DATASET_URL;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Competition identifier on the primary source.
pub const DEFAULT_COMPETITION: &str = "brain-to-text-25";

/// Data directory name, relative to the base directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// External pipeline entry point, relative to the base directory.
pub const DEFAULT_PIPELINE: &str = "run_full_pipeline.py";

/// Configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "b2t.toml";

/// Configuration for the fetch-and-verify workflow.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory the dataset files are placed in.
    pub data_dir: Utf8PathBuf,
    /// The required artifact filenames.
    pub manifest: DataManifest,
    /// Location of the primary-source credential file.
    pub credentials_path: Utf8PathBuf,
    /// Competition identifier on the primary source.
    pub competition: String,
    /// Secondary-source landing page URL.
    pub secondary_url: String,
    /// When true, suppress progress output.
    pub quiet: bool,
}

/// Configuration for the full pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Acquisition settings for the data-fetch step.
    pub fetch: FetchConfig,
    /// Working directory for the external pipeline child process.
    pub base_dir: Utf8PathBuf,
    /// Path to the external pipeline executable.
    pub pipeline_command: Utf8PathBuf,
    /// Skip the fetch step entirely and require data to be present.
    pub skip_fetch: bool,
}

impl FetchConfig {
    /// Resolve fetch configuration from CLI arguments, the optional
    /// configuration file, and built-in defaults, relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`B2tError::InvalidConfig`] when the configuration file is
    /// unparsable, and [`B2tError::ConfigResolution`] when no credential
    /// path is configured and the home directory cannot be determined.
    pub fn resolve(args: &FetchArgs, dirs: &dyn UserDirs, base_dir: &Utf8Path) -> Result<Self> {
        let file = load_config_file(args.config.as_deref())?;
        Self::resolve_with_file(args, file.as_ref(), dirs, base_dir)
    }

    fn resolve_with_file(
        args: &FetchArgs,
        file: Option<&ConfigFile>,
        dirs: &dyn UserDirs,
        base_dir: &Utf8Path,
    ) -> Result<Self> {
        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| file.and_then(|f| f.data.dir.as_deref().map(Utf8PathBuf::from)))
            .unwrap_or_else(|| base_dir.join(DEFAULT_DATA_DIR));

        let competition = args
            .competition
            .clone()
            .or_else(|| file.and_then(|f| f.sources.competition.clone()))
            .unwrap_or_else(|| DEFAULT_COMPETITION.to_owned());

        let secondary_url = file
            .and_then(|f| f.sources.dryad_url.clone())
            .unwrap_or_else(|| DRYAD_DATASET_URL.to_owned());

        let credentials_path = args
            .credentials
            .clone()
            .or_else(|| file.and_then(|f| f.credentials.kaggle.as_deref().map(Utf8PathBuf::from)))
            .or_else(|| default_credentials_path(dirs))
            .ok_or_else(|| B2tError::ConfigResolution {
                reason: "could not determine the home directory for the default \
                         kaggle.json location; pass --credentials"
                    .to_owned(),
            })?;

        Ok(Self {
            data_dir,
            manifest: DataManifest::competition(),
            credentials_path,
            competition,
            secondary_url,
            quiet: args.quiet,
        })
    }
}

impl RunConfig {
    /// Resolve run configuration from CLI arguments, the optional
    /// configuration file, and built-in defaults.
    ///
    /// Relative pipeline paths are anchored at the base directory, which
    /// is also the explicit working directory of the pipeline child.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`FetchConfig::resolve`].
    pub fn resolve(args: &RunArgs, dirs: &dyn UserDirs) -> Result<Self> {
        let base_dir = args
            .base_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        let file = load_config_file(args.fetch.config.as_deref())?;
        let fetch = FetchConfig::resolve_with_file(&args.fetch, file.as_ref(), dirs, &base_dir)?;

        let pipeline_command = args
            .pipeline
            .clone()
            .or_else(|| {
                file.as_ref()
                    .and_then(|f| f.pipeline.command.as_deref().map(Utf8PathBuf::from))
            })
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_PIPELINE));
        let pipeline_command = if pipeline_command.is_relative() {
            base_dir.join(pipeline_command)
        } else {
            pipeline_command
        };

        Ok(Self {
            fetch,
            base_dir,
            pipeline_command,
            skip_fetch: args.skip_fetch,
        })
    }

    /// Whether progress output is suppressed.
    #[must_use]
    pub fn quiet(&self) -> bool {
        self.fetch.quiet
    }

    /// Format the resolved plan for dry-run display.
    #[must_use]
    pub fn display_plan(&self) -> String {
        let lines = vec![
            "Dry run - no downloads or processes will be started".to_owned(),
            String::new(),
            format!("Base directory: {}", self.base_dir),
            format!("Data directory: {}", self.fetch.data_dir),
            format!("Required files: {}", self.fetch.manifest),
            format!("Competition: {}", self.fetch.competition),
            format!("Credentials: {}", self.fetch.credentials_path),
            format!("Secondary source: {}", self.fetch.secondary_url),
            format!("Pipeline: {}", self.pipeline_command),
            format!("Skip fetch: {}", self.skip_fetch),
            format!("Quiet: {}", self.fetch.quiet),
        ];
        lines.join("\n")
    }
}

/// The optional `b2t.toml` configuration file schema.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// `[data]` section.
    #[serde(default)]
    pub data: DataSection,
    /// `[sources]` section.
    #[serde(default)]
    pub sources: SourcesSection,
    /// `[credentials]` section.
    #[serde(default)]
    pub credentials: CredentialsSection,
    /// `[pipeline]` section.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[data]` settings.
#[derive(Debug, Default, Deserialize)]
pub struct DataSection {
    /// Data directory path.
    pub dir: Option<String>,
}

/// `[sources]` settings.
#[derive(Debug, Default, Deserialize)]
pub struct SourcesSection {
    /// Competition identifier on the primary source.
    pub competition: Option<String>,
    /// Secondary-source landing page URL.
    pub dryad_url: Option<String>,
}

/// `[credentials]` settings.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsSection {
    /// Path to `kaggle.json`.
    pub kaggle: Option<String>,
}

/// `[pipeline]` settings.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineSection {
    /// Path to the external pipeline executable.
    pub command: Option<String>,
}

/// Load the configuration file.
///
/// With an explicit path, the file must exist and parse. Without one, the
/// default `b2t.toml` is used when present and silently skipped when
/// absent.
///
/// # Errors
///
/// Returns [`B2tError::InvalidConfig`] for unreadable or unparsable files,
/// and for an explicitly named file that does not exist.
pub fn load_config_file(path: Option<&Utf8Path>) -> Result<Option<ConfigFile>> {
    let (path, required) = match path {
        Some(explicit) => (explicit.to_owned(), true),
        None => (Utf8PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !path.is_file() {
        if required {
            return Err(B2tError::InvalidConfig {
                path,
                reason: "file not found".to_owned(),
            });
        }
        return Ok(None);
    }
    let contents =
        std::fs::read_to_string(path.as_std_path()).map_err(|e| B2tError::InvalidConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    let parsed = toml::from_str(&contents).map_err(|e| B2tError::InvalidConfig {
        path,
        reason: e.to_string(),
    })?;
    Ok(Some(parsed))
}
