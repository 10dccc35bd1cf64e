//! Settings for the hltex command line
//!
//! The shipped defaults live in `defaults/hltex.default.toml` and are compiled
//! in, so a bare `hltex file.hltex` behaves the same everywhere. A project
//! `hltex.toml`, an explicit `--config` file and command-line switches are
//! stacked over them with [`Loader`]; later layers win key by key.

use crate::execution::{ExecutorFactory, NoExecution, ProcessExecutorFactory};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_TOML: &str = include_str!("../defaults/hltex.default.toml");

/// Top-level configuration consumed by the hltex binary.
#[derive(Debug, Clone, Deserialize)]
pub struct HltexConfig {
    pub output: OutputConfig,
    pub pysplice: PyspliceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub extension: String,
}

/// Interpreter used for `\pysplice` bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct PyspliceConfig {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
}

impl PyspliceConfig {
    /// The executor factory these settings describe.
    pub fn executor_factory(&self) -> Arc<dyn ExecutorFactory> {
        if self.enabled {
            Arc::new(ProcessExecutorFactory::new(
                self.program.clone(),
                self.args.clone(),
            ))
        } else {
            Arc::new(NoExecution)
        }
    }
}

/// Stacks configuration layers over the compiled-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Loader {
            builder: Config::builder().add_source(defaults),
        }
    }

    /// Add a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Add a TOML file that is skipped when absent, such as a project
    /// `hltex.toml`.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let file = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(file);
        self
    }

    /// Force `key` (dotted, e.g. `pysplice.enabled`) to `value` regardless of
    /// the files.
    pub fn set_override<V>(mut self, key: &str, value: V) -> Result<Self, ConfigError>
    where
        V: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into an [`HltexConfig`].
    ///
    /// Missing required files, malformed TOML and missing or mistyped keys are
    /// all reported here.
    pub fn build(self) -> Result<HltexConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The compiled-in defaults alone.
pub fn load_defaults() -> Result<HltexConfig, ConfigError> {
    Loader::new().build()
}
