use crate::fs::{HostFs, OsFs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fs: FsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Host directory exposed as the guest's `/`. Without one the guest gets
    /// `ENOSYS` for every filesystem call.
    pub root: Option<PathBuf>,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "wasmexec=info".to_string(), json: false }
    }
}

impl Config {
    /// Load `wasmexec.{toml,json,yaml}` from the working directory if present,
    /// then apply `WASMEXEC_*` environment overrides (`WASMEXEC_FS__ROOT`).
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("wasmexec")
    }

    pub fn load_from(name: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("WASMEXEC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// The host filesystem described by `fs`, if a root is configured.
    pub fn host_fs(&self) -> Option<Arc<dyn HostFs>> {
        self.fs.root.as_ref().map(|root| {
            Arc::new(OsFs::new(root).read_only(self.fs.read_only)) as Arc<dyn HostFs>
        })
    }
}
