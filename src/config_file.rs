//! Loading and saving of configuration files; the format is chosen
//! by the file name extension.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::json5_from_str::json5_from_str;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
}

impl ConfigBackend {
    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.config_from_str(&s)
            .with_context(|| anyhow!("config file {path:?}"))
    }

    pub fn config_from_str<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => json5_from_str(s).with_context(|| anyhow!("decoding JSON5")),
            ConfigBackend::Yaml => serde_yml::from_str(s).with_context(|| anyhow!("decoding YAML")),
        }
    }

    pub fn config_to_string<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            // json5 output would be plain JSON anyway; pretty-print it
            ConfigBackend::Json5 => {
                serde_json::to_string_pretty(value).with_context(|| anyhow!("encoding config as JSON"))
            }
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).with_context(|| anyhow!("encoding config as YAML"))
            }
        }
    }

    pub fn save_config_file<T: Serialize>(self, path: &Path, value: &T) -> Result<()> {
        let s = self.config_to_string(value)?;
        std::fs::write(path, s).with_context(|| anyhow!("writing config file to {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path does have an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path does have an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

pub fn load_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    backend_from_path(path)?.load_config_file(path)
}

pub fn save_config_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    backend_from_path(path)?.save_config_file(path, value)
}
