//! Generic config file loader

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
}

impl ConfigBackend {
    pub fn from_str_config<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => {
                serde_json5::from_str(s).map_err(|e| anyhow!("decoding JSON5: {e}"))
            }
            ConfigBackend::Yaml => serde_yml::from_str(s).map_err(|e| anyhow!("decoding YAML: {e}")),
        }
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.from_str_config(&s)
            .with_context(|| anyhow!("config file {path:?}"))
    }

    pub fn to_config_string<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            // JSON is valid JSON5
            ConfigBackend::Json5 => serde_json::to_string_pretty(value)
                .with_context(|| anyhow!("encoding config as JSON5")),
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).with_context(|| anyhow!("encoding config as YAML"))
            }
        }
    }

    pub fn save_config_file<T: Serialize>(self, path: &Path, value: &T) -> Result<()> {
        let s = self.to_config_string(value)?;
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

pub fn save_config_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let backend = backend_from_path(path)?;
    backend.save_config_file(path, value)
}

/// `path` with `.{extension}` appended to its file name. None if
/// `path` has no file name.
fn add_extension(path: &Path, extension: &str) -> Option<PathBuf> {
    let mut file_name = path.file_name()?.to_owned();
    file_name.push(".");
    file_name.push(extension);
    Some(path.with_file_name(file_name))
}

/// The existing files among `base` with each of `FILE_EXTENSIONS`
/// appended.
fn existing_candidates(base: &Path) -> Result<Vec<(PathBuf, ConfigBackend)>> {
    let mut found = Vec::new();
    for (extension, backend) in FILE_EXTENSIONS {
        let candidate = add_extension(base, extension)
            .ok_or_else(|| anyhow!("config path has no file name: {base:?}"))?;
        if candidate.exists() {
            found.push((candidate, *backend));
        }
    }
    Ok(found)
}

pub trait LoadConfigFile: DeserializeOwned {
    /// Without extension; each of `FILE_EXTENSIONS` is tried. None
    /// if the type has no default location.
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// Load from `path` if given (it must exist and have a known
    /// extension). Otherwise load from the default location if
    /// exactly one candidate file exists there; with none, `or_else`
    /// gets a description of what was tried and decides between an
    /// error and a default value. Several candidates are an error.
    fn load_config<P: AsRef<Path>>(
        path: Option<P>,
        or_else: impl FnOnce(String) -> Result<Self>,
    ) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            return backend_from_path(path)?.load_config_file(path);
        }
        let Some(base) = Self::default_config_path_without_suffix()? else {
            return or_else("no config path given, and no default location".into());
        };
        match existing_candidates(&base)?.as_slice() {
            [] => or_else(format!(
                "no file {base:?} with any of the extensions {}",
                FILE_EXTENSIONS.iter().map(|(e, _)| *e).join(", ")
            )),
            [(path, backend)] => backend.load_config_file(path),
            several => {
                let paths: Vec<&PathBuf> = several.iter().map(|(p, _)| p).collect();
                bail!("ambiguous config location, found all of {paths:?}")
            }
        }
    }
}
