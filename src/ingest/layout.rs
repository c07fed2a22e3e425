//! Where the benchmark drivers put their result files below the
//! results base directory:
//!
//! - `{db}/load/{backend}/{db}_load_{backend}_th{threads}_trail{i}.yml`
//! - `{db}/run/{backend}/{db}_workload{w}_{backend}_trail{i}.yml`
//! - `raw/{backend}_{read|write}.csv`
//! - `recover/{db}/{backend}.csv`
//!
//! (Yes, "trail": that's how the drivers spell it.) Figures go to
//! `fig/`.

use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{bail, Result};

/// A YCSB workload letter, `a` to `f`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Workload(char);

impl FromStr for Workload {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut cs = s.chars();
        match (cs.next(), cs.next()) {
            (Some(c @ 'a'..='f'), None) => Ok(Workload(c)),
            _ => bail!("invalid YCSB workload {s:?}, expecting a single letter a-f"),
        }
    }
}

impl TryFrom<String> for Workload {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Workload> for String {
    fn from(w: Workload) -> Self {
        w.0.into()
    }
}

impl Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The independent variable of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Configuration {
    Threads(u32),
    Workload(Workload),
    /// Payload size in bytes
    Size(u64),
}

impl Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Configuration::Threads(t) => write!(f, "th{t}"),
            Configuration::Workload(w) => write!(f, "workload{w}"),
            Configuration::Size(s) => write!(f, "{s}B"),
        }
    }
}

/// Per-trial structured records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TrialPhase {
    #[strum(serialize = "load")]
    Load,
    #[strum(serialize = "run")]
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RawKind {
    #[strum(serialize = "read")]
    Read,
    #[strum(serialize = "write")]
    Write,
}

#[derive(Debug, Clone)]
pub struct ResultLayout {
    base_dir: PathBuf,
}

impl ResultLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The path of the record of one trial. Returns an error for
    /// combinations the drivers never produce (e.g. a load record
    /// for a workload letter).
    pub fn trial_path(
        &self,
        database: &str,
        phase: TrialPhase,
        backend: &str,
        configuration: Configuration,
        trial: u32,
    ) -> Result<PathBuf> {
        let file_name = match (phase, configuration) {
            (TrialPhase::Load, Configuration::Threads(t)) => {
                format!("{database}_load_{backend}_th{t}_trail{trial}.yml")
            }
            (TrialPhase::Run, Configuration::Workload(w)) => {
                format!("{database}_workload{w}_{backend}_trail{trial}.yml")
            }
            _ => bail!("no {phase} records exist for configuration {configuration}"),
        };
        Ok(self
            .base_dir
            .join(database)
            .join(phase.to_string())
            .join(backend)
            .join(file_name))
    }

    pub fn raw_path(&self, backend: &str, kind: RawKind) -> PathBuf {
        self.base_dir
            .join("raw")
            .join(format!("{backend}_{kind}.csv"))
    }

    pub fn recovery_path(&self, database: &str, backend: &str) -> PathBuf {
        self.base_dir
            .join("recover")
            .join(database)
            .join(format!("{backend}.csv"))
    }

    pub fn figure_dir(&self) -> PathBuf {
        self.base_dir.join("fig")
    }
}
