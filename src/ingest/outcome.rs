//! The result of trying to read one input file. Both failure kinds
//! lead to the same skip-and-continue policy, but are logged at
//! different levels: an absent file is expected (the trial has not
//! been produced), a malformed one is worth a warning.

use std::{fmt::Display, io::ErrorKind, path::Path};

use anyhow::{anyhow, Context, Result};

use crate::{debug, warn};

#[derive(Debug)]
pub enum ReadOutcome<T> {
    Absent,
    Malformed(anyhow::Error),
    Loaded(T),
}

impl<T> ReadOutcome<T> {
    /// Read `path` as a string and hand it to `parse`. Never returns
    /// an error: a missing file is `Absent`, any other failure
    /// (I/O or parsing) is `Malformed`.
    pub fn read(path: &Path, parse: impl FnOnce(&str) -> Result<T>) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match parse(&s).with_context(|| anyhow!("parsing {path:?}")) {
                Ok(v) => ReadOutcome::Loaded(v),
                Err(e) => ReadOutcome::Malformed(e),
            },
            Err(e) => match e.kind() {
                ErrorKind::NotFound => ReadOutcome::Absent,
                _ => ReadOutcome::Malformed(anyhow!("reading {path:?}: {e}")),
            },
        }
    }

    /// Log the failure cases (`what` names the file's role, `path`
    /// where it was expected) and return the value if loaded.
    pub fn logged(self, what: impl Display, path: &Path) -> Option<T> {
        match self {
            ReadOutcome::Absent => {
                debug!("{what}: no file at {path:?}, skipping");
                None
            }
            ReadOutcome::Malformed(e) => {
                warn!("{what}: skipping malformed file: {e:#}");
                None
            }
            ReadOutcome::Loaded(v) => Some(v),
        }
    }
}

/// Counts of what happened to the files making up one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    pub loaded: usize,
    pub absent: usize,
    pub malformed: usize,
}

impl IngestReport {
    pub fn record<T>(&mut self, outcome: &ReadOutcome<T>) {
        match outcome {
            ReadOutcome::Absent => self.absent += 1,
            ReadOutcome::Malformed(_) => self.malformed += 1,
            ReadOutcome::Loaded(_) => self.loaded += 1,
        }
    }

    pub fn add(&mut self, other: IngestReport) {
        let IngestReport {
            loaded,
            absent,
            malformed,
        } = other;
        self.loaded += loaded;
        self.absent += absent;
        self.malformed += malformed;
    }

    pub fn skipped(&self) -> usize {
        self.absent + self.malformed
    }
}

impl Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let IngestReport {
            loaded,
            absent,
            malformed,
        } = self;
        write!(f, "{loaded} loaded, {absent} absent, {malformed} malformed")
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{bail, Result};

    use super::*;

    #[test]
    fn t_absent_vs_malformed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("x.txt");

        let outcome = ReadOutcome::read(&path, |s| Ok(s.len()));
        assert!(matches!(outcome, ReadOutcome::Absent));

        std::fs::write(&path, "abc")?;
        let outcome = ReadOutcome::read(&path, |s| Ok(s.len()));
        assert!(matches!(outcome, ReadOutcome::Loaded(3)));

        let outcome: ReadOutcome<usize> = ReadOutcome::read(&path, |_| bail!("nope"));
        assert!(matches!(outcome, ReadOutcome::Malformed(_)));

        let mut report = IngestReport::default();
        report.record(&outcome);
        report.record(&ReadOutcome::<()>::Absent);
        report.record(&ReadOutcome::Loaded(()));
        assert_eq!(
            report,
            IngestReport {
                loaded: 1,
                absent: 1,
                malformed: 1
            }
        );
        assert_eq!(report.skipped(), 2);
        Ok(())
    }
}
