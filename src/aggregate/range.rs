use std::fmt::Display;

use anyhow::{bail, Result};

/// Inclusive bound on the thread counts a backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawConfigRange")]
pub struct ConfigRange {
    pub min: u32,
    pub max: u32,
}

/// `ConfigRange` as written in config files, before validation.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigRange {
    min: u32,
    max: u32,
}

impl TryFrom<RawConfigRange> for ConfigRange {
    type Error = anyhow::Error;

    fn try_from(RawConfigRange { min, max }: RawConfigRange) -> Result<Self> {
        Self::new(min, max)
    }
}

impl ConfigRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            bail!("invalid range: min {min} > max {max}")
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: u32) -> bool {
        let Self { min, max } = *self;
        (min..=max).contains(&value)
    }

    /// The members of `values` within the range, in their given
    /// order.
    pub fn filter<'v>(&self, values: &'v [u32]) -> impl Iterator<Item = u32> + 'v {
        let range = *self;
        values.iter().copied().filter(move |v| range.contains(*v))
    }
}

impl Display for ConfigRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
