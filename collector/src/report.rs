use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The closed set of report feeds we poll. The SPC publishes one daily
/// cumulative CSV per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    Hail,
    Wind,
    Tornado,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Hail => "Hail",
            ReportCategory::Wind => "Wind",
            ReportCategory::Tornado => "Tornado",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown report category: {0}")]
pub struct UnknownCategory(String);

impl FromStr for ReportCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hail" => Ok(ReportCategory::Hail),
            "Wind" => Ok(ReportCategory::Wind),
            "Tornado" => Ok(ReportCategory::Tornado),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// One configured feed. The set of sources is fixed for the process
/// lifetime, built from config at startup.
#[derive(Debug, Clone)]
pub struct ReportSource {
    pub category: ReportCategory,
    pub url: String,
}

/// Derive the cache key for one record line.
///
/// The category name is prepended so identical text under two categories
/// never collides, then whitespace and commas are stripped. Lines that
/// only differ in spacing or comma placement share a key.
pub fn dedup_key(category: ReportCategory, line: &str) -> String {
    let mut key = String::with_capacity(category.as_str().len() + line.len());
    key.push_str(category.as_str());
    key.extend(
        line.chars()
            .filter(|c| !c.is_whitespace() && *c != ','),
    );
    key
}
