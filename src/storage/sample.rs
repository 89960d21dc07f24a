//! Sample data model
//!
//! A sample is one scored visitor observation. It is appended with an
//! unknown outcome and later labeled by a confirmation. Samples are never
//! deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LeadError, LeadResult};

/// Tenant-scoped sample identifier, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(pub u64);

impl SampleId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ground-truth label for a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Unknown,
    Converted,
    NotConverted,
}

impl Outcome {
    /// Returns whether the outcome is a confirmed label
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Unknown)
    }

    /// Training target: converted = 1, not converted = 0
    pub fn target(&self) -> Option<f64> {
        match self {
            Outcome::Unknown => None,
            Outcome::Converted => Some(1.0),
            Outcome::NotConverted => Some(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Unknown => "unknown",
            Outcome::Converted => "converted",
            Outcome::NotConverted => "not_converted",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "converted" | "1" | "true" => Ok(Outcome::Converted),
            "not_converted" | "0" | "false" => Ok(Outcome::NotConverted),
            "unknown" => Ok(Outcome::Unknown),
            other => Err(LeadError::validation(format!(
                "outcome must be 'converted' or 'not_converted', got '{}'",
                other
            ))),
        }
    }
}

/// The three behavioral signals a classifier consumes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Seconds spent on site, non-negative
    pub time_on_site: f64,
    pub pages_visited: u32,
    pub clicked_price: bool,
}

impl Signals {
    pub fn new(time_on_site: f64, pages_visited: u32, clicked_price: bool) -> LeadResult<Self> {
        if !time_on_site.is_finite() || time_on_site < 0.0 {
            return Err(LeadError::validation(
                "time_on_site must be a non-negative number",
            ));
        }
        Ok(Self {
            time_on_site,
            pages_visited,
            clicked_price,
        })
    }

    /// Feature vector in fixed order: time on site, pages, clicked price as 0/1
    pub fn features(&self) -> [f64; 3] {
        [
            self.time_on_site,
            self.pages_visited as f64,
            if self.clicked_price { 1.0 } else { 0.0 },
        ]
    }
}

/// One behavioral observation belonging to exactly one tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub tenant_id: String,
    pub signals: Signals,
    pub outcome: Outcome,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labeled_at: Option<DateTime<Utc>>,
}

/// Effect of a `set_outcome` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeChange {
    /// Outcome was already set to the same value; nothing written
    Unchanged,
    /// First terminal label
    Labeled,
    /// A different terminal label replaced the previous one
    Relabeled { previous: Outcome },
}

impl OutcomeChange {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, OutcomeChange::Unchanged)
    }
}

/// Inclusive-exclusive time window over `created_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        Self { since, until }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| *at >= since) && self.until.map_or(true, |until| *at < until)
    }
}
