//! Tri-state health rollup.
//!
//! `Unknown` means at least one testing service could not be queried; it
//! dominates `Unhealthy`, which dominates `Healthy`.

use serde::{Serialize, Serializer};

/// Health of an instance, suite or workflow.
///
/// Serialized as `true`, `false` or the string `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
    Unknown,
}

impl Health {
    /// Combine two health values; the worse one wins.
    pub fn combine(self, other: Health) -> Health {
        match (self, other) {
            (Health::Unknown, _) | (_, Health::Unknown) => Health::Unknown,
            (Health::Unhealthy, _) | (_, Health::Unhealthy) => Health::Unhealthy,
            _ => Health::Healthy,
        }
    }
}

impl Serialize for Health {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Health::Healthy => serializer.serialize_bool(true),
            Health::Unhealthy => serializer.serialize_bool(false),
            Health::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

/// Health value plus the messages of every testing service that failed to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub healthy: Health,
    pub issues: Vec<String>,
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::healthy()
    }
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            healthy: Health::Healthy,
            issues: Vec::new(),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: Health::Unhealthy,
            issues: Vec::new(),
        }
    }

    pub fn unknown(issue: impl Into<String>) -> Self {
        Self {
            healthy: Health::Unknown,
            issues: vec![issue.into()],
        }
    }

    /// Fold another report into this one, keeping every issue in order.
    pub fn merge(&mut self, other: HealthReport) {
        self.healthy = self.healthy.combine(other.healthy);
        self.issues.extend(other.issues);
    }

    /// Roll up child reports. An empty input is vacuously healthy.
    pub fn rollup<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = HealthReport>,
    {
        reports
            .into_iter()
            .fold(HealthReport::healthy(), |mut acc, report| {
                acc.merge(report);
                acc
            })
    }
}
