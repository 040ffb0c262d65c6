//! Findings, warnings, and the analysis report.

use crate::types::{PatternType, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A single detected pattern with supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// The detected pattern type.
    pub pattern_type: PatternType,
    /// Severity of the finding.
    pub risk_level: RiskLevel,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Human-readable description.
    pub description: String,
    /// Accounts implicated in the pattern.
    pub affected_accounts: BTreeSet<String>,
    /// Identifiers of the constituent transactions, when attributable.
    pub transaction_ids: Vec<String>,
    /// Supporting metrics, keyed deterministically.
    pub evidence: BTreeMap<String, Value>,
    /// Suggested follow-up action.
    pub recommendation: String,
    /// Time of detection (not of the underlying transactions).
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    /// Create a finding; confidence is clamped into [0, 1].
    #[must_use]
    pub fn new(
        pattern_type: PatternType,
        risk_level: RiskLevel,
        confidence: f64,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            pattern_type,
            risk_level,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
            affected_accounts: BTreeSet::new(),
            transaction_ids: Vec::new(),
            evidence: BTreeMap::new(),
            recommendation: recommendation.into(),
            detected_at: Utc::now(),
        }
    }

    /// Set the affected accounts.
    #[must_use]
    pub fn with_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the constituent transaction identifiers.
    #[must_use]
    pub fn with_transactions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transaction_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the evidence map.
    #[must_use]
    pub fn with_evidence(mut self, evidence: BTreeMap<String, Value>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Why a detector did not contribute its full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// The detector raised an error and was excluded from the run.
    Failed,
    /// The detector hit a result or enumeration cap and returned a prefix.
    Truncated,
    /// The detector was skipped before running (e.g. graph too large).
    Skipped,
}

/// Per-detector outcome surfaced alongside the findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisWarning {
    /// Detector identifier.
    pub detector: String,
    /// Outcome class.
    pub reason: WarningReason,
    /// Details for the operator.
    pub message: String,
}

impl AnalysisWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        detector: impl Into<String>,
        reason: WarningReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            detector: detector.into(),
            reason,
            message: message.into(),
        }
    }
}

/// Aggregate statistics over a set of findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of findings.
    pub total_patterns: usize,
    /// Finding counts per risk level.
    pub risk_distribution: BTreeMap<String, usize>,
    /// Finding counts per pattern type.
    pub pattern_types: BTreeMap<String, usize>,
    /// Number of high or critical findings.
    pub high_risk_count: usize,
    /// Mean confidence across findings; 0 when there are none.
    pub average_confidence: f64,
    /// Size of the union of all affected-account sets.
    pub affected_accounts: usize,
    /// Canned follow-up actions, present when high-risk findings exist.
    pub recommendations: Vec<String>,
    /// When the analysis completed.
    pub analysis_timestamp: DateTime<Utc>,
}

/// The result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Findings sorted by risk level, then confidence, both descending.
    pub findings: Vec<Finding>,
    /// Aggregate statistics.
    pub summary: ReportSummary,
    /// Detectors that failed, truncated, or were skipped.
    pub warnings: Vec<AnalysisWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let finding = Finding::new(
            PatternType::Structuring,
            RiskLevel::High,
            1.7,
            "test",
            "investigate",
        );
        assert_eq!(finding.confidence, 1.0);

        let finding = Finding::new(
            PatternType::Structuring,
            RiskLevel::High,
            -0.5,
            "test",
            "investigate",
        );
        assert_eq!(finding.confidence, 0.0);
    }

    #[test]
    fn test_finding_builders() {
        let finding = Finding::new(
            PatternType::Smurfing,
            RiskLevel::Medium,
            0.6,
            "coordinated inbound transfers",
            "investigate",
        )
        .with_accounts(["ACC_B", "ACC_A", "ACC_B"])
        .with_transactions(["t1", "t2"]);

        assert_eq!(finding.affected_accounts.len(), 2);
        assert_eq!(
            finding.affected_accounts.iter().next().map(String::as_str),
            Some("ACC_A")
        );
        assert_eq!(finding.transaction_ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_warning_roundtrip() {
        let warning = AnalysisWarning::new(
            "patterns/layering",
            WarningReason::Truncated,
            "finding cap reached",
        );
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"truncated\""));
    }
}
