//! Orders findings and rolls them up into a report summary.

use amlscan_core::report::{AnalysisWarning, Finding, Report, ReportSummary};
use amlscan_core::types::RiskLevel;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Collects detector output into a deterministic [`Report`].
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Create an aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sort findings by severity and build the summary.
    #[must_use]
    pub fn aggregate(
        &self,
        mut findings: Vec<Finding>,
        warnings: Vec<AnalysisWarning>,
    ) -> Report {
        // Stable sort keeps detector order for equal keys.
        findings.sort_by(|a, b| {
            b.risk_level
                .cmp(&a.risk_level)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });

        let summary = Self::summarize(&findings);
        Report {
            findings,
            summary,
            warnings,
        }
    }

    fn summarize(findings: &[Finding]) -> ReportSummary {
        let mut risk_distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut pattern_types: BTreeMap<String, usize> = BTreeMap::new();
        let mut accounts: BTreeSet<&str> = BTreeSet::new();
        let mut high_risk_count = 0;
        let mut confidence_total = 0.0;

        for finding in findings {
            *risk_distribution
                .entry(finding.risk_level.as_str().to_string())
                .or_insert(0) += 1;
            *pattern_types
                .entry(finding.pattern_type.as_str().to_string())
                .or_insert(0) += 1;
            accounts.extend(finding.affected_accounts.iter().map(String::as_str));
            if finding.risk_level >= RiskLevel::High {
                high_risk_count += 1;
            }
            confidence_total += finding.confidence;
        }

        let average_confidence = if findings.is_empty() {
            0.0
        } else {
            confidence_total / findings.len() as f64
        };

        let mut recommendations = Vec::new();
        if high_risk_count > 0 {
            recommendations.push(
                "Immediate investigation required for high-risk patterns".to_string(),
            );
            recommendations
                .push("Consider filing suspicious activity reports (SARs)".to_string());
            recommendations.push("Enhanced monitoring of flagged accounts".to_string());
        }

        ReportSummary {
            total_patterns: findings.len(),
            risk_distribution,
            pattern_types,
            high_risk_count,
            average_confidence,
            affected_accounts: accounts.len(),
            recommendations,
            analysis_timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::types::PatternType;

    fn finding(pattern: PatternType, risk: RiskLevel, confidence: f64) -> Finding {
        Finding::new(pattern, risk, confidence, "test", "test")
            .with_accounts([format!("{pattern}-{confidence}")])
    }

    #[test]
    fn test_findings_sorted_by_risk_then_confidence() {
        let aggregator = ResultAggregator::new();
        let report = aggregator.aggregate(
            vec![
                finding(PatternType::RoundAmount, RiskLevel::Low, 0.5),
                finding(PatternType::Structuring, RiskLevel::High, 0.6),
                finding(PatternType::CircularTransactions, RiskLevel::Critical, 0.9),
                finding(PatternType::Smurfing, RiskLevel::High, 0.8),
            ],
            Vec::new(),
        );
        let order: Vec<RiskLevel> = report.findings.iter().map(|f| f.risk_level).collect();
        assert_eq!(
            order,
            vec![
                RiskLevel::Critical,
                RiskLevel::High,
                RiskLevel::High,
                RiskLevel::Low
            ]
        );
        assert!(report.findings[1].confidence > report.findings[2].confidence);
    }

    #[test]
    fn test_summary_counts_and_recommendations() {
        let aggregator = ResultAggregator::new();
        let report = aggregator.aggregate(
            vec![
                finding(PatternType::Structuring, RiskLevel::High, 0.8),
                finding(PatternType::Structuring, RiskLevel::Medium, 0.4),
            ],
            Vec::new(),
        );
        let summary = &report.summary;
        assert_eq!(summary.total_patterns, 2);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.pattern_types["structuring"], 2);
        assert_eq!(summary.risk_distribution["high"], 1);
        assert!((summary.average_confidence - 0.6).abs() < 1e-12);
        assert_eq!(summary.recommendations.len(), 3);
        assert_eq!(summary.affected_accounts, 2);
    }

    #[test]
    fn test_empty_input_yields_empty_summary() {
        let report = ResultAggregator::new().aggregate(Vec::new(), Vec::new());
        assert!(report.findings.is_empty());
        assert_eq!(report.summary.total_patterns, 0);
        assert_eq!(report.summary.average_confidence, 0.0);
        assert!(report.summary.recommendations.is_empty());
    }

    #[test]
    fn test_warnings_pass_through() {
        use amlscan_core::report::WarningReason;
        let report = ResultAggregator::new().aggregate(
            Vec::new(),
            vec![AnalysisWarning::new(
                "patterns/layering",
                WarningReason::Truncated,
                "capped",
            )],
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].detector, "patterns/layering");
    }
}
