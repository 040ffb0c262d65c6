//! Account-profile detectors: unusual geography and shell-company
//! characteristics.

use crate::stats::{mean, sample_std};
use crate::suite::{AnalysisContext, Detection, Detector};
use crate::util::{by_source, transaction_ids};
use amlscan_core::detector::DetectorMetadata;
use amlscan_core::error::Result;
use amlscan_core::report::Finding;
use amlscan_core::types::{EnrichedRecord, PatternType, RiskLevel, TransactionTable};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Detects accounts dominated by cross-institution transfers fanning
/// out to several destinations.
#[derive(Debug, Clone)]
pub struct UnusualGeographyDetector {
    metadata: DetectorMetadata,
}

impl Default for UnusualGeographyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UnusualGeographyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/unusual-geography")
                .with_description("High cross-institution activity per source account"),
        }
    }

    /// Flag sources where half or more of their transfers cross
    /// institution boundaries.
    #[must_use]
    pub fn compute(table: &TransactionTable) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (account, records) in by_source(table) {
            if records.len() < 5 {
                continue;
            }
            let cross: Vec<&EnrichedRecord> = records
                .iter()
                .filter(|r| r.is_cross_institution())
                .copied()
                .collect();
            if cross.len() < 3 {
                continue;
            }
            let ratio = cross.len() as f64 / records.len() as f64;
            if ratio < 0.5 {
                continue;
            }

            let destinations: BTreeSet<&str> = cross
                .iter()
                .filter_map(|r| r.record.destination_institution.as_deref())
                .collect();
            let total_cross: f64 = cross.iter().map(|r| r.record.amount).sum();

            let confidence = (ratio * destinations.len() as f64 / 10.0).min(0.7);
            let risk = if destinations.len() >= 3 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("international_ratio".to_string(), json!(ratio));
            evidence.insert("unique_institutions".to_string(), json!(destinations.len()));
            evidence.insert("total_international_amount".to_string(), json!(total_cross));
            evidence.insert(
                "institutions".to_string(),
                json!(destinations.iter().collect::<Vec<_>>()),
            );

            findings.push(
                Finding::new(
                    PatternType::UnusualGeography,
                    risk,
                    confidence,
                    format!(
                        "Account {account} shows high international activity: {:.1}% to {} institutions (${total_cross:.2})",
                        ratio * 100.0,
                        destinations.len()
                    ),
                    "Investigate high international transaction activity",
                )
                .with_accounts([account])
                .with_transactions(transaction_ids(&cross))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for UnusualGeographyDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table)))
    }
}

/// Detects accounts with high volume, few counterparties, and the
/// amount regularity typical of shell companies.
#[derive(Debug, Clone)]
pub struct ShellCompanyDetector {
    metadata: DetectorMetadata,
}

impl Default for ShellCompanyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellCompanyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/shell-company")
                .with_description("Volume, counterparty, and regularity scoring per source"),
        }
    }

    /// Score each source with ten or more transactions to at most
    /// three counterparties; a score of 0.4 or more is a finding.
    #[must_use]
    pub fn compute(table: &TransactionTable) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (account, records) in by_source(table) {
            if records.len() < 10 {
                continue;
            }
            let targets: BTreeSet<&str> = records
                .iter()
                .map(|r| r.record.target_account.as_str())
                .collect();
            if targets.len() > 3 {
                continue;
            }

            let amounts: Vec<f64> = records.iter().map(|r| r.record.amount).collect();
            let avg_amount = mean(&amounts);
            let amount_std = sample_std(&amounts);
            // Table order is timestamp order.
            let first = records[0].record.timestamp;
            let last = records[records.len() - 1].record.timestamp;
            let operational_days = (last - first).num_days() + 1;

            let mut score: f64 = 0.0;
            let mut evidence = BTreeMap::new();
            if records.len() >= 20 && targets.len() <= 2 {
                score += 0.3;
                evidence.insert("concentrated_activity".to_string(), json!(true));
            }
            if operational_days <= 30 && records.len() >= 15 {
                score += 0.2;
                evidence.insert(
                    "short_operational_period".to_string(),
                    json!(operational_days),
                );
            }
            let round_count = records
                .iter()
                .filter(|r| r.record.amount % 1000.0 == 0.0)
                .count();
            let round_ratio = round_count as f64 / records.len() as f64;
            if round_ratio >= 0.7 {
                score += 0.2;
                evidence.insert("high_round_amounts".to_string(), json!(round_ratio));
            }
            if amount_std < avg_amount * 0.1 {
                score += 0.2;
                evidence.insert("regular_amounts".to_string(), json!(true));
            }
            if score < 0.4 {
                continue;
            }

            let total_amount: f64 = amounts.iter().sum();
            let confidence = score.min(0.9);
            let risk = if score >= 0.7 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            evidence.insert("shell_score".to_string(), json!(score));
            evidence.insert("transaction_count".to_string(), json!(records.len()));
            evidence.insert("unique_counterparties".to_string(), json!(targets.len()));
            evidence.insert("operational_days".to_string(), json!(operational_days));
            evidence.insert("total_amount".to_string(), json!(total_amount));

            findings.push(
                Finding::new(
                    PatternType::ShellCompany,
                    risk,
                    confidence,
                    format!(
                        "Account {account} exhibits shell company characteristics: {} transactions to only {} counterparties in {operational_days} days",
                        records.len(),
                        targets.len()
                    ),
                    "Investigate for potential shell company activity",
                )
                .with_accounts([account])
                .with_transactions(transaction_ids(&records))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for ShellCompanyDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table)))
    }
}
