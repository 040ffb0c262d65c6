//! Timing-driven detectors: velocity anomalies and unusual-hour activity.

use crate::suite::{AnalysisContext, Detection, Detector};
use crate::util::{all_accounts, by_source, transaction_ids};
use amlscan_core::config::AnalyzerConfig;
use amlscan_core::detector::DetectorMetadata;
use amlscan_core::error::Result;
use amlscan_core::report::Finding;
use amlscan_core::types::{EnrichedRecord, PatternType, RiskLevel, TransactionTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::BTreeMap;

/// Detects accounts whose daily transaction count spikes far above
/// their own baseline.
#[derive(Debug, Clone)]
pub struct VelocityAnomalyDetector {
    metadata: DetectorMetadata,
}

impl Default for VelocityAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityAnomalyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/velocity-anomaly")
                .with_description("Daily transaction-count spikes against a per-account baseline"),
        }
    }

    /// Examine each account (as source or target) with at least five
    /// transactions spanning at least three distinct days.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for account in all_accounts(table) {
            let involved: Vec<&EnrichedRecord> = table
                .records()
                .iter()
                .filter(|r| {
                    r.record.source_account == account || r.record.target_account == account
                })
                .collect();
            if involved.len() < 5 {
                continue;
            }

            let mut daily_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
            for record in &involved {
                *daily_counts.entry(record.day).or_insert(0) += 1;
            }
            if daily_counts.len() < 3 {
                continue;
            }

            let counts: Vec<f64> = daily_counts.values().map(|&c| c as f64).collect();
            let mean_velocity = crate::stats::mean(&counts);
            let std_velocity = crate::stats::sample_std(&counts);
            if std_velocity <= 0.0 {
                continue;
            }

            let cutoff = mean_velocity + config.velocity_multiplier * std_velocity;
            // Earliest day wins ties on the peak count.
            let peak = daily_counts
                .iter()
                .filter(|(_, &count)| (count as f64) > cutoff)
                .max_by_key(|(day, &count)| (count, std::cmp::Reverse(*day)));
            let Some((&peak_day, &peak_count)) = peak else {
                continue;
            };

            let ratio = peak_count as f64 / mean_velocity;
            let confidence =
                ((peak_count as f64 - mean_velocity) / mean_velocity * 0.5).min(0.9);
            let risk = if peak_count as f64 > mean_velocity * 5.0 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("normal_velocity".to_string(), json!(mean_velocity));
            evidence.insert("anomalous_velocity".to_string(), json!(peak_count));
            evidence.insert("anomalous_date".to_string(), json!(peak_day.to_string()));
            evidence.insert("velocity_ratio".to_string(), json!(ratio));

            findings.push(
                Finding::new(
                    PatternType::VelocityAnomaly,
                    risk,
                    confidence,
                    format!(
                        "Account {account} showed unusual transaction velocity: {peak_count} transactions on {peak_day} (normal: {mean_velocity:.1})"
                    ),
                    "Investigate unusual transaction velocity pattern",
                )
                .with_accounts([account])
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for VelocityAnomalyDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}

/// Detects accounts that transact heavily during late-night hours.
#[derive(Debug, Clone)]
pub struct TimeAnomalyDetector {
    metadata: DetectorMetadata,
}

impl Default for TimeAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeAnomalyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/time-anomaly")
                .with_description("High share of activity during unusual hours"),
        }
    }

    fn is_unusual(hour: u32, config: &AnalyzerConfig) -> bool {
        let (start, end) = config.unusual_hours;
        // The window wraps midnight: [start, 23] plus [0, end].
        hour >= start || hour <= end
    }

    /// Flag source accounts with ten or more transactions where at
    /// least 30% fall inside the unusual-hours window.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (account, records) in by_source(table) {
            if records.len() < 10 {
                continue;
            }
            let unusual: Vec<&EnrichedRecord> = records
                .iter()
                .filter(|r| Self::is_unusual(r.hour, config))
                .copied()
                .collect();
            let ratio = unusual.len() as f64 / records.len() as f64;
            if ratio < 0.3 {
                continue;
            }

            let total_unusual: f64 = unusual.iter().map(|r| r.record.amount).sum();
            let mut hour_counts: BTreeMap<u32, usize> = BTreeMap::new();
            for record in &unusual {
                *hour_counts.entry(record.hour).or_insert(0) += 1;
            }
            // Smallest hour wins ties, matching the ascending map order.
            let mode_hour = hour_counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(&hour, _)| hour);

            let confidence = (ratio * 0.9).min(0.8);
            let risk = if ratio >= 0.5 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("unusual_ratio".to_string(), json!(ratio));
            evidence.insert("unusual_transaction_count".to_string(), json!(unusual.len()));
            evidence.insert("total_unusual_amount".to_string(), json!(total_unusual));
            evidence.insert("most_common_hour".to_string(), json!(mode_hour));

            findings.push(
                Finding::new(
                    PatternType::TimeAnomaly,
                    risk,
                    confidence,
                    format!(
                        "Account {account} conducts {:.1}% of transactions during unusual hours (${total_unusual:.2})",
                        ratio * 100.0
                    ),
                    "Investigate transactions occurring at unusual hours",
                )
                .with_accounts([account])
                .with_transactions(transaction_ids(&unusual))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for TimeAnomalyDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}
