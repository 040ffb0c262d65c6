//! Amount-driven detectors: structuring, rapid movement, round amounts,
//! smurfing, and flow concentration.

use crate::stats::{gini_coefficient, mean};
use crate::suite::{AnalysisContext, Detection, Detector};
use crate::util::{by_source, by_target, transaction_ids};
use amlscan_core::config::AnalyzerConfig;
use amlscan_core::detector::DetectorMetadata;
use amlscan_core::error::Result;
use amlscan_core::report::Finding;
use amlscan_core::types::{EnrichedRecord, PatternType, RiskLevel, TransactionTable};
use amlscan_graph::graph::TxGraph;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Structuring
// ============================================================================

/// Detects repeated transactions just below the reporting threshold.
#[derive(Debug, Clone)]
pub struct StructuringDetector {
    metadata: DetectorMetadata,
}

impl Default for StructuringDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuringDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/structuring")
                .with_description("Sub-threshold transaction clustering per source account"),
        }
    }

    /// Flag source accounts with enough sub-threshold transactions,
    /// at least three of which land on a single calendar day.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let threshold = config.structuring_amount;
        let mut findings = Vec::new();

        for (account, records) in by_source(table) {
            let below: Vec<&EnrichedRecord> = records
                .iter()
                .filter(|r| r.record.amount >= threshold * 0.7 && r.record.amount < threshold)
                .copied()
                .collect();
            if below.len() < config.structuring_frequency {
                continue;
            }

            let mut days: BTreeMap<NaiveDate, Vec<&EnrichedRecord>> = BTreeMap::new();
            for record in &below {
                days.entry(record.day).or_default().push(record);
            }
            let burst_days: Vec<&Vec<&EnrichedRecord>> =
                days.values().filter(|group| group.len() >= 3).collect();
            if burst_days.is_empty() {
                continue;
            }

            let total_amount: f64 = burst_days
                .iter()
                .flat_map(|group| group.iter())
                .map(|r| r.record.amount)
                .sum();
            let amounts: Vec<f64> = below.iter().map(|r| r.record.amount).collect();
            let first = below.iter().map(|r| r.record.timestamp).min();
            let last = below.iter().map(|r| r.record.timestamp).max();
            let span_days = match (first, last) {
                (Some(first), Some(last)) => (last - first).num_days(),
                _ => 0,
            };

            let confidence = (below.len() as f64 / 10.0 * 0.8).min(0.95);
            let risk = if confidence > 0.8 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("transaction_count".to_string(), json!(below.len()));
            evidence.insert("total_amount".to_string(), json!(total_amount));
            evidence.insert("average_amount".to_string(), json!(mean(&amounts)));
            evidence.insert("time_span_days".to_string(), json!(span_days));

            findings.push(
                Finding::new(
                    PatternType::Structuring,
                    risk,
                    confidence,
                    format!(
                        "Account {account} conducted {} transactions just below ${threshold:.2} threshold, totaling ${total_amount:.2}",
                        below.len()
                    ),
                    "Investigate for potential structuring to avoid reporting requirements",
                )
                .with_accounts([account])
                .with_transactions(transaction_ids(&below))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for StructuringDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}

// ============================================================================
// Rapid Movement
// ============================================================================

/// Detects similar amounts moving through several accounts within a
/// short sliding window.
#[derive(Debug, Clone)]
pub struct RapidMovementDetector {
    metadata: DetectorMetadata,
}

impl Default for RapidMovementDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RapidMovementDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/rapid-movement")
                .with_description("Similar amounts moving within a sliding time window"),
        }
    }

    /// Group transactions by amount rounded to the nearest $1,000 and
    /// slide a three-transaction window over each group.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let window = Duration::hours(config.rapid_movement_hours);
        let mut findings = Vec::new();

        // Table order is timestamp order, so groups stay sorted.
        let mut buckets: BTreeMap<i64, Vec<&EnrichedRecord>> = BTreeMap::new();
        for record in table.records() {
            let bucket = (record.record.amount / 1000.0).round() as i64;
            buckets.entry(bucket).or_default().push(record);
        }

        for group in buckets.values().filter(|g| g.len() >= 3) {
            for chunk in group.windows(3) {
                let span = chunk[2].record.timestamp - chunk[0].record.timestamp;
                if span > window {
                    continue;
                }
                let mut accounts = BTreeSet::new();
                for record in chunk {
                    accounts.insert(record.record.source_account.clone());
                    accounts.insert(record.record.target_account.clone());
                }
                let total_amount: f64 = chunk.iter().map(|r| r.record.amount).sum();
                let span_hours = span.num_seconds() as f64 / 3600.0;

                let confidence = (accounts.len() as f64 / 5.0 * 0.7).min(0.9);
                let risk = if accounts.len() >= 4 {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                };

                let mut evidence = BTreeMap::new();
                evidence.insert("accounts_count".to_string(), json!(accounts.len()));
                evidence.insert("total_amount".to_string(), json!(total_amount));
                evidence.insert("time_span_hours".to_string(), json!(span_hours));
                evidence.insert("transaction_count".to_string(), json!(chunk.len()));

                findings.push(
                    Finding::new(
                        PatternType::RapidMovement,
                        risk,
                        confidence,
                        format!(
                            "Rapid movement of ${total_amount:.2} through {} accounts within {span_hours:.1} hours",
                            accounts.len()
                        ),
                        "Investigate rapid fund movement pattern",
                    )
                    .with_accounts(accounts)
                    .with_transactions(transaction_ids(chunk))
                    .with_evidence(evidence),
                );
            }
        }
        findings
    }
}

#[async_trait]
impl Detector for RapidMovementDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}

// ============================================================================
// Round Amount
// ============================================================================

/// Detects source accounts dominated by round $1,000-multiple amounts.
#[derive(Debug, Clone)]
pub struct RoundAmountDetector {
    metadata: DetectorMetadata,
}

impl Default for RoundAmountDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundAmountDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/round-amount")
                .with_description("High share of round-amount transactions per source"),
        }
    }

    /// Flag accounts whose round-amount ratio meets the threshold.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (account, records) in by_source(table) {
            if records.len() < 5 {
                continue;
            }
            let round: Vec<&EnrichedRecord> =
                records.iter().filter(|r| r.is_round).copied().collect();
            let ratio = round.len() as f64 / records.len() as f64;
            if ratio < config.round_amount_threshold {
                continue;
            }
            let total_round: f64 = round.iter().map(|r| r.record.amount).sum();

            let confidence = (ratio * 0.9).min(0.85);
            let risk = if ratio >= 0.9 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("round_ratio".to_string(), json!(ratio));
            evidence.insert("round_transaction_count".to_string(), json!(round.len()));
            evidence.insert("total_round_amount".to_string(), json!(total_round));
            evidence.insert("total_transactions".to_string(), json!(records.len()));

            findings.push(
                Finding::new(
                    PatternType::RoundAmount,
                    risk,
                    confidence,
                    format!(
                        "Account {account} has {:.1}% round amount transactions (${total_round:.2} total)",
                        ratio * 100.0
                    ),
                    "Investigate high frequency of round amount transactions",
                )
                .with_accounts([account])
                .with_transactions(transaction_ids(&round))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for RoundAmountDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}

// ============================================================================
// Smurfing
// ============================================================================

/// Detects many small same-day transfers from distinct sources into one
/// recipient.
#[derive(Debug, Clone)]
pub struct SmurfingDetector {
    metadata: DetectorMetadata,
}

impl Default for SmurfingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SmurfingDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/smurfing")
                .with_description("Coordinated small inbound transfers from many sources"),
        }
    }

    /// Inspect the top recipients by inbound transaction count.
    #[must_use]
    pub fn compute(table: &TransactionTable, config: &AnalyzerConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        let grouped = by_target(table);
        let mut ranked: Vec<(&str, usize)> = grouped
            .iter()
            .map(|(account, records)| (*account, records.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(config.smurfing_top_recipients);

        for (target, _) in ranked {
            let mut days: BTreeMap<NaiveDate, Vec<&EnrichedRecord>> = BTreeMap::new();
            for record in &grouped[target] {
                days.entry(record.day).or_default().push(record);
            }

            for (day, day_txns) in &days {
                if day_txns.len() < 5 {
                    continue;
                }
                let sources: BTreeSet<&str> = day_txns
                    .iter()
                    .map(|r| r.record.source_account.as_str())
                    .collect();
                let amounts: Vec<f64> = day_txns.iter().map(|r| r.record.amount).collect();
                let average = mean(&amounts);
                if sources.len() < 3 || average >= config.smurfing_max_average {
                    continue;
                }
                let total_amount: f64 = amounts.iter().sum();

                let confidence =
                    ((sources.len() * day_txns.len()) as f64 / 50.0 * 0.8).min(0.9);
                let risk = if sources.len() >= 5 {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                };

                let mut evidence = BTreeMap::new();
                evidence.insert("transaction_count".to_string(), json!(day_txns.len()));
                evidence.insert("unique_sources".to_string(), json!(sources.len()));
                evidence.insert("total_amount".to_string(), json!(total_amount));
                evidence.insert("average_amount".to_string(), json!(average));
                evidence.insert("date".to_string(), json!(day.to_string()));

                let mut accounts: BTreeSet<&str> = sources.clone();
                accounts.insert(target);
                findings.push(
                    Finding::new(
                        PatternType::Smurfing,
                        risk,
                        confidence,
                        format!(
                            "Potential smurfing detected: {} small transactions from {} sources to {target} on {day}, totaling ${total_amount:.2}",
                            day_txns.len(),
                            sources.len()
                        ),
                        "Investigate coordinated small transactions pattern",
                    )
                    .with_accounts(accounts)
                    .with_transactions(transaction_ids(day_txns))
                    .with_evidence(evidence),
                );
            }
        }
        findings
    }
}

#[async_trait]
impl Detector for SmurfingDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.table, ctx.config)))
    }
}

// ============================================================================
// Flow Concentration
// ============================================================================

/// Detects funnel accounts whose inflow or outflow distribution is
/// highly unequal (Gini above threshold).
#[derive(Debug, Clone)]
pub struct FlowConcentrationDetector {
    metadata: DetectorMetadata,
}

impl Default for FlowConcentrationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowConcentrationDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/flow-concentration")
                .with_description("Gini concentration of per-account inflows and outflows")
                .with_graph(),
        }
    }

    /// Examine every node with at least two inflow sources and two
    /// outflow targets.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &AnalyzerConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for u in 0..graph.node_count() {
            let inflows: Vec<f64> = graph
                .predecessors(u)
                .iter()
                .filter_map(|&p| graph.edge(p, u))
                .map(|e| e.weight)
                .collect();
            let outflows: Vec<f64> = graph
                .successors(u)
                .iter()
                .filter_map(|&s| graph.edge(u, s))
                .map(|e| e.weight)
                .collect();
            if inflows.len() < 2 || outflows.len() < 2 {
                continue;
            }

            let inflow_gini = gini_coefficient(&inflows);
            let outflow_gini = gini_coefficient(&outflows);
            let worst = inflow_gini.max(outflow_gini);
            if worst <= config.flow_concentration_ratio {
                continue;
            }

            let total_inflow: f64 = inflows.iter().sum();
            let total_outflow: f64 = outflows.iter().sum();
            let confidence = worst.min(0.9);
            let risk = if worst > 0.9 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("inflow_gini".to_string(), json!(inflow_gini));
            evidence.insert("outflow_gini".to_string(), json!(outflow_gini));
            evidence.insert("total_inflow".to_string(), json!(total_inflow));
            evidence.insert("total_outflow".to_string(), json!(total_outflow));
            evidence.insert("num_inflow_sources".to_string(), json!(inflows.len()));
            evidence.insert("num_outflow_targets".to_string(), json!(outflows.len()));

            findings.push(
                Finding::new(
                    PatternType::FlowConcentration,
                    risk,
                    confidence,
                    format!(
                        "Account {} shows high flow concentration (Gini: in={inflow_gini:.2}, out={outflow_gini:.2}) with ${:.2} total flow",
                        graph.node(u),
                        total_inflow + total_outflow
                    ),
                    "Investigate concentrated flow patterns for potential funnel account",
                )
                .with_accounts([graph.node(u)])
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for FlowConcentrationDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.graph, ctx.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::types::TransactionRecord;
    use chrono::{TimeZone, Utc};

    fn ts(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    fn table(records: Vec<TransactionRecord>) -> TransactionTable {
        TransactionTable::from_records(records).unwrap()
    }

    fn structuring_transactions() -> Vec<TransactionRecord> {
        // Six sub-threshold transfers, five on the same day.
        (0..6)
            .map(|i| {
                let day = if i < 5 { 10 } else { 11 };
                TransactionRecord::new(
                    format!("t{i}"),
                    "ACC_S",
                    format!("ACC_T{i}"),
                    9_800.0,
                    ts(day, 9 + i as u32 % 5, 0),
                )
            })
            .collect()
    }

    #[test]
    fn test_structuring_detects_same_day_burst() {
        let config = AnalyzerConfig::default();
        let findings = StructuringDetector::compute(&table(structuring_transactions()), &config);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.pattern_type, PatternType::Structuring);
        assert!(finding.affected_accounts.contains("ACC_S"));
        assert_eq!(finding.risk_level, RiskLevel::Medium); // 6/10 * 0.8 = 0.48
        assert_eq!(finding.evidence["transaction_count"], json!(6));
    }

    #[test]
    fn test_structuring_ignores_spread_out_transactions() {
        // Five sub-threshold transfers on five different days.
        let records = (0..5)
            .map(|i| {
                TransactionRecord::new(
                    format!("t{i}"),
                    "ACC_S",
                    "ACC_T",
                    9_500.0,
                    ts(10 + i as u32, 9, 0),
                )
            })
            .collect();
        let config = AnalyzerConfig::default();
        assert!(StructuringDetector::compute(&table(records), &config).is_empty());
    }

    #[test]
    fn test_structuring_ignores_amounts_outside_band() {
        let records = (0..6)
            .map(|i| {
                TransactionRecord::new(format!("t{i}"), "ACC_S", "ACC_T", 5_000.0, ts(10, 9, i))
            })
            .collect();
        let config = AnalyzerConfig::default();
        assert!(StructuringDetector::compute(&table(records), &config).is_empty());
    }

    #[test]
    fn test_rapid_movement_window() {
        let records = vec![
            TransactionRecord::new("t0", "A", "B", 5_000.0, ts(10, 1, 0)),
            TransactionRecord::new("t1", "B", "C", 5_100.0, ts(10, 5, 0)),
            TransactionRecord::new("t2", "C", "D", 4_900.0, ts(10, 9, 0)),
        ];
        let config = AnalyzerConfig::default();
        let findings = RapidMovementDetector::compute(&table(records), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].risk_level, RiskLevel::High); // 4 accounts involved
        assert_eq!(findings[0].evidence["accounts_count"], json!(4));
    }

    #[test]
    fn test_rapid_movement_respects_window() {
        let records = vec![
            TransactionRecord::new("t0", "A", "B", 5_000.0, ts(10, 1, 0)),
            TransactionRecord::new("t1", "B", "C", 5_000.0, ts(12, 1, 0)),
            TransactionRecord::new("t2", "C", "D", 5_000.0, ts(14, 1, 0)),
        ];
        let config = AnalyzerConfig::default();
        assert!(RapidMovementDetector::compute(&table(records), &config).is_empty());
    }

    #[test]
    fn test_round_amount_full_ratio_is_medium() {
        let records = (0..5)
            .map(|i| {
                TransactionRecord::new(
                    format!("t{i}"),
                    "ACC_R",
                    format!("ACC_T{i}"),
                    (1 + i as i64) as f64 * 1000.0,
                    ts(10 + i as u32, 9, 0),
                )
            })
            .collect();
        let config = AnalyzerConfig::default();
        let findings = RoundAmountDetector::compute(&table(records), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence["round_ratio"], json!(1.0));
        assert_eq!(findings[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_round_amount_below_threshold_silent() {
        // 3 of 5 round: ratio 0.6 below the 0.8 default.
        let records = vec![
            TransactionRecord::new("t0", "ACC_R", "X", 1000.0, ts(10, 1, 0)),
            TransactionRecord::new("t1", "ACC_R", "X", 2000.0, ts(10, 2, 0)),
            TransactionRecord::new("t2", "ACC_R", "X", 3000.0, ts(10, 3, 0)),
            TransactionRecord::new("t3", "ACC_R", "X", 1234.0, ts(10, 4, 0)),
            TransactionRecord::new("t4", "ACC_R", "X", 567.0, ts(10, 5, 0)),
        ];
        let config = AnalyzerConfig::default();
        assert!(RoundAmountDetector::compute(&table(records), &config).is_empty());
    }

    #[test]
    fn test_smurfing_same_day_many_sources() {
        let records = (0..6)
            .map(|i| {
                TransactionRecord::new(
                    format!("t{i}"),
                    format!("SRC_{i}"),
                    "SINK",
                    800.0,
                    ts(10, 8 + i as u32, 0),
                )
            })
            .collect();
        let config = AnalyzerConfig::default();
        let findings = SmurfingDetector::compute(&table(records), &config);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.risk_level, RiskLevel::High); // 6 distinct sources
        assert!(finding.affected_accounts.contains("SINK"));
        assert_eq!(finding.affected_accounts.len(), 7);
    }

    #[test]
    fn test_smurfing_large_amounts_not_flagged() {
        let records = (0..6)
            .map(|i| {
                TransactionRecord::new(
                    format!("t{i}"),
                    format!("SRC_{i}"),
                    "SINK",
                    50_000.0,
                    ts(10, 8 + i as u32, 0),
                )
            })
            .collect();
        let config = AnalyzerConfig::default();
        assert!(SmurfingDetector::compute(&table(records), &config).is_empty());
    }

    #[test]
    fn test_flow_concentration_skewed_inflows() {
        // Six inflows, one dominant: Gini is about 0.833 for the
        // inbound distribution, clearing the 0.8 gate.
        let mut records = vec![
            TransactionRecord::new("big", "WHALE", "HUB", 1_000_000.0, ts(10, 1, 0)),
        ];
        for i in 0..5 {
            records.push(TransactionRecord::new(
                format!("in{i}"),
                format!("MINNOW_{i}"),
                "HUB",
                10.0,
                ts(10, 2 + i as u32, 0),
            ));
        }
        records.push(TransactionRecord::new("o1", "HUB", "OUT_A", 500.0, ts(11, 1, 0)));
        records.push(TransactionRecord::new("o2", "HUB", "OUT_B", 500.0, ts(11, 2, 0)));

        let graph = TxGraph::build(&table(records));
        let config = AnalyzerConfig::default();
        let findings = FlowConcentrationDetector::compute(&graph, &config);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].affected_accounts.contains("HUB"));
        assert_eq!(findings[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_flow_concentration_even_flows_silent() {
        let records = vec![
            TransactionRecord::new("i1", "A", "HUB", 100.0, ts(10, 1, 0)),
            TransactionRecord::new("i2", "B", "HUB", 100.0, ts(10, 2, 0)),
            TransactionRecord::new("i3", "C", "HUB", 100.0, ts(10, 3, 0)),
            TransactionRecord::new("o1", "HUB", "D", 150.0, ts(10, 4, 0)),
            TransactionRecord::new("o2", "HUB", "E", 150.0, ts(10, 5, 0)),
        ];
        let graph = TxGraph::build(&table(records));
        let config = AnalyzerConfig::default();
        assert!(FlowConcentrationDetector::compute(&graph, &config).is_empty());
    }
}
