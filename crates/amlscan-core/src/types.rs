//! Transaction records, enumerations, and the validated transaction table.

use crate::error::{AnalyzerError, Result};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single normalized transfer record.
///
/// Produced by the upstream ingestion layer; field names and semantics are
/// fixed at this boundary (no fuzzy column mapping happens here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier (kept for evidence trails).
    pub id: String,
    /// Source account identifier.
    pub source_account: String,
    /// Target account identifier.
    pub target_account: String,
    /// Transfer amount; must be positive and finite.
    pub amount: f64,
    /// Currency code.
    pub currency: String,
    /// Transaction timestamp.
    pub timestamp: DateTime<Utc>,
    /// Institution code of the originating bank, when known.
    pub origin_institution: Option<String>,
    /// Institution code of the destination bank, when known.
    pub destination_institution: Option<String>,
}

impl TransactionRecord {
    /// Create a record with the required fields; currency defaults to USD.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            source_account: source.into(),
            target_account: target.into(),
            amount,
            currency: "USD".to_string(),
            timestamp,
            origin_institution: None,
            destination_institution: None,
        }
    }

    /// Set the currency code.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set origin and destination institution codes.
    #[must_use]
    pub fn with_institutions(
        mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.origin_institution = Some(origin.into());
        self.destination_institution = Some(destination.into());
        self
    }
}

/// A validated record with per-transaction features derived once.
///
/// Detectors read these precomputed features instead of mutating shared
/// scratch columns, which keeps the suite order-independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// The underlying record with trimmed account identifiers.
    pub record: TransactionRecord,
    /// Calendar day of the transaction (UTC).
    pub day: NaiveDate,
    /// Hour of day in [0, 23] (UTC).
    pub hour: u32,
    /// Whether the amount is a round multiple of $1,000 (and at least $1,000).
    pub is_round: bool,
}

impl EnrichedRecord {
    /// True when both institution codes are present and differ.
    #[must_use]
    pub fn is_cross_institution(&self) -> bool {
        match (
            &self.record.origin_institution,
            &self.record.destination_institution,
        ) {
            (Some(origin), Some(dest)) => origin != dest,
            _ => false,
        }
    }
}

/// Validated, timestamp-ordered collection of transactions.
///
/// Construction drops records whose source or target account is empty (or
/// the literal "nan") after trimming, or whose amount is non-positive.
/// Non-finite amounts abort construction: they indicate a broken upstream
/// adapter rather than a single bad row.
#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    records: Vec<EnrichedRecord>,
    dropped: usize,
}

fn canonical_account(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl TransactionTable {
    /// Build a table from raw records.
    ///
    /// Records are sorted by timestamp (stable, so input order breaks ties)
    /// and enriched with derived per-transaction features.
    pub fn from_records(records: Vec<TransactionRecord>) -> Result<Self> {
        let input_len = records.len();
        let mut enriched = Vec::with_capacity(input_len);

        for mut record in records {
            if !record.amount.is_finite() {
                return Err(AnalyzerError::validation(format!(
                    "transaction '{}' has a non-finite amount",
                    record.id
                )));
            }
            let (source, target) = match (
                canonical_account(&record.source_account),
                canonical_account(&record.target_account),
            ) {
                (Some(s), Some(t)) => (s, t),
                _ => continue,
            };
            if record.amount <= 0.0 {
                continue;
            }
            record.source_account = source;
            record.target_account = target;

            let day = record.timestamp.date_naive();
            let hour = record.timestamp.hour();
            let is_round = record.amount % 1000.0 == 0.0 && record.amount >= 1000.0;
            enriched.push(EnrichedRecord {
                record,
                day,
                hour,
                is_round,
            });
        }

        enriched.sort_by_key(|e| e.record.timestamp);
        let dropped = input_len - enriched.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped malformed transaction records");
        }

        Ok(Self {
            records: enriched,
            dropped,
        })
    }

    /// All retained records in timestamp order.
    #[must_use]
    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records dropped during validation.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }
}

/// Closed enumeration of detectable laundering patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Splitting funds into sub-threshold amounts.
    Structuring,
    /// Long chains through intermediary accounts.
    Layering,
    /// Funds returning to their origin through a cycle.
    CircularTransactions,
    /// Similar amounts moving within a short window.
    RapidMovement,
    /// A day's transaction count far above the account's norm.
    VelocityAnomaly,
    /// Dominance of round $1,000-multiple amounts.
    RoundAmount,
    /// Many small inbound transfers from distinct sources.
    Smurfing,
    /// High activity with few counterparties over a short span.
    ShellCompany,
    /// High share of cross-institution transfers.
    UnusualGeography,
    /// Transactions concentrated in unusual hours.
    TimeAnomaly,
    /// Betweenness centrality above the population percentile.
    GraphCentralityAnomaly,
    /// Account touching multiple graph bridges.
    BridgeAccount,
    /// Degree far above the population mean.
    HubAccount,
    /// Dense, internally-focused connected component.
    IsolatedCluster,
    /// Highly unequal inflow or outflow distribution.
    FlowConcentration,
    /// Local clustering coefficient far above the norm.
    NetworkDensityAnomaly,
    /// Account sitting on many shortest paths.
    BetweennessExploitation,
    /// Eigenvector centrality dominating the network.
    EigenvectorDominance,
    /// Community with few edges to the rest of the graph.
    CommunityIsolation,
    /// Component diameter far above the random-graph expectation.
    GraphDiameterAnomaly,
}

impl PatternType {
    /// All pattern types, in detector execution order.
    pub const ALL: &'static [PatternType] = &[
        PatternType::Structuring,
        PatternType::Layering,
        PatternType::CircularTransactions,
        PatternType::RapidMovement,
        PatternType::VelocityAnomaly,
        PatternType::RoundAmount,
        PatternType::Smurfing,
        PatternType::TimeAnomaly,
        PatternType::UnusualGeography,
        PatternType::ShellCompany,
        PatternType::GraphCentralityAnomaly,
        PatternType::BridgeAccount,
        PatternType::HubAccount,
        PatternType::IsolatedCluster,
        PatternType::FlowConcentration,
        PatternType::NetworkDensityAnomaly,
        PatternType::BetweennessExploitation,
        PatternType::EigenvectorDominance,
        PatternType::CommunityIsolation,
        PatternType::GraphDiameterAnomaly,
    ];

    /// Stable string form used in report summaries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PatternType::Structuring => "structuring",
            PatternType::Layering => "layering",
            PatternType::CircularTransactions => "circular_transactions",
            PatternType::RapidMovement => "rapid_movement",
            PatternType::VelocityAnomaly => "velocity_anomaly",
            PatternType::RoundAmount => "round_amount",
            PatternType::Smurfing => "smurfing",
            PatternType::ShellCompany => "shell_company",
            PatternType::UnusualGeography => "unusual_geography",
            PatternType::TimeAnomaly => "time_anomaly",
            PatternType::GraphCentralityAnomaly => "graph_centrality_anomaly",
            PatternType::BridgeAccount => "bridge_account",
            PatternType::HubAccount => "hub_account",
            PatternType::IsolatedCluster => "isolated_cluster",
            PatternType::FlowConcentration => "flow_concentration",
            PatternType::NetworkDensityAnomaly => "network_density_anomaly",
            PatternType::BetweennessExploitation => "betweenness_exploitation",
            PatternType::EigenvectorDominance => "eigenvector_dominance",
            PatternType::CommunityIsolation => "community_isolation",
            PatternType::GraphDiameterAnomaly => "graph_diameter_anomaly",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Worth noting, no immediate action.
    Low,
    /// Review within the normal cycle.
    Medium,
    /// Prioritized investigation.
    High,
    /// Immediate investigation.
    Critical,
}

impl RiskLevel {
    /// Stable string form used in report summaries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
