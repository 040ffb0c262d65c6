//! End-to-end runs of the full pipeline over small scenarios.

use amlscan_core::config::AnalyzerConfig;
use amlscan_core::types::{PatternType, RiskLevel, TransactionRecord};
use amlscan_patterns::engine::PatternEngine;
use chrono::{TimeZone, Utc};
use serde_json::json;

fn ts(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
}

fn engine() -> PatternEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    PatternEngine::new(AnalyzerConfig::default()).unwrap()
}

#[tokio::test]
async fn empty_batch_yields_empty_report() {
    let report = engine().analyze(Vec::new()).await.unwrap();
    assert_eq!(report.summary.total_patterns, 0);
    assert_eq!(report.summary.affected_accounts, 0);
    assert!(report.summary.recommendations.is_empty());
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn structuring_burst_is_reported() {
    // Six transfers of $9,800 out of one account on the same day.
    let records: Vec<TransactionRecord> = (0..6)
        .map(|i| {
            TransactionRecord::new(
                format!("t{i}"),
                "ACC_SRC",
                format!("ACC_DST{i}"),
                9_800.0,
                ts(10, 9, i as u32 * 7),
            )
        })
        .collect();

    let report = engine().analyze(records).await.unwrap();
    let structuring: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.pattern_type == PatternType::Structuring)
        .collect();
    assert_eq!(structuring.len(), 1);
    let finding = structuring[0];
    assert!(finding.affected_accounts.contains("ACC_SRC"));
    assert_eq!(finding.evidence["transaction_count"], json!(6));
    assert_eq!(finding.transaction_ids.len(), 6);
    assert!(report.summary.pattern_types.contains_key("structuring"));
}

#[tokio::test]
async fn circular_flow_is_high_risk() {
    let records = vec![
        TransactionRecord::new("t1", "A", "B", 1_500.0, ts(1, 10, 0)),
        TransactionRecord::new("t2", "B", "C", 1_500.0, ts(1, 12, 0)),
        TransactionRecord::new("t3", "C", "A", 1_500.0, ts(1, 14, 0)),
    ];

    let report = engine().analyze(records).await.unwrap();
    let circular: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.pattern_type == PatternType::CircularTransactions)
        .collect();
    assert_eq!(circular.len(), 1);
    let finding = circular[0];
    assert_eq!(finding.risk_level, RiskLevel::High);
    for account in ["A", "B", "C"] {
        assert!(finding.affected_accounts.contains(account));
    }
    assert_eq!(finding.evidence["total_amount"], json!(4_500.0));
    assert!(report.summary.high_risk_count >= 1);
    assert_eq!(report.summary.recommendations.len(), 3);
}

#[tokio::test]
async fn round_amounts_are_reported() {
    let records: Vec<TransactionRecord> = (0..5)
        .map(|i| {
            TransactionRecord::new(
                format!("t{i}"),
                "ACC_R",
                format!("DST{i}"),
                (i as f64 + 1.0) * 1_000.0,
                ts(1 + i as u32, 11, 0),
            )
        })
        .collect();

    let report = engine().analyze(records).await.unwrap();
    let round: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.pattern_type == PatternType::RoundAmount)
        .collect();
    assert_eq!(round.len(), 1);
    assert_eq!(round[0].risk_level, RiskLevel::Medium);
    assert_eq!(round[0].evidence["round_ratio"], json!(1.0));
}

#[tokio::test]
async fn malformed_records_are_dropped_not_fatal() {
    let records = vec![
        TransactionRecord::new("ok", "A", "B", 500.0, ts(1, 10, 0)),
        TransactionRecord::new("no-target", "A", "", 500.0, ts(1, 11, 0)),
        TransactionRecord::new("nan-id", "nan", "B", 500.0, ts(1, 12, 0)),
        TransactionRecord::new("negative", "A", "B", -500.0, ts(1, 13, 0)),
    ];

    let report = engine().analyze(records).await.unwrap();
    for finding in &report.findings {
        assert!(!finding.affected_accounts.contains(""));
        assert!(!finding.affected_accounts.contains("nan"));
    }
}

#[tokio::test]
async fn findings_are_ranked_by_severity() {
    // A circular flow (high) alongside a round-amount pattern (medium).
    let mut records = vec![
        TransactionRecord::new("c1", "A", "B", 1_500.0, ts(1, 10, 0)),
        TransactionRecord::new("c2", "B", "C", 1_500.0, ts(1, 12, 0)),
        TransactionRecord::new("c3", "C", "A", 1_500.0, ts(1, 14, 0)),
    ];
    for i in 0..5 {
        records.push(TransactionRecord::new(
            format!("r{i}"),
            "ACC_R",
            format!("DST{i}"),
            2_000.0,
            ts(2 + i as u32, 11, 0),
        ));
    }

    let report = engine().analyze(records).await.unwrap();
    for pair in report.findings.windows(2) {
        assert!(pair[0].risk_level >= pair[1].risk_level);
        if pair[0].risk_level == pair[1].risk_level {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}

#[tokio::test]
async fn analysis_is_deterministic() {
    let records: Vec<TransactionRecord> = vec![
        TransactionRecord::new("c1", "A", "B", 1_500.0, ts(1, 10, 0)),
        TransactionRecord::new("c2", "B", "C", 1_500.0, ts(1, 12, 0)),
        TransactionRecord::new("c3", "C", "A", 1_500.0, ts(1, 14, 0)),
        TransactionRecord::new("s1", "D", "E", 9_900.0, ts(2, 9, 0)),
        TransactionRecord::new("s2", "D", "E", 9_900.0, ts(2, 10, 0)),
        TransactionRecord::new("s3", "D", "E", 9_900.0, ts(2, 11, 0)),
        TransactionRecord::new("s4", "D", "E", 9_900.0, ts(2, 12, 0)),
        TransactionRecord::new("s5", "D", "E", 9_900.0, ts(2, 13, 0)),
    ];

    let first = engine().analyze(records.clone()).await.unwrap();
    let second = engine().analyze(records).await.unwrap();

    assert_eq!(first.findings.len(), second.findings.len());
    for (a, b) in first.findings.iter().zip(&second.findings) {
        assert_eq!(a.pattern_type, b.pattern_type);
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        assert_eq!(a.description, b.description);
        assert_eq!(a.affected_accounts, b.affected_accounts);
        assert_eq!(a.transaction_ids, b.transaction_ids);
        assert_eq!(a.evidence, b.evidence);
    }
}
