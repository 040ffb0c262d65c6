//! # AMLScan Core
//!
//! Shared domain types for the AML pattern detection engine:
//! - Transaction records and the validated transaction table
//! - Pattern and risk enumerations
//! - Findings, warnings, and the analysis report
//! - Detector metadata and the threshold configuration bundle
//! - The error taxonomy (`AnalyzerError`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod detector;
pub mod error;
pub mod report;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::AnalyzerConfig;
    pub use crate::detector::{DetectorCost, DetectorMetadata};
    pub use crate::error::{AnalyzerError, Result};
    pub use crate::report::{AnalysisWarning, Finding, Report, ReportSummary, WarningReason};
    pub use crate::types::{
        EnrichedRecord, PatternType, RiskLevel, TransactionRecord, TransactionTable,
    };
}
