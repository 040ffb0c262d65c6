//! Internal grouping helpers shared by the detectors.

use amlscan_core::types::{EnrichedRecord, TransactionTable};
use std::collections::{BTreeMap, BTreeSet};

/// Records grouped by source account, groups keyed deterministically.
/// Within a group, records keep table (timestamp) order.
pub(crate) fn by_source(table: &TransactionTable) -> BTreeMap<&str, Vec<&EnrichedRecord>> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedRecord>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry(record.record.source_account.as_str())
            .or_default()
            .push(record);
    }
    groups
}

/// Records grouped by target account.
pub(crate) fn by_target(table: &TransactionTable) -> BTreeMap<&str, Vec<&EnrichedRecord>> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedRecord>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry(record.record.target_account.as_str())
            .or_default()
            .push(record);
    }
    groups
}

/// Every account appearing as a source or target, sorted.
pub(crate) fn all_accounts(table: &TransactionTable) -> BTreeSet<&str> {
    let mut accounts = BTreeSet::new();
    for record in table.records() {
        accounts.insert(record.record.source_account.as_str());
        accounts.insert(record.record.target_account.as_str());
    }
    accounts
}

/// Transaction identifiers of a record slice, skipping empty ids.
pub(crate) fn transaction_ids(records: &[&EnrichedRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.record.id.is_empty())
        .map(|r| r.record.id.clone())
        .collect()
}
