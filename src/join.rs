//! Left join of enriched tracts with food-access records.

use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::enrich::EnrichedTract;
use crate::error::{PipelineError, Result};
use crate::food_access::FoodAccessRecord;
use crate::tract::TractId;

const STAGE: &str = "join";

/// Access fields copied from the matching food-access record.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessFields {
    pub low_access: bool,
    pub poverty_rate: Option<f64>,
}

/// An enriched tract with its food-access fields, `None` when unmatched.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTract {
    pub tract: EnrichedTract,
    pub access: Option<AccessFields>,
}

impl JoinedTract {
    /// The low-access flag for matched tracts.
    pub fn low_access(&self) -> Option<bool> {
        self.access.as_ref().map(|a| a.low_access)
    }
}

/// Indexes food-access records by tract, rejecting duplicate keys.
pub fn index_records(records: &[FoodAccessRecord]) -> Result<HashMap<TractId, &FoodAccessRecord>> {
    let mut index: HashMap<TractId, &FoodAccessRecord> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(first) = index.insert(record.tract_id, record) {
            return Err(PipelineError::integrity(
                STAGE,
                Some(record.row),
                Some(&record.tract_id.to_string()),
                format!(
                    "duplicate food-access key, first seen at row {}",
                    first.row
                ),
            ));
        }
    }
    Ok(index)
}

/// Joins every tract to at most one food-access record.
///
/// The output has exactly one row per input tract, in input order.
///
/// # Errors
///
/// `DataIntegrity` if any tract key occurs more than once in `records`.
#[instrument(skip_all, fields(tracts = tracts.len(), records = records.len()))]
pub fn left_join(tracts: Vec<EnrichedTract>, records: &[FoodAccessRecord]) -> Result<Vec<JoinedTract>> {
    let index = index_records(records)?;

    let joined: Vec<JoinedTract> = tracts
        .into_iter()
        .map(|tract| {
            let access = index.get(&tract.tract_id).map(|r| AccessFields {
                low_access: r.low_access,
                poverty_rate: r.poverty_rate,
            });
            JoinedTract { tract, access }
        })
        .collect();

    let matched = joined.iter().filter(|j| j.access.is_some()).count();
    let unmatched = joined.len() - matched;
    if unmatched > 0 {
        warn!(unmatched, "Tracts without a food-access record are excluded from aggregation");
    }
    info!(rows = joined.len(), matched, unmatched, "Join complete");

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tract::{GroupCounts, GroupShares, MajorityCategory};
    use std::collections::BTreeMap;

    fn tract(id: u64) -> EnrichedTract {
        EnrichedTract {
            tract_id: TractId::parse(&id.to_string()).unwrap(),
            name: None,
            geometry: None,
            total_population: 100,
            population_by_group: GroupCounts::default(),
            group_share: GroupShares::default(),
            majority_category: MajorityCategory::RaciallyDiverse,
        }
    }

    fn record(row: usize, id: &str, low_access: bool) -> FoodAccessRecord {
        FoodAccessRecord {
            row,
            tract_id: TractId::parse(id).unwrap(),
            low_access,
            poverty_rate: Some(12.0),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_left_join_keeps_every_tract() {
        let tracts = vec![tract(1), tract(2), tract(3)];
        let records = vec![record(1, "0001", true), record(2, "3", false), record(3, "99", true)];

        let joined = left_join(tracts, &records).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].low_access(), Some(true));
        assert_eq!(joined[1].low_access(), None);
        assert_eq!(joined[2].low_access(), Some(false));
        assert_eq!(joined[2].access.as_ref().unwrap().poverty_rate, Some(12.0));
    }

    #[test]
    fn test_duplicate_food_access_key_fails() {
        let tracts = vec![tract(1)];
        let records = vec![record(1, "1", true), record(2, "01", false)];

        match left_join(tracts, &records).unwrap_err() {
            PipelineError::DataIntegrity { row, key, .. } => {
                assert_eq!(row, Some(2));
                assert_eq!(key.as_deref(), Some("1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_unrelated_key_still_fails() {
        let tracts = vec![tract(1)];
        let records = vec![record(1, "5", true), record(2, "5", true)];
        assert!(left_join(tracts, &records).is_err());
    }

    #[test]
    fn test_empty_food_access_table() {
        let joined = left_join(vec![tract(1)], &[]).unwrap();
        assert_eq!(joined.len(), 1);
        assert!(joined[0].access.is_none());
    }
}
