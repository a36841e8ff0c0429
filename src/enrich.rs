//! Tract validation, share derivation and majority classification.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::demographics::{DemographicRow, DemographicTable};
use crate::error::{PipelineError, Result};
use crate::tract::{Group, GroupCounts, GroupShares, MajorityCategory, TractId};

const STAGE: &str = "enrichment";

/// A share strictly above this marks a majority.
pub const MAJORITY_THRESHOLD: f64 = 0.5;

/// A validated tract with combined per-group counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Tract {
    pub tract_id: TractId,
    pub name: Option<String>,
    pub geometry: Option<String>,
    pub total_population: u64,
    pub population_by_group: GroupCounts,
}

/// A tract with derived shares and its majority label.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTract {
    pub tract_id: TractId,
    pub name: Option<String>,
    pub geometry: Option<String>,
    pub total_population: u64,
    pub population_by_group: GroupCounts,
    pub group_share: GroupShares,
    pub majority_category: MajorityCategory,
}

type Rule = (fn(&GroupShares) -> bool, MajorityCategory);

/// Evaluated top to bottom; the first matching predicate labels the tract.
static CLASSIFICATION_RULES: [Rule; 6] = [
    (
        |s| s[Group::White] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::White),
    ),
    (
        |s| s[Group::Black] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::Black),
    ),
    (
        |s| s[Group::Aapi] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::Aapi),
    ),
    (
        |s| s[Group::Aian] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::Aian),
    ),
    (
        |s| s[Group::Multiracial] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::Multiracial),
    ),
    (
        |s| s[Group::HispanicLatino] > MAJORITY_THRESHOLD,
        MajorityCategory::Majority(Group::HispanicLatino),
    ),
];

/// Assigns the majority label, falling back to `RaciallyDiverse`.
pub fn classify(shares: &GroupShares) -> MajorityCategory {
    CLASSIFICATION_RULES
        .iter()
        .find(|(predicate, _)| predicate(shares))
        .map(|(_, label)| *label)
        .unwrap_or(MajorityCategory::RaciallyDiverse)
}

/// Validates every demographic row and combines raw sub-counts into groups.
///
/// # Errors
///
/// `DataIntegrity` on a non-numeric identifier, a duplicate identifier, or a
/// missing, negative or over-total count.
#[instrument(skip_all, fields(rows = table.rows.len()))]
pub fn validate_tracts(table: &DemographicTable) -> Result<Vec<Tract>> {
    let mut seen: HashMap<TractId, usize> = HashMap::with_capacity(table.rows.len());
    let mut tracts = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let tract = validate_row(row, table)?;
        if let Some(first) = seen.insert(tract.tract_id, row.row) {
            return Err(PipelineError::integrity(
                STAGE,
                Some(row.row),
                Some(&tract.tract_id.to_string()),
                format!("duplicate tract identifier, first seen at row {first}"),
            ));
        }
        tracts.push(tract);
    }

    Ok(tracts)
}

fn validate_row(row: &DemographicRow, table: &DemographicTable) -> Result<Tract> {
    let tract_id = TractId::parse(&row.geoid).ok_or_else(|| {
        PipelineError::integrity(STAGE, Some(row.row), Some(&row.geoid), "tract identifier is not numeric")
    })?;
    let key = tract_id.to_string();

    let read = |code: &str| -> Result<u64> {
        match row.count(code) {
            None => Err(PipelineError::integrity(
                STAGE,
                Some(row.row),
                Some(&key),
                format!("count for {code} is missing"),
            )),
            Some(v) if v < 0 => Err(PipelineError::integrity(
                STAGE,
                Some(row.row),
                Some(&key),
                format!("count for {code} is negative ({v})"),
            )),
            Some(v) => Ok(v as u64),
        }
    };

    let vars = &table.variables;
    let total_population = read(vars.total.as_str())?;

    let mut population_by_group = GroupCounts::default();
    for group in Group::ALL {
        for code in vars.components(group) {
            let count = read(code)?;
            if count > total_population {
                return Err(PipelineError::integrity(
                    STAGE,
                    Some(row.row),
                    Some(&key),
                    format!("count for {code} ({count}) exceeds total population ({total_population})"),
                ));
            }
            population_by_group[group] += count;
        }
        if population_by_group[group] > total_population {
            return Err(PipelineError::integrity(
                STAGE,
                Some(row.row),
                Some(&key),
                format!(
                    "{} count ({}) exceeds total population ({total_population})",
                    group.label(),
                    population_by_group[group]
                ),
            ));
        }
    }

    Ok(Tract {
        tract_id,
        name: row.name.clone(),
        geometry: row.geometry.clone(),
        total_population,
        population_by_group,
    })
}

/// Share of `count` in `total`.
///
/// # Errors
///
/// `ArithmeticUndefined` when `total` is zero.
pub fn share(count: u64, total: u64, tract_id: TractId) -> Result<f64> {
    if total == 0 {
        return Err(PipelineError::ArithmeticUndefined {
            key: tract_id.to_string(),
            message: "share requested for a tract with zero population".to_string(),
        });
    }
    Ok(count as f64 / total as f64)
}

/// Drops zero-population tracts, derives shares and classifies the rest.
#[instrument(skip_all, fields(tracts = tracts.len()))]
pub fn enrich(tracts: Vec<Tract>) -> Result<Vec<EnrichedTract>> {
    let loaded = tracts.len();
    let mut enriched = Vec::with_capacity(loaded);

    for tract in tracts {
        if tract.total_population == 0 {
            debug!(tract_id = %tract.tract_id, "Skipping zero-population tract");
            continue;
        }

        let mut group_share = GroupShares::default();
        for (group, count) in tract.population_by_group.iter() {
            group_share[group] = share(count, tract.total_population, tract.tract_id)?;
        }
        let majority_category = classify(&group_share);

        enriched.push(EnrichedTract {
            tract_id: tract.tract_id,
            name: tract.name,
            geometry: tract.geometry,
            total_population: tract.total_population,
            population_by_group: tract.population_by_group,
            group_share,
            majority_category,
        });
    }

    info!(
        loaded,
        eligible = enriched.len(),
        excluded = loaded - enriched.len(),
        "Tracts enriched"
    );
    Ok(enriched)
}

/// Flat CSV row for a classified tract.
#[derive(Debug, Serialize)]
pub struct ClassifiedRow<'a> {
    pub tract_id: TractId,
    pub name: Option<&'a str>,
    pub total_population: u64,
    pub white: u64,
    pub black: u64,
    pub aapi: u64,
    pub aian: u64,
    pub multiracial: u64,
    pub hispanic_latino: u64,
    pub white_pct: f64,
    pub black_pct: f64,
    pub aapi_pct: f64,
    pub aian_pct: f64,
    pub multiracial_pct: f64,
    pub hispanic_latino_pct: f64,
    pub majority_category: MajorityCategory,
}

impl<'a> From<&'a EnrichedTract> for ClassifiedRow<'a> {
    fn from(t: &'a EnrichedTract) -> Self {
        let c = &t.population_by_group;
        let s = &t.group_share;
        Self {
            tract_id: t.tract_id,
            name: t.name.as_deref(),
            total_population: t.total_population,
            white: c[Group::White],
            black: c[Group::Black],
            aapi: c[Group::Aapi],
            aian: c[Group::Aian],
            multiracial: c[Group::Multiracial],
            hispanic_latino: c[Group::HispanicLatino],
            white_pct: s[Group::White],
            black_pct: s[Group::Black],
            aapi_pct: s[Group::Aapi],
            aian_pct: s[Group::Aian],
            multiracial_pct: s[Group::Multiracial],
            hispanic_latino_pct: s[Group::HispanicLatino],
            majority_category: t.majority_category,
        }
    }
}
