//! Runs enrichment, join and aggregation as one pass over in-memory tables.

use serde::Serialize;
use tracing::{info, instrument};

use crate::analyzers::aggregate::{scatter_points, summarize};
use crate::analyzers::types::{ScatterPoint, Summary};
use crate::demographics::DemographicTable;
use crate::enrich::{enrich, validate_tracts};
use crate::error::Result;
use crate::food_access::FoodAccessRecord;
use crate::join::{JoinedTract, left_join};

/// Row counts observed at each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub demographic_rows: usize,
    pub zero_population_excluded: usize,
    pub eligible_tracts: usize,
    pub food_access_records: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Everything the presentation step consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// One row per eligible tract, matched or not.
    pub tracts: Vec<JoinedTract>,
    pub summary: Summary,
    pub scatter: Vec<ScatterPoint>,
    pub counts: StageCounts,
}

/// Validates, enriches, joins and aggregates.
///
/// # Errors
///
/// Any integrity or arithmetic failure from the stages; nothing is returned
/// on partial success.
#[instrument(skip_all)]
pub fn run_pipeline(
    demographics: &DemographicTable,
    food_access: &[FoodAccessRecord],
) -> Result<PipelineOutput> {
    let validated = validate_tracts(demographics)?;
    let demographic_rows = validated.len();

    let enriched = enrich(validated)?;
    let eligible_tracts = enriched.len();

    let tracts = left_join(enriched, food_access)?;
    let matched = tracts.iter().filter(|t| t.access.is_some()).count();

    let summary = summarize(&tracts);
    let scatter = scatter_points(&tracts);

    let counts = StageCounts {
        demographic_rows,
        zero_population_excluded: demographic_rows - eligible_tracts,
        eligible_tracts,
        food_access_records: food_access.len(),
        matched,
        unmatched: eligible_tracts - matched,
    };
    info!(?counts, "Pipeline complete");

    Ok(PipelineOutput {
        tracts,
        summary,
        scatter,
        counts,
    })
}
