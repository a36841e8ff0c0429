//! Loader for the per-tract food-access indicator table.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use crate::config::FoodAccessColumns;
use crate::error::{PipelineError, Result};
use crate::table::Table;
use crate::tract::TractId;

const STAGE: &str = "food-access load";

/// One tract's food-access indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodAccessRecord {
    /// 1-based data row in the source table.
    pub row: usize,
    pub tract_id: TractId,
    pub low_access: bool,
    /// Percentage in `[0, 100]`; `None` when the cell is blank.
    pub poverty_rate: Option<f64>,
    /// Every other column, by header name.
    pub extra: BTreeMap<String, String>,
}

/// Loads food-access records from a delimited file.
///
/// The load is all-or-nothing: the first bad row fails the whole table.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_food_access(
    path: &Path,
    columns: &FoodAccessColumns,
    delimiter: u8,
) -> Result<Vec<FoodAccessRecord>> {
    let table = Table::read_csv(path, delimiter)?;
    records_from_table(&table, columns)
}

/// Parses food-access records from an in-memory table, e.g. a downloaded body.
pub fn parse_food_access(
    name: &str,
    bytes: &[u8],
    columns: &FoodAccessColumns,
    delimiter: u8,
) -> Result<Vec<FoodAccessRecord>> {
    let table = Table::from_reader(name, bytes, delimiter)?;
    records_from_table(&table, columns)
}

/// Interprets a raw table as food-access records.
pub fn records_from_table(
    table: &Table,
    columns: &FoodAccessColumns,
) -> Result<Vec<FoodAccessRecord>> {
    let tract_idx = table.column(&columns.tract)?;
    let flag_idx = table.column(&columns.low_access)?;
    let poverty_idx = table.column(&columns.poverty_rate)?;

    let mut records = Vec::with_capacity(table.rows.len());

    for (i, cells) in table.rows.iter().enumerate() {
        let row = i + 1;
        let raw_id = &cells[tract_idx];

        let tract_id = TractId::parse(raw_id).ok_or_else(|| {
            PipelineError::integrity(STAGE, Some(row), Some(raw_id), "tract identifier is not numeric")
        })?;
        let key = tract_id.to_string();

        let low_access = parse_flag(&cells[flag_idx]).ok_or_else(|| {
            PipelineError::integrity(
                STAGE,
                Some(row),
                Some(&key),
                format!("low-access flag '{}' is not 0/1", cells[flag_idx]),
            )
        })?;

        let poverty_rate = parse_poverty_rate(&cells[poverty_idx]).map_err(|message| {
            PipelineError::integrity(STAGE, Some(row), Some(&key), message)
        })?;

        let extra = table
            .headers
            .iter()
            .zip(cells)
            .enumerate()
            .filter(|(idx, _)| ![tract_idx, flag_idx, poverty_idx].contains(idx))
            .map(|(_, (header, cell))| (header.clone(), cell.clone()))
            .collect();

        records.push(FoodAccessRecord {
            row,
            tract_id,
            low_access,
            poverty_rate,
            extra,
        });
    }

    info!(source = %table.name, records = records.len(), "Food-access table loaded");
    Ok(records)
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_poverty_rate(cell: &str) -> std::result::Result<Option<f64>, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let rate: f64 = trimmed
        .parse()
        .map_err(|_| format!("poverty rate '{trimmed}' is not a number"))?;
    if !(0.0..=100.0).contains(&rate) {
        return Err(format!("poverty rate {rate} is outside 0-100"));
    }
    Ok(Some(rate))
}
