//! Per-tract demographic counts as delivered by the survey source.
//!
//! Cells stay unvalidated here; enrichment decides whether a missing or
//! negative count rejects the run.

use std::collections::BTreeMap;
use tracing::info;

use crate::config::CensusVariables;
use crate::error::Result;
use crate::table::Table;

/// Column carrying the full state+county+tract identifier.
pub const GEOID_COLUMN: &str = "GEOID";
pub const NAME_COLUMN: &str = "NAME";
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One tract row with its raw census counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DemographicRow {
    /// 1-based data row in the source table.
    pub row: usize,
    pub geoid: String,
    pub name: Option<String>,
    /// Opaque shape, carried through untouched.
    pub geometry: Option<String>,
    /// Variable code to parsed count; `None` for blank or non-numeric cells.
    pub counts: BTreeMap<String, Option<i64>>,
}

impl DemographicRow {
    pub fn count(&self, code: &str) -> Option<i64> {
        self.counts.get(code).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemographicTable {
    pub variables: CensusVariables,
    pub rows: Vec<DemographicRow>,
}

impl DemographicTable {
    /// Interprets a raw table using the given variable codes.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` if the identifier column or any variable column is absent.
    pub fn from_table(table: &Table, variables: &CensusVariables) -> Result<Self> {
        let geoid_idx = table.column(GEOID_COLUMN)?;
        let name_idx = table.optional_column(NAME_COLUMN);
        let geometry_idx = table.optional_column(GEOMETRY_COLUMN);

        let code_idx = variables
            .codes()
            .into_iter()
            .map(|code| Ok((code.to_string(), table.column(code)?)))
            .collect::<Result<Vec<_>>>()?;

        let rows: Vec<DemographicRow> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| DemographicRow {
                row: i + 1,
                geoid: cells[geoid_idx].clone(),
                name: name_idx.and_then(|idx| non_empty(&cells[idx])),
                geometry: geometry_idx.and_then(|idx| non_empty(&cells[idx])),
                counts: code_idx
                    .iter()
                    .map(|(code, idx)| (code.clone(), parse_count(&cells[*idx])))
                    .collect(),
            })
            .collect();

        info!(source = %table.name, tracts = rows.len(), "Demographic table loaded");

        Ok(Self {
            variables: variables.clone(),
            rows,
        })
    }
}

fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses an integer count. Integral floats such as `"120.0"` are accepted.
fn parse_count(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn header() -> Vec<String> {
        let vars = CensusVariables::default();
        std::iter::once(GEOID_COLUMN)
            .chain(std::iter::once(NAME_COLUMN))
            .chain(vars.codes())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_from_table_reads_counts() {
        let row: Vec<String> = ["06037101110", "Tract 1011.10", "1000", "600", "300", "0", "50", "0", "0", "10", "40"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let table = Table::new("inline", header(), vec![row]);

        let demo = DemographicTable::from_table(&table, &CensusVariables::default()).unwrap();

        assert_eq!(demo.rows.len(), 1);
        let r = &demo.rows[0];
        assert_eq!(r.row, 1);
        assert_eq!(r.name.as_deref(), Some("Tract 1011.10"));
        assert!(r.geometry.is_none());
        assert_eq!(r.count("B03002_001E"), Some(1000));
        assert_eq!(r.count("B03002_012E"), Some(40));
    }

    #[test]
    fn test_missing_variable_column() {
        let mut headers = header();
        headers.pop();
        let table = Table::new("inline", headers, vec![]);

        let err = DemographicTable::from_table(&table, &CensusVariables::default()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref column, .. } if column == "B03002_012E"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count(" 42 "), Some(42));
        assert_eq!(parse_count("42.0"), Some(42));
        assert_eq!(parse_count("-666666666"), Some(-666666666));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("null"), None);
        assert_eq!(parse_count("4.5"), None);
    }
}
