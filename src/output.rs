//! Output formatting and persistence for pipeline results.
//!
//! Summary tables are written as CSV and JSON, charts as Vega-Lite specs.
//! Only `manifest.json` carries a timestamp, so the tables themselves are
//! byte-identical across runs on identical inputs.

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::{
    CategoryAggregate, PovertyByAccess, ScatterPoint, SubgroupAggregate, Summary,
};
use crate::charts::{category_chart, scatter_chart, subgroup_chart};
use crate::enrich::ClassifiedRow;
use crate::error::Result;
use crate::join::JoinedTract;
use crate::pipeline::{PipelineOutput, StageCounts};
use crate::tract::{Group, MajorityCategory, TractId};

/// Logs both aggregate tables, one event per row.
pub fn print_summary(summary: &Summary) {
    for row in &summary.by_category {
        info!(
            category = %row.majority_category,
            food_desert = row.count_food_desert,
            total = row.total_tracts,
            pct = %format!("{:.1}%", row.pct_food_desert * 100.0),
            "By category"
        );
    }
    for row in &summary.by_subgroup {
        info!(
            group = %row.group,
            food_desert = row.food_desert,
            not_food_desert = row.not_food_desert,
            pct = %format!("{:.1}%", row.per_food_desert * 100.0),
            "By subgroup"
        );
    }
    for row in &summary.poverty_by_access {
        info!(
            low_access = row.low_access_flag,
            tracts = row.tracts,
            mean_poverty_rate = %format!("{:.2}", row.mean_poverty_rate),
            "Poverty by access"
        );
    }
}

/// A row type written to CSV, with its column names in field order.
pub trait CsvRecord: Serialize {
    const HEADERS: &'static [&'static str];
}

impl<T: CsvRecord> CsvRecord for &T {
    const HEADERS: &'static [&'static str] = T::HEADERS;
}

impl CsvRecord for CategoryAggregate {
    const HEADERS: &'static [&'static str] = &[
        "majority_category",
        "count_food_desert",
        "total_tracts",
        "pct_food_desert",
    ];
}

impl CsvRecord for SubgroupAggregate {
    const HEADERS: &'static [&'static str] = &[
        "group",
        "food_desert",
        "not_food_desert",
        "total_pop",
        "per_food_desert",
    ];
}

impl CsvRecord for PovertyByAccess {
    const HEADERS: &'static [&'static str] = &[
        "low_access_flag",
        "tracts",
        "mean_poverty_rate",
        "stddev_poverty_rate",
    ];
}

impl CsvRecord for ScatterPoint {
    const HEADERS: &'static [&'static str] =
        &["tract_id", "white_pct", "poverty_rate", "low_access_flag"];
}

impl CsvRecord for ClassifiedRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "tract_id",
        "name",
        "total_population",
        "white",
        "black",
        "aapi",
        "aian",
        "multiracial",
        "hispanic_latino",
        "white_pct",
        "black_pct",
        "aapi_pct",
        "aian_pct",
        "multiracial_pct",
        "hispanic_latino_pct",
        "majority_category",
    ];
}

impl CsvRecord for TractRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "tract_id",
        "name",
        "total_population",
        "white",
        "black",
        "aapi",
        "aian",
        "multiracial",
        "hispanic_latino",
        "white_pct",
        "black_pct",
        "aapi_pct",
        "aian_pct",
        "multiracial_pct",
        "hispanic_latino_pct",
        "majority_category",
        "low_access_flag",
        "poverty_rate",
        "geometry",
    ];
}

/// Writes `records` as a CSV file with a header row, replacing any existing file.
///
/// The header is written even when there are no records.
pub fn write_records<T: CsvRecord>(path: &Path, records: impl IntoIterator<Item = T>) -> Result<()> {
    debug!(path = %path.display(), "Writing CSV");
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut empty = true;
    for record in records {
        writer.serialize(record)?;
        empty = false;
    }
    if empty {
        writer.write_record(T::HEADERS)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `value` as pretty-printed JSON with a trailing newline.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    debug!(path = %path.display(), "Writing JSON");
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');
    fs::write(path, body)?;
    Ok(())
}

/// Flat per-tract row of the joined table. Access fields are empty when the
/// tract had no food-access record.
#[derive(Debug, Serialize)]
pub struct TractRow<'a> {
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
    pub low_access_flag: Option<u8>,
    pub poverty_rate: Option<f64>,
    pub geometry: Option<&'a str>,
}

impl<'a> From<&'a JoinedTract> for TractRow<'a> {
    fn from(j: &'a JoinedTract) -> Self {
        let t = &j.tract;
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
            low_access_flag: j.access.as_ref().map(|a| a.low_access as u8),
            poverty_rate: j.access.as_ref().and_then(|a| a.poverty_rate),
            geometry: t.geometry.as_deref(),
        }
    }
}

/// Where the inputs of a run came from.
#[derive(Debug, Clone, Serialize)]
pub struct RunSources {
    pub demographics: String,
    pub food_access: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    sources: &'a RunSources,
    counts: StageCounts,
    outputs: Vec<String>,
}

/// Writes every artifact into `dir`, creating it if needed.
///
/// Returns the written paths, manifest last.
pub fn write_outputs(
    output: &PipelineOutput,
    dir: &Path,
    sources: &RunSources,
) -> Result<Vec<PathBuf>> {
    let charts_dir = dir.join("charts");
    fs::create_dir_all(&charts_dir)?;

    let mut written = Vec::new();
    let mut record = |path: PathBuf| {
        written.push(path.clone());
        path
    };

    write_records(&record(dir.join("by_category.csv")), &output.summary.by_category)?;
    write_records(&record(dir.join("by_subgroup.csv")), &output.summary.by_subgroup)?;
    write_records(
        &record(dir.join("poverty_by_access.csv")),
        &output.summary.poverty_by_access,
    )?;
    write_records(&record(dir.join("scatter.csv")), &output.scatter)?;
    write_records(
        &record(dir.join("tracts.csv")),
        output.tracts.iter().map(TractRow::from),
    )?;
    write_json(&record(dir.join("summary.json")), &output.summary)?;

    write_json(
        &record(charts_dir.join("by_category.vl.json")),
        &category_chart(&output.summary.by_category),
    )?;
    write_json(
        &record(charts_dir.join("by_subgroup.vl.json")),
        &subgroup_chart(&output.summary.by_subgroup),
    )?;
    write_json(
        &record(charts_dir.join("poverty_scatter.vl.json")),
        &scatter_chart(&output.scatter),
    )?;

    let manifest_path = dir.join("manifest.json");
    let manifest = Manifest {
        generated_at: Utc::now(),
        sources,
        counts: output.counts,
        outputs: written
            .iter()
            .map(|p| p.strip_prefix(dir).unwrap_or(p).display().to_string())
            .collect(),
    };
    write_json(&manifest_path, &manifest)?;
    written.push(manifest_path);

    info!(dir = %dir.display(), files = written.len(), "Outputs written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::EnrichedTract;
    use crate::join::AccessFields;
    use crate::tract::{GroupCounts, GroupShares};

    fn category_rows() -> Vec<CategoryAggregate> {
        vec![CategoryAggregate {
            majority_category: MajorityCategory::Majority(Group::Black),
            count_food_desert: 1,
            total_tracts: 2,
            pct_food_desert: 0.5,
        }]
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        let summary = Summary {
            by_category: category_rows(),
            by_subgroup: vec![],
            poverty_by_access: vec![],
        };
        print_summary(&summary);
    }

    #[test]
    fn test_write_records_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("by_category.csv");

        write_records(&path, &category_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "majority_category,count_food_desert,total_tracts,pct_food_desert"
        );
        assert_eq!(lines[1], "Majority Black,1,2,0.5");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_write_records_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");

        write_records(&path, &category_rows()).unwrap();
        write_records(&path, &category_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_write_json_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_json(&path, &category_rows()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("]\n"));
    }

    fn enriched_tract() -> EnrichedTract {
        EnrichedTract {
            tract_id: TractId::parse("6037101110").unwrap(),
            name: Some("Tract 1011.10".to_string()),
            geometry: None,
            total_population: 10,
            population_by_group: GroupCounts::from_fn(|_| 1),
            group_share: GroupShares::from_fn(|_| 0.1),
            majority_category: MajorityCategory::RaciallyDiverse,
        }
    }

    fn serialized_header<T: CsvRecord>(record: T) -> String {
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(vec![]);
        writer.serialize(record).unwrap();
        let bytes = writer.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_write_records_empty_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("by_category.csv");

        write_records(&path, Vec::<CategoryAggregate>::new()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "majority_category,count_food_desert,total_tracts,pct_food_desert\n"
        );
    }

    #[test]
    fn test_declared_headers_match_serialized_fields() {
        let tract = enriched_tract();
        let joined = JoinedTract {
            tract: tract.clone(),
            access: Some(AccessFields {
                low_access: true,
                poverty_rate: Some(12.5),
            }),
        };

        assert_eq!(
            serialized_header(ClassifiedRow::from(&tract)),
            ClassifiedRow::HEADERS.join(",")
        );
        assert_eq!(
            serialized_header(TractRow::from(&joined)),
            TractRow::HEADERS.join(",")
        );
        assert_eq!(
            serialized_header(&category_rows()[0]),
            CategoryAggregate::HEADERS.join(",")
        );
        assert_eq!(
            serialized_header(SubgroupAggregate {
                group: Group::Aian,
                food_desert: 1,
                not_food_desert: 2,
                total_pop: 3,
                per_food_desert: 1.0 / 3.0,
            }),
            SubgroupAggregate::HEADERS.join(",")
        );
        assert_eq!(
            serialized_header(PovertyByAccess {
                low_access_flag: 1,
                tracts: 2,
                mean_poverty_rate: 10.0,
                stddev_poverty_rate: 1.0,
            }),
            PovertyByAccess::HEADERS.join(",")
        );
        assert_eq!(
            serialized_header(ScatterPoint {
                tract_id: tract.tract_id,
                white_pct: 0.1,
                poverty_rate: 12.5,
                low_access_flag: 1,
            }),
            ScatterPoint::HEADERS.join(",")
        );
    }
}
