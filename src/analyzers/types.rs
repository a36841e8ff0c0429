//! Output rows produced by the aggregation step.

use serde::Serialize;

use crate::tract::{Group, MajorityCategory, TractId};

/// Food-desert counts for one majority category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub majority_category: MajorityCategory,
    pub count_food_desert: usize,
    pub total_tracts: usize,
    pub pct_food_desert: f64,
}

/// Population living in and out of food-desert tracts for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupAggregate {
    pub group: Group,
    pub food_desert: u64,
    pub not_food_desert: u64,
    pub total_pop: u64,
    pub per_food_desert: f64,
}

/// Poverty-rate statistics for tracts sharing a low-access flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PovertyByAccess {
    pub low_access_flag: u8,
    pub tracts: usize,
    pub mean_poverty_rate: f64,
    pub stddev_poverty_rate: f64,
}

/// One point of the poverty vs. White-share scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub tract_id: TractId,
    pub white_pct: f64,
    pub poverty_rate: f64,
    pub low_access_flag: u8,
}

/// Both aggregate tables, written together as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub by_category: Vec<CategoryAggregate>,
    pub by_subgroup: Vec<SubgroupAggregate>,
    pub poverty_by_access: Vec<PovertyByAccess>,
}
