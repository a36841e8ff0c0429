use crate::analyzers::types::{
    CategoryAggregate, PovertyByAccess, ScatterPoint, SubgroupAggregate, Summary,
};
use crate::analyzers::utility::{mean, proportion, stddev};
use crate::join::JoinedTract;
use crate::tract::{Group, GroupCounts, MajorityCategory};
use std::collections::HashMap;
use tracing::instrument;

/// Counts food-desert tracts per majority category.
///
/// Unmatched tracts are skipped. Rows come out in category precedence order
/// and only categories that occur are listed.
pub fn aggregate_by_category(rows: &[JoinedTract]) -> Vec<CategoryAggregate> {
    let mut groups: HashMap<MajorityCategory, (usize, usize)> = HashMap::new();

    for row in rows {
        let Some(low_access) = row.low_access() else {
            continue;
        };
        let entry = groups.entry(row.tract.majority_category).or_default();
        if low_access {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    MajorityCategory::all()
        .filter_map(|majority_category| {
            let &(count_food_desert, total_tracts) = groups.get(&majority_category)?;
            Some(CategoryAggregate {
                majority_category,
                count_food_desert,
                total_tracts,
                pct_food_desert: proportion(count_food_desert as u64, total_tracts as u64),
            })
        })
        .collect()
}

/// Sums each group's population inside and outside food-desert tracts.
///
/// Sorted by descending `per_food_desert`; ties keep precedence order.
pub fn aggregate_by_subgroup(rows: &[JoinedTract]) -> Vec<SubgroupAggregate> {
    let mut in_desert = GroupCounts::default();
    let mut outside = GroupCounts::default();

    for row in rows {
        let Some(low_access) = row.low_access() else {
            continue;
        };
        let target = if low_access { &mut in_desert } else { &mut outside };
        for (group, count) in row.tract.population_by_group.iter() {
            target[group] += count;
        }
    }

    let mut aggregates: Vec<SubgroupAggregate> = Group::ALL
        .iter()
        .map(|group| {
            let food_desert = in_desert[*group];
            let not_food_desert = outside[*group];
            let total_pop = food_desert + not_food_desert;
            SubgroupAggregate {
                group: *group,
                food_desert,
                not_food_desert,
                total_pop,
                per_food_desert: proportion(food_desert, total_pop),
            }
        })
        .collect();

    // Stable sort keeps precedence order among equal shares.
    aggregates.sort_by(|a, b| b.per_food_desert.total_cmp(&a.per_food_desert));
    aggregates
}

/// Mean and spread of poverty rates for food-desert and other tracts.
///
/// Matched tracts without a poverty rate are skipped. Flag 1 is listed first.
pub fn poverty_by_access(rows: &[JoinedTract]) -> Vec<PovertyByAccess> {
    [true, false]
        .into_iter()
        .map(|flag| {
            let rates: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.access.as_ref())
                .filter(|a| a.low_access == flag)
                .filter_map(|a| a.poverty_rate)
                .collect();
            let avg = mean(&rates);
            PovertyByAccess {
                low_access_flag: flag as u8,
                tracts: rates.len(),
                mean_poverty_rate: avg,
                stddev_poverty_rate: stddev(&rates, avg),
            }
        })
        .collect()
}

/// Per-tract points for the poverty vs. White-share chart.
pub fn scatter_points(rows: &[JoinedTract]) -> Vec<ScatterPoint> {
    rows.iter()
        .filter_map(|row| {
            let access = row.access.as_ref()?;
            Some(ScatterPoint {
                tract_id: row.tract.tract_id,
                white_pct: row.tract.group_share[Group::White],
                poverty_rate: access.poverty_rate?,
                low_access_flag: access.low_access as u8,
            })
        })
        .collect()
}

/// Runs every reduction over the joined table.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn summarize(rows: &[JoinedTract]) -> Summary {
    Summary {
        by_category: aggregate_by_category(rows),
        by_subgroup: aggregate_by_subgroup(rows),
        poverty_by_access: poverty_by_access(rows),
    }
}
