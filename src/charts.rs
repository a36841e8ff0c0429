//! Vega-Lite chart specifications with inline data.
//!
//! Each spec renders interactively in any Vega-Lite viewer; tooltips expose
//! the underlying aggregate fields.

use serde_json::{Value, json};

use crate::analyzers::types::{CategoryAggregate, ScatterPoint, SubgroupAggregate};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Bar chart of the food-desert share per majority category.
pub fn category_chart(rows: &[CategoryAggregate]) -> Value {
    json!({
        "$schema": SCHEMA,
        "title": "Share of tracts with low food access, by majority category",
        "data": { "values": rows },
        "mark": { "type": "bar", "tooltip": true },
        "encoding": {
            "x": {
                "field": "majority_category",
                "type": "nominal",
                "sort": "-y",
                "title": "Majority category"
            },
            "y": {
                "field": "pct_food_desert",
                "type": "quantitative",
                "axis": { "format": ".0%" },
                "title": "Food-desert tracts"
            }
        }
    })
}

/// Bar chart of each group's population share living in food-desert tracts.
pub fn subgroup_chart(rows: &[SubgroupAggregate]) -> Value {
    json!({
        "$schema": SCHEMA,
        "title": "Share of each group living in low food access tracts",
        "data": { "values": rows },
        "mark": { "type": "bar", "tooltip": true },
        "encoding": {
            "y": {
                "field": "group",
                "type": "nominal",
                "sort": "-x",
                "title": null
            },
            "x": {
                "field": "per_food_desert",
                "type": "quantitative",
                "axis": { "format": ".0%" },
                "title": "Population in food-desert tracts"
            }
        }
    })
}

/// Scatter of poverty rate against White share, coloured by access flag.
pub fn scatter_chart(points: &[ScatterPoint]) -> Value {
    json!({
        "$schema": SCHEMA,
        "title": "Poverty rate vs. White share of tract population",
        "data": { "values": points },
        "mark": { "type": "point", "filled": true, "tooltip": true },
        "params": [{ "name": "zoom", "select": "interval", "bind": "scales" }],
        "encoding": {
            "x": {
                "field": "white_pct",
                "type": "quantitative",
                "axis": { "format": ".0%" },
                "title": "White share"
            },
            "y": {
                "field": "poverty_rate",
                "type": "quantitative",
                "title": "Poverty rate (%)"
            },
            "color": {
                "field": "low_access_flag",
                "type": "nominal",
                "title": "Low access"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tract::{Group, MajorityCategory, TractId};

    #[test]
    fn test_category_chart_inlines_rows() {
        let rows = vec![CategoryAggregate {
            majority_category: MajorityCategory::Majority(Group::Black),
            count_food_desert: 3,
            total_tracts: 4,
            pct_food_desert: 0.75,
        }];
        let spec = category_chart(&rows);

        assert_eq!(spec["$schema"], SCHEMA);
        assert_eq!(spec["data"]["values"][0]["majority_category"], "Majority Black");
        assert_eq!(spec["data"]["values"][0]["pct_food_desert"], 0.75);
    }

    #[test]
    fn test_scatter_chart_fields() {
        let points = vec![ScatterPoint {
            tract_id: TractId::parse("6037101110").unwrap(),
            white_pct: 0.2,
            poverty_rate: 18.5,
            low_access_flag: 1,
        }];
        let spec = scatter_chart(&points);

        assert_eq!(spec["data"]["values"][0]["tract_id"], 6037101110u64);
        assert_eq!(spec["encoding"]["color"]["field"], "low_access_flag");
    }

    #[test]
    fn test_subgroup_chart_uses_group_labels() {
        let rows = vec![SubgroupAggregate {
            group: Group::HispanicLatino,
            food_desert: 10,
            not_food_desert: 30,
            total_pop: 40,
            per_food_desert: 0.25,
        }];
        let spec = subgroup_chart(&rows);
        assert_eq!(spec["data"]["values"][0]["group"], "Hispanic/Latino");
    }
}
