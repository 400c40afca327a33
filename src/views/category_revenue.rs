use crate::error::Result;
use crate::frame::{float_values, require, string_values};
use crate::models::{OrderStatus, SourceTable, StatusFilter, columns};
use crate::pipeline::{JoinPipeline, JoinPlan, JoinStep};
use crate::processor::PreparedTables;
use crate::views::{orders_purchased_in, quarter_label};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRevenueParams {
    pub years: Vec<i32>,
    pub top_k: usize,
    /// Empty means every status.
    pub statuses: Vec<OrderStatus>,
}

impl Default for CategoryRevenueParams {
    fn default() -> Self {
        Self {
            years: vec![2017, 2018],
            top_k: 5,
            statuses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterRevenue {
    pub year: i32,
    pub quarter: u32,
    pub label: String,
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterTop {
    pub year: i32,
    pub quarter: u32,
    pub label: String,
    pub top: Vec<QuarterRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryRevenueSummary {
    pub quarterly: Vec<QuarterRevenue>,
    pub top_per_quarter: Vec<QuarterTop>,
    pub consistent_categories: Vec<String>,
    /// Set only when no category is consistent: the top categories over the
    /// whole period.
    pub overall_top: Vec<CategoryTotal>,
    /// Per-quarter revenue of the consistent categories, or of `overall_top`
    /// when there are none.
    pub trend: Vec<QuarterRevenue>,
}

/// Payments, items and products for revenue by category.
pub fn category_revenue_plan() -> JoinPlan {
    JoinPlan::new(vec![
        JoinStep::inner(SourceTable::OrderPayments, columns::ORDER_ID),
        JoinStep::inner(SourceTable::OrderItems, columns::ORDER_ID),
        JoinStep::left(SourceTable::Products, columns::PRODUCT_ID),
    ])
}

pub fn category_revenue(
    tables: &PreparedTables,
    params: &CategoryRevenueParams,
) -> Result<CategoryRevenueSummary> {
    let in_years = orders_purchased_in(&tables.orders, &params.years)?;
    let joined = JoinPipeline::new(category_revenue_plan())
        .with_status_filter(StatusFilter::from(params.statuses.clone()))
        .run_on(&in_years, tables)?
        .frame;

    let quarterly = quarterly_revenue(&joined)?;
    let top_per_quarter = rank_quarters(&quarterly, params.top_k);
    let consistent_categories = consistent_categories(&top_per_quarter);

    let (overall_top, members): (Vec<CategoryTotal>, BTreeSet<String>) =
        if consistent_categories.is_empty() {
            let overall = overall_top(&quarterly, params.top_k);
            let members = overall.iter().map(|c| c.category.clone()).collect();
            (overall, members)
        } else {
            (Vec::new(), consistent_categories.iter().cloned().collect())
        };

    let trend = quarterly
        .iter()
        .filter(|row| members.contains(&row.category))
        .cloned()
        .collect();

    info!(
        "Revenue over {} quarters; consistent top-{} categories: {:?}",
        top_per_quarter.len(),
        params.top_k,
        consistent_categories
    );

    Ok(CategoryRevenueSummary {
        quarterly,
        top_per_quarter,
        consistent_categories,
        overall_top,
        trend,
    })
}

/// Sum of `payment_value` per (year, quarter, category), ordered by quarter
/// then category. Rows without a category are not counted.
pub fn quarterly_revenue(joined: &DataFrame) -> Result<Vec<QuarterRevenue>> {
    if joined.height() == 0 {
        return Ok(Vec::new());
    }

    require(joined, "revenue", columns::PURCHASE_TIMESTAMP)?;
    let purchased = col(columns::PURCHASE_TIMESTAMP);

    let grouped = joined
        .clone()
        .lazy()
        .with_columns([
            purchased.clone().dt().year().alias("year"),
            purchased.dt().quarter().cast(DataType::Int32).alias("quarter"),
        ])
        .filter(
            col(columns::PRODUCT_CATEGORY_NAME)
                .is_not_null()
                .and(col("year").is_not_null()),
        )
        .group_by([col("year"), col("quarter"), col(columns::PRODUCT_CATEGORY_NAME)])
        .agg([col(columns::PAYMENT_VALUE)
            .cast(DataType::Float64)
            .sum()
            .alias("revenue")])
        .collect()?;

    let year_values = grouped.column("year")?.cast(&DataType::Int64)?;
    let quarter_values = grouped.column("quarter")?.cast(&DataType::Int64)?;
    let categories = string_values(&grouped, "revenue", columns::PRODUCT_CATEGORY_NAME)?;
    let revenues = float_values(&grouped, "revenue", "revenue")?;

    let mut rows: Vec<QuarterRevenue> = year_values
        .i64()?
        .into_iter()
        .zip(quarter_values.i64()?.into_iter())
        .zip(categories)
        .zip(revenues)
        .filter_map(|(((year, quarter), category), revenue)| {
            let (year, quarter) = (year? as i32, quarter? as u32);
            Some(QuarterRevenue {
                year,
                quarter,
                label: quarter_label(year, quarter),
                category: category?,
                revenue: revenue.unwrap_or(0.0),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        (a.year, a.quarter, &a.category).cmp(&(b.year, b.quarter, &b.category))
    });
    Ok(rows)
}

/// The `top_k` categories by revenue in each quarter, quarters in calendar
/// order. Equal revenue ranks by category name.
pub fn rank_quarters(quarterly: &[QuarterRevenue], top_k: usize) -> Vec<QuarterTop> {
    let mut by_quarter: BTreeMap<(i32, u32), Vec<QuarterRevenue>> = BTreeMap::new();
    for row in quarterly {
        by_quarter
            .entry((row.year, row.quarter))
            .or_default()
            .push(row.clone());
    }

    by_quarter
        .into_iter()
        .map(|((year, quarter), mut rows)| {
            rows.sort_by(|a, b| {
                b.revenue
                    .total_cmp(&a.revenue)
                    .then_with(|| a.category.cmp(&b.category))
            });
            rows.truncate(top_k);
            QuarterTop {
                year,
                quarter,
                label: quarter_label(year, quarter),
                top: rows,
            }
        })
        .collect()
}

/// Categories present in every quarter's top list, narrowed quarter by
/// quarter from the first one. Sorted by name.
pub fn consistent_categories(tops: &[QuarterTop]) -> Vec<String> {
    let mut quarters = tops.iter();
    let Some(first) = quarters.next() else {
        return Vec::new();
    };

    let mut consistent: BTreeSet<&str> = first.top.iter().map(|r| r.category.as_str()).collect();
    for quarter in quarters {
        let current: BTreeSet<&str> = quarter.top.iter().map(|r| r.category.as_str()).collect();
        consistent.retain(|category| current.contains(category));
    }

    consistent.into_iter().map(str::to_string).collect()
}

/// Highest-revenue categories over every quarter combined.
pub fn overall_top(quarterly: &[QuarterRevenue], top_k: usize) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in quarterly {
        *totals.entry(row.category.as_str()).or_insert(0.0) += row.revenue;
    }

    let mut ranked: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, revenue)| CategoryTotal {
            category: category.to_string(),
            revenue,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(top_k);
    ranked
}
