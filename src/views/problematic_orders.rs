use crate::error::Result;
use crate::frame::string_values;
use crate::models::{OrderStatus, SourceTable, StatusFilter, columns};
use crate::pipeline::{JoinPipeline, JoinPlan, JoinStep};
use crate::processor::PreparedTables;
use crate::views::orders_purchased_in;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblematicOrderParams {
    pub year: i32,
    pub statuses: Vec<OrderStatus>,
    pub top_n: usize,
}

impl Default for ProblematicOrderParams {
    fn default() -> Self {
        Self {
            year: 2018,
            statuses: vec![OrderStatus::Canceled, OrderStatus::Unavailable],
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblematicOrdersSummary {
    pub year: i32,
    pub order_count: usize,
    pub item_rows: usize,
    pub top_categories: Vec<RankedCount>,
    pub top_sellers: Vec<RankedCount>,
}

/// Items and their products for the problematic orders of one year.
pub fn problematic_order_plan() -> JoinPlan {
    JoinPlan::new(vec![
        JoinStep::inner(SourceTable::OrderItems, columns::ORDER_ID),
        JoinStep::left(SourceTable::Products, columns::PRODUCT_ID),
    ])
}

/// Canceled or unavailable orders of the selected year, broken down by
/// product category and seller. Counts are item rows, ranked descending.
pub fn problematic_orders(
    tables: &PreparedTables,
    params: &ProblematicOrderParams,
) -> Result<ProblematicOrdersSummary> {
    let pipeline = JoinPipeline::new(problematic_order_plan())
        .with_status_filter(StatusFilter::from(params.statuses.clone()));

    let in_year = orders_purchased_in(&tables.orders, &[params.year])?;
    let order_count = pipeline.filter_orders(&in_year)?.height();
    info!(
        "{} orders with status {:?} in {}",
        order_count, params.statuses, params.year
    );

    let items = pipeline.run_on(&in_year, tables)?.frame;

    Ok(ProblematicOrdersSummary {
        year: params.year,
        order_count,
        item_rows: items.height(),
        top_categories: ranked_counts(&items, columns::PRODUCT_CATEGORY_NAME, params.top_n)?,
        top_sellers: ranked_counts(&items, columns::SELLER_ID, params.top_n)?,
    })
}

/// Row counts per non-null value of `key`, highest first, ties by key.
pub fn ranked_counts(df: &DataFrame, key: &str, top_n: usize) -> Result<Vec<RankedCount>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let counts = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([len().alias("count")])
        .collect()?;

    let keys = string_values(&counts, "counts", key)?;
    let totals = counts.column("count")?.cast(&DataType::Int64)?;

    let mut ranked: Vec<RankedCount> = keys
        .into_iter()
        .zip(totals.i64()?.into_iter())
        .filter_map(|(key, count)| {
            Some(RankedCount {
                key: key?,
                count: count? as usize,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(top_n);
    Ok(ranked)
}
