pub mod category_revenue;
pub mod delivery_duration;
pub mod problematic_orders;

pub use category_revenue::*;
pub use delivery_duration::*;
pub use problematic_orders::*;

use crate::error::Result;
use crate::frame::require;
use crate::models::columns;
use crate::processor::PreparedTables;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for all three views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewsConfig {
    #[serde(default)]
    pub delivery: DeliveryDurationParams,
    #[serde(default)]
    pub problematic: ProblematicOrderParams,
    #[serde(default)]
    pub revenue: CategoryRevenueParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub delivery: DeliveryDurationSummary,
    pub problematic: ProblematicOrdersSummary,
    pub revenue: CategoryRevenueSummary,
}

pub fn build_report(tables: &PreparedTables, config: &ViewsConfig) -> Result<AnalyticsReport> {
    Ok(AnalyticsReport {
        delivery: delivery_duration(&tables.orders, &config.delivery)?,
        problematic: problematic_orders(tables, &config.problematic)?,
        revenue: category_revenue(tables, &config.revenue)?,
    })
}

pub fn quarter_label(year: i32, quarter: u32) -> String {
    format!("{}-Q{}", year, quarter)
}

/// Orders whose purchase year is one of `years`. Orders without a purchase
/// timestamp never match.
pub(crate) fn orders_purchased_in(orders: &DataFrame, years: &[i32]) -> Result<DataFrame> {
    require(orders, "orders", columns::PURCHASE_TIMESTAMP)?;

    let predicate = years
        .iter()
        .map(|year| col(columns::PURCHASE_TIMESTAMP).dt().year().eq(lit(*year)))
        .reduce(|acc, next| acc.or(next))
        .unwrap_or_else(|| lit(false));

    Ok(orders
        .clone()
        .lazy()
        .filter(predicate.fill_null(lit(false)))
        .collect()?)
}
