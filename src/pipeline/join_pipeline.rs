use crate::error::Result;
use crate::frame::{datetime_millis, whole_days_between};
use crate::models::{SourceTable, StatusFilter, columns};
use crate::processor::PreparedTables;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Left => JoinType::Left,
        }
    }
}

/// One merge of the running table with a prepared source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinStep {
    pub right: SourceTable,
    pub key: &'static str,
    pub kind: JoinKind,
}

impl JoinStep {
    pub const fn inner(right: SourceTable, key: &'static str) -> Self {
        Self {
            right,
            key,
            kind: JoinKind::Inner,
        }
    }

    pub const fn left(right: SourceTable, key: &'static str) -> Self {
        Self {
            right,
            key,
            kind: JoinKind::Left,
        }
    }
}

/// Ordered join steps applied to the status-filtered orders table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    pub fn new(steps: Vec<JoinStep>) -> Self {
        Self { steps }
    }

    /// Orders, items, payments, customers, products, sellers, then at most one review.
    pub fn unified_order_record() -> Self {
        Self::new(vec![
            JoinStep::inner(SourceTable::OrderItems, columns::ORDER_ID),
            JoinStep::inner(SourceTable::OrderPayments, columns::ORDER_ID),
            JoinStep::inner(SourceTable::Customers, columns::CUSTOMER_ID),
            JoinStep::inner(SourceTable::Products, columns::PRODUCT_ID),
            JoinStep::inner(SourceTable::Sellers, columns::SELLER_ID),
            JoinStep::left(SourceTable::OrderReviews, columns::ORDER_ID),
        ])
    }

    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinStepReport {
    pub right: &'static str,
    pub key: &'static str,
    pub kind: JoinKind,
    pub rows_before: usize,
    pub rows_after: usize,
}

/// Row counts through the pipeline. Rows removed by inner joins are not
/// errors; this is the only place they show up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct JoinReport {
    pub orders_total: usize,
    pub orders_after_filter: usize,
    pub steps: Vec<JoinStepReport>,
}

#[derive(Debug, Clone)]
pub struct UnifiedTable {
    pub frame: DataFrame,
    pub report: JoinReport,
}

pub struct JoinPipeline {
    plan: JoinPlan,
    status_filter: StatusFilter,
    derive_delivery_duration: bool,
}

impl JoinPipeline {
    pub fn new(plan: JoinPlan) -> Self {
        Self {
            plan,
            status_filter: StatusFilter::Any,
            derive_delivery_duration: false,
        }
    }

    /// The batch export pipeline: full plan plus `delivery_duration_days`.
    pub fn unified(status_filter: StatusFilter) -> Self {
        Self::new(JoinPlan::unified_order_record())
            .with_status_filter(status_filter)
            .with_delivery_duration()
    }

    pub fn with_status_filter(mut self, status_filter: StatusFilter) -> Self {
        self.status_filter = status_filter;
        self
    }

    pub fn with_delivery_duration(mut self) -> Self {
        self.derive_delivery_duration = true;
        self
    }

    pub fn filter_orders(&self, orders: &DataFrame) -> Result<DataFrame> {
        match &self.status_filter {
            StatusFilter::Any => Ok(orders.clone()),
            StatusFilter::Only(statuses) => {
                let predicate = statuses
                    .iter()
                    .map(|status| col(columns::ORDER_STATUS).eq(lit(status.as_str())))
                    .reduce(|acc, next| acc.or(next))
                    .unwrap_or_else(|| lit(true));
                Ok(orders.clone().lazy().filter(predicate).collect()?)
            }
        }
    }

    pub fn run(&self, tables: &PreparedTables) -> Result<UnifiedTable> {
        self.run_on(&tables.orders, tables)
    }

    /// Runs the plan with `orders` as the left side instead of `tables.orders`.
    /// The status filter still applies.
    pub fn run_on(&self, orders: &DataFrame, tables: &PreparedTables) -> Result<UnifiedTable> {
        let mut report = JoinReport {
            orders_total: orders.height(),
            ..JoinReport::default()
        };

        let mut current = self.filter_orders(orders)?;
        report.orders_after_filter = current.height();
        info!(
            "Status filter {:?} kept {} of {} orders",
            self.status_filter, report.orders_after_filter, report.orders_total
        );

        for step in self.plan.steps() {
            let right = tables.joinable(step.right)?;
            let rows_before = current.height();

            current = current
                .lazy()
                .join(
                    right.clone().lazy(),
                    [col(step.key)],
                    [col(step.key)],
                    JoinArgs::new(step.kind.into()),
                )
                .collect()?;

            info!(
                "Joined {} on {} ({:?}): {} -> {} rows",
                step.right,
                step.key,
                step.kind,
                rows_before,
                current.height()
            );
            report.steps.push(JoinStepReport {
                right: step.right.name(),
                key: step.key,
                kind: step.kind,
                rows_before,
                rows_after: current.height(),
            });
        }

        if self.derive_delivery_duration {
            current = with_delivery_duration(&current)?;
        }

        info!("Unified table shape: {:?}", current.shape());
        debug!("Unified table preview:\n{}", current.head(Some(5)));

        Ok(UnifiedTable {
            frame: current,
            report,
        })
    }
}

/// Adds `delivery_duration_days`: whole days from purchase to customer
/// delivery, null when either timestamp is missing.
pub fn with_delivery_duration(df: &DataFrame) -> Result<DataFrame> {
    let purchased = datetime_millis(df, "unified", columns::PURCHASE_TIMESTAMP)?;
    let delivered = datetime_millis(df, "unified", columns::DELIVERED_CUSTOMER_DATE)?;

    let durations: Vec<Option<i64>> = purchased
        .into_iter()
        .zip(delivered)
        .map(|(start, end)| match (start, end) {
            (Some(start), Some(end)) => Some(whole_days_between(start, end)),
            _ => None,
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Series::new(columns::DELIVERY_DURATION_DAYS.into(), durations))?;
    Ok(out)
}
