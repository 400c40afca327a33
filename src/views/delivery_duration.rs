use crate::error::Result;
use crate::frame::{datetime_millis, string_values, whole_days_between};
use crate::models::{OrderStatus, columns};
use crate::views::orders_purchased_in;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryDurationParams {
    pub years: Vec<i32>,
    pub histogram_bins: usize,
}

impl Default for DeliveryDurationParams {
    fn default() -> Self {
        Self {
            years: vec![2017, 2018],
            histogram_bins: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryPoint {
    pub order_id: String,
    pub purchased_at: NaiveDateTime,
    pub duration_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryDurationSummary {
    pub order_count: usize,
    pub mean_days: Option<f64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub median_days: Option<f64>,
    pub p75_days: Option<f64>,
    pub histogram: Vec<HistogramBin>,
    pub points: Vec<DeliveryPoint>,
}

/// Delivery time of delivered orders purchased in the selected years.
///
/// Accepts the prepared orders table or any table joined from it; rows are
/// reduced to one per `order_id` (first seen). Orders missing either
/// timestamp are skipped and negative durations are discarded.
pub fn delivery_duration(
    orders: &DataFrame,
    params: &DeliveryDurationParams,
) -> Result<DeliveryDurationSummary> {
    let orders = orders_purchased_in(orders, &params.years)?;
    let order_ids = string_values(&orders, "orders", columns::ORDER_ID)?;
    let statuses = string_values(&orders, "orders", columns::ORDER_STATUS)?;
    let purchased = datetime_millis(&orders, "orders", columns::PURCHASE_TIMESTAMP)?;
    let delivered = datetime_millis(&orders, "orders", columns::DELIVERED_CUSTOMER_DATE)?;

    let mut seen = HashSet::new();
    let mut points = Vec::new();
    let mut negative = 0usize;

    for (((order_id, status), start), end) in order_ids
        .into_iter()
        .zip(statuses)
        .zip(purchased)
        .zip(delivered)
    {
        let Some(order_id) = order_id else { continue };
        if status.as_deref() != Some(OrderStatus::Delivered.as_str()) {
            continue;
        }
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };
        if !seen.insert(order_id.clone()) {
            continue;
        }

        let duration_days = whole_days_between(start, end);
        if duration_days < 0 {
            negative += 1;
            continue;
        }
        let Some(purchased_at) = DateTime::from_timestamp_millis(start) else {
            continue;
        };
        points.push(DeliveryPoint {
            order_id,
            purchased_at: purchased_at.naive_utc(),
            duration_days,
        });
    }

    if negative > 0 {
        info!("Discarded {} orders with negative delivery duration", negative);
    }

    let summary = summarize(points, params.histogram_bins)?;
    info!(
        "Delivery duration over {} orders: mean {:?} days",
        summary.order_count, summary.mean_days
    );
    Ok(summary)
}

fn summarize(points: Vec<DeliveryPoint>, bins: usize) -> Result<DeliveryDurationSummary> {
    if points.is_empty() {
        return Ok(DeliveryDurationSummary::default());
    }

    let days = Int64Chunked::from_vec(
        "duration_days".into(),
        points.iter().map(|p| p.duration_days).collect(),
    );
    let (min, max) = (days.min(), days.max());

    Ok(DeliveryDurationSummary {
        order_count: days.len(),
        mean_days: days.mean(),
        min_days: min,
        max_days: max,
        median_days: days.median(),
        p75_days: days.quantile(0.75, QuantileMethod::Linear)?,
        histogram: match (min, max) {
            (Some(min), Some(max)) => histogram(&days, min, max, bins),
            _ => Vec::new(),
        },
        points,
    })
}

/// Equal-width bins over [min, max]; the last bin includes the maximum.
fn histogram(days: &Int64Chunked, min: i64, max: i64, bins: usize) -> Vec<HistogramBin> {
    let bins = if max > min { bins.max(1) } else { 1 };
    let (min, max) = (min as f64, max as f64);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for value in days.into_iter().flatten() {
        let index = (((value as f64) - min) / width).floor() as usize;
        out[index.min(bins - 1)].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::DateNormalizer;

    fn orders() -> DataFrame {
        let raw = df!(
            "order_id" => ["o1", "o2", "o3", "o4", "o5", "o1"],
            "customer_id" => ["c1", "c2", "c3", "c4", "c5", "c1"],
            "order_status" => ["delivered", "delivered", "delivered", "shipped", "delivered", "delivered"],
            "order_purchase_timestamp" => [
                Some("2017-01-01 00:00:00"),
                Some("2018-05-01 00:00:00"),
                Some("2017-06-10 00:00:00"),
                Some("2017-02-01 00:00:00"),
                Some("2016-10-01 00:00:00"),
                Some("2017-01-01 00:00:00")
            ],
            "order_approved_at" => [None::<&str>, None, None, None, None, None],
            "order_delivered_carrier_date" => [None::<&str>, None, None, None, None, None],
            "order_delivered_customer_date" => [
                Some("2017-01-11 00:00:00"),
                Some("2018-05-05 00:00:00"),
                Some("2017-06-01 00:00:00"),
                Some("2017-02-03 00:00:00"),
                Some("2016-10-20 00:00:00"),
                Some("2017-01-11 00:00:00")
            ],
            "order_estimated_delivery_date" => [None::<&str>, None, None, None, None, None]
        )
        .unwrap();
        DateNormalizer::for_orders().normalize(&raw).unwrap()
    }

    #[test]
    fn test_duration_statistics() {
        let summary = delivery_duration(&orders(), &DeliveryDurationParams::default()).unwrap();
        // o1 (10 days, counted once) and o2 (4 days); o3 negative, o4 not delivered, o5 out of range
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.min_days, Some(4));
        assert_eq!(summary.max_days, Some(10));
        assert_eq!(summary.mean_days, Some(7.0));
        assert_eq!(summary.median_days, Some(7.0));
        assert_eq!(summary.p75_days, Some(8.5));
        assert_eq!(summary.points.len(), 2);
    }

    #[test]
    fn test_year_selection() {
        let params = DeliveryDurationParams {
            years: vec![2016],
            ..DeliveryDurationParams::default()
        };
        let summary = delivery_duration(&orders(), &params).unwrap();
        assert_eq!(summary.order_count, 1);
        assert_eq!(summary.max_days, Some(19));
    }

    #[test]
    fn test_empty_selection_is_not_an_error() {
        let params = DeliveryDurationParams {
            years: vec![2020],
            ..DeliveryDurationParams::default()
        };
        let summary = delivery_duration(&orders(), &params).unwrap();
        assert_eq!(summary, DeliveryDurationSummary::default());
    }

    #[test]
    fn test_histogram_covers_every_order() {
        let days = Int64Chunked::from_vec("days".into(), vec![0, 1, 1, 5, 10]);
        let bins = histogram(&days, 0, 10, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[4].count, 1);

        let single = histogram(&Int64Chunked::from_vec("days".into(), vec![3, 3]), 3, 3, 50);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);
    }
}
