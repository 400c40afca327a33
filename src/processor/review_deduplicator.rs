use crate::error::Result;
use crate::frame::require;
use crate::models::columns;
use polars::prelude::*;
use tracing::info;

/// Keeps one review per order: the first one in the table's row order.
/// Reviews without an `order_id` count as one group.
pub struct ReviewDeduplicator;

impl ReviewDeduplicator {
    pub fn first_per_order(&self, reviews: &DataFrame) -> Result<DataFrame> {
        require(reviews, "order_reviews", columns::ORDER_ID)?;

        let deduplicated = reviews.unique_stable(
            Some(&[columns::ORDER_ID.into()]),
            UniqueKeepStrategy::First,
            None,
        )?;

        let dropped = reviews.height() - deduplicated.height();
        if dropped > 0 {
            info!("Dropped {} duplicate reviews", dropped);
        }
        Ok(deduplicated)
    }
}
