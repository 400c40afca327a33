use crate::error::{PipelineError, Result};
use crate::loader::RawTables;
use crate::models::{SourceTable, columns};
use crate::processor::{CategoryResolver, DateNormalizer, MedianFiller, NumericFill, ReviewDeduplicator};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessOptions {
    #[serde(default)]
    pub numeric_fill: NumericFill,
}

/// Tables ready for joining: dates parsed, categories resolved, reviews
/// deduplicated. The category translation table has been folded into
/// `products` and is not kept.
#[derive(Debug, Clone)]
pub struct PreparedTables {
    pub orders: DataFrame,
    pub order_items: DataFrame,
    pub order_payments: DataFrame,
    pub customers: DataFrame,
    pub products: DataFrame,
    pub sellers: DataFrame,
    pub order_reviews: DataFrame,
}

impl PreparedTables {
    /// Frame to use as the right side of a join step.
    pub fn joinable(&self, table: SourceTable) -> Result<&DataFrame> {
        match table {
            SourceTable::OrderItems => Ok(&self.order_items),
            SourceTable::OrderPayments => Ok(&self.order_payments),
            SourceTable::Customers => Ok(&self.customers),
            SourceTable::Products => Ok(&self.products),
            SourceTable::Sellers => Ok(&self.sellers),
            SourceTable::OrderReviews => Ok(&self.order_reviews),
            SourceTable::Orders | SourceTable::CategoryTranslation => {
                Err(PipelineError::InvalidJoinStep(table.name()))
            }
        }
    }
}

pub struct Preprocessor {
    options: PreprocessOptions,
    dates: DateNormalizer,
    medians: MedianFiller,
}

impl Preprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self {
            options,
            dates: DateNormalizer::for_orders(),
            medians: MedianFiller::new(columns::PRODUCT_NUMERIC_COLUMNS.to_vec()),
        }
    }

    pub fn prepare(&self, raw: &RawTables) -> Result<PreparedTables> {
        let orders = self.dates.normalize(raw.get(SourceTable::Orders)?)?;
        info!("Normalized timestamps for {} orders", orders.height());

        let products = self.prepare_products(
            raw.get(SourceTable::Products)?,
            raw.get(SourceTable::CategoryTranslation)?,
        )?;

        let order_reviews = ReviewDeduplicator.first_per_order(raw.get(SourceTable::OrderReviews)?)?;

        Ok(PreparedTables {
            orders,
            order_items: raw.get(SourceTable::OrderItems)?.clone(),
            order_payments: raw.get(SourceTable::OrderPayments)?.clone(),
            customers: raw.get(SourceTable::Customers)?.clone(),
            products,
            sellers: raw.get(SourceTable::Sellers)?.clone(),
            order_reviews,
        })
    }

    pub fn prepare_products(&self, products: &DataFrame, translations: &DataFrame) -> Result<DataFrame> {
        let filled = match self.options.numeric_fill {
            NumericFill::Median => self.medians.fill(products)?,
            NumericFill::None => products.clone(),
        };
        CategoryResolver::from_translation_table(translations)?.resolve(&filled)
    }

    /// Re-applies the idempotent steps to already prepared tables.
    pub fn reprepare(&self, prepared: &PreparedTables, translations: &DataFrame) -> Result<PreparedTables> {
        Ok(PreparedTables {
            orders: self.dates.normalize(&prepared.orders)?,
            products: self.prepare_products(&prepared.products, translations)?,
            order_reviews: ReviewDeduplicator.first_per_order(&prepared.order_reviews)?,
            ..prepared.clone()
        })
    }
}
