use crate::error::Result;
use crate::frame::require;
use crate::models::{UNKNOWN_CATEGORY, columns};
use polars::prelude::*;
use tracing::info;

const RAW: &str = columns::PRODUCT_CATEGORY_NAME;
const ENGLISH: &str = columns::PRODUCT_CATEGORY_NAME_ENGLISH;

/// Resolves raw product category names to display names through the
/// translation table.
pub struct CategoryResolver {
    lookup: DataFrame,
}

impl CategoryResolver {
    /// Builds the lookup from the translation table. When a raw name appears
    /// more than once, the first translation is kept.
    pub fn from_translation_table(translations: &DataFrame) -> Result<Self> {
        let table = "product_category_name_translation";
        require(translations, table, RAW)?;
        require(translations, table, ENGLISH)?;

        let lookup = translations
            .clone()
            .lazy()
            .select([
                col(RAW).cast(DataType::String),
                col(ENGLISH).cast(DataType::String),
            ])
            .filter(col(RAW).is_not_null().and(col(ENGLISH).is_not_null()))
            .collect()?
            .unique_stable(Some(&[RAW.into()]), UniqueKeepStrategy::First, None)?;

        info!("Category translation lookup holds {} entries", lookup.height());
        Ok(Self { lookup })
    }

    /// Returns a copy of `products` whose `product_category_name` holds the
    /// resolved display category: the translation when one exists, otherwise
    /// the raw name, with missing or empty names replaced by
    /// `unknown_category` first. No translation column is kept.
    pub fn resolve(&self, products: &DataFrame) -> Result<DataFrame> {
        let placeholders = require(products, "products", RAW)?.null_count();

        let mut base = products.clone();
        if base.column(ENGLISH).is_ok() {
            base = base.drop(ENGLISH)?;
        }

        let resolved = base
            .lazy()
            .with_column(col(RAW).cast(DataType::String))
            .with_column(
                when(col(RAW).fill_null(lit("")).eq(lit("")))
                    .then(lit(UNKNOWN_CATEGORY))
                    .otherwise(col(RAW))
                    .alias(RAW),
            )
            .join(
                self.lookup.clone().lazy(),
                [col(RAW)],
                [col(RAW)],
                JoinArgs {
                    maintain_order: MaintainOrderJoin::Left,
                    ..JoinArgs::new(JoinType::Left)
                },
            )
            .with_column(col(ENGLISH).fill_null(col(RAW)).alias(RAW))
            .collect()?
            .drop(ENGLISH)?;

        info!(
            "Resolved categories for {} products ({} without a category name)",
            resolved.height(),
            placeholders
        );
        Ok(resolved)
    }
}
